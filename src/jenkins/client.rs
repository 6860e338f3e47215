//! Jenkins admin API client.

use log::{debug, info, warn};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{HeaderName, HeaderValue},
    redirect::Policy,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{config::JenkinsSettings, error::ProvisionError};

use super::{
    http::{self, HttpError, READ_TIMEOUT, RetryPolicy, WRITE_TIMEOUT, retry},
    script::{ROLE_ASSIGNED_MARKER, role_assignment_script},
};

/// CSRF token that must accompany state-changing requests when Jenkins has
/// CSRF protection enabled.
#[derive(Debug, Clone)]
pub struct CrumbToken {
    pub field_name: HeaderName,
    pub value: HeaderValue,
}

impl CrumbToken {
    /// Returns `None` when either part is not usable as an HTTP header.
    pub fn parse(field_name: &str, value: &str) -> Option<Self> {
        let field_name = HeaderName::from_bytes(field_name.as_bytes()).ok()?;
        let mut value = HeaderValue::from_str(value).ok()?;
        value.set_sensitive(true);
        Some(Self { field_name, value })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrumbResponse {
    crumb_request_field: String,
    crumb: String,
}

/// Result of an account creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Jenkins refused to create the account because it exists.
    AlreadyExists,
}

/// Thin client over the Jenkins endpoints used for provisioning.
///
/// Every request authenticates with HTTP basic auth using the admin user and
/// API token. Read requests follow redirects and go through the retry policy;
/// account creation and script execution never follow redirects and are sent
/// once.
pub struct JenkinsAdminClient {
    http: Client,
    forms: Client,
    base_url: String,
    admin_user: String,
    admin_token: SecretString,
    retry: RetryPolicy,
}

impl JenkinsAdminClient {
    pub fn new(settings: &JenkinsSettings) -> Result<Self, ProvisionError> {
        Self::with_retry_policy(settings, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        settings: &JenkinsSettings,
        retry: RetryPolicy,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            http: http::new_client(Policy::default())?,
            forms: http::new_client(Policy::none())?,
            base_url: settings.url.trim_end_matches('/').to_string(),
            admin_user: settings.admin_user.clone(),
            admin_token: SecretString::from(settings.admin_token.expose_secret().to_string()),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.admin_user, Some(self.admin_token.expose_secret()))
    }

    /// GET with the retry policy applied to transient statuses and
    /// connection failures.
    async fn get(&self, url: &str) -> Result<Response, HttpError> {
        retry(&self.retry, || async move {
            let response = self
                .authorized(self.http.get(url))
                .timeout(READ_TIMEOUT)
                .send()
                .await
                .map_err(HttpError::Transport)?;

            if self.retry.is_retryable_status(response.status()) {
                return Err(HttpError::Status(response.status()));
            }
            Ok(response)
        })
        .await
    }

    /// POST carrying the crumb header when Jenkins issued one.
    fn post(&self, url: &str, crumb: Option<&CrumbToken>) -> RequestBuilder {
        let request = self.authorized(self.forms.post(url)).timeout(WRITE_TIMEOUT);
        match crumb {
            Some(crumb) => request.header(crumb.field_name.clone(), crumb.value.clone()),
            None => request,
        }
    }

    /// Fetches a CSRF crumb, or `None` when Jenkins does not hand one out.
    ///
    /// Never fails: a disabled crumb issuer must not block provisioning.
    pub async fn fetch_crumb(&self) -> Option<CrumbToken> {
        let response = match self.get(&self.url("/crumbIssuer/api/json")).await {
            Ok(response) => response,
            Err(error) => {
                debug!("No crumb available: {error}");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("No crumb available: crumb issuer answered {}", response.status());
            return None;
        }

        match response.json::<CrumbResponse>().await {
            Ok(body) => {
                let crumb = CrumbToken::parse(&body.crumb_request_field, &body.crumb);
                if crumb.is_none() {
                    warn!("Ignoring crumb with unusable field '{}'", body.crumb_request_field);
                }
                crumb
            }
            Err(error) => {
                warn!("Ignoring malformed crumb response: {error}");
                None
            }
        }
    }

    /// Reports whether `username` has an account.
    ///
    /// Any final status other than 200 means absent; transport failures are
    /// errors. `username` is placed in the URL path as is and must already be
    /// validated.
    pub async fn user_exists(&self, username: &str) -> Result<bool, ProvisionError> {
        let url = self.url(&format!("/securityRealm/user/{username}/api/json"));
        let response = self.get(&url).await?;
        Ok(response.status() == StatusCode::OK)
    }

    /// Creates an account through the admin signup form.
    ///
    /// A `302` means created. A `200` means Jenkins re-rendered the form,
    /// which counts as [`CreateOutcome::AlreadyExists`] only when a follow-up
    /// lookup finds the user. Any other status fails with
    /// [`ProvisionError::Provisioning`].
    pub async fn create_user(
        &self,
        username: &str,
        password: &SecretString,
        email: &str,
    ) -> Result<CreateOutcome, ProvisionError> {
        let crumb = self.fetch_crumb().await;
        let password = password.expose_secret();
        let form = [
            ("username", username),
            ("password1", password),
            ("password2", password),
            ("fullname", username),
            ("email", email),
        ];

        let response = self
            .post(&self.url("/securityRealm/createAccountByAdmin"), crumb.as_ref())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FOUND {
            info!("User {username} created.");
            return Ok(CreateOutcome::Created);
        }
        if status == StatusCode::OK && self.user_exists(username).await? {
            return Ok(CreateOutcome::AlreadyExists);
        }

        Err(ProvisionError::Provisioning {
            username: username.to_string(),
            status: status.as_u16(),
        })
    }

    /// Assigns the global `role` to `username` by running a script on the
    /// controller.
    ///
    /// Succeeds only when the response body carries the success marker.
    pub async fn assign_role(&self, username: &str, role: &str) -> Result<(), ProvisionError> {
        let crumb = self.fetch_crumb().await;
        let script = role_assignment_script(username, role);

        let body = self
            .post(&self.url("/scriptText"), crumb.as_ref())
            .form(&[("script", script.as_str())])
            .send()
            .await?
            .text()
            .await?;

        if body.contains(ROLE_ASSIGNED_MARKER) {
            debug!("Role {role} assigned to {username}");
            Ok(())
        } else {
            Err(ProvisionError::RoleAssignment {
                username: username.to_string(),
                role: role.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crumb_parses_valid_header() {
        let crumb = CrumbToken::parse("Jenkins-Crumb", "abc123").unwrap();
        assert_eq!(crumb.field_name.as_str(), "jenkins-crumb");
        assert_eq!(crumb.value.to_str().unwrap(), "abc123");
        assert!(crumb.value.is_sensitive());
    }

    #[test]
    fn crumb_with_invalid_header_name_is_dropped() {
        assert!(CrumbToken::parse("not a header", "abc").is_none());
        assert!(CrumbToken::parse("Jenkins-Crumb", "line\nbreak").is_none());
    }

    #[test]
    fn crumb_response_uses_jenkins_field_names() {
        let body: CrumbResponse = serde_json::from_str(
            r#"{"_class":"hudson.security.csrf.DefaultCrumbIssuer","crumb":"c","crumbRequestField":"Jenkins-Crumb"}"#,
        )
        .unwrap();
        assert_eq!(body.crumb_request_field, "Jenkins-Crumb");
        assert_eq!(body.crumb, "c");
    }
}
