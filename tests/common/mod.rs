#![allow(dead_code)]

pub mod mocks;

use std::{io::Write, path::Path, time::Duration};

use jenkins_provisioner::{
    config::Settings,
    jenkins::{JenkinsAdminClient, http::RetryPolicy},
};
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::{
    Match, Mock, MockServer, Request, ResponseTemplate,
    matchers::{method, path},
};

pub use mocks::MockMailer;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_TOKEN: &str = "api-token";
pub const CRUMB: &str = "c0ffee";

/// Writes a roster with the standard header followed by `rows`.
pub fn roster(rows: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "username,email,role").unwrap();
    file.write_all(rows.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn settings(jenkins_url: &str, roster: &Path, extra: &[(&str, &str)]) -> Settings {
    let roster = roster.to_string_lossy().into_owned();
    let mut vars = vec![
        ("JENKINS_URL".to_string(), jenkins_url.to_string()),
        ("ADMIN_USER".to_string(), ADMIN_USER.to_string()),
        ("ADMIN_TOKEN".to_string(), ADMIN_TOKEN.to_string()),
        ("CSV_PATH".to_string(), roster),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    Settings::from_lookup(|key| {
        vars.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        ..RetryPolicy::default()
    }
}

pub fn client(settings: &Settings) -> JenkinsAdminClient {
    JenkinsAdminClient::with_retry_policy(&settings.jenkins, fast_retry()).unwrap()
}

/// Matches requests that do not carry the named header.
pub struct HeaderAbsent(pub &'static str);

impl Match for HeaderAbsent {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key(self.0)
    }
}

pub fn user_path(username: &str) -> String {
    format!("/securityRealm/user/{username}/api/json")
}

pub async fn mount_crumb(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/crumbIssuer/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_class": "hudson.security.csrf.DefaultCrumbIssuer",
            "crumb": CRUMB,
            "crumbRequestField": "Jenkins-Crumb"
        })))
        .mount(server)
        .await;
}

pub async fn mount_user_lookup(server: &MockServer, username: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(user_path(username)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_role_script(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/scriptText"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
