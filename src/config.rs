//! Process settings resolved once from the environment.
//!
//! [`Settings::from_lookup`] takes any key lookup so that callers (and tests)
//! can resolve settings without touching the process environment.

use std::{env, path::PathBuf};

use secrecy::SecretString;

use crate::error::ProvisionError;

pub const DEFAULT_JENKINS_URL: &str = "http://localhost:8080";
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_CSV_PATH: &str = "users.csv";
pub const DEFAULT_PASSWORD_LENGTH: usize = 14;

/// Connection details of the Jenkins controller.
#[derive(Debug)]
pub struct JenkinsSettings {
    /// Base URL without trailing slash.
    pub url: String,
    pub admin_user: String,
    pub admin_token: SecretString,
}

/// SMTP relay used to deliver credentials.
#[derive(Debug)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    /// Login name, also used as the sender address.
    pub user: Option<String>,
    pub password: Option<SecretString>,
}

/// Immutable configuration for one provisioning run.
#[derive(Debug)]
pub struct Settings {
    pub jenkins: JenkinsSettings,
    pub smtp: SmtpSettings,
    pub csv_path: PathBuf,
    pub password_length: usize,
    /// When set, roles outside this list are rejected before any call.
    pub allowed_roles: Option<Vec<String>>,
    /// Turns row failures into a non-zero exit status.
    pub fail_on_row_errors: bool,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ProvisionError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves settings through `lookup`.
    ///
    /// Fails with [`ProvisionError::Configuration`] when `ADMIN_TOKEN` is
    /// absent or empty, or when a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let admin_token = get("ADMIN_TOKEN")
            .map(SecretString::from)
            .ok_or_else(|| ProvisionError::Configuration("ADMIN_TOKEN missing".to_string()))?;

        let url = get("JENKINS_URL")
            .unwrap_or_else(|| DEFAULT_JENKINS_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ProvisionError::Configuration(format!("SMTP_PORT must be a port number, got '{raw}'"))
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let password_length = match get("PASSWORD_LENGTH") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(length) if length > 0 => length,
                _ => {
                    return Err(ProvisionError::Configuration(format!(
                        "PASSWORD_LENGTH must be a positive integer, got '{raw}'"
                    )));
                }
            },
            None => DEFAULT_PASSWORD_LENGTH,
        };

        let allowed_roles = get("ALLOWED_ROLES").map(|raw| {
            raw.split(',')
                .map(|role| role.trim().to_lowercase())
                .filter(|role| !role.is_empty())
                .collect::<Vec<_>>()
        });

        let fail_on_row_errors = get("FAIL_ON_ROW_ERRORS")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Settings {
            jenkins: JenkinsSettings {
                url,
                admin_user: get("ADMIN_USER").unwrap_or_default(),
                admin_token,
            },
            smtp: SmtpSettings {
                server: get("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
                port,
                user: get("SMTP_USER"),
                password: get("SMTP_PASSWORD").map(SecretString::from),
            },
            csv_path: get("CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            password_length,
            allowed_roles,
            fail_on_row_errors,
        })
    }
}
