use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("Step {0} failed")]
    Step(String),
}

/// Failure kinds of the provisioning workflow.
///
/// Every variant except [`ProvisionError::Configuration`] is confined to the
/// row that raised it.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A roster value failed syntactic validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network failure, timeout or retries exhausted on a required call.
    #[error("transport error: {0}")]
    Transport(String),

    /// Jenkins answered account creation with an unexpected status.
    #[error("failed creating {username}: HTTP {status}")]
    Provisioning { username: String, status: u16 },

    /// The role script ran without printing its success marker.
    #[error("role assignment of '{role}' failed for {username}")]
    RoleAssignment { username: String, role: String },

    #[error("notification failed: {0}")]
    Notification(String),

    /// Fatal startup problem, e.g. the admin token is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ProvisionError {
    fn from(error: reqwest::Error) -> Self {
        ProvisionError::Transport(error.to_string())
    }
}
