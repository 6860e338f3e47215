use secrecy::SecretString;
use serde::Deserialize;

/// One account request, as read from a roster row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub role: String,
}

impl UserRecord {
    pub fn new(username: &str, email: &str, role: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    /// Trims every field and lower-cases the role.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role.trim().to_lowercase(),
        }
    }
}

/// Login issued to a freshly created account.
///
/// Lives only until the credentials email has been sent.
#[derive(Debug)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}
