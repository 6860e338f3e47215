use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProvisionError;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username pattern compiles"));

static ROLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.-]+$").expect("role pattern compiles"));

/// Accepts usernames made only of ASCII letters, digits, `_` and `-`.
pub fn validate_username(username: &str) -> Result<(), ProvisionError> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        Err(ProvisionError::InvalidInput(format!("Invalid username: {username}")))
    }
}

/// Accepts a lower-cased role name and, when `allowed` is given, only the
/// roles it lists.
pub fn validate_role(role: &str, allowed: Option<&[String]>) -> Result<(), ProvisionError> {
    if !ROLE_PATTERN.is_match(role) {
        return Err(ProvisionError::InvalidInput(format!("Invalid role: {role}")));
    }

    match allowed {
        Some(roles) if !roles.iter().any(|allowed_role| allowed_role == role) => Err(
            ProvisionError::InvalidInput(format!("Role not allowed: {role}")),
        ),
        _ => Ok(()),
    }
}
