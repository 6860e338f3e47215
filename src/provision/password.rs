use rand::distr::{Distribution, Uniform};
use secrecy::SecretString;

use crate::config::DEFAULT_PASSWORD_LENGTH;

/// Characters a generated password is drawn from.
pub const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

/// Generates initial account passwords.
///
/// Each character is drawn uniformly from [`PASSWORD_CHARSET`] using the
/// thread-local CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct PasswordGenerator {
    length: usize,
}

impl Default for PasswordGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD_LENGTH)
    }
}

impl PasswordGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> SecretString {
        let index = Uniform::new(0, PASSWORD_CHARSET.len()).expect("password charset is not empty");
        let password: String = index
            .sample_iter(rand::rng())
            .take(self.length)
            .map(|i| PASSWORD_CHARSET[i] as char)
            .collect();
        SecretString::from(password)
    }
}
