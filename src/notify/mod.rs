//! Delivery of initial credentials to newly provisioned users.

use secrecy::ExposeSecret;

use crate::{error::ProvisionError, provision::record::Credential};

pub mod smtp;

pub use smtp::SmtpNotifier;

pub const SUBJECT: &str = "Your Jenkins Access";

/// Sends a freshly created login to its owner.
///
/// A failed delivery is not retried and does not undo anything already done
/// on the Jenkins side.
pub trait Notifier {
    fn notify(&self, credential: &Credential, email: &str, role: &str)
    -> Result<(), ProvisionError>;
}

/// Plain-text body of the credentials email.
pub fn render_credentials_body(jenkins_url: &str, credential: &Credential, role: &str) -> String {
    format!(
        "Hello {username},\n\
         \n\
         Your Jenkins account has been created.\n\
         \n\
         URL: {jenkins_url}\n\
         Username: {username}\n\
         Password: {password}\n\
         Role: {role}\n\
         \n\
         Please change password after login.\n",
        username = credential.username,
        password = credential.password.expose_secret(),
    )
}
