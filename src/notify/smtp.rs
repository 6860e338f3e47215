use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use log::info;
use secrecy::ExposeSecret;

use crate::{
    config::SmtpSettings, core::block_on, error::ProvisionError, provision::record::Credential,
};

use super::{Notifier, SUBJECT, render_credentials_body};

/// Emails credentials through an SMTP relay, upgrading the session with
/// STARTTLS before authenticating.
///
/// The SMTP user doubles as the sender address. A session is opened per
/// message and always authenticates, so both SMTP credentials are required.
pub struct SmtpNotifier<'a> {
    smtp: &'a SmtpSettings,
    jenkins_url: &'a str,
}

impl<'a> SmtpNotifier<'a> {
    pub fn new(smtp: &'a SmtpSettings, jenkins_url: &'a str) -> Self {
        Self { smtp, jenkins_url }
    }

    fn build_message(
        &self,
        credential: &Credential,
        email: &str,
        role: &str,
    ) -> Result<Message, ProvisionError> {
        let sender = self
            .smtp
            .user
            .as_deref()
            .ok_or_else(|| ProvisionError::Notification("SMTP_USER is not set".to_string()))?;

        let from: Mailbox = sender
            .parse()
            .map_err(|e| ProvisionError::Notification(format!("invalid sender {sender}: {e}")))?;
        let to: Mailbox = email
            .parse()
            .map_err(|e| ProvisionError::Notification(format!("invalid recipient {email}: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(render_credentials_body(self.jenkins_url, credential, role))
            .map_err(|e| ProvisionError::Notification(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, ProvisionError> {
        let user = self
            .smtp
            .user
            .as_ref()
            .ok_or_else(|| ProvisionError::Notification("SMTP_USER is not set".to_string()))?;
        let password = self
            .smtp
            .password
            .as_ref()
            .ok_or_else(|| ProvisionError::Notification("SMTP_PASSWORD is not set".to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.server)
            .map_err(|e| ProvisionError::Notification(e.to_string()))?
            .port(self.smtp.port)
            .credentials(Credentials::new(
                user.clone(),
                password.expose_secret().to_string(),
            ))
            .build();

        Ok(transport)
    }
}

impl Notifier for SmtpNotifier<'_> {
    fn notify(
        &self,
        credential: &Credential,
        email: &str,
        role: &str,
    ) -> Result<(), ProvisionError> {
        let message = self.build_message(credential, email, role)?;
        let transport = self.transport()?;

        block_on(transport.send(message))
            .map_err(|e| ProvisionError::Notification(e.to_string()))?;

        info!("Email sent to {email}");
        Ok(())
    }
}
