use std::{cell::RefCell, collections::HashSet};

use log::{debug, info};

use crate::{
    core::{
        block_on,
        item::{ItemProcessor, ItemProcessorResult},
    },
    jenkins::{CreateOutcome, JenkinsAdminClient},
    notify::Notifier,
};

use super::{
    outcome::{Disposition, RowOutcome, Stage},
    password::PasswordGenerator,
    record::{Credential, UserRecord},
    validate::{validate_role, validate_username},
};

/// Runs the per-user pipeline: validate, check existence, create, assign the
/// role and email the credentials.
///
/// Every failure is captured in the returned [`RowOutcome`], so the step never
/// sees a processing error and the next row always runs.
pub struct ProvisioningProcessor<'a> {
    jenkins: &'a JenkinsAdminClient,
    notifier: &'a dyn Notifier,
    passwords: PasswordGenerator,
    allowed_roles: Option<&'a [String]>,
    seen: RefCell<HashSet<String>>,
}

impl<'a> ProvisioningProcessor<'a> {
    pub fn new(
        jenkins: &'a JenkinsAdminClient,
        notifier: &'a dyn Notifier,
        passwords: PasswordGenerator,
    ) -> Self {
        Self {
            jenkins,
            notifier,
            passwords,
            allowed_roles: None,
            seen: RefCell::new(HashSet::new()),
        }
    }

    /// Restricts assignable roles to `roles`.
    pub fn allowed_roles(mut self, roles: Option<&'a [String]>) -> Self {
        self.allowed_roles = roles;
        self
    }

    fn provision(&self, record: &UserRecord) -> RowOutcome {
        let username = record.username.as_str();

        if let Err(error) = validate_username(username)
            .and_then(|_| validate_role(&record.role, self.allowed_roles))
        {
            return RowOutcome::failed(username, Stage::Validate, error);
        }

        if !self.seen.borrow_mut().insert(username.to_lowercase()) {
            return RowOutcome::new(username, Disposition::Duplicate);
        }

        match block_on(self.jenkins.user_exists(username)) {
            Ok(true) => return RowOutcome::new(username, Disposition::Existing),
            Ok(false) => {}
            Err(error) => return RowOutcome::failed(username, Stage::ExistenceCheck, error),
        }

        let credential = Credential {
            username: username.to_string(),
            password: self.passwords.generate(),
        };

        match block_on(
            self.jenkins
                .create_user(username, &credential.password, &record.email),
        ) {
            Ok(CreateOutcome::Created) => {}
            Ok(CreateOutcome::AlreadyExists) => {
                return RowOutcome::new(username, Disposition::CreatedElsewhere);
            }
            Err(error) => return RowOutcome::failed(username, Stage::Create, error),
        }

        if let Err(error) = block_on(self.jenkins.assign_role(username, &record.role)) {
            return RowOutcome::failed(username, Stage::AssignRole, error);
        }
        debug!("Role {} assigned to {}", record.role, username);

        if let Err(error) = self
            .notifier
            .notify(&credential, &record.email, &record.role)
        {
            return RowOutcome::failed(username, Stage::Notify, error);
        }

        RowOutcome::new(
            username,
            Disposition::Provisioned {
                role: record.role.clone(),
            },
        )
    }
}

impl ItemProcessor<UserRecord, RowOutcome> for ProvisioningProcessor<'_> {
    fn process(&self, item: &UserRecord) -> ItemProcessorResult<RowOutcome> {
        let record = item.normalized();
        info!("Processing {}", record.username);
        Ok(self.provision(&record))
    }
}
