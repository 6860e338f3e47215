//! The per-user provisioning workflow and the batch job that drives it.

pub mod job;

pub mod outcome;

pub mod password;

pub mod processor;

pub mod record;

pub mod validate;

pub use job::{EXIT_FATAL, EXIT_ROW_FAILURES, exit_status, provision_users};
pub use outcome::{Disposition, ProvisioningSummary, RowOutcome, Stage};
pub use record::{Credential, UserRecord};
