use std::cell::RefCell;

use log::{error, info};

use crate::{
    core::item::{ItemWriter, ItemWriterResult},
    provision::outcome::{Disposition, ProvisioningSummary, RowOutcome},
};

/// Logs every row outcome and tallies them into a [`ProvisioningSummary`].
#[derive(Default)]
pub struct OutcomeWriter {
    summary: RefCell<ProvisioningSummary>,
}

impl OutcomeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> ProvisioningSummary {
        self.summary.borrow().clone()
    }

    pub fn into_summary(self) -> ProvisioningSummary {
        self.summary.into_inner()
    }
}

impl ItemWriter<RowOutcome> for OutcomeWriter {
    fn write(&self, items: &[RowOutcome]) -> ItemWriterResult {
        let mut summary = self.summary.borrow_mut();

        for outcome in items {
            match &outcome.disposition {
                Disposition::Provisioned { role } => {
                    info!("{} provisioned with role {}", outcome.username, role)
                }
                Disposition::Existing => info!("{} already exists.", outcome.username),
                Disposition::CreatedElsewhere => {
                    info!("User {} already exists.", outcome.username)
                }
                Disposition::Duplicate => {
                    info!("{} appears more than once, skipping", outcome.username)
                }
                Disposition::Failed { stage, error } => {
                    error!("Error for {} at {}: {}", outcome.username, stage, error)
                }
            }
            summary.record(outcome);
        }

        Ok(())
    }
}
