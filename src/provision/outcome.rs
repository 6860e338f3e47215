//! Tagged per-row results and the batch summary built from them.

use std::fmt;

use crate::error::ProvisionError;

/// Step of the per-user pipeline at which a row stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    ExistenceCheck,
    Create,
    AssignRole,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::ExistenceCheck => "existence-check",
            Stage::Create => "create",
            Stage::AssignRole => "assign-role",
            Stage::Notify => "notify",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum Disposition {
    /// Created, role assigned and credentials emailed.
    Provisioned { role: String },
    /// The account existed before this run; nothing was changed.
    Existing,
    /// Jenkins reported the account as present when asked to create it.
    CreatedElsewhere,
    /// The username already appeared earlier in the roster.
    Duplicate,
    Failed { stage: Stage, error: ProvisionError },
}

/// Result of processing one roster row.
#[derive(Debug)]
pub struct RowOutcome {
    pub username: String,
    pub disposition: Disposition,
}

impl RowOutcome {
    pub fn new(username: &str, disposition: Disposition) -> Self {
        Self {
            username: username.to_string(),
            disposition,
        }
    }

    pub fn failed(username: &str, stage: Stage, error: ProvisionError) -> Self {
        Self::new(username, Disposition::Failed { stage, error })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.disposition, Disposition::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub username: String,
    pub stage: Stage,
    pub message: String,
}

/// Counts of what happened to every row of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningSummary {
    pub rows: usize,
    pub provisioned: usize,
    pub existing: usize,
    pub created_elsewhere: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// Rows the roster reader could not parse.
    pub unreadable: usize,
    pub failures: Vec<FailureRecord>,
}

impl ProvisioningSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.rows += 1;
        match &outcome.disposition {
            Disposition::Provisioned { .. } => self.provisioned += 1,
            Disposition::Existing => self.existing += 1,
            Disposition::CreatedElsewhere => self.created_elsewhere += 1,
            Disposition::Duplicate => self.duplicates += 1,
            Disposition::Failed { stage, error } => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    username: outcome.username.clone(),
                    stage: *stage,
                    message: error.to_string(),
                });
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.existing + self.created_elsewhere + self.duplicates
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.unreadable > 0
    }
}

impl fmt::Display for ProvisioningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} provisioned, {} skipped, {} failed, {} unreadable",
            self.rows + self.unreadable,
            self.provisioned,
            self.skipped(),
            self.failed,
            self.unreadable
        )
    }
}
