use log::info;

use crate::{
    config::Settings,
    core::{
        job::{Job, JobBuilder},
        step::{ChunkOrientedStep, StepBuilder},
    },
    error::BatchError,
    item::{report::OutcomeWriter, roster::RosterReaderBuilder},
    jenkins::JenkinsAdminClient,
    notify::Notifier,
};

use super::{
    outcome::{ProvisioningSummary, RowOutcome},
    password::PasswordGenerator,
    processor::ProvisioningProcessor,
    record::UserRecord,
};

pub const STEP_NAME: &str = "provision-users";

pub const JOB_NAME: &str = "jenkins-user-provisioning";

/// Fatal startup problem: configuration, HTTP client or roster.
pub const EXIT_FATAL: u8 = 1;

/// Rows failed and `FAIL_ON_ROW_ERRORS` is enabled.
pub const EXIT_ROW_FAILURES: u8 = 2;

/// Maps a finished run to the process exit status.
///
/// Row failures only change the status when `fail_on_row_errors` is set.
pub fn exit_status(run: &Result<ProvisioningSummary, BatchError>, fail_on_row_errors: bool) -> u8 {
    match run {
        Ok(summary) if fail_on_row_errors && summary.has_failures() => EXIT_ROW_FAILURES,
        Ok(_) => 0,
        Err(_) => EXIT_FATAL,
    }
}

/// Provisions every row of the roster at `settings.csv_path`, one row at a
/// time.
///
/// Row failures never stop the run; they are counted in the returned summary.
/// Errors are returned only when the roster cannot be opened.
pub fn provision_users(
    settings: &Settings,
    jenkins: &JenkinsAdminClient,
    notifier: &dyn Notifier,
) -> Result<ProvisioningSummary, BatchError> {
    let reader = RosterReaderBuilder::new().from_path(&settings.csv_path)?;

    let processor = ProvisioningProcessor::new(
        jenkins,
        notifier,
        PasswordGenerator::new(settings.password_length),
    )
    .allowed_roles(settings.allowed_roles.as_deref());

    let writer = OutcomeWriter::new();

    let step: ChunkOrientedStep<UserRecord, RowOutcome> = StepBuilder::new()
        .name(STEP_NAME)
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(1)
        .skip_limit(usize::MAX)
        .build();

    let job = JobBuilder::new().name(JOB_NAME).start(&step).build();
    let execution = job.run()?;

    let mut summary = writer.summary();
    summary.unreadable = execution
        .step_executions
        .iter()
        .map(|step_execution| step_execution.read_error_count)
        .sum();

    info!("Provisioning completed. {summary}");
    Ok(summary)
}
