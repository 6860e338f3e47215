use std::process::ExitCode;

use log::error;

use jenkins_provisioner::{
    config::Settings,
    jenkins::JenkinsAdminClient,
    logging,
    notify::SmtpNotifier,
    provision::{EXIT_FATAL, exit_status, provision_users},
};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let jenkins = match JenkinsAdminClient::new(&settings.jenkins) {
        Ok(jenkins) => jenkins,
        Err(e) => {
            error!("Cannot build Jenkins client: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let notifier = SmtpNotifier::new(&settings.smtp, jenkins.base_url());

    let run = provision_users(&settings, &jenkins, &notifier);
    if let Err(e) = &run {
        error!("Provisioning aborted: {e}");
    }

    ExitCode::from(exit_status(&run, settings.fail_on_row_errors))
}
