/*!
 # Jenkins user provisioner

 Provisions Jenkins accounts from a CSV roster. Each row goes through the same
 pipeline, one row at a time:

 1. validate the username (and the role, against an optional allow-list),
 2. skip users that already exist,
 3. create the account with a generated password,
 4. assign a global role through the role-based authorization strategy,
 5. email the credentials to the user.

 A failing row is logged with its username and the stage it reached, then the
 next row runs. The run ends with a [`provision::ProvisioningSummary`].

 ## Building blocks

 The run is a batch job made of one chunk-oriented step:

- **ItemReader:** [`item::roster::RosterReader`] reads `username,email,role` rows.
- **ItemProcessor:** [`provision::processor::ProvisioningProcessor`] runs the pipeline and turns every row into a [`provision::RowOutcome`].
- **ItemWriter:** [`item::report::OutcomeWriter`] logs the outcomes and tallies them.

 Jenkins is reached through [`jenkins::JenkinsAdminClient`], whose read
 requests are retried on transient failures. Credentials are delivered by a
 [`notify::Notifier`], normally [`notify::SmtpNotifier`].

 ## Configuration

 | **Variable**         | **Default**             |
 |----------------------|-------------------------|
 | `JENKINS_URL`        | `http://localhost:8080` |
 | `ADMIN_USER`         | empty                   |
 | `ADMIN_TOKEN`        | required                |
 | `SMTP_SERVER`        | `smtp.gmail.com`        |
 | `SMTP_PORT`          | `587`                   |
 | `SMTP_USER`          | unset                   |
 | `SMTP_PASSWORD`      | unset                   |
 | `CSV_PATH`           | `users.csv`             |
 | `PASSWORD_LENGTH`    | `14`                    |
 | `ALLOWED_ROLES`      | unset (any role)        |
 | `FAIL_ON_ROW_ERRORS` | `false`                 |

 ## Getting Started

```no_run
use jenkins_provisioner::{
    config::Settings, jenkins::JenkinsAdminClient, notify::SmtpNotifier,
    provision::provision_users,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let jenkins = JenkinsAdminClient::new(&settings.jenkins)?;
    let notifier = SmtpNotifier::new(&settings.smtp, jenkins.base_url());

    let summary = provision_users(&settings, &jenkins, &notifier)?;
    println!("{summary}");
    Ok(())
}
```
 */

/// Settings resolved from the environment
pub mod config;

/// Batch primitives: items, steps and jobs
pub mod core;

/// Error types
pub mod error;

#[doc(inline)]
pub use error::*;

/// Roster reader and outcome writer
pub mod item;

pub mod jenkins;

pub mod logging;

pub mod notify;

pub mod provision;
