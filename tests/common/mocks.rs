//! Mock version of the credentials notifier.
use mockall::mock;

use jenkins_provisioner::{ProvisionError, notify::Notifier, provision::Credential};

mock! {
    pub Mailer {}
    impl Notifier for Mailer {
        fn notify(&self, credential: &Credential, email: &str, role: &str) -> Result<(), ProvisionError>;
    }
}
