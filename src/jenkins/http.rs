//! Shared HTTP client and retry with exponential backoff.

use std::{fmt, future::Future, time::Duration};

use log::warn;
use reqwest::{Client, StatusCode, redirect::Policy};

use crate::error::ProvisionError;

/// Timeout applied to read requests.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout applied to state-changing requests.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds a pooled client for Jenkins calls following `redirects`.
///
/// Lookups use [`Policy::default`]. Form posts use [`Policy::none`], so a
/// `302` from account creation reaches the caller untouched.
pub fn new_client(redirects: Policy) -> Result<Client, ProvisionError> {
    Client::builder()
        .user_agent(user_agent())
        .redirect(redirects)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ProvisionError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Format: `{crate}/{version}`.
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub jitter: bool,
    pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: false,
            retryable_statuses: vec![
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());

        let delay = if self.jitter {
            capped * (0.5 + rand::random::<f64>())
        } else {
            capped
        };

        Duration::from_secs_f64(delay)
    }
}

pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

/// Failure of a single HTTP exchange.
#[derive(Debug)]
pub enum HttpError {
    Transport(reqwest::Error),
    /// The server answered with a status the retry policy treats as transient.
    Status(StatusCode),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Transport(error) => write!(f, "{error}"),
            HttpError::Status(status) => write!(f, "server answered {status}"),
        }
    }
}

impl RetryableError for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            HttpError::Transport(error) => error.is_timeout() || error.is_connect(),
            HttpError::Status(_) => true,
        }
    }
}

impl From<HttpError> for ProvisionError {
    fn from(error: HttpError) -> Self {
        ProvisionError::Transport(error.to_string())
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error or
/// `policy.max_attempts` attempts have been made.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;

                if !error.is_retryable() {
                    return Err(error);
                }

                if attempt >= policy.max_attempts {
                    warn!("Giving up after {attempt} attempts: {error}");
                    return Err(error);
                }

                let delay = policy.delay(attempt - 1);
                warn!(
                    "Attempt {}/{} failed ({}), retrying in {} ms",
                    attempt,
                    policy.max_attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    #[derive(Debug)]
    struct FakeError {
        retryable: bool,
    }

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake (retryable: {})", self.retryable)
        }
    }

    impl RetryableError for FakeError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<(), FakeError> = retry(&fast_policy(3), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError { retryable: false })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_error_stops_at_max_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<(), FakeError> = retry(&fast_policy(3), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError { retryable: true })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<&str, FakeError> = retry(&fast_policy(3), || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FakeError { retryable: true })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_grows_exponentially_and_is_capped() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(3));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            base_delay: Duration::from_millis(100),
            ..RetryPolicy::default()
        };

        for _ in 0..20 {
            let delay = policy.delay(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn default_policy_retries_gateway_errors_only() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 3);
        for status in [500, 502, 503, 504] {
            assert!(policy.is_retryable_status(StatusCode::from_u16(status).unwrap()));
        }
        assert!(!policy.is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn client_builds() {
        assert!(new_client(Policy::default()).is_ok());
        assert!(new_client(Policy::none()).is_ok());
        assert!(user_agent().starts_with("jenkins-provisioner/"));
    }
}
