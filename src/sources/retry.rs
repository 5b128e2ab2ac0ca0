/*! Retry and backoff

Every attempt, including the first one, is preceded by a fixed politeness pause and a linear backoff (`base * attempt`).
Failures are handled according to their [FailureKind]:

- rate limiting is retried and is never turned into a hard failure: once attempts run out, [Error::RateLimited] is returned,
- flood waits sleep for the requested time (plus a margin), which replaces the linear backoff of the next attempt,
- transient failures are retried, the last one being returned,
- fatal failures are returned immediately.
!*/
use std::{future::Future, time::Duration};

use log::{debug, warn};
use serde::Deserialize;
use tokio::time::sleep;

use crate::error::{Error, FailureKind};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub max_retries: u32,
    pub politeness_secs: f64,
    pub base_secs: f64,
    pub flood_margin_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            politeness_secs: 1.5,
            base_secs: 2.0,
            flood_margin_secs: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backoff {
    max_retries: u32,
    politeness: Duration,
    base: Duration,
    flood_margin: Duration,
}

impl Default for Backoff {
    /// 3 attempts, 1.5s politeness pause, 2s base backoff and 5s flood wait margin.
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for Backoff {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            politeness: Duration::from_secs_f64(config.politeness_secs.max(0.0)),
            base: Duration::from_secs_f64(config.base_secs.max(0.0)),
            flood_margin: Duration::from_secs(config.flood_margin_secs),
        }
    }
}

impl Backoff {
    pub fn new(max_retries: u32, politeness: Duration, base: Duration, flood_margin: Duration) -> Self {
        Self {
            max_retries,
            politeness,
            base,
            flood_margin,
        }
    }

    /// No delays at all, with the same retry policy.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `op` until it succeeds, fails fatally or attempts are exhausted.
    ///
    /// `label` is only used for logging.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let attempts = self.max_retries.max(1);
        let mut flood_waited = false;

        for attempt in 1..=attempts {
            sleep(self.politeness).await;
            if !flood_waited {
                sleep(self.base * attempt).await;
            }
            flood_waited = false;

            debug!("{label}: attempt {attempt}/{attempts}");
            let err = match op().await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };

            let last = attempt == attempts;
            match err.failure_kind() {
                FailureKind::Fatal => return Err(err),
                FailureKind::Transient if last => return Err(err),
                FailureKind::Transient => {
                    warn!("{label}: attempt {attempt} failed ({err}), retrying");
                }
                FailureKind::RateLimited => {
                    warn!("{label}: rate limited on attempt {attempt}");
                }
                FailureKind::FloodWait(_) if last => return Err(err),
                FailureKind::FloodWait(secs) => {
                    let wait = Duration::from_secs(secs) + self.flood_margin;
                    warn!("{label}: flood wait, sleeping {}s", wait.as_secs());
                    sleep(wait).await;
                    flood_waited = true;
                }
            }
        }

        Err(Error::RateLimited(format!("{label}: {attempts} attempts")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Mutex,
    };

    use tokio::time::Instant;

    use super::*;

    /// Returns the provided results in order, then succeeds.
    struct Script {
        results: Mutex<Vec<Error>>,
        calls: AtomicU32,
    }

    impl Script {
        fn new(mut errors: Vec<Error>) -> Self {
            errors.reverse();
            Self {
                results: Mutex::new(errors),
                calls: AtomicU32::new(0),
            }
        }

        async fn call(&self) -> Result<&'static str, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.results.lock().unwrap().pop() {
                Some(e) => Err(e),
                None => Ok("ok"),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn transient() -> Error {
        Error::HttpStatus(503, "u".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn delays_before_every_attempt() {
        let script = Script::new(vec![transient(), transient()]);
        let start = Instant::now();
        let res = Backoff::default().run("test", || script.call()).await;
        assert_eq!(res.unwrap(), "ok");
        assert_eq!(script.calls(), 3);
        // 3 * 1.5s politeness + (2 + 4 + 6)s backoff
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(16_500) && elapsed < Duration::from_millis(16_600));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_exhausted() {
        let script = Script::new(vec![transient(), transient(), transient(), transient()]);
        let res = Backoff::default().run("test", || script.call()).await;
        assert!(matches!(res, Err(Error::HttpStatus(503, _))));
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_is_immediate() {
        let script = Script::new(vec![Error::HttpStatus(404, "u".to_string())]);
        let res = Backoff::default().run("test", || script.call()).await;
        assert!(matches!(res, Err(Error::HttpStatus(404, _))));
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_never_fatal() {
        let script = Script::new(vec![
            Error::HttpStatus(429, "u".to_string()),
            Error::HttpStatus(429, "u".to_string()),
            Error::HttpStatus(429, "u".to_string()),
        ]);
        let res = Backoff::default().run("test", || script.call()).await;
        assert!(matches!(res, Err(Error::RateLimited(_))));
        assert_eq!(script.calls(), 3);

        let script = Script::new(vec![Error::HttpStatus(429, "u".to_string())]);
        let res = Backoff::default().run("test", || script.call()).await;
        assert_eq!(res.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_replaces_backoff() {
        let script = Script::new(vec![Error::FloodWait(30)]);
        let start = Instant::now();
        let res = Backoff::default().run("test", || script.call()).await;
        assert_eq!(res.unwrap(), "ok");
        assert_eq!(script.calls(), 2);
        // attempt 1: 1.5 + 2, flood: 30 + 5, attempt 2: 1.5 only
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(40_000) && elapsed < Duration::from_millis(40_100));
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_on_last_attempt() {
        let script = Script::new(vec![Error::FloodWait(30)]);
        let res = Backoff::immediate(1).run("test", || script.call()).await;
        assert!(matches!(res, Err(Error::FloodWait(30))));
    }

    #[test]
    fn from_config() {
        let config: BackoffConfig = serde_yaml::from_str("max_retries: 5\nbase_secs: 0.5\n").unwrap();
        assert_eq!(config.politeness_secs, 1.5);
        let backoff = Backoff::from(&config);
        assert_eq!(backoff.max_retries(), 5);
        assert_eq!(backoff.base, Duration::from_millis(500));
    }
}
