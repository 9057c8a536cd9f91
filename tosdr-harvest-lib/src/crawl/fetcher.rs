//! Rate-limit aware HTTP GET with jittered pacing and bounded retries.

use super::FetchResult;
use super::fetch_result::parse_retry_after;
use crate::Result;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::USER_AGENT;
use seatbelt::retry::Retry;
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use std::sync::Arc;
use tick::Clock;

const LOG_TARGET: &str = "   fetcher";

/// Rate-limit pauses longer than this are reported at warn level.
const NOISY_PAUSE_THRESHOLD: Duration = Duration::from_secs(10);

/// Browser identities rotated across requests.
pub const DEFAULT_USER_AGENTS: [&str; 2] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Retry, pacing and timeout settings for [`RateLimitedFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total number of attempts per URL.
    pub max_retries: u32,

    /// Unit of the escalating backoff applied after a 429 response.
    pub base_backoff: Duration,

    /// Flat backoff applied after a transport failure.
    pub transient_backoff: Duration,

    /// Hard per-request timeout.
    pub timeout: Duration,

    /// Lower bound of the pre-request jitter.
    pub jitter_min: Duration,

    /// Upper bound of the pre-request jitter.
    pub jitter_max: Duration,

    /// `User-Agent` values picked at random for each attempt.
    pub user_agents: Vec<String>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(5),
            transient_backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            jitter_min: Duration::from_millis(100),
            jitter_max: Duration::from_millis(300),
            user_agents: DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl FetchPolicy {
    /// Backoff applied after a 429 on the given zero-based attempt.
    #[must_use]
    pub const fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(attempt.saturating_add(1))
    }

    /// Draw a jitter delay uniformly from `jitter_min..=jitter_max`.
    #[must_use]
    pub fn jitter_delay(&self) -> Duration {
        let min = micros(self.jitter_min);
        let max = micros(self.jitter_max);
        if max <= min {
            return self.jitter_min;
        }

        Duration::from_micros(fastrand::u64(min..=max))
    }

    fn pick_user_agent(&self) -> Option<&str> {
        fastrand::choice(&self.user_agents).map(String::as_str)
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Issues GET requests, retrying transient failures and backing off on rate limits.
///
/// Cloning is cheap; clones share the underlying connection pool and clock.
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher {
    client: reqwest::Client,
    policy: Arc<FetchPolicy>,
    clock: Clock,
}

impl RateLimitedFetcher {
    /// Create a fetcher that waits on the tokio timer. Must be called within a tokio runtime.
    pub fn new(policy: FetchPolicy) -> Result<Self> {
        Self::with_clock(policy, Clock::new_tokio())
    }

    /// Create a fetcher whose jitter, backoff and timeout all run on `clock`.
    pub fn with_clock(policy: FetchPolicy, clock: Clock) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .into_app_err("unable to create HTTP client")?;

        Ok(Self {
            client,
            policy: Arc::new(policy),
            clock,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch `url`, returning either [`FetchResult::Success`] or [`FetchResult::Exhausted`].
    ///
    /// Never fails hard: a URL that cannot be retrieved simply yields no data.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let context = ResilienceContext::new(&self.clock).name("tosdr_get");
        let recovery_policy = Arc::clone(&self.policy);
        let attempt_policy = Arc::clone(&self.policy);
        let client = self.client.clone();
        let clock = self.clock.clone();
        let retry_url = url.to_string();

        let service = (
            Retry::layer("retry", &context)
                .clone_input()
                .recovery_with(move |outcome: &Result<FetchResult>, args| recovery_for(&recovery_policy, outcome, args.attempt().index()))
                .max_retry_attempts(self.policy.max_retries.saturating_sub(1))
                .on_retry(move |outcome, args| log_retry(&retry_url, outcome, args.attempt().index(), args.retry_delay())),
            Timeout::layer("timeout", &context)
                .timeout_error(|args| app_err!("request timed out after {}ms", args.timeout().as_millis()))
                .timeout(self.policy.timeout),
            Execute::new(move |url: String| {
                let client = client.clone();
                let clock = clock.clone();
                let policy = Arc::clone(&attempt_policy);
                async move {
                    clock.delay(policy.jitter_delay()).await;
                    attempt(&client, &policy, &url).await
                }
            }),
        )
            .into_service();

        match service.execute(url.to_string()).await {
            Ok(FetchResult::Success(body)) => FetchResult::Success(body),
            Ok(_) => {
                log::debug!(target: LOG_TARGET, "Giving up on '{url}' after {} attempt(s)", self.policy.max_retries);
                FetchResult::Exhausted
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Giving up on '{url}' after {} attempt(s): {e}", self.policy.max_retries);
                FetchResult::Exhausted
            }
        }
    }
}

/// Issue one GET and classify the outcome. `Err` means the transport failed.
async fn attempt(client: &reqwest::Client, policy: &FetchPolicy, url: &str) -> Result<FetchResult> {
    let mut request = client.get(url);
    if let Some(user_agent) = policy.pick_user_agent() {
        request = request.header(USER_AGENT, user_agent);
    }

    let response = request.send().await?;
    match response.status() {
        StatusCode::OK => Ok(FetchResult::Success(response.bytes().await?)),
        StatusCode::TOO_MANY_REQUESTS => Ok(FetchResult::RateLimited {
            retry_after_hint: parse_retry_after(response.headers()),
        }),
        _ => Ok(FetchResult::Transient),
    }
}

/// Pick the pause before the next attempt from the outcome of attempt `index`.
fn recovery_for(policy: &FetchPolicy, outcome: &Result<FetchResult>, index: u32) -> RecoveryInfo {
    match outcome {
        Ok(FetchResult::Success(_)) => RecoveryInfo::never(),
        Ok(FetchResult::RateLimited { .. }) => RecoveryInfo::retry().delay(policy.rate_limit_backoff(index)),
        Ok(FetchResult::Transient | FetchResult::Exhausted) => RecoveryInfo::retry().delay(Duration::ZERO),
        Err(_) => RecoveryInfo::retry().delay(policy.transient_backoff),
    }
}

fn log_retry(url: &str, outcome: &Result<FetchResult>, index: u32, delay: Duration) {
    let attempt = index + 1;
    match outcome {
        Ok(FetchResult::RateLimited { retry_after_hint }) => {
            if delay > NOISY_PAUSE_THRESHOLD {
                log::warn!(target: LOG_TARGET, "Rate limited by remote, pausing {}s", delay.as_secs());
            } else {
                log::debug!(
                    target: LOG_TARGET,
                    "Rate limited on '{url}' (attempt {attempt}, retry-after hint {retry_after_hint:?}), pausing {}ms",
                    delay.as_millis()
                );
            }
        }
        Ok(_) => log::debug!(target: LOG_TARGET, "Unexpected status for '{url}' (attempt {attempt})"),
        Err(e) => log::debug!(
            target: LOG_TARGET,
            "Transport failure for '{url}' (attempt {attempt}): {e}, pausing {}ms",
            delay.as_millis()
        ),
    }
}
