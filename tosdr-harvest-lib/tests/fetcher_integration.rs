//! Integration tests for the rate-limited fetcher against a mock server

use core::time::Duration;
use std::sync::{Arc, Mutex};
use tick::{Clock, ClockControl};
use tosdr_harvest_lib::crawl::{FetchPolicy, FetchResult, RateLimitedFetcher};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Clock that jumps straight to each pending timer, so backoffs cost no real time.
fn instant_clock() -> Clock {
    ClockControl::new().auto_advance_timers(true).to_clock()
}

/// Policy without jitter. An auto-advancing clock would fire any finite timeout immediately.
fn quiet_policy() -> FetchPolicy {
    FetchPolicy {
        jitter_min: Duration::ZERO,
        jitter_max: Duration::ZERO,
        timeout: Duration::MAX,
        ..FetchPolicy::default()
    }
}

/// Mount a responder that replies with `statuses` in order (200 afterwards) and
/// records when each request arrived, measured on `clock`.
async fn mount_script(server: &MockServer, clock: &Clock, statuses: Vec<u16>) -> Arc<Mutex<Vec<Duration>>> {
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&arrivals);
    let clock = clock.clone();
    let start = clock.instant();

    Mock::given(method("GET"))
        .respond_with(move |_: &Request| {
            let mut arrivals = recorded.lock().unwrap();
            let status = statuses.get(arrivals.len()).copied().unwrap_or(200);
            arrivals.push(clock.instant().duration_since(start));
            ResponseTemplate::new(status).set_body_string("done")
        })
        .mount(server)
        .await;

    arrivals
}

fn gaps(arrivals: &[Duration]) -> Vec<Duration> {
    arrivals.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_success_on_first_attempt() {
    let server = MockServer::start().await;
    let clock = instant_clock();
    let arrivals = mount_script(&server, &clock, vec![200]).await;

    let fetcher = RateLimitedFetcher::with_clock(quiet_policy(), clock.clone()).unwrap();
    let stopwatch = clock.stopwatch();
    let result = fetcher.fetch(&format!("{}/ok", server.uri())).await;

    assert_eq!(result.into_body().as_deref(), Some(&b"done"[..]));
    assert_eq!(arrivals.lock().unwrap().len(), 1);
    assert_eq!(stopwatch.elapsed(), Duration::ZERO);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_rate_limited_twice_then_success() {
    let server = MockServer::start().await;
    let clock = instant_clock();
    let arrivals = mount_script(&server, &clock, vec![429, 429, 200]).await;

    let fetcher = RateLimitedFetcher::with_clock(quiet_policy(), clock).unwrap();
    let result = fetcher.fetch(&format!("{}/busy", server.uri())).await;

    assert!(result.is_success());

    let backoffs = gaps(&arrivals.lock().unwrap());
    assert_eq!(backoffs, vec![Duration::from_secs(5), Duration::from_secs(10)]);
    assert!(backoffs[1] >= backoffs[0]);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_rate_limited_until_exhausted() {
    let server = MockServer::start().await;
    let clock = instant_clock();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = RateLimitedFetcher::with_clock(quiet_policy(), clock.clone()).unwrap();
    let stopwatch = clock.stopwatch();
    let result = fetcher.fetch(&format!("{}/never", server.uri())).await;

    assert_eq!(result, FetchResult::Exhausted);

    // 5s after the first refusal, 10s after the second, and no pause after the last
    assert_eq!(stopwatch.elapsed(), Duration::from_secs(15));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_server_errors_retry_without_backoff() {
    let server = MockServer::start().await;
    let clock = instant_clock();
    let arrivals = mount_script(&server, &clock, vec![500, 500, 500]).await;

    let fetcher = RateLimitedFetcher::with_clock(quiet_policy(), clock).unwrap();
    let result = fetcher.fetch(&format!("{}/broken", server.uri())).await;

    assert_eq!(result, FetchResult::Exhausted);
    assert_eq!(*arrivals.lock().unwrap(), vec![Duration::ZERO; 3]);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_transport_failure_uses_flat_backoff() {
    // Grab a free port, then release it so connections are refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/gone", listener.local_addr().unwrap());
    drop(listener);

    let clock = instant_clock();
    let policy = FetchPolicy {
        max_retries: 3,
        ..quiet_policy()
    };
    let fetcher = RateLimitedFetcher::with_clock(policy, clock.clone()).unwrap();
    let stopwatch = clock.stopwatch();
    let result = fetcher.fetch(&url).await;

    assert_eq!(result, FetchResult::Exhausted);
    assert_eq!(stopwatch.elapsed(), Duration::from_secs(2));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_jitter_stays_within_bounds() {
    let server = MockServer::start().await;
    let clock = instant_clock();
    let arrivals = mount_script(&server, &clock, vec![503; 10]).await;

    let policy = FetchPolicy {
        max_retries: 10,
        jitter_min: Duration::from_millis(100),
        jitter_max: Duration::from_millis(300),
        ..quiet_policy()
    };
    let fetcher = RateLimitedFetcher::with_clock(policy, clock).unwrap();
    let _ = fetcher.fetch(&format!("{}/slow", server.uri())).await;

    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 10);

    // Every attempt, the first included, waits one jitter delay before sending
    let mut waits = vec![arrivals[0]];
    waits.extend(gaps(&arrivals));
    assert!(
        waits
            .iter()
            .all(|d| *d >= Duration::from_millis(100) && *d <= Duration::from_millis(300))
    );
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_user_agent_comes_from_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "tosdr-harvest-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let policy = FetchPolicy {
        user_agents: vec!["tosdr-harvest-test/1.0".to_string()],
        ..quiet_policy()
    };
    let fetcher = RateLimitedFetcher::with_clock(policy, instant_clock()).unwrap();

    assert!(fetcher.fetch(&format!("{}/ua", server.uri())).await.is_success());
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let policy = FetchPolicy {
        max_retries: 1,
        timeout: Duration::from_millis(200),
        jitter_min: Duration::ZERO,
        jitter_max: Duration::ZERO,
        ..FetchPolicy::default()
    };
    let fetcher = RateLimitedFetcher::new(policy).unwrap();

    assert_eq!(fetcher.fetch(&format!("{}/stuck", server.uri())).await, FetchResult::Exhausted);
}
