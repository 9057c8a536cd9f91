use bytes::Bytes;
use core::time::Duration;

/// Outcome of an HTTP fetch.
///
/// A single attempt ends in [`Success`](Self::Success), [`RateLimited`](Self::RateLimited)
/// or [`Transient`](Self::Transient). A full fetch, after retries, ends in either
/// [`Success`](Self::Success) or [`Exhausted`](Self::Exhausted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Status 200 with the response body.
    Success(Bytes),

    /// Status 429. The hint comes from a `Retry-After` header, if the server sent one.
    RateLimited { retry_after_hint: Option<Duration> },

    /// Any other status code.
    Transient,

    /// Every attempt failed; the caller treats this as "no data available".
    Exhausted,
}

impl FetchResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the body if this is a success.
    #[must_use]
    pub fn into_body(self) -> Option<Bytes> {
        match self {
            Self::Success(body) => Some(body),
            _ => None,
        }
    }
}

/// Parse the `Retry-After` header value as seconds.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let s = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())?;
    s.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_into_body() {
        let result = FetchResult::Success(Bytes::from_static(b"[]"));
        assert!(result.is_success());
        assert_eq!(result.into_body(), Some(Bytes::from_static(b"[]")));

        assert_eq!(FetchResult::Exhausted.into_body(), None);
        assert_eq!(FetchResult::Transient.into_body(), None);
        assert!(!FetchResult::RateLimited { retry_after_hint: None }.is_success());
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_retry_after_missing_or_http_date() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }
}
