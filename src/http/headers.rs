use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Reads the `Retry-After` header, either delay-seconds or an HTTP-date.
///
/// Returns `None` when the header is missing, unparsable, or names a date
/// that already passed, so the caller falls back to its own backoff.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    parse_retry_after(value, Utc::now())
}

fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    (at - now).to_std().ok().filter(|wait| !wait.is_zero())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_retry_after_missing_or_invalid() {
        assert_eq!(retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("-1"));
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 5, 15, 15, 34, 0).unwrap();

        assert_eq!(
            parse_retry_after("Fri, 15 May 2015 15:34:21 GMT", now),
            Some(Duration::from_secs(21))
        );
        // already in the past
        assert_eq!(parse_retry_after("Fri, 15 May 2015 15:33:00 GMT", now), None);
    }
}
