//! Response normalization.
//!
//! Every HTTP exchange is reduced to a [`RawResponse`] and then classified
//! here, so the rules can be tested without a server:
//!
//! 1. 401 → [`ApiError::Unauthorized`]
//! 2. 429 → [`ApiError::Throttled`] with the parsed `Retry-After` hint
//! 3. 502 / 503 / 504 → [`ApiError::Unavailable`]
//! 4. any other non-2xx → [`ApiError::Http`]
//! 5. 2xx without `response.status == "success"` → [`ApiError::Rejected`]
//! 6. otherwise the `result` object is handed back

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Transport-level view of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<EnvelopeStatus>,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct EnvelopeStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: String,
}

/// Classify a response and unwrap its `result` payload.
pub fn normalize(raw: RawResponse, now: DateTime<Utc>) -> Result<Value, ApiError> {
    let status = raw.status;
    if !(200..300).contains(&status) {
        let message = error_message(&raw.body, status);
        return Err(match status {
            401 => ApiError::Unauthorized { message },
            429 => ApiError::Throttled {
                retry_after: raw
                    .retry_after
                    .as_deref()
                    .and_then(|v| parse_retry_after(v, now)),
                message,
            },
            502..=504 => ApiError::Unavailable { status, message },
            _ => ApiError::Http { status, message },
        });
    }

    let envelope: Envelope = serde_json::from_str(&raw.body)
        .map_err(|e| ApiError::Decode(format!("HTTP {status}: {e}")))?;
    let Some(marker) = envelope.response else {
        return Err(ApiError::Rejected {
            status,
            code: String::new(),
            message: "response carries no status marker".to_string(),
        });
    };
    if marker.status != "success" {
        let message = if marker.message.is_empty() {
            format!("status '{}'", marker.status)
        } else {
            marker.message
        };
        return Err(ApiError::Rejected {
            status,
            code: code_string(&marker.code),
            message,
        });
    }
    Ok(envelope.result)
}

/// Parse a `Retry-After` header: delta-seconds or an HTTP date.
///
/// Dates in the past collapse to zero; garbage yields `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

/// Prefer the envelope's message; fall back to the raw body, then the status.
fn error_message(body: &str, status: u16) -> String {
    if let Ok(Envelope {
        response: Some(marker),
        ..
    }) = serde_json::from_str::<Envelope>(body)
    {
        if !marker.message.is_empty() {
            return marker.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("request failed with status {status}")
    } else {
        trimmed.chars().take(200).collect()
    }
}

fn code_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            retry_after: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn success_envelope_yields_result() {
        let body = r#"{"response":{"status":"success","code":"200","message":"OK"},
                       "result":{"terms":{"parsed":2,"added":2}}}"#;
        let value = normalize(raw(200, body), now()).unwrap();
        assert_eq!(value, json!({"terms": {"parsed": 2, "added": 2}}));
    }

    #[test]
    fn failed_marker_on_http_200_is_rejected_with_server_message() {
        let body = r#"{"response":{"status":"fail","code":"4011","message":"Invalid API Token"}}"#;
        let err = normalize(raw(200, body), now()).unwrap_err();
        match err {
            ApiError::Rejected {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 200);
                assert_eq!(code, "4011");
                assert_eq!(message, "Invalid API Token");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn missing_marker_is_rejected() {
        let err = normalize(raw(200, r#"{"result":{}}"#), now()).unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[test]
    fn non_json_success_body_is_a_decode_error() {
        let err = normalize(raw(200, "<html>proxy</html>"), now()).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn unauthorized_is_credential_error() {
        let body = r#"{"response":{"status":"fail","code":"4011","message":"Invalid API Token"}}"#;
        let err = normalize(raw(401, body), now()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { ref message } if message == "Invalid API Token"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn throttled_carries_retry_after_seconds() {
        let response = RawResponse {
            status: 429,
            retry_after: Some("30".into()),
            body: String::new(),
        };
        let err = normalize(response, now()).unwrap_err();
        assert_eq!(err.retry_hint(), Some(Duration::from_secs(30)));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn throttled_without_header_has_no_hint() {
        let err = normalize(raw(429, "Too Many Requests"), now()).unwrap_err();
        assert!(matches!(err, ApiError::Throttled { retry_after: None, .. }));
    }

    #[rstest]
    #[case(502)]
    #[case(503)]
    #[case(504)]
    fn gateway_and_unavailable_statuses_are_transient(#[case] status: u16) {
        let err = normalize(raw(status, ""), now()).unwrap_err();
        assert!(matches!(err, ApiError::Unavailable { status: s, .. } if s == status));
        assert!(err.is_retryable());
    }

    #[rstest]
    #[case(400)]
    #[case(404)]
    #[case(500)]
    fn other_failures_keep_their_status(#[case] status: u16) {
        let err = normalize(raw(status, "nope"), now()).unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("nope"));
    }

    #[rstest]
    #[case("0", Some(Duration::ZERO))]
    #[case(" 12 ", Some(Duration::from_secs(12)))]
    #[case("Fri, 01 Mar 2024 12:00:45 GMT", Some(Duration::from_secs(45)))]
    #[case("Fri, 01 Mar 2024 11:00:00 GMT", Some(Duration::ZERO))]
    #[case("soon", None)]
    fn retry_after_parsing(#[case] header: &str, #[case] expected: Option<Duration>) {
        assert_eq!(parse_retry_after(header, now()), expected);
    }
}
