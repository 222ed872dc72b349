// Response interpretation for probes: success heuristics and display summaries

use serde_json::Value;

const SUCCESS_STATUS_CODES: &[u16] = &[200, 201, 202];

/// Substrings that mark a body as an error page. Legitimate payloads that
/// happen to contain them are reported as failures too.
const ERROR_INDICATORS: &[&str] = &[
    "error",
    "invalid",
    "unauthorized",
    "forbidden",
    "not found",
];

const HTML_SUMMARY_CHARS: usize = 500;
const TEXT_SUMMARY_CHARS: usize = 1000;
const FALLBACK_SUMMARY_CHARS: usize = 500;

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn is_successful_response(status_code: u16, content_type: &str, body: &str) -> bool {
    if !SUCCESS_STATUS_CODES.contains(&status_code) {
        return false;
    }

    let body_lower = body.to_lowercase();
    if ERROR_INDICATORS
        .iter()
        .any(|indicator| body_lower.contains(indicator))
    {
        return false;
    }

    if content_type.to_lowercase().starts_with("application/json")
        && let Ok(json) = serde_json::from_str::<Value>(body)
    {
        if !is_truthy(&json) {
            return false;
        }
        if let Some(error) = json.get("error")
            && is_truthy(error)
        {
            return false;
        }
    }

    true
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn summarize_response(content_type: &str, body: &[u8]) -> String {
    let content_type = content_type.to_lowercase();
    let text = String::from_utf8_lossy(body);

    if content_type.contains("application/json") {
        match serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
        {
            Some(pretty) => pretty,
            None => truncate_chars(&text, FALLBACK_SUMMARY_CHARS),
        }
    } else if content_type.contains("text/html") {
        truncate_chars(&text, HTML_SUMMARY_CHARS)
    } else if content_type.contains("text/plain") {
        truncate_chars(&text, TEXT_SUMMARY_CHARS)
    } else {
        format!("[{}] {} bytes", content_type, body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_on_clean_json() {
        assert!(is_successful_response(200, "application/json", r#"{"ok":true}"#));
        assert!(is_successful_response(201, "application/json; charset=utf-8", r#"[1]"#));
        assert!(is_successful_response(202, "text/plain", "queued"));
    }

    #[test]
    fn test_failure_on_status() {
        assert!(!is_successful_response(204, "text/plain", ""));
        assert!(!is_successful_response(301, "text/html", "moved"));
        assert!(!is_successful_response(401, "application/json", r#"{"ok":true}"#));
        assert!(!is_successful_response(500, "text/plain", "boom"));
    }

    #[test]
    fn test_failure_on_body_indicators() {
        assert!(!is_successful_response(200, "text/html", "<h1>Not Found</h1>"));
        assert!(!is_successful_response(200, "text/plain", "Invalid token"));
        assert!(!is_successful_response(200, "application/json", r#"{"msg":"Forbidden"}"#));
    }

    // Known false negative: payload text that merely mentions an indicator.
    #[test]
    fn test_indicator_inside_legit_payload_fails() {
        assert!(!is_successful_response(
            200,
            "application/json",
            r#"{"articles":["How to handle an error gracefully"]}"#
        ));
    }

    #[test]
    fn test_failure_on_empty_json() {
        assert!(!is_successful_response(200, "application/json", "{}"));
        assert!(!is_successful_response(200, "application/json", "[]"));
        assert!(!is_successful_response(200, "application/json", "null"));
        assert!(!is_successful_response(200, "application/json", "0"));
    }

    #[test]
    fn test_json_without_error_field_passes() {
        assert!(is_successful_response(200, "application/json", r#"{"status":"ok"}"#));
    }

    #[test]
    fn test_unparseable_json_body_is_not_fatal() {
        assert!(is_successful_response(200, "application/json", "ok: yes"));
    }

    #[test]
    fn test_summary_json_pretty() {
        let summary = summarize_response("application/json", br#"{"b":1,"a":[true]}"#);
        assert_eq!(summary, "{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}");
    }

    #[test]
    fn test_summary_html_truncated() {
        let body = "x".repeat(600);
        let summary = summarize_response("text/html; charset=utf-8", body.as_bytes());
        assert_eq!(summary.len(), 503);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summary_html_short_kept() {
        let summary = summarize_response("text/html", b"<p>hi</p>");
        assert_eq!(summary, "<p>hi</p>");
    }

    #[test]
    fn test_summary_plain_text_limit() {
        let exact = "y".repeat(1000);
        assert_eq!(summarize_response("text/plain", exact.as_bytes()), exact);

        let long = "y".repeat(1001);
        let summary = summarize_response("text/plain", long.as_bytes());
        assert_eq!(summary.chars().count(), 1003);
    }

    #[test]
    fn test_summary_counts_characters_not_bytes() {
        let body = "é".repeat(600);
        let summary = summarize_response("text/html", body.as_bytes());
        assert_eq!(summary.chars().count(), 503);
    }

    #[test]
    fn test_summary_binary() {
        let summary = summarize_response("image/png", &[0u8; 42]);
        assert_eq!(summary, "[image/png] 42 bytes");
    }

    #[test]
    fn test_summary_missing_content_type() {
        assert_eq!(summarize_response("", b"abc"), "[] 3 bytes");
    }

    #[test]
    fn test_summary_invalid_json_falls_back_to_text() {
        let summary = summarize_response("application/json", b"not json");
        assert_eq!(summary, "not json");
    }
}
