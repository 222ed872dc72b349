//! Keyword heuristics that turn a URL into a [`Candidate`].
//!
//! Every rule table below is evaluated top-down and the first hit wins, so
//! the order of the entries is part of the behaviour. A URL mentioning both
//! `sms` and `login` is an SMS endpoint because the SMS row comes first.

use crate::candidate::{
    ApiType, Candidate, HttpMethod, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM,
};
use crate::error::{Result, ScanError};
use std::collections::BTreeMap;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const METHOD_RULES: &[(&[&str], HttpMethod)] = &[
    (&["login", "signin", "submit", "post", "send"], HttpMethod::Post),
    (&["get", "fetch", "load", "data", "list"], HttpMethod::Get),
    (&["update", "put", "modify"], HttpMethod::Put),
    (&["delete", "remove"], HttpMethod::Delete),
    (&["api", "rest"], HttpMethod::Get),
];

const TYPE_RULES: &[(&[&str], ApiType)] = &[
    (&["sms", "otp", "message", "text"], ApiType::Sms),
    (&["login", "auth", "signin", "authenticate"], ApiType::Auth),
    (&["data", "fetch", "get", "list"], ApiType::Data),
    (&["api", "rest"], ApiType::Api),
    (&["graphql"], ApiType::Graphql),
    (&["ajax"], ApiType::Ajax),
    (&["file", "upload", "download"], ApiType::File),
];

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["sms", "otp", "message", "data_sms", "api", "data"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["login", "auth", "fetch", "get", "ajax"];

const JSON_API_KEYWORDS: &[&str] = &["api", "rest", "graphql"];

/// Default request headers attached to every candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProfile {
    pub user_agent: String,
}

impl HeaderProfile {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn base_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers.insert(
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.5".to_string());
        headers.insert(
            "Accept-Encoding".to_string(),
            "gzip, deflate, br".to_string(),
        );
        headers.insert("Connection".to_string(), "keep-alive".to_string());
        headers
    }
}

impl Default for HeaderProfile {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn guess_method(url: &str) -> HttpMethod {
    let url_lower = url.to_lowercase();
    METHOD_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&url_lower, keywords))
        .map(|(_, method)| *method)
        .unwrap_or(HttpMethod::Get)
}

pub fn classify_type(url: &str) -> ApiType {
    let url_lower = url.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&url_lower, keywords))
        .map(|(_, api_type)| *api_type)
        .unwrap_or(ApiType::Unknown)
}

/// The medium check runs after the high one and overwrites it, so
/// `/api/login` ends up at 2 rather than 3.
pub fn calculate_priority(url: &str) -> u8 {
    let url_lower = url.to_lowercase();
    let mut priority = PRIORITY_LOW;

    if contains_any(&url_lower, HIGH_PRIORITY_KEYWORDS) {
        priority = PRIORITY_HIGH;
    }

    if contains_any(&url_lower, MEDIUM_PRIORITY_KEYWORDS) {
        priority = PRIORITY_MEDIUM;
    }

    priority
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    profile: HeaderProfile,
}

impl Classifier {
    pub fn new(profile: HeaderProfile) -> Self {
        Self { profile }
    }

    pub fn headers_for(&self, url: &str) -> BTreeMap<String, String> {
        let mut headers = self.profile.base_headers();
        let url_lower = url.to_lowercase();

        if contains_any(&url_lower, JSON_API_KEYWORDS) {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
            headers.insert("X-Requested-With".to_string(), "XMLHttpRequest".to_string());
        } else if url_lower.contains("ajax") {
            headers.insert("X-Requested-With".to_string(), "XMLHttpRequest".to_string());
        }

        headers
    }

    pub fn classify(&self, url: &str) -> Result<Candidate> {
        let parsed = Url::parse(url)?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScanError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                parsed.scheme(),
                url
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ScanError::InvalidUrl(format!("missing host in {}", url)))?;
        let domain = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Candidate {
            url: url.to_string(),
            domain,
            path: parsed.path().to_string(),
            query: parsed.query().unwrap_or_default().to_string(),
            method: guess_method(url),
            api_type: classify_type(url),
            priority: calculate_priority(url),
            headers: self.headers_for(url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sms_wins_over_api_keywords() {
        let candidate = Classifier::default()
            .classify("https://api.example.com/v1/sms")
            .unwrap();
        assert_eq!(candidate.api_type, ApiType::Sms);
        assert_eq!(candidate.priority, 3);
    }

    #[test]
    fn test_sms_wins_over_login() {
        assert_eq!(classify_type("https://example.com/sms/login"), ApiType::Sms);
    }

    #[test]
    fn test_login_is_post_auth() {
        let candidate = Classifier::default()
            .classify("https://example.com/login")
            .unwrap();
        assert_eq!(candidate.method, HttpMethod::Post);
        assert_eq!(candidate.api_type, ApiType::Auth);
        assert_eq!(candidate.priority, 2);
    }

    #[test]
    fn test_method_rules_in_order() {
        assert_eq!(guess_method("https://api.example.com/login"), HttpMethod::Post);
        assert_eq!(guess_method("https://api.example.com/users"), HttpMethod::Get);
        assert_eq!(guess_method("https://example.com/update"), HttpMethod::Put);
        assert_eq!(guess_method("https://example.com/delete"), HttpMethod::Delete);
        assert_eq!(guess_method("https://example.com/rest/items"), HttpMethod::Get);
        assert_eq!(guess_method("https://example.com/page"), HttpMethod::Get);
        // "post" before "delete"
        assert_eq!(guess_method("https://example.com/post/delete"), HttpMethod::Post);
    }

    #[test]
    fn test_type_rules_in_order() {
        assert_eq!(classify_type("https://example.com/graphql"), ApiType::Graphql);
        assert_eq!(classify_type("https://example.com/ajax/items"), ApiType::Ajax);
        assert_eq!(classify_type("https://example.com/upload"), ApiType::File);
        assert_eq!(classify_type("https://example.com/rest/users"), ApiType::Api);
        assert_eq!(classify_type("https://example.com/page.php"), ApiType::Unknown);
        // data is checked before api
        assert_eq!(classify_type("https://example.com/api/data"), ApiType::Data);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(classify_type("https://EXAMPLE.com/SendOTP"), ApiType::Sms);
        assert_eq!(guess_method("https://example.com/SignIn"), HttpMethod::Post);
    }

    #[test]
    fn test_priority_high() {
        assert_eq!(calculate_priority("https://api.example.com/v1/sms"), 3);
        assert_eq!(calculate_priority("https://example.com/data_sms"), 3);
        assert_eq!(calculate_priority("https://example.com/api/messages"), 3);
    }

    #[test]
    fn test_priority_low() {
        assert_eq!(calculate_priority("https://example.com/page.php"), 1);
    }

    // Medium keywords are checked last and downgrade an earlier 3.
    #[test]
    fn test_priority_medium_overrides_high() {
        assert_eq!(calculate_priority("https://example.com/api/login"), 2);
        assert_eq!(calculate_priority("https://example.com/data/get"), 2);
        assert_eq!(calculate_priority("https://example.com/ajax/list"), 2);
    }

    #[test]
    fn test_headers_for_api_url() {
        let headers = Classifier::default().headers_for("https://example.com/graphql");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(headers.get("X-Requested-With").unwrap(), "XMLHttpRequest");
        assert_eq!(headers.get("User-Agent").unwrap(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_headers_for_ajax_url() {
        let headers = Classifier::default().headers_for("https://example.com/ajax/items");
        assert!(headers.get("Content-Type").is_none());
        assert_eq!(headers.get("X-Requested-With").unwrap(), "XMLHttpRequest");
    }

    #[test]
    fn test_headers_plain_url() {
        let headers = Classifier::default().headers_for("https://example.com/page.php");
        assert_eq!(headers.len(), 5);
        assert!(headers.get("X-Requested-With").is_none());
    }

    #[test]
    fn test_custom_user_agent() {
        let classifier = Classifier::new(HeaderProfile::new("apitester-test/1.0"));
        let candidate = classifier.classify("https://example.com/a.json").unwrap();
        assert_eq!(candidate.headers.get("User-Agent").unwrap(), "apitester-test/1.0");
    }

    #[test]
    fn test_url_components() {
        let candidate = Classifier::default()
            .classify("http://localhost:8000/api/items?page=2&limit=10")
            .unwrap();
        assert_eq!(candidate.domain, "localhost:8000");
        assert_eq!(candidate.path, "/api/items");
        assert_eq!(candidate.query, "page=2&limit=10");
    }

    #[test]
    fn test_malformed_url_is_error() {
        let classifier = Classifier::default();
        assert!(classifier.classify("not a url").is_err());
        assert!(classifier.classify("ftp://example.com/file").is_err());
        assert!(classifier.classify("http://[::1/api").is_err());
    }
}
