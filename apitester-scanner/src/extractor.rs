//! Pulls endpoint candidates out of a pasted DevTools blob.
//!
//! Four passes feed one list of raw URLs: the shape patterns, URL strings
//! inside embedded JSON, quoted `curl` targets, and HTTP request lines. The
//! raw list is filtered, classified, deduplicated and ranked. Nothing here
//! touches the network.

use crate::candidate::Candidate;
use crate::classifier::Classifier;
use crate::error::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

const API_PATTERNS: &[&str] = &[
    r#"(?i)https?://[^\s"']+\.php(?:\?[^\s"']*)?"#,
    r#"(?i)https?://[^\s"']+\.json(?:\?[^\s"']*)?"#,
    r#"(?i)https?://[^\s"']+\.xml(?:\?[^\s"']*)?"#,
    r#"(?i)https?://[^\s"']+/api/[^\s"']+"#,
    r#"(?i)https?://[^\s"']+/rest/[^\s"']+"#,
    r#"(?i)https?://[^\s"']+/graphql"#,
    r#"(?i)https?://[^\s"']+/ajax/[^\s"']+"#,
    r#"(?i)https?://[^\s"']+/data/[^\s"']+"#,
];

const JSON_PATTERNS: &[&str] = &[
    r#"\{[^{}]*"[^"]*"\s*:\s*"[^"]*"[^{}]*\}"#,
    r#"\[[^\[\]]*\{[^{}]*\}[^\[\]]*\]"#,
];

const CURL_PATTERN: &str = r"(?i)curl\s+[^']*'([^']+)'";

const REQUEST_LINE_PATTERN: &str =
    r#"(?m)^\s*(?:GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s+(https?://[^\s"'<>]+)"#;

const EXCLUDED_PATTERNS: &[&str] = &[
    r"(?i)\.css$",
    r"(?i)\.js$",
    r"(?i)\.png$",
    r"(?i)\.jpg$",
    r"(?i)\.gif$",
    r"(?i)\.ico$",
    r"(?i)\.svg$",
    r"(?i)fonts\.",
    r"(?i)googleapis\.com",
    r"(?i)gstatic\.com",
    r"(?i)jquery",
    r"(?i)bootstrap",
];

pub struct Extractor {
    api_patterns: Vec<Regex>,
    json_patterns: Vec<Regex>,
    curl_pattern: Regex,
    request_line_pattern: Regex,
    excluded: Vec<Regex>,
    blacklist: Vec<String>,
    classifier: Classifier,
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(Into::into))
        .collect()
}

impl Extractor {
    pub fn new(classifier: Classifier) -> Result<Self> {
        Ok(Self {
            api_patterns: compile_all(API_PATTERNS)?,
            json_patterns: compile_all(JSON_PATTERNS)?,
            curl_pattern: Regex::new(CURL_PATTERN)?,
            request_line_pattern: Regex::new(REQUEST_LINE_PATTERN)?,
            excluded: compile_all(EXCLUDED_PATTERNS)?,
            blacklist: Vec::new(),
            classifier,
        })
    }

    pub fn with_blacklist(mut self, blacklist: Vec<String>) -> Self {
        self.blacklist = blacklist
            .into_iter()
            .filter(|entry| !entry.is_empty())
            .collect();
        self
    }

    pub fn extract(&self, text: &str) -> Vec<Candidate> {
        info!("Extracting API candidates from {} bytes of input", text.len());

        let mut raw_urls: Vec<String> = Vec::new();

        for pattern in &self.api_patterns {
            raw_urls.extend(pattern.find_iter(text).map(|m| m.as_str().to_string()));
        }
        raw_urls.extend(self.urls_from_json(text));
        raw_urls.extend(self.urls_from_curl(text));
        raw_urls.extend(self.urls_from_request_lines(text));

        debug!("{} raw URL matches before filtering", raw_urls.len());

        let candidates = raw_urls
            .iter()
            .filter(|url| self.is_valid_api_url(url))
            .filter_map(|url| match self.classifier.classify(url) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!("Dropping {}: {}", url, e);
                    None
                }
            })
            .collect();

        let unique = dedup_and_rank(candidates);
        info!("Extracted {} unique API candidates", unique.len());
        unique
    }

    /// Static assets, CDN hosts and blacklisted domains are rejected
    pub fn is_valid_api_url(&self, url: &str) -> bool {
        if self.excluded.iter().any(|pattern| pattern.is_match(url)) {
            return false;
        }

        !self.blacklist.iter().any(|domain| url.contains(domain.as_str()))
    }

    fn urls_from_json(&self, text: &str) -> Vec<String> {
        let mut urls = Vec::new();

        for pattern in &self.json_patterns {
            for fragment in pattern.find_iter(text) {
                match serde_json::from_str::<Value>(fragment.as_str()) {
                    Ok(value) => collect_json_urls(&value, &mut urls),
                    Err(e) => debug!("Skipping malformed JSON fragment: {}", e),
                }
            }
        }

        urls
    }

    fn urls_from_curl(&self, text: &str) -> Vec<String> {
        self.curl_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn urls_from_request_lines(&self, text: &str) -> Vec<String> {
        self.request_line_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

fn collect_json_urls(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_json_urls(v, urls);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_urls(item, urls);
            }
        }
        Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => {
            urls.push(s.clone());
        }
        _ => {}
    }
}

/// First occurrence of a URL wins; the sort is stable so equal priorities
/// keep their discovery order.
pub fn dedup_and_rank(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.url.clone()))
        .collect();

    unique.sort_by(|a, b| b.priority.cmp(&a.priority));
    unique
}
