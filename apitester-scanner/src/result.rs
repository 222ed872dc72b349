use crate::candidate::{ApiType, Candidate, HttpMethod};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub method: HttpMethod,
    pub api_type: ApiType,
    pub success: bool,
    pub status_code: u16,
    pub response_summary: String,
    pub size: usize,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn new(candidate: &Candidate) -> Self {
        Self {
            url: candidate.url.clone(),
            method: candidate.method,
            api_type: candidate.api_type,
            success: false,
            status_code: 0,
            response_summary: String::new(),
            size: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            error: None,
        }
    }

    pub fn with_error(candidate: &Candidate, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(candidate)
        }
    }
}
