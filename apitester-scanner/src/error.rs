use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<url::ParseError> for ScanError {
    fn from(e: url::ParseError) -> Self {
        ScanError::InvalidUrl(e.to_string())
    }
}

impl From<regex::Error> for ScanError {
    fn from(e: regex::Error) -> Self {
        ScanError::ParseError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
