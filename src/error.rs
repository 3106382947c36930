use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unexpected status code {status} for URL: {url}")]
    Status { url: String, status: u16 },

    #[error("Rate limit exceeded for URL: {url}")]
    RateLimitExceeded { url: String },

    #[error("Failed to read body of {url}: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decompress {url}: {source}")]
    Decompression {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed index record ({reason}): {line:?}")]
    MalformedRecord { line: String, reason: String },

    #[error("Missing tag <{tag}> in document")]
    TagNotFound { tag: String },

    #[error("Tag <{tag}> is never closed")]
    UnterminatedTag { tag: String },

    #[error("Invalid year: must be 1993 or greater")]
    InvalidYear,

    #[error("Invalid month: must be between 1 and 12")]
    InvalidMonth,

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    XmlError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl EdgarError {
    /// Returns `true` when the remote archive answered with HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EdgarError::Status { status: 404, .. })
    }
}

#[cfg(feature = "form4")]
impl From<quick_xml::DeError> for EdgarError {
    fn from(error: quick_xml::DeError) -> Self {
        EdgarError::XmlError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EdgarError>;
