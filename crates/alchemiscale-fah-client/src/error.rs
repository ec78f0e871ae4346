//! Error types for the FAH adaptive sampling client

/// Errors that can occur while talking to a FAH assignment or work server
#[derive(Debug, thiserror::Error)]
pub enum FahError {
    #[error("Request failed with {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("key error: {0}")]
    Key(#[from] rcgen::Error),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("server path {0:?} is not a relative path below the destination")]
    UnsafePath(String),

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FahError {
    /// HTTP status code of a rejected request, if this error is one
    pub fn status(&self) -> Option<u16> {
        match self {
            FahError::RequestFailed { status, .. } => Some(*status),
            FahError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FahError>;
