use thiserror::Error;

/// Failures talking to the upstream completion provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Failures of a single relay request.
///
/// The `Display` text is what gets sent to the client; details stay in the
/// error source and the logs.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Unparseable bodies get the same generic answer as upstream failures
    #[error("Failed to get response from AI")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Messages array is required")]
    MissingMessages,

    #[error("Failed to get response from AI")]
    Provider(#[source] ProviderError),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingMessages => 400,
            RelayError::InvalidJson(_) | RelayError::Provider(_) => 500,
        }
    }
}
