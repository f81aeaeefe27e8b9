use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors returned by the OpenAI HTTP client.
#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("OpenAI API key not set. Set OPENAI_API_KEY or configure openai.api_key")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Request rejected {status}: {body}")]
    Client { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

impl OpenAiError {
    /// Classify an unsuccessful HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited(body),
            500..=599 => Self::Server { status, body },
            _ => Self::Client { status, body },
        }
    }

    /// Whether a retry could plausibly succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited(_) | Self::Server { .. }
        )
    }
}

impl From<OpenAiError> for DomainError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::MissingApiKey | OpenAiError::ClientBuild(_) => {
                DomainError::Configuration(err.to_string())
            }
            OpenAiError::Decode(_) => DomainError::SerializationError(err.to_string()),
            _ => DomainError::ExecutionFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(OpenAiError::from_status(429, String::new()).is_transient());
        assert!(OpenAiError::from_status(503, String::new()).is_transient());
        assert!(!OpenAiError::from_status(401, String::new()).is_transient());
        assert!(!OpenAiError::from_status(400, String::new()).is_transient());
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err: DomainError = OpenAiError::MissingApiKey.into();
        assert!(matches!(err, DomainError::Configuration(_)));
    }
}
