//! Error types for Stock Sage

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, SageError>;

/// Failures of a single analysis request.
///
/// Every variant is terminal for the request that produced it; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Missing API key: enter your Perplexity API key before selecting a stock")]
    MissingCredential,

    #[error("API Error: {status} - {body}")]
    HttpError { status: u16, body: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Single display string shown in the result panel
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::NetworkError { message } => format!(
                "Could not reach the analysis service ({}). \
                 This is usually a network, proxy or CORS problem; check your connection and try again.",
                message
            ),
            other => other.to_string(),
        }
    }

    /// Short machine-readable name, used by the HTTP surface
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MissingCredential => "missing_credential",
            AnalysisError::HttpError { .. } => "http_error",
            AnalysisError::NetworkError { .. } => "network_error",
            AnalysisError::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[derive(Error, Debug)]
pub enum SageError {

    // =============================
    // Domain Errors
    // =============================

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Unknown stock symbol: {0}")]
    UnknownSymbol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_mentions_status() {
        let err = AnalysisError::HttpError {
            status: 401,
            body: "invalid api key".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid api key"));
        assert_eq!(err.kind(), "http_error");
    }

    #[test]
    fn test_network_error_is_explained() {
        let err = AnalysisError::NetworkError {
            message: "connection refused".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("CORS"));
    }

    #[test]
    fn test_analysis_error_converts_into_sage_error() {
        let err: SageError = AnalysisError::MissingCredential.into();
        assert!(matches!(err, SageError::Analysis(AnalysisError::MissingCredential)));
        assert!(err.to_string().contains("Missing API key"));
    }
}
