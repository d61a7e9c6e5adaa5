//! Error types for the management SRE authenticator.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while configuring or running an authenticator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Credentials are missing, incomplete, or could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The token endpoint could not be reached or returned a non-2xx status.
    #[error("Token fetch failed: {message}")]
    TokenFetch {
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Status line or transport error description.
        message: String,
    },

    /// A 2xx response body did not decode as a token response.
    #[error("Token decode failed: {0}")]
    TokenDecode(String),

    /// No credential header could be produced for the request.
    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl AuthError {
    /// HTTP status carried by a [`AuthError::TokenFetch`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::TokenFetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_on_fetch_errors() {
        let err = AuthError::TokenFetch {
            status: Some(503),
            message: "auth request failed with status: 503 Service Unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.clone().status(), Some(503));
        assert_eq!(AuthError::TokenDecode("bad".to_string()).status(), None);
    }

    #[test]
    fn test_is_configuration() {
        assert!(AuthError::Configuration("missing".to_string()).is_configuration());
        assert!(!AuthError::Authentication("no token".to_string()).is_configuration());
    }
}
