//! Authentication error types

use thiserror::Error;
use wata_types::WataError;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Token errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token is invalid (malformed, wrong signature, wrong issuer or audience)
    #[error("Invalid token")]
    InvalidToken,

    /// Token could not be produced
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

impl AuthError {
    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenGeneration(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

impl From<AuthError> for WataError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenGeneration(msg) => WataError::TokenGenerationFailed(msg),
            AuthError::TokenExpired | AuthError::InvalidToken => {
                WataError::TokenGenerationFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::TokenExpired.error_code(), "TOKEN_EXPIRED");
        assert_eq!(AuthError::InvalidToken.error_code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_generation_failure_maps_to_token_code() {
        let err: WataError = AuthError::TokenGeneration("bad key".to_string()).into();
        assert_eq!(err.code(), "0100");
    }
}
