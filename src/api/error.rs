use crate::storage::StorageError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed ({status}): {message}")]
    Http { status: StatusCode, message: String },
    #[error("response error: {0}")]
    Parse(String),
    /// The server rejected the bearer token. Local credentials are left alone;
    /// callers decide whether to log out.
    #[error("Session expired or invalid token")]
    SessionExpired,
    /// The server answered with `success: false`.
    #[error("{0}")]
    Rejected(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ApiError::SessionExpired.to_string(),
            "Session expired or invalid token"
        );
        assert_eq!(
            ApiError::Rejected("Invalid credentials".to_string()).to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            ApiError::Http {
                status: StatusCode::BAD_GATEWAY,
                message: "upstream".to_string(),
            }
            .to_string(),
            "request failed (502 Bad Gateway): upstream"
        );
    }
}
