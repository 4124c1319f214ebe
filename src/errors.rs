use reqwest::StatusCode;
use thiserror::Error;

/// Every failure the remote store client can report.
///
/// The `Display` text is the user-facing error string: server messages are
/// passed through verbatim, everything else gets a short generic message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    /// A local file for an upload could not be read. Nothing was sent.
    #[error("{0}")]
    File(String),
}

impl ApiError {
    /// Map a non-success HTTP status plus the optional `error` field of the
    /// body onto the taxonomy. `fallback` is used when the server sent no
    /// message.
    pub fn from_status(status: StatusCode, server_message: Option<String>, fallback: &str) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthenticated,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// True when the only way forward is re-authentication.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport("request timed out".to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_session_fatal() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, Some("Token has expired".into()), "x");
        assert_eq!(err, ApiError::Unauthenticated);
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some("Name and email are required".into()),
            "Failed to create employee",
        );
        assert_eq!(err.to_string(), "Name and email are required");
        assert!(!err.is_session_fatal());
    }

    #[test]
    fn test_blank_server_message_uses_fallback() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, Some("  ".into()), "Failed to update task");
        assert_eq!(err.to_string(), "Failed to update task");
    }

    #[test]
    fn test_not_found_and_server_errors() {
        let nf = ApiError::from_status(StatusCode::NOT_FOUND, None, "Failed to delete notification");
        assert!(nf.is_not_found());
        assert_eq!(nf.to_string(), "Failed to delete notification");

        let se = ApiError::from_status(StatusCode::BAD_GATEWAY, Some("upstream down".into()), "x");
        assert_eq!(
            se,
            ApiError::Server {
                status: 502,
                message: "upstream down".into()
            }
        );
    }
}
