use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use vanish_vault::VaultError;

/// Errors that can occur when running the vanish server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A protocol-level error surfaced through the API.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The request was rejected before reaching the vault.
    #[error("{0}")]
    BadRequest(String),
}

impl ServerError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(msg) | Self::Vault(VaultError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Vault(VaultError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "unauthorized".to_owned())
            }
            Self::Vault(VaultError::NotFound) => (
                StatusCode::NOT_FOUND,
                "photo not found or has expired".to_owned(),
            ),
            Self::Vault(VaultError::UnprocessableContent(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("failed to process image: {msg}"),
            ),
            Self::Vault(VaultError::BackendUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "storage backend unavailable".to_owned(),
            ),
            Self::Vault(VaultError::CorruptedState(_) | VaultError::Passphrase(_))
            | Self::Config(_)
            | Self::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use vanish_state::StateError;

    use super::*;

    fn status_of(err: ServerError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn vault_errors_map_to_statuses() {
        assert_eq!(
            status_of(VaultError::InvalidInput("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(VaultError::Unauthorized.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(VaultError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(VaultError::UnprocessableContent("x".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(VaultError::CorruptedState("x".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(VaultError::BackendUnavailable(StateError::Connection("down".into())).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ServerError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn startup_errors_are_internal() {
        let io = ServerError::from(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address already in use",
        ));
        assert!(matches!(io, ServerError::Io(_)));
        assert_eq!(status_of(io), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(ServerError::Config("bad toml".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ServerError::from(VaultError::CorruptedState("photo:meta:abc: eof".into()));
        let (_, message) = err.status_and_message();
        assert!(!message.contains("photo:meta"));
    }
}
