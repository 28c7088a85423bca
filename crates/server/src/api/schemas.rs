use serde::{Deserialize, Serialize};

/// Successful JSON response: `success: true` alongside the payload's fields.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Body of a successful burn.
#[derive(Debug, Serialize)]
pub struct BurnResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Body of `POST /photos/{id}/unlock`.
#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub passphrase: String,
}

/// Query string of `GET /photos/{id}`.
#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    pub token: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
