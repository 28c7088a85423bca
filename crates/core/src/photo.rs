use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PhotoId, ReceiptId, ViewTokenId};

/// Metadata stored alongside a photo blob under `photo:meta:<id>`.
///
/// The presence of this record is what makes a photo "live"; the blob is only
/// ever reachable together with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMeta {
    pub id: PhotoId,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Salted slow hash of the passphrase. Never the plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_hash: Option<String>,
}

impl PhotoMeta {
    /// Whether viewing this photo requires a view token.
    #[must_use]
    pub fn is_passphrase_protected(&self) -> bool {
        self.passphrase_hash.is_some()
    }
}

/// Uploader-side record stored under `receipt:<receiptId>`.
///
/// Outlives the photo it points at: the receipt stays until its own TTL runs
/// out, so its presence next to an absent photo means "consumed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The photo this receipt tracks.
    pub id: PhotoId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Record stored under `photo:viewtoken:<token>`, binding a token to one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewToken {
    pub id: PhotoId,
}

/// A photo that has been read and removed from the store in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedPhoto {
    pub meta: PhotoMeta,
    pub blob: Vec<u8>,
}

/// What an uploader gets back. Deliberately excludes the photo id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub receipt_id: ReceiptId,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockGrant {
    pub token: ViewTokenId,
    /// Seconds the token stays redeemable.
    pub token_expires_in: u64,
    /// Relative reference `<photoId>?token=<token>` for the one-time fetch.
    pub photo_url: String,
}

impl UnlockGrant {
    /// Build a grant for `photo`, deriving the relative fetch path.
    #[must_use]
    pub fn new(photo: &PhotoId, token: ViewTokenId, ttl_seconds: u64) -> Self {
        let photo_url = format!("{photo}?token={token}");
        Self {
            token,
            token_expires_in: ttl_seconds,
            photo_url,
        }
    }
}
