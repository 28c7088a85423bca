use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PhotoId, ReceiptId};

/// Status of a photo looked up by its own id.
///
/// Once the photo is gone this lookup cannot tell "viewed" from "expired" from
/// "never existed": no record is kept for the photo id itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoStatus {
    pub id: PhotoId,
    pub exists: bool,
    pub is_expired: bool,
    pub is_consumed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ttl_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub is_with_password: bool,
}

impl PhotoStatus {
    /// Status reported for a photo whose metadata is absent.
    #[must_use]
    pub fn absent(id: PhotoId) -> Self {
        Self {
            id,
            exists: false,
            is_expired: true,
            is_consumed: true,
            created_at: None,
            expires_at: None,
            ttl_seconds: 0,
            size_bytes: None,
            is_with_password: false,
        }
    }
}

/// Status of a photo as seen through the uploader's receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStatus {
    pub receipt_id: ReceiptId,
    pub exists: bool,
    pub is_expired: bool,
    pub is_consumed: bool,
    /// The underlying photo id, once the receipt has been found.
    pub id: Option<PhotoId>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ttl_seconds: u64,
}

impl ReceiptStatus {
    /// Status reported for a receipt that is absent or expired.
    #[must_use]
    pub fn absent(receipt_id: ReceiptId) -> Self {
        Self {
            receipt_id,
            exists: false,
            is_expired: true,
            is_consumed: true,
            id: None,
            created_at: None,
            expires_at: None,
            ttl_seconds: 0,
        }
    }
}
