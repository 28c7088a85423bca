pub mod id;
pub mod photo;
pub mod status;
pub mod ttl;
pub mod types;

pub use id::new_id;
pub use photo::{ConsumedPhoto, PhotoMeta, Receipt, UnlockGrant, UploadReceipt, ViewToken};
pub use status::{PhotoStatus, ReceiptStatus};
pub use ttl::{
    DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, MIN_TTL_SECONDS, VIEW_TOKEN_TTL_SECONDS, resolve_ttl,
};
pub use types::{PhotoId, ReceiptId, ViewTokenId};
