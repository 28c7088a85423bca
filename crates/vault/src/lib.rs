//! The one-time secret retrieval protocol.
//!
//! [`SecretStore`] owns every rule about how a photo lives and dies: it writes
//! the blob, metadata and receipt on upload, hands the payload out exactly
//! once, gates protected photos behind single-use view tokens, and derives
//! status purely from which keys are still present in the backing store.
//!
//! The store itself holds no state between calls. All coordination between
//! concurrent callers happens inside the [`KvStore`]'s atomic scripts.
//!
//! [`KvStore`]: vanish_state::KvStore

pub mod error;
pub mod passphrase;
pub mod store;
pub mod upload;

pub use error::VaultError;
pub use passphrase::{Argon2Hasher, HashError, PassphraseHasher};
pub use store::SecretStore;
pub use upload::{MAX_PASSPHRASE_CHARS, UploadRequest};
