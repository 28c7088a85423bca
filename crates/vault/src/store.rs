use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use vanish_core::ttl::{VIEW_TOKEN_TTL_SECONDS, resolve_ttl, whole_seconds};
use vanish_core::{
    ConsumedPhoto, MAX_TTL_SECONDS, MIN_TTL_SECONDS, PhotoId, PhotoMeta, PhotoStatus, Receipt,
    ReceiptId, ReceiptStatus, UnlockGrant, UploadReceipt, ViewToken, ViewTokenId,
};
use vanish_media::{SourceHint, TranscodedImage, Transcoder};
use vanish_state::{AtomicScript, KvStore, StateKey};

use crate::error::VaultError;
use crate::passphrase::PassphraseHasher;
use crate::upload::{MAX_PASSPHRASE_CHARS, UploadRequest};

/// The one-time photo protocol over a shared [`KvStore`].
///
/// Cheap to share behind an `Arc`; every method takes `&self` and keeps no
/// state of its own between calls.
pub struct SecretStore {
    kv: Arc<dyn KvStore>,
    transcoder: Arc<dyn Transcoder>,
    hasher: Arc<dyn PassphraseHasher>,
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}

impl SecretStore {
    pub fn new(
        kv: Arc<dyn KvStore>,
        transcoder: Arc<dyn Transcoder>,
        hasher: Arc<dyn PassphraseHasher>,
    ) -> Self {
        Self {
            kv,
            transcoder,
            hasher,
        }
    }

    /// Store a new photo and return the uploader's receipt.
    ///
    /// Writes the blob, then the metadata, then the receipt, all with the same
    /// TTL. A failure part-way can leave a blob without metadata; it is
    /// unreachable and expires on its own.
    #[instrument(
        skip(self, request),
        fields(size = request.bytes.len(), ttl = ?request.ttl_seconds)
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, VaultError> {
        if request.bytes.is_empty() {
            return Err(VaultError::InvalidInput("no photo provided".into()));
        }
        let ttl = resolve_ttl(request.ttl_seconds).ok_or_else(|| {
            VaultError::InvalidInput(format!(
                "ttl must be between {MIN_TTL_SECONDS} and {MAX_TTL_SECONDS} seconds"
            ))
        })?;
        let passphrase = request.effective_passphrase().map(str::to_owned);
        if passphrase
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PASSPHRASE_CHARS)
        {
            return Err(VaultError::InvalidInput(format!(
                "passphrase must be at most {MAX_PASSPHRASE_CHARS} characters"
            )));
        }

        let passphrase_hash = match passphrase {
            Some(p) => Some(self.hash_passphrase(p).await?),
            None => None,
        };
        let image = self.transcode(request).await?;

        let id = PhotoId::generate();
        let receipt_id = ReceiptId::generate();
        let created_at = Utc::now();
        let lifetime = chrono::Duration::from_std(ttl)
            .map_err(|e| VaultError::InvalidInput(format!("ttl out of range: {e}")))?;
        let expires_at = created_at + lifetime;

        let meta = PhotoMeta {
            id: id.clone(),
            size_bytes: image.size_bytes(),
            filename: image.filename,
            mime_type: image.mime_type,
            created_at,
            expires_at,
            passphrase_hash,
        };
        let receipt = Receipt {
            id: id.clone(),
            created_at,
            expires_at,
        };

        self.kv
            .set_with_ttl(&StateKey::photo_blob(id.as_str()), &image.bytes, ttl)
            .await?;
        self.kv
            .set_with_ttl(&StateKey::photo_meta(id.as_str()), &encode(&meta)?, ttl)
            .await?;
        self.kv
            .set_with_ttl(
                &StateKey::receipt(receipt_id.as_str()),
                &encode(&receipt)?,
                ttl,
            )
            .await?;

        info!(
            photo.id = %id,
            size_bytes = meta.size_bytes,
            protected = meta.is_passphrase_protected(),
            "photo stored"
        );
        Ok(UploadReceipt {
            receipt_id,
            expires_at,
        })
    }

    /// Take the photo out of the store, ignoring any passphrase.
    ///
    /// Exactly one of any number of concurrent callers receives the payload;
    /// every other caller gets [`VaultError::NotFound`]. Transports must go
    /// through [`fetch_guarded`](Self::fetch_guarded) instead.
    #[instrument(skip(self), fields(photo.id = %id))]
    pub async fn fetch_and_consume(&self, id: &PhotoId) -> Result<ConsumedPhoto, VaultError> {
        let meta_key = StateKey::photo_meta(id.as_str());
        let blob_key = StateKey::photo_blob(id.as_str());
        let reply = self
            .kv
            .run_script(AtomicScript::TakePair, &[meta_key.clone(), blob_key], &[])
            .await?;

        let Some(mut values) = reply else {
            debug!("photo absent");
            return Err(VaultError::NotFound);
        };
        if values.len() != 2 {
            return Err(VaultError::CorruptedState(format!(
                "take-pair returned {} values",
                values.len()
            )));
        }
        let blob = values.pop().unwrap_or_default();
        let raw_meta = values.pop().unwrap_or_default();
        let meta: PhotoMeta = decode(&raw_meta, &meta_key)?;

        info!(size_bytes = blob.len(), "photo consumed");
        Ok(ConsumedPhoto { meta, blob })
    }

    /// Consume the photo, requiring a view token if it is passphrase protected.
    ///
    /// A token is spent by the first attempt to redeem it, even when that
    /// attempt then fails.
    #[instrument(skip(self, token), fields(photo.id = %id, token = token.is_some()))]
    pub async fn fetch_guarded(
        &self,
        id: &PhotoId,
        token: Option<&ViewTokenId>,
    ) -> Result<ConsumedPhoto, VaultError> {
        let meta = self.read_meta(id).await?.ok_or(VaultError::NotFound)?;
        if meta.is_passphrase_protected() {
            let token = token.ok_or(VaultError::Unauthorized)?;
            self.redeem_view_token(id, token).await?;
        }
        self.fetch_and_consume(id).await
    }

    /// Trade a passphrase for a short-lived single-use view token.
    ///
    /// Unprotected photos get a token too; it is simply never required.
    #[instrument(skip(self, passphrase), fields(photo.id = %id))]
    pub async fn unlock(&self, id: &PhotoId, passphrase: &str) -> Result<UnlockGrant, VaultError> {
        let meta = self.read_meta(id).await?.ok_or(VaultError::NotFound)?;

        if let Some(hash) = meta.passphrase_hash {
            let hasher = Arc::clone(&self.hasher);
            let candidate = passphrase.to_owned();
            let matches = tokio::task::spawn_blocking(move || hasher.verify(&hash, &candidate))
                .await
                .map_err(|e| VaultError::Passphrase(e.to_string()))??;
            if !matches {
                warn!("passphrase rejected");
                return Err(VaultError::Unauthorized);
            }
        }

        let token = ViewTokenId::generate();
        let record = ViewToken { id: id.clone() };
        self.kv
            .set_with_ttl(
                &StateKey::view_token(token.as_str()),
                &encode(&record)?,
                Duration::from_secs(VIEW_TOKEN_TTL_SECONDS),
            )
            .await?;

        info!("view token issued");
        Ok(UnlockGrant::new(id, token, VIEW_TOKEN_TTL_SECONDS))
    }

    /// Report whether the photo is still retrievable.
    #[instrument(skip(self), fields(photo.id = %id))]
    pub async fn status_by_id(&self, id: &PhotoId) -> Result<PhotoStatus, VaultError> {
        let Some(meta) = self.read_meta(id).await? else {
            return Ok(PhotoStatus::absent(id.clone()));
        };
        let remaining = self
            .kv
            .remaining_ttl(&StateKey::photo_meta(id.as_str()))
            .await?;
        let ttl_seconds = whole_seconds(remaining);

        Ok(PhotoStatus {
            id: id.clone(),
            exists: true,
            is_expired: ttl_seconds == 0,
            is_consumed: false,
            created_at: Some(meta.created_at),
            expires_at: Some(meta.expires_at),
            ttl_seconds,
            size_bytes: Some(meta.size_bytes),
            is_with_password: meta.is_passphrase_protected(),
        })
    }

    /// Report on the photo behind a receipt without revealing the photo itself.
    ///
    /// While the receipt lives, a missing photo means it was viewed or burned.
    #[instrument(skip(self), fields(receipt.id = %receipt_id))]
    pub async fn status_by_receipt(
        &self,
        receipt_id: &ReceiptId,
    ) -> Result<ReceiptStatus, VaultError> {
        let receipt_key = StateKey::receipt(receipt_id.as_str());
        let Some(raw) = self.kv.get(&receipt_key).await? else {
            return Ok(ReceiptStatus::absent(receipt_id.clone()));
        };
        let receipt: Receipt = decode(&raw, &receipt_key)?;
        let remaining = self.kv.remaining_ttl(&receipt_key).await?;
        let photo_present = self
            .kv
            .exists(&StateKey::photo_meta(receipt.id.as_str()))
            .await?;
        let ttl_seconds = whole_seconds(remaining);

        Ok(ReceiptStatus {
            receipt_id: receipt_id.clone(),
            exists: true,
            is_expired: ttl_seconds == 0,
            is_consumed: !photo_present,
            id: Some(receipt.id),
            created_at: Some(receipt.created_at),
            expires_at: Some(receipt.expires_at),
            ttl_seconds,
        })
    }

    /// Destroy the photo. Idempotent: burning an absent photo succeeds.
    ///
    /// The receipt is left to expire so the uploader can still see the photo
    /// is gone.
    #[instrument(skip(self), fields(photo.id = %id))]
    pub async fn burn(&self, id: &PhotoId) -> Result<(), VaultError> {
        let reply = self
            .kv
            .run_script(
                AtomicScript::DeletePair,
                &[
                    StateKey::photo_meta(id.as_str()),
                    StateKey::photo_blob(id.as_str()),
                ],
                &[],
            )
            .await?;
        if reply.is_some() {
            info!("photo burned");
        } else {
            debug!("burn on absent photo");
        }
        Ok(())
    }

    async fn read_meta(&self, id: &PhotoId) -> Result<Option<PhotoMeta>, VaultError> {
        let key = StateKey::photo_meta(id.as_str());
        self.kv
            .get(&key)
            .await?
            .map(|raw| decode(&raw, &key))
            .transpose()
    }

    /// Spend `token` for photo `id`.
    ///
    /// The delete decides ownership: a concurrent redeemer that loses the
    /// delete is rejected even though it read the same record.
    async fn redeem_view_token(&self, id: &PhotoId, token: &ViewTokenId) -> Result<(), VaultError> {
        let key = StateKey::view_token(token.as_str());
        let raw = self.kv.get(&key).await?.ok_or(VaultError::Unauthorized)?;
        if !self.kv.delete(&key).await? {
            return Err(VaultError::Unauthorized);
        }
        let record: ViewToken = decode(&raw, &key)?;
        if record.id != *id {
            warn!("view token bound to a different photo");
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    async fn hash_passphrase(&self, passphrase: String) -> Result<String, VaultError> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&passphrase))
            .await
            .map_err(|e| VaultError::Passphrase(e.to_string()))??;
        Ok(hash)
    }

    async fn transcode(&self, request: UploadRequest) -> Result<TranscodedImage, VaultError> {
        let transcoder = Arc::clone(&self.transcoder);
        let UploadRequest {
            bytes,
            filename,
            mime_type,
            ..
        } = request;
        tokio::task::spawn_blocking(move || {
            transcoder.transcode(
                &bytes,
                SourceHint {
                    filename: filename.as_deref(),
                    mime_type: mime_type.as_deref(),
                },
            )
        })
        .await
        .map_err(|e| VaultError::UnprocessableContent(format!("transcoder aborted: {e}")))?
        .map_err(|e| VaultError::UnprocessableContent(e.to_string()))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, VaultError> {
    serde_json::to_vec(value).map_err(|e| VaultError::CorruptedState(format!("encode: {e}")))
}

fn decode<T: DeserializeOwned>(raw: &[u8], key: &StateKey) -> Result<T, VaultError> {
    serde_json::from_slice(raw).map_err(|e| VaultError::CorruptedState(format!("{key}: {e}")))
}
