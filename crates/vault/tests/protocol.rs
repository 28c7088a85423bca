use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use argon2::Params;
use async_trait::async_trait;

use vanish_core::{PhotoId, ReceiptId, UploadReceipt, ViewTokenId};
use vanish_media::{SourceHint, TranscodeError, TranscodedImage, Transcoder};
use vanish_state::{AtomicScript, KvStore, ScriptReply, StateError, StateKey};
use vanish_state_memory::MemoryKvStore;
use vanish_vault::{Argon2Hasher, SecretStore, UploadRequest, VaultError};

/// Passes bytes through untouched; rejects payloads starting with `bad`.
struct PassThrough;

impl Transcoder for PassThrough {
    fn transcode(
        &self,
        input: &[u8],
        _hint: SourceHint<'_>,
    ) -> Result<TranscodedImage, TranscodeError> {
        if input.starts_with(b"bad") {
            return Err(TranscodeError::Decode("not an image".into()));
        }
        Ok(TranscodedImage {
            bytes: input.to_vec(),
            mime_type: "image/jpeg".into(),
            filename: "photo.jpg".into(),
        })
    }
}

struct Harness {
    kv: Arc<MemoryKvStore>,
    vault: SecretStore,
}

fn harness() -> Harness {
    let kv = Arc::new(MemoryKvStore::new());
    let hasher = Argon2Hasher::new(Params::new(1024, 1, 1, None).unwrap());
    let vault = SecretStore::new(kv.clone(), Arc::new(PassThrough), Arc::new(hasher));
    Harness { kv, vault }
}

impl Harness {
    async fn upload(&self, request: UploadRequest) -> UploadReceipt {
        self.vault.upload(request).await.unwrap()
    }

    async fn photo_id(&self, receipt: &UploadReceipt) -> PhotoId {
        self.vault
            .status_by_receipt(&receipt.receipt_id)
            .await
            .unwrap()
            .id
            .unwrap()
    }
}

/// Delegates to an in-memory store and counts view-token writes.
#[derive(Default)]
struct TokenCountingStore {
    inner: MemoryKvStore,
    token_writes: AtomicUsize,
}

impl TokenCountingStore {
    fn record(&self, key: &StateKey) {
        if key.canonical().starts_with("photo:viewtoken:") {
            self.token_writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn token_writes(&self) -> usize {
        self.token_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for TokenCountingStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(key).await
    }

    async fn set_with_ttl(
        &self,
        key: &StateKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StateError> {
        self.record(key);
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn set(&self, key: &StateKey, value: &[u8]) -> Result<(), StateError> {
        self.record(key);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &StateKey) -> Result<bool, StateError> {
        self.inner.exists(key).await
    }

    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError> {
        self.inner.remaining_ttl(key).await
    }

    async fn run_script(
        &self,
        script: AtomicScript,
        keys: &[StateKey],
        args: &[String],
    ) -> Result<ScriptReply, StateError> {
        self.inner.run_script(script, keys, args).await
    }
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test(start_paused = true)]
async fn scenario_view_once_then_receipt_reports_consumed() {
    let h = harness();
    let bytes = payload(500);
    let receipt = h
        .upload(UploadRequest::new(bytes.clone()).with_ttl_seconds(120))
        .await;

    let status = h.vault.status_by_receipt(&receipt.receipt_id).await.unwrap();
    assert!(status.exists);
    assert!(!status.is_consumed);
    assert!(!status.is_expired);
    assert_eq!(status.ttl_seconds, 120);
    let id = status.id.unwrap();

    let first = h.vault.fetch_guarded(&id, None).await.unwrap();
    assert_eq!(first.blob, bytes);
    assert_eq!(first.meta.size_bytes, 500);
    assert_eq!(first.meta.mime_type, "image/jpeg");

    let second = h.vault.fetch_guarded(&id, None).await;
    assert!(matches!(second, Err(VaultError::NotFound)));

    let after = h.vault.status_by_receipt(&receipt.receipt_id).await.unwrap();
    assert!(after.exists);
    assert!(after.is_consumed);
    assert_eq!(after.id.as_ref(), Some(&id));

    let by_id = h.vault.status_by_id(&id).await.unwrap();
    assert!(!by_id.exists);
    assert!(by_id.is_consumed);
    assert_eq!(by_id.ttl_seconds, 0);
}

#[tokio::test]
async fn upload_rejects_empty_payload() {
    let h = harness();
    let result = h.vault.upload(UploadRequest::new(Vec::new())).await;
    assert!(matches!(result, Err(VaultError::InvalidInput(_))));
}

#[tokio::test]
async fn ttl_boundaries() {
    let h = harness();
    for (ttl, ok) in [(59, false), (60, true), (86_400, true), (86_401, false)] {
        let result = h
            .vault
            .upload(UploadRequest::new(payload(10)).with_ttl_seconds(ttl))
            .await;
        assert_eq!(result.is_ok(), ok, "ttl {ttl}");
        if !ok {
            assert!(matches!(result, Err(VaultError::InvalidInput(_))));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn default_ttl_is_one_hour() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(10))).await;
    let id = h.photo_id(&receipt).await;

    let status = h.vault.status_by_id(&id).await.unwrap();
    assert_eq!(status.ttl_seconds, 3_600);
    let lifetime = status.expires_at.unwrap() - status.created_at.unwrap();
    assert_eq!(lifetime.num_seconds(), 3_600);
}

#[tokio::test(start_paused = true)]
async fn status_counts_down_then_expires() {
    let h = harness();
    let receipt = h
        .upload(UploadRequest::new(payload(64)).with_ttl_seconds(120))
        .await;
    let id = h.photo_id(&receipt).await;

    let fresh = h.vault.status_by_id(&id).await.unwrap();
    assert!(fresh.exists);
    assert_eq!(fresh.ttl_seconds, 120);
    assert_eq!(fresh.size_bytes, Some(64));
    assert!(!fresh.is_with_password);

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(h.vault.status_by_id(&id).await.unwrap().ttl_seconds, 90);

    tokio::time::advance(Duration::from_secs(91)).await;
    let gone = h.vault.status_by_id(&id).await.unwrap();
    assert!(!gone.exists);
    assert!(gone.is_expired);
    assert!(matches!(
        h.vault.fetch_and_consume(&id).await,
        Err(VaultError::NotFound)
    ));

    let receipt_status = h.vault.status_by_receipt(&receipt.receipt_id).await.unwrap();
    assert!(!receipt_status.exists);
    assert!(receipt_status.id.is_none());
}

#[tokio::test]
async fn passphrase_length_limit() {
    let h = harness();
    let longest = "x".repeat(256);
    assert!(
        h.vault
            .upload(UploadRequest::new(payload(10)).with_passphrase(longest))
            .await
            .is_ok()
    );

    let too_long = "x".repeat(257);
    let result = h
        .vault
        .upload(UploadRequest::new(payload(10)).with_passphrase(too_long))
        .await;
    assert!(matches!(result, Err(VaultError::InvalidInput(_))));
}

#[tokio::test]
async fn transcode_failure_is_unprocessable() {
    let h = harness();
    let result = h
        .vault
        .upload(UploadRequest::new(b"bad bytes".to_vec()))
        .await;
    assert!(matches!(result, Err(VaultError::UnprocessableContent(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fetches_deliver_exactly_once() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(500))).await;
    let id = h.photo_id(&receipt).await;
    let vault = Arc::new(h.vault);

    let attempts = (0..32).map(|_| {
        let vault = Arc::clone(&vault);
        let id = id.clone();
        tokio::spawn(async move { vault.fetch_and_consume(&id).await })
    });
    let results = futures::future::join_all(attempts).await;

    let mut winners = 0;
    for result in results {
        match result.unwrap() {
            Ok(photo) => {
                assert_eq!(photo.blob.len(), 500);
                winners += 1;
            }
            Err(VaultError::NotFound) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn protected_photo_requires_token() {
    let h = harness();
    let receipt = h
        .upload(UploadRequest::new(payload(100)).with_passphrase("open sesame"))
        .await;
    let id = h.photo_id(&receipt).await;
    assert!(h.vault.status_by_id(&id).await.unwrap().is_with_password);

    let without = h.vault.fetch_guarded(&id, None).await;
    assert!(matches!(without, Err(VaultError::Unauthorized)));
    let bogus = h
        .vault
        .fetch_guarded(&id, Some(&ViewTokenId::new("made-up")))
        .await;
    assert!(matches!(bogus, Err(VaultError::Unauthorized)));
    assert!(h.vault.status_by_id(&id).await.unwrap().exists);

    let wrong = h.vault.unlock(&id, "close sesame").await;
    assert!(matches!(wrong, Err(VaultError::Unauthorized)));

    let grant = h.vault.unlock(&id, "open sesame").await.unwrap();
    assert_eq!(grant.token_expires_in, 90);
    assert_eq!(grant.photo_url, format!("{id}?token={}", grant.token));

    let photo = h.vault.fetch_guarded(&id, Some(&grant.token)).await.unwrap();
    assert_eq!(photo.blob, payload(100));
    assert!(!h.vault.status_by_id(&id).await.unwrap().exists);
}

#[tokio::test]
async fn wrong_passphrase_writes_no_view_token() {
    let kv = Arc::new(TokenCountingStore::default());
    let hasher = Argon2Hasher::new(Params::new(1024, 1, 1, None).unwrap());
    let vault = SecretStore::new(kv.clone(), Arc::new(PassThrough), Arc::new(hasher));
    let receipt = vault
        .upload(UploadRequest::new(payload(64)).with_passphrase("open sesame"))
        .await
        .unwrap();
    let id = vault
        .status_by_receipt(&receipt.receipt_id)
        .await
        .unwrap()
        .id
        .unwrap();

    let wrong = vault.unlock(&id, "close sesame").await;
    assert!(matches!(wrong, Err(VaultError::Unauthorized)));
    let empty = vault.unlock(&id, "").await;
    assert!(matches!(empty, Err(VaultError::Unauthorized)));
    assert_eq!(kv.token_writes(), 0);

    let grant = vault.unlock(&id, "open sesame").await.unwrap();
    assert_eq!(kv.token_writes(), 1);
    assert!(
        kv.exists(&StateKey::view_token(grant.token.as_str()))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn token_is_spent_by_first_redemption_attempt() {
    let h = harness();
    let first = h
        .upload(UploadRequest::new(payload(10)).with_passphrase("pw"))
        .await;
    let second = h
        .upload(UploadRequest::new(payload(20)).with_passphrase("pw"))
        .await;
    let first_id = h.photo_id(&first).await;
    let second_id = h.photo_id(&second).await;

    let grant = h.vault.unlock(&first_id, "pw").await.unwrap();

    let mismatched = h.vault.fetch_guarded(&second_id, Some(&grant.token)).await;
    assert!(matches!(mismatched, Err(VaultError::Unauthorized)));

    let reused = h.vault.fetch_guarded(&first_id, Some(&grant.token)).await;
    assert!(matches!(reused, Err(VaultError::Unauthorized)));

    assert!(h.vault.status_by_id(&first_id).await.unwrap().exists);
    assert!(h.vault.status_by_id(&second_id).await.unwrap().exists);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_token_redemption_has_one_winner() {
    let h = harness();
    let receipt = h
        .upload(UploadRequest::new(payload(10)).with_passphrase("pw"))
        .await;
    let id = h.photo_id(&receipt).await;
    let grant = h.vault.unlock(&id, "pw").await.unwrap();
    let vault = Arc::new(h.vault);

    let attempts = (0..16).map(|_| {
        let vault = Arc::clone(&vault);
        let id = id.clone();
        let token = grant.token.clone();
        tokio::spawn(async move { vault.fetch_guarded(&id, Some(&token)).await })
    });
    let results = futures::future::join_all(attempts).await;
    let winners = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(winners, 1);
}

#[tokio::test(start_paused = true)]
async fn token_expires_after_ninety_seconds() {
    let h = harness();
    let receipt = h
        .upload(UploadRequest::new(payload(10)).with_passphrase("pw"))
        .await;
    let id = h.photo_id(&receipt).await;
    let grant = h.vault.unlock(&id, "pw").await.unwrap();

    tokio::time::advance(Duration::from_secs(91)).await;
    let late = h.vault.fetch_guarded(&id, Some(&grant.token)).await;
    assert!(matches!(late, Err(VaultError::Unauthorized)));
}

#[tokio::test]
async fn unprotected_photo_unlocks_without_check() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(10))).await;
    let id = h.photo_id(&receipt).await;

    let grant = h.vault.unlock(&id, "anything").await.unwrap();
    assert!(grant.photo_url.starts_with(id.as_str()));
    assert!(h.vault.fetch_guarded(&id, None).await.is_ok());
}

#[tokio::test]
async fn unlock_missing_photo_is_not_found() {
    let h = harness();
    let result = h.vault.unlock(&PhotoId::new("nope"), "pw").await;
    assert!(matches!(result, Err(VaultError::NotFound)));
}

#[tokio::test]
async fn stored_metadata_never_holds_plaintext_passphrase() {
    let h = harness();
    let receipt = h
        .upload(UploadRequest::new(payload(10)).with_passphrase("plaintext-marker"))
        .await;
    let id = h.photo_id(&receipt).await;

    let raw = h
        .kv
        .get_string(&StateKey::photo_meta(id.as_str()))
        .await
        .unwrap()
        .unwrap();
    assert!(!raw.contains("plaintext-marker"));
    assert!(raw.contains("$argon2id$"));
}

#[tokio::test]
async fn burn_is_idempotent_and_keeps_receipt() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(10))).await;
    let id = h.photo_id(&receipt).await;

    h.vault.burn(&id).await.unwrap();
    h.vault.burn(&id).await.unwrap();
    h.vault.burn(&PhotoId::new("never-existed")).await.unwrap();

    assert!(matches!(
        h.vault.fetch_guarded(&id, None).await,
        Err(VaultError::NotFound)
    ));
    let status = h.vault.status_by_receipt(&receipt.receipt_id).await.unwrap();
    assert!(status.exists);
    assert!(status.is_consumed);
}

#[tokio::test]
async fn corrupted_metadata_is_reported() {
    let h = harness();
    let id = PhotoId::new("corrupt");
    let ttl = Duration::from_secs(60);
    h.kv
        .set_with_ttl(&StateKey::photo_meta(id.as_str()), b"{not json", ttl)
        .await
        .unwrap();
    h.kv
        .set_with_ttl(&StateKey::photo_blob(id.as_str()), b"bytes", ttl)
        .await
        .unwrap();

    assert!(matches!(
        h.vault.status_by_id(&id).await,
        Err(VaultError::CorruptedState(_))
    ));
    assert!(matches!(
        h.vault.fetch_guarded(&id, None).await,
        Err(VaultError::CorruptedState(_))
    ));
    assert!(matches!(
        h.vault.fetch_and_consume(&id).await,
        Err(VaultError::CorruptedState(_))
    ));
}

#[tokio::test]
async fn unparsable_stored_hash_is_corrupted_state() {
    let h = harness();
    let id = PhotoId::new("bad-hash");
    let meta = serde_json::json!({
        "id": "bad-hash",
        "filename": "photo.jpg",
        "mimeType": "image/jpeg",
        "sizeBytes": 5,
        "createdAt": "2024-01-01T00:00:00Z",
        "expiresAt": "2024-01-01T01:00:00Z",
        "passphraseHash": "definitely-not-phc"
    });
    h.kv
        .set_with_ttl(
            &StateKey::photo_meta(id.as_str()),
            meta.to_string().as_bytes(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let result = h.vault.unlock(&id, "pw").await;
    assert!(matches!(result, Err(VaultError::CorruptedState(_))));
}

#[tokio::test]
async fn dangling_metadata_heals_on_fetch() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(10))).await;
    let id = h.photo_id(&receipt).await;
    h.kv
        .delete(&StateKey::photo_blob(id.as_str()))
        .await
        .unwrap();

    assert!(h.vault.status_by_id(&id).await.unwrap().exists);
    assert!(matches!(
        h.vault.fetch_and_consume(&id).await,
        Err(VaultError::NotFound)
    ));
    assert!(!h.vault.status_by_id(&id).await.unwrap().exists);
}

#[tokio::test]
async fn unknown_receipt_is_absent() {
    let h = harness();
    let status = h
        .vault
        .status_by_receipt(&ReceiptId::new("unknown"))
        .await
        .unwrap();
    assert!(!status.exists);
    assert!(status.is_expired);
    assert!(status.is_consumed);
    assert!(status.id.is_none());
    assert_eq!(status.ttl_seconds, 0);
}

#[tokio::test]
async fn receipt_and_photo_ids_differ() {
    let h = harness();
    let receipt = h.upload(UploadRequest::new(payload(10))).await;
    let id = h.photo_id(&receipt).await;
    assert_ne!(id.as_str(), receipt.receipt_id.as_str());
    assert_eq!(id.len(), 32);
}
