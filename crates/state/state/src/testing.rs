use std::time::Duration;

use crate::error::StateError;
use crate::key::StateKey;
use crate::script::AtomicScript;
use crate::store::KvStore;

/// Run the full key-value store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if the store fails at the transport level. Behavioural
/// mismatches panic through assertions.
pub async fn run_store_conformance_tests(store: &dyn KvStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_binary_roundtrip(store).await?;
    test_get_string(store).await?;
    test_overwrite(store).await?;
    test_delete(store).await?;
    test_exists(store).await?;
    test_remaining_ttl(store).await?;
    test_take_pair(store).await?;
    test_take_pair_missing_primary(store).await?;
    test_take_pair_dangling_primary(store).await?;
    test_delete_pair(store).await?;
    test_script_arity(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::photo_meta("conf-missing");
    assert!(store.get(&key).await?.is_none(), "get on missing key should return None");
    assert!(store.get_string(&key).await?.is_none());
    Ok(())
}

async fn test_binary_roundtrip(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::photo_blob("conf-binary");
    let payload: Vec<u8> = (0..=255u8).chain([0, 0xff, 0xfe, 0x00]).collect();
    store
        .set_with_ttl(&key, &payload, Duration::from_secs(60))
        .await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some(payload.as_slice()), "bytes must round-trip exactly");
    Ok(())
}

async fn test_get_string(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::receipt("conf-string");
    store.set(&key, "hello".as_bytes()).await?;
    assert_eq!(store.get_string(&key).await?.as_deref(), Some("hello"));

    let bad = StateKey::receipt("conf-not-utf8");
    store.set(&bad, &[0xff, 0xfe, 0xfd]).await?;
    let result = store.get_string(&bad).await;
    assert!(
        matches!(result, Err(StateError::Serialization(_))),
        "invalid UTF-8 should surface as a serialization error"
    );
    Ok(())
}

async fn test_overwrite(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::photo_meta("conf-overwrite");
    store.set(&key, b"v1").await?;
    store.set_with_ttl(&key, b"v2", Duration::from_secs(60)).await?;
    assert_eq!(store.get(&key).await?.as_deref(), Some(b"v2".as_slice()));
    Ok(())
}

async fn test_delete(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::view_token("conf-delete");
    store.set(&key, b"bye").await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    assert!(store.get(&key).await?.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_exists(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::photo_meta("conf-exists");
    assert!(!store.exists(&key).await?);
    store.set_with_ttl(&key, b"{}", Duration::from_secs(60)).await?;
    assert!(store.exists(&key).await?);
    store.delete(&key).await?;
    assert!(!store.exists(&key).await?);
    Ok(())
}

async fn test_remaining_ttl(store: &dyn KvStore) -> Result<(), StateError> {
    let key = StateKey::photo_meta("conf-ttl");
    store
        .set_with_ttl(&key, b"ephemeral", Duration::from_secs(120))
        .await?;
    let ttl = store
        .remaining_ttl(&key)
        .await?
        .expect("key with TTL should report remaining time");
    assert!(ttl <= Duration::from_secs(120), "ttl must not exceed what was set");
    assert!(ttl > Duration::from_secs(110), "ttl should be close to what was set");

    let persistent = StateKey::photo_meta("conf-ttl-none");
    store.set(&persistent, b"forever").await?;
    assert!(
        store.remaining_ttl(&persistent).await?.is_none(),
        "key without TTL should report None"
    );

    let missing = StateKey::photo_meta("conf-ttl-missing");
    assert!(store.remaining_ttl(&missing).await?.is_none());
    Ok(())
}

async fn test_take_pair(store: &dyn KvStore) -> Result<(), StateError> {
    let meta = StateKey::photo_meta("conf-take");
    let blob = StateKey::photo_blob("conf-take");
    store.set_with_ttl(&meta, b"meta", Duration::from_secs(60)).await?;
    store
        .set_with_ttl(&blob, &[0, 1, 2, 0xff], Duration::from_secs(60))
        .await?;

    let keys = [meta.clone(), blob.clone()];
    let reply = store.run_script(AtomicScript::TakePair, &keys, &[]).await?;
    assert_eq!(
        reply,
        Some(vec![b"meta".to_vec(), vec![0, 1, 2, 0xff]]),
        "take should return both values in key order"
    );
    assert!(!store.exists(&meta).await?, "primary should be deleted");
    assert!(!store.exists(&blob).await?, "companion should be deleted");

    let again = store.run_script(AtomicScript::TakePair, &keys, &[]).await?;
    assert!(again.is_none(), "second take should find nothing");
    Ok(())
}

async fn test_take_pair_missing_primary(store: &dyn KvStore) -> Result<(), StateError> {
    let meta = StateKey::photo_meta("conf-take-orphan-blob");
    let blob = StateKey::photo_blob("conf-take-orphan-blob");
    store.set_with_ttl(&blob, b"bytes", Duration::from_secs(60)).await?;

    let reply = store
        .run_script(AtomicScript::TakePair, &[meta, blob.clone()], &[])
        .await?;
    assert!(reply.is_none(), "take without primary should return None");
    assert!(
        store.exists(&blob).await?,
        "companion is left alone when the primary is missing"
    );
    store.delete(&blob).await?;
    Ok(())
}

async fn test_take_pair_dangling_primary(store: &dyn KvStore) -> Result<(), StateError> {
    let meta = StateKey::photo_meta("conf-take-dangling");
    let blob = StateKey::photo_blob("conf-take-dangling");
    store.set_with_ttl(&meta, b"meta", Duration::from_secs(60)).await?;

    let reply = store
        .run_script(AtomicScript::TakePair, &[meta.clone(), blob], &[])
        .await?;
    assert!(reply.is_none(), "take without companion should return None");
    assert!(
        !store.exists(&meta).await?,
        "dangling primary should be cleaned up"
    );
    Ok(())
}

async fn test_delete_pair(store: &dyn KvStore) -> Result<(), StateError> {
    let meta = StateKey::photo_meta("conf-burn");
    let blob = StateKey::photo_blob("conf-burn");
    let keys = [meta.clone(), blob.clone()];

    let reply = store.run_script(AtomicScript::DeletePair, &keys, &[]).await?;
    assert!(reply.is_none(), "deleting nothing should return None");

    store.set_with_ttl(&blob, b"bytes", Duration::from_secs(60)).await?;
    let reply = store.run_script(AtomicScript::DeletePair, &keys, &[]).await?;
    assert!(reply.is_some(), "deleting a lone companion should report a deletion");
    assert!(!store.exists(&blob).await?);

    store.set_with_ttl(&meta, b"meta", Duration::from_secs(60)).await?;
    store.set_with_ttl(&blob, b"bytes", Duration::from_secs(60)).await?;
    let reply = store.run_script(AtomicScript::DeletePair, &keys, &[]).await?;
    assert!(reply.is_some());
    assert!(!store.exists(&meta).await?);
    assert!(!store.exists(&blob).await?);
    Ok(())
}

async fn test_script_arity(store: &dyn KvStore) -> Result<(), StateError> {
    let result = store
        .run_script(AtomicScript::TakePair, &[StateKey::photo_meta("x")], &[])
        .await;
    assert!(
        matches!(result, Err(StateError::Backend(_))),
        "wrong key count should be rejected"
    );
    Ok(())
}
