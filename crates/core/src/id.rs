use rand_core::{OsRng, RngCore};

/// Number of random bytes behind every identifier.
pub const ID_BYTES: usize = 16;

/// Generate a 32-character lowercase hex identifier from the OS CSPRNG.
///
/// Used for photo ids, receipt ids and view tokens alike. No uniqueness check
/// is performed against the store: 128 bits of entropy make collisions a
/// non-concern.
#[must_use]
pub fn new_id() -> String {
    let mut buf = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
