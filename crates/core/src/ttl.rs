//! Lifetime bounds for stored photos and view tokens.

use std::time::Duration;

/// Shortest lifetime an uploader may request, in seconds.
pub const MIN_TTL_SECONDS: u64 = 60;

/// Longest lifetime an uploader may request, in seconds.
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// Lifetime applied when the uploader does not ask for one.
pub const DEFAULT_TTL_SECONDS: u64 = 3_600;

/// Fixed lifetime of a view token issued by an unlock.
pub const VIEW_TOKEN_TTL_SECONDS: u64 = 90;

/// Resolve a requested TTL, applying the default when absent.
///
/// Returns `None` when the requested value lies outside
/// [`MIN_TTL_SECONDS`]`..=`[`MAX_TTL_SECONDS`].
#[must_use]
pub fn resolve_ttl(requested: Option<u64>) -> Option<Duration> {
    let secs = requested.unwrap_or(DEFAULT_TTL_SECONDS);
    (MIN_TTL_SECONDS..=MAX_TTL_SECONDS)
        .contains(&secs)
        .then_some(Duration::from_secs(secs))
}

/// Whole seconds left in `remaining`, rounded to the nearest second.
///
/// A missing TTL counts as zero.
#[must_use]
pub fn whole_seconds(remaining: Option<Duration>) -> u64 {
    remaining.map_or(0, |d| {
        let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        millis.saturating_add(500) / 1000
    })
}
