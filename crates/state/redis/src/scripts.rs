/// Lua script for atomically reading and deleting a pair of keys.
///
/// KEYS\[1\] = primary key (photo meta)
/// KEYS\[2\] = companion key (photo blob)
///
/// Returns `{primary, companion}` and deletes both when both exist. Returns
/// nil when the primary is missing; deletes the dangling primary and returns
/// nil when only the companion is missing.
pub const TAKE_PAIR: &str = r#"
local primary = redis.call('GET', KEYS[1])
if not primary then
    return nil
end
local companion = redis.call('GET', KEYS[2])
if not companion then
    redis.call('DEL', KEYS[1])
    return nil
end
redis.call('DEL', KEYS[1], KEYS[2])
return {primary, companion}
"#;

/// Lua script for deleting a pair of keys if either exists.
///
/// KEYS\[1\], KEYS\[2\] = keys to remove together
///
/// Returns 1 if anything was deleted, 0 otherwise.
pub const DELETE_PAIR: &str = r"
local existing = redis.call('EXISTS', KEYS[1], KEYS[2])
if existing == 0 then
    return 0
end
redis.call('DEL', KEYS[1], KEYS[2])
return 1
";
