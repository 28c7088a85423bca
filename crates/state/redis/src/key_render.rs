use vanish_state::StateKey;

/// Render a [`StateKey`] into a Redis key string with the given prefix.
///
/// The format is `prefix:kind:id`, or plain `kind:id` for an empty prefix.
pub fn render_key(prefix: &str, key: &StateKey) -> String {
    if prefix.is_empty() {
        key.canonical()
    } else {
        format!("{}:{}", prefix, key.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_prefixed_key() {
        let key = StateKey::photo_meta("abc-123");
        assert_eq!(render_key("vanish", &key), "vanish:photo:meta:abc-123");
    }

    #[test]
    fn renders_bare_key_without_prefix() {
        let key = StateKey::receipt("r1");
        assert_eq!(render_key("", &key), "receipt:r1");
    }

    #[test]
    fn renders_all_kinds() {
        let keys = [
            (StateKey::photo_meta("id"), "p:photo:meta:id"),
            (StateKey::photo_blob("id"), "p:photo:blob:id"),
            (StateKey::receipt("id"), "p:receipt:id"),
            (StateKey::view_token("id"), "p:photo:viewtoken:id"),
        ];
        for (key, expected) in keys {
            assert_eq!(render_key("p", &key), expected);
        }
    }
}
