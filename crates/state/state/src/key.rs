use serde::{Deserialize, Serialize};

/// The kind of record being stored. Each kind owns its own key namespace so
/// TTLs and deletions never cross between unrelated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// JSON photo metadata.
    PhotoMeta,
    /// Raw transcoded image bytes.
    PhotoBlob,
    /// Uploader receipt pointing at a photo id.
    Receipt,
    /// Short-lived token issued by an unlock.
    ViewToken,
}

impl KeyKind {
    /// Return the key prefix used for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhotoMeta => "photo:meta",
            Self::PhotoBlob => "photo:blob",
            Self::Receipt => "receipt",
            Self::ViewToken => "photo:viewtoken",
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to address records in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub kind: KeyKind,
    pub id: String,
}

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub fn new(kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key of the metadata record for photo `id`.
    #[must_use]
    pub fn photo_meta(id: impl Into<String>) -> Self {
        Self::new(KeyKind::PhotoMeta, id)
    }

    /// Key of the image bytes for photo `id`.
    #[must_use]
    pub fn photo_blob(id: impl Into<String>) -> Self {
        Self::new(KeyKind::PhotoBlob, id)
    }

    /// Key of the receipt `id`.
    #[must_use]
    pub fn receipt(id: impl Into<String>) -> Self {
        Self::new(KeyKind::Receipt, id)
    }

    /// Key of the view token `token`.
    #[must_use]
    pub fn view_token(token: impl Into<String>) -> Self {
        Self::new(KeyKind::ViewToken, token)
    }

    /// Return a canonical string representation: `kind:id`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
