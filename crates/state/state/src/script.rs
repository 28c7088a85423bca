/// Multi-key sequences a backend must run as one indivisible step.
///
/// Every backend implements each script so that no other operation touching
/// the same keys can interleave with it. The reply shape is shared:
/// `None` means "nothing happened", `Some(values)` carries whatever the script
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicScript {
    /// KEYS\[1\] = primary, KEYS\[2\] = companion.
    ///
    /// Primary absent: `None`. Companion absent: primary is deleted, `None`.
    /// Otherwise both are deleted and returned as `Some([primary, companion])`.
    TakePair,

    /// KEYS\[1\], KEYS\[2\] = keys to remove together.
    ///
    /// Neither exists: `None`. Otherwise both are deleted and `Some([])` is
    /// returned.
    DeletePair,
}

impl AtomicScript {
    /// Number of keys the script operates on.
    #[must_use]
    pub fn key_count(self) -> usize {
        match self {
            Self::TakePair | Self::DeletePair => 2,
        }
    }

    /// Short name used in logs and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TakePair => "take_pair",
            Self::DeletePair => "delete_pair",
        }
    }
}

impl std::fmt::Display for AtomicScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
