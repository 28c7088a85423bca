pub mod error;
pub mod key;
pub mod script;
pub mod store;
pub mod testing;

pub use error::StateError;
pub use key::{KeyKind, StateKey};
pub use script::AtomicScript;
pub use store::{KvStore, ScriptReply};
