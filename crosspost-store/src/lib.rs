//! Session store: the registered accounts and where they are persisted.
//!
//! Sessions live in memory as an ordered list and are mirrored, whole, to a
//! key/value backend under the single key [`SESSION_KEY`]. [`FileStorage`] keeps
//! each key in its own JSON file; [`MemoryStorage`] keeps them in process.
pub mod sessions;
pub mod storage;

pub use sessions::{SESSION_KEY, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
