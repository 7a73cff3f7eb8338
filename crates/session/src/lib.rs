//! `skillhub-session`
//!
//! **Responsibility:** the client's persisted key-value session cache.
//!
//! Values are JSON strings under a small set of well-known keys (see
//! [`keys`]). The cache is read once at startup and written whenever the
//! auth or tenant state changes.

pub mod keys;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;
pub use store::{SessionStore, SessionStoreError, load_json, save_json};
