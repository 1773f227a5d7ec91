//! Durable key-value storage for session tokens and the cart.
//!
//! This module provides:
//! - `FileStore`: a JSON file shared by every process using the same path
//! - `KeyringStore`: one OS keychain entry per key via keyring
//! - `MemoryStore`: in-process storage for tests and throwaway sessions

pub mod file;
pub mod keychain;
pub mod memory;

use anyhow::Result;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// A synchronous string key-value store that survives restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
