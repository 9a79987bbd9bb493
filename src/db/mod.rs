//! Key-value persistence for client-side collections
//!
//! Values are opaque byte blobs; callers decide the encoding.
use std::io;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Capability to read and write whole blobs by key
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key was never written or cannot be read
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;
}
