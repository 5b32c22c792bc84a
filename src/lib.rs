/// session-keeper library
///
/// Project discovery caching, session bookkeeping, trigger phrases and
/// backups for working alongside an AI coding assistant.

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod intelligence;
pub mod session;

// Re-exports for convenience
pub use cache::ConfigCache;
pub use config::Settings;
pub use error::{CacheError, KeeperError, Result};
