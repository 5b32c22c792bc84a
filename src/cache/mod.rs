/// Project configuration cache
///
/// Remembers what the project looks like so we don't walk the directory
/// tree on every command. Records are stored as one JSON file and thrown
/// away when they get old or when any tracked file changes.

pub mod config_cache;
pub mod fingerprint;
pub mod models;
pub mod scanner;
pub mod store;

pub use config_cache::ConfigCache;
pub use fingerprint::{epoch_now, fingerprint_all};
pub use models::*;
pub use scanner::ProjectScanner;
pub use store::CacheStore;
