//! # LC Header Store
//!
//! Persistence for block headers accepted by the synchronizer.
//!
//! The store keeps two buckets:
//!
//! - `blockheaders`: header hash -> encoded header
//! - `lastblockheader`: a single slot holding the encoded chain tip
//!
//! Header encoding is opaque here; callers hand in bytes.
//!
//! ## Module Structure
//!
//! ```text
//! lc-header-store/
//! ├── domain/     # StoreError
//! ├── ports/      # KeyValueStore (driven), HeaderStore (driving)
//! ├── adapters/   # InMemoryKVStore, FileBackedKVStore
//! └── service.rs  # KvHeaderStore: bucket layout over any KeyValueStore
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::StoreError;
pub use ports::{HeaderStore, KeyValueStore};
pub use service::KvHeaderStore;
