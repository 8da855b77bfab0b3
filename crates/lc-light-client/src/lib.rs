//! # LC Light Client
//!
//! Light client core for an account-based chain: follows the header chain
//! from full nodes, replays only the blocks relevant to one account, and
//! checks every replayed transaction against its block's Merkle root.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Trust Model
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Header linkage | Every accepted header links to its parent by hash |
//! | Merkle verification | A replayed transaction counts only if its path closes on the header root |
//! | Bounded rollback | A non-linking announcement drops a bounded suffix and re-walks |
//! | Random peers | Each request goes to a randomly chosen session |
//!
//! ## Module Structure
//!
//! ```text
//! lc-light-client/
//! ├── domain/          # HeaderChain, AccountProjection, TxRing, errors
//! ├── algorithms/      # Merkle paths, ancestor walk, block relevance
//! ├── wire/            # Frames, message type ids, payload helpers
//! ├── ports/           # LightClientApi (inbound), FullNodeConnection + TxSigner (outbound)
//! ├── adapters/        # Peer sessions, pool, router, health monitor, NetworkClient
//! ├── application/     # Synchronizer, reconstructor, stage, ClientSession
//! ├── testing.rs       # ChainBuilder over MockFullNode
//! └── config.rs        # LightClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod testing;
pub mod wire;

// Re-exports
pub use adapters::{HealthMonitor, NetworkClient, PeerPool, PeerSession, Router};
pub use algorithms::{
    build_merkle_path, compute_merkle_root, is_relevant, validate_header_batch,
    validate_inclusion, verify_merkle_path, AncestorWalk,
};
pub use application::{
    AccountReconstructor, AnnouncementOutcome, ClientSession, HeaderSynchronizer,
    PendingTxStage, Reconstruction,
};
pub use config::LightClientConfig;
pub use domain::{
    AccountProjection, BroadcastTarget, ChainTip, FinalizeOutcome, FundsTxView, Hash,
    HeaderChain, LightClientError, SyncState, TxRing, TxStatus, TX_RING_CAPACITY,
};
pub use ports::{FullNodeConnection, LightClientApi, MockFullNode, MockSigner, TxSigner};
pub use wire::{Frame, MessageType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
