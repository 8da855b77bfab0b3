//! # Adapters Module
//!
//! TCP sessions, the peer pool, the response router and the network-backed
//! [`FullNodeConnection`](crate::ports::FullNodeConnection).

pub mod health;
pub mod network;
pub mod pool;
pub mod router;
pub mod session;

pub use health::HealthMonitor;
pub use network::NetworkClient;
pub use pool::PeerPool;
pub use router::{PendingFetch, Response, ResponseKind, Routed, Router};
pub use session::PeerSession;
