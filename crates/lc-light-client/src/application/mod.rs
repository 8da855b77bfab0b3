//! # Application Layer
//!
//! Services that drive the domain through the ports: the header
//! synchronizer, the account reconstructor, the pending-transaction stage
//! and the [`ClientSession`] tying them together.

pub mod reconstructor;
pub mod service;
pub mod staging;
pub mod synchronizer;

pub use reconstructor::{AccountReconstructor, Reconstruction};
pub use service::ClientSession;
pub use staging::PendingTxStage;
pub use synchronizer::{AnnouncementOutcome, HeaderSynchronizer};
