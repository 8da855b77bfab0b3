//! # Ports Module
//!
//! Hexagonal ports: the public API (inbound) and the network and signing
//! collaborators (outbound).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
