//! # Light Client Test Suite
//!
//! Cross-crate tests that run a whole client session against a node.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support/          # Loopback full node speaking the wire protocol
//! │   └── stub_node.rs
//! │
//! └── integration/
//!     ├── scenarios.rs  # Session + in-memory node: sync, replay, forks, staging
//!     ├── persistence.rs# File-backed header store across restarts
//!     └── wire.rs       # Session + NetworkClient against the loopback node
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lc-tests
//!
//! # By category
//! cargo test -p lc-tests integration::scenarios::
//! cargo test -p lc-tests integration::wire::
//!
//! # Benchmarks
//! cargo bench -p lc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
