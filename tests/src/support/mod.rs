//! Shared fixtures for the integration tests.

pub mod stub_node;

pub use stub_node::StubFullNode;
