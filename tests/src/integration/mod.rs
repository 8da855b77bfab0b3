//! # Integration Tests
//!
//! - `scenarios`: a [`lc_light_client::ClientSession`] over the in-memory node
//! - `persistence`: header store reuse across sessions
//! - `wire`: the same session over TCP via [`lc_light_client::NetworkClient`]

pub mod persistence;
pub mod scenarios;
pub mod wire;
