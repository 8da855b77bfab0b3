//! # Domain Module
//!
//! Core types for the light client: the header chain, the reconstructed
//! account projection, sync state and errors.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
