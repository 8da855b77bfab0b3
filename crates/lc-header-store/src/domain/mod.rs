//! Store domain types.

mod errors;

pub use errors::StoreError;
