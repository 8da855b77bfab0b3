//! # LC Types
//!
//! Ledger entities consumed by the light client.
//!
//! ## Contents
//!
//! - **Chain**: [`BlockHeader`], [`Block`]
//! - **Transactions**: the closed [`Transaction`] enum over [`AccTx`],
//!   [`ConfigTx`], [`FundsTx`], [`StakeTx`] and [`IotTx`]
//! - **State**: remote [`Account`] records and protocol [`Parameters`]
//! - **Hashing**: [`serialize_hash_content`] (SHA3-256 over canonical
//!   big-endian bytes)
//! - **Codec**: bincode payload encoding used on the wire and in storage

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod entities;
pub mod hashing;
pub mod parameters;
pub mod transactions;

pub use codec::{decode, encode, CodecError};
pub use entities::{Account, Block, BlockHeader};
pub use hashing::{address_hash, serialize_hash_content, short_hex, ZERO_HASH};
pub use parameters::{ConfigOption, Parameters};
pub use transactions::{
    AccTx, ConfigTx, FundsTx, IotTx, StakeTx, Transaction, TxKind, EMPTY_SIGNATURE,
};

/// A 32-byte SHA3-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte signature.
pub type Signature = [u8; 64];

/// An account address: the 64-byte uncompressed public key.
pub type Address = [u8; 64];
