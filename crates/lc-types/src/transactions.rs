//! # Transactions
//!
//! The closed set of ledger operations the client constructs and replays.
//! A transaction's hash covers every field except its signatures, so the
//! hash is stable while signature slots are filled in.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::codec::{decode, CodecError};
use crate::hashing::serialize_hash_content;
use crate::{Address, Hash, Signature};

/// An unset signature slot.
pub const EMPTY_SIGNATURE: Signature = [0u8; 64];

/// Transaction kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Account creation
    Acc,
    /// Protocol parameter change
    Config,
    /// Value transfer
    Funds,
    /// Validator staking toggle
    Stake,
    /// Device data transfer
    Iot,
}

/// Account creation issued by an existing (root) account.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccTx {
    /// Header byte
    pub header: u8,
    /// Issuer account hash
    pub issuer: Hash,
    /// Fee
    pub fee: u64,
    /// Public key of the new account
    #[serde_as(as = "Bytes")]
    pub pub_key: Address,
    /// Issuer signature
    #[serde_as(as = "Bytes")]
    pub sig: Signature,
}

impl AccTx {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(1 + 32 + 8 + 64);
        buf.push(self.header);
        buf.extend_from_slice(&self.issuer);
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(&self.pub_key);
        serialize_hash_content(&buf)
    }
}

/// Protocol parameter change; see [`crate::ConfigOption`] for ids.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTx {
    /// Header byte
    pub header: u8,
    /// Parameter id
    pub id: u8,
    /// New parameter value
    pub payload: u64,
    /// Fee
    pub fee: u64,
    /// Root transaction counter
    pub tx_cnt: u8,
    /// Root signature
    #[serde_as(as = "Bytes")]
    pub sig: Signature,
}

impl ConfigTx {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(1 + 1 + 8 + 8 + 1);
        buf.push(self.header);
        buf.push(self.id);
        buf.extend_from_slice(&self.payload.to_be_bytes());
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.push(self.tx_cnt);
        serialize_hash_content(&buf)
    }
}

/// Value transfer. Needs the sender's signature and a co-signature.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsTx {
    /// Header byte
    pub header: u8,
    /// Amount transferred
    pub amount: u64,
    /// Fee paid to the beneficiary
    pub fee: u64,
    /// Sender transaction counter
    pub tx_cnt: u32,
    /// Sender account hash
    pub from: Hash,
    /// Recipient account hash
    pub to: Hash,
    /// Sender signature
    #[serde_as(as = "Bytes")]
    pub sig1: Signature,
    /// Co-signature
    #[serde_as(as = "Bytes")]
    pub sig2: Signature,
}

impl FundsTx {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(1 + 8 + 8 + 4 + 32 + 32);
        buf.push(self.header);
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(&self.tx_cnt.to_be_bytes());
        buf.extend_from_slice(&self.from);
        buf.extend_from_slice(&self.to);
        serialize_hash_content(&buf)
    }
}

/// Validator staking toggle.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeTx {
    /// Header byte
    pub header: u8,
    /// Fee
    pub fee: u64,
    /// New staking flag
    pub is_staking: bool,
    /// Hash of the validator seed
    pub hashed_seed: Hash,
    /// Account hash
    pub account: Hash,
    /// Account signature
    #[serde_as(as = "Bytes")]
    pub sig: Signature,
}

impl StakeTx {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(1 + 8 + 1 + 32 + 32);
        buf.push(self.header);
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.push(self.is_staking as u8);
        buf.extend_from_slice(&self.hashed_seed);
        buf.extend_from_slice(&self.account);
        serialize_hash_content(&buf)
    }
}

/// Device data transfer. Co-signed like [`FundsTx`].
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IotTx {
    /// Header byte
    pub header: u8,
    /// Sender transaction counter
    pub tx_cnt: u32,
    /// Sender account hash
    pub from: Hash,
    /// Recipient account hash
    pub to: Hash,
    /// Opaque device payload
    pub data: Vec<u8>,
    /// Fee
    pub fee: u64,
    /// Device signature
    #[serde_as(as = "Bytes")]
    pub sig1: Signature,
    /// Co-signature
    #[serde_as(as = "Bytes")]
    pub sig2: Signature,
}

impl IotTx {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(1 + 4 + 32 + 32 + 8 + self.data.len());
        buf.push(self.header);
        buf.extend_from_slice(&self.tx_cnt.to_be_bytes());
        buf.extend_from_slice(&self.from);
        buf.extend_from_slice(&self.to);
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(&self.data);
        serialize_hash_content(&buf)
    }
}

/// Any transaction the client handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    /// Account creation
    Acc(AccTx),
    /// Parameter change
    Config(ConfigTx),
    /// Value transfer
    Funds(FundsTx),
    /// Staking toggle
    Stake(StakeTx),
    /// Device data transfer
    Iot(IotTx),
}

impl Transaction {
    /// Decode the payload of a transaction response of the given kind.
    pub fn decode(kind: TxKind, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(match kind {
            TxKind::Acc => Self::Acc(decode(bytes)?),
            TxKind::Config => Self::Config(decode(bytes)?),
            TxKind::Funds => Self::Funds(decode(bytes)?),
            TxKind::Stake => Self::Stake(decode(bytes)?),
            TxKind::Iot => Self::Iot(decode(bytes)?),
        })
    }

    /// Encode only the inner transaction, as it travels on the wire.
    pub fn encode_inner(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Acc(tx) => crate::codec::encode(tx),
            Self::Config(tx) => crate::codec::encode(tx),
            Self::Funds(tx) => crate::codec::encode(tx),
            Self::Stake(tx) => crate::codec::encode(tx),
            Self::Iot(tx) => crate::codec::encode(tx),
        }
    }

    /// Kind tag.
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Acc(_) => TxKind::Acc,
            Self::Config(_) => TxKind::Config,
            Self::Funds(_) => TxKind::Funds,
            Self::Stake(_) => TxKind::Stake,
            Self::Iot(_) => TxKind::Iot,
        }
    }

    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        match self {
            Self::Acc(tx) => tx.hash(),
            Self::Config(tx) => tx.hash(),
            Self::Funds(tx) => tx.hash(),
            Self::Stake(tx) => tx.hash(),
            Self::Iot(tx) => tx.hash(),
        }
    }

    /// Fee paid to the including block's beneficiary.
    pub fn fee(&self) -> u64 {
        match self {
            Self::Acc(tx) => tx.fee,
            Self::Config(tx) => tx.fee,
            Self::Funds(tx) => tx.fee,
            Self::Stake(tx) => tx.fee,
            Self::Iot(tx) => tx.fee,
        }
    }

    /// `true` for kinds that need a sender signature and a co-signature.
    pub fn is_cosigned(&self) -> bool {
        matches!(self, Self::Funds(_) | Self::Iot(_))
    }
}
