//! Protocol parameters adjustable by configuration transactions.

use serde::{Deserialize, Serialize};

use crate::transactions::ConfigTx;

/// Parameter ids carried in [`ConfigTx::id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfigOption {
    /// Maximum block size in bytes
    BlockSize = 1,
    /// Difficulty adjustment interval in blocks
    DifficultyInterval = 2,
    /// Minimum fee
    FeeMinimum = 3,
    /// Target block interval in seconds
    BlockInterval = 4,
    /// Reward credited to a block's beneficiary
    BlockReward = 5,
}

impl TryFrom<u8> for ConfigOption {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::BlockSize),
            2 => Ok(Self::DifficultyInterval),
            3 => Ok(Self::FeeMinimum),
            4 => Ok(Self::BlockInterval),
            5 => Ok(Self::BlockReward),
            other => Err(other),
        }
    }
}

/// Active protocol parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Maximum block size in bytes
    pub block_size: u64,
    /// Difficulty adjustment interval in blocks
    pub diff_interval: u64,
    /// Minimum fee
    pub fee_minimum: u64,
    /// Target block interval in seconds
    pub block_interval: u64,
    /// Beneficiary reward per block
    pub block_reward: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            block_size: 5000,
            diff_interval: 10,
            fee_minimum: 1,
            block_interval: 15,
            block_reward: 10,
        }
    }
}

impl Parameters {
    /// Apply a configuration transaction. Returns `false` for unknown ids
    /// and zero payloads, which leave the parameters untouched.
    pub fn apply(&mut self, tx: &ConfigTx) -> bool {
        if tx.payload == 0 {
            return false;
        }
        let Ok(option) = ConfigOption::try_from(tx.id) else {
            return false;
        };
        match option {
            ConfigOption::BlockSize => self.block_size = tx.payload,
            ConfigOption::DifficultyInterval => self.diff_interval = tx.payload,
            ConfigOption::FeeMinimum => self.fee_minimum = tx.payload,
            ConfigOption::BlockInterval => self.block_interval = tx.payload,
            ConfigOption::BlockReward => self.block_reward = tx.payload,
        }
        true
    }
}
