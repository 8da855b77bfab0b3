//! # Inbound Ports
//!
//! The four operations the light client exposes to a CLI or REST front-end.

use async_trait::async_trait;
use lc_types::{Address, Hash, Signature, Transaction};

use crate::domain::{AccountProjection, FinalizeOutcome, FundsTxView, LightClientError};

/// Light Client API - inbound port.
#[async_trait]
pub trait LightClientApi: Send + Sync {
    /// Unsigned account creation issued by `issuer` for `pub_key`.
    fn construct_acc_tx(
        &self,
        header: u8,
        fee: u64,
        issuer: Hash,
        pub_key: Address,
    ) -> Result<Transaction, LightClientError>;

    /// Unsigned parameter change. `id` must name a known parameter.
    fn construct_config_tx(
        &self,
        header: u8,
        id: u8,
        payload: u64,
        fee: u64,
        tx_cnt: u8,
    ) -> Result<Transaction, LightClientError>;

    /// Unsigned value transfer.
    fn construct_funds_tx(
        &self,
        header: u8,
        amount: u64,
        fee: u64,
        tx_cnt: u32,
        from: Hash,
        to: Hash,
    ) -> Result<Transaction, LightClientError>;

    /// Unsigned staking toggle.
    fn construct_stake_tx(
        &self,
        header: u8,
        fee: u64,
        is_staking: bool,
        hashed_seed: Hash,
        account: Hash,
    ) -> Result<Transaction, LightClientError>;

    /// Unsigned device data transfer.
    fn construct_iot_tx(
        &self,
        header: u8,
        tx_cnt: u32,
        from: Hash,
        to: Hash,
        data: Vec<u8>,
        fee: u64,
    ) -> Result<Transaction, LightClientError>;

    /// Stage an unsigned transaction; returns its canonical hash.
    fn stage(&self, tx: Transaction) -> Hash;

    /// Attach `signature` to the staged transaction and broadcast it.
    async fn finalize(
        &self,
        hash: Hash,
        signature: Signature,
    ) -> Result<FinalizeOutcome, LightClientError>;

    /// Rebuild the account from the synchronized chain.
    ///
    /// Returns the projection and its recent transfers, most recent last.
    async fn query_account(
        &self,
        address: &Address,
    ) -> Result<(AccountProjection, Vec<FundsTxView>), LightClientError>;
}
