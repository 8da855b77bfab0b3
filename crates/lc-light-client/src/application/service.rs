//! # Client Session
//!
//! Owns the synchronizer, the reconstructor, the pending-transaction stage
//! and the active protocol parameters, and exposes them through
//! [`LightClientApi`].

use std::sync::Arc;

use async_trait::async_trait;
use lc_header_store::HeaderStore;
use lc_types::{
    short_hex, AccTx, Address, ConfigOption, ConfigTx, FundsTx, Hash, IotTx, Parameters,
    Signature, StakeTx, Transaction, EMPTY_SIGNATURE,
};
use parking_lot::RwLock;
use tracing::debug;

use super::reconstructor::AccountReconstructor;
use super::staging::PendingTxStage;
use super::synchronizer::HeaderSynchronizer;
use crate::config::LightClientConfig;
use crate::domain::{
    AccountProjection, ChainTip, FinalizeOutcome, FundsTxView, LightClientError, SyncState,
};
use crate::ports::{FullNodeConnection, LightClientApi, TxSigner};

/// One light client instance.
pub struct ClientSession<N: FullNodeConnection, S: HeaderStore> {
    node: Arc<N>,
    synchronizer: Arc<HeaderSynchronizer<N, S>>,
    reconstructor: AccountReconstructor<N>,
    stage: PendingTxStage,
    active_parameters: RwLock<Parameters>,
}

impl<N: FullNodeConnection, S: HeaderStore> ClientSession<N, S> {
    /// Wire up a session over a node connection and a header store.
    pub fn new(config: LightClientConfig, node: Arc<N>, store: Arc<S>) -> Self {
        let synchronizer = Arc::new(HeaderSynchronizer::new(
            config.clone(),
            Arc::clone(&node),
            store,
        ));
        let reconstructor =
            AccountReconstructor::new(config, Arc::clone(&node), synchronizer.chain());
        Self {
            node,
            synchronizer,
            reconstructor,
            stage: PendingTxStage::new(),
            active_parameters: RwLock::new(Parameters::default()),
        }
    }

    /// The header synchronizer, for spawning its listener.
    pub fn synchronizer(&self) -> Arc<HeaderSynchronizer<N, S>> {
        Arc::clone(&self.synchronizer)
    }

    /// Synchronizer state.
    pub fn sync_state(&self) -> SyncState {
        self.synchronizer.state()
    }

    /// Local chain tip.
    pub fn tip(&self) -> Option<ChainTip> {
        self.synchronizer.tip()
    }

    /// Parameters from the most recent reconstruction.
    pub fn active_parameters(&self) -> Parameters {
        self.active_parameters.read().clone()
    }

    /// Number of staged transactions.
    pub fn staged(&self) -> usize {
        self.stage.len()
    }

    /// Sign with `signer` and finalize.
    pub async fn sign_and_finalize(
        &self,
        hash: Hash,
        signer: &dyn TxSigner,
    ) -> Result<FinalizeOutcome, LightClientError> {
        let signature = signer.sign(&hash)?;
        self.stage
            .finalize(self.node.as_ref(), hash, signature)
            .await
    }

    fn check_fee(&self, fee: u64) -> Result<(), LightClientError> {
        let minimum = self.active_parameters.read().fee_minimum;
        if fee < minimum {
            return Err(LightClientError::InvalidTransaction(format!(
                "fee {} below minimum {}",
                fee, minimum
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<N, S> LightClientApi for ClientSession<N, S>
where
    N: FullNodeConnection + 'static,
    S: HeaderStore + 'static,
{
    fn construct_acc_tx(
        &self,
        header: u8,
        fee: u64,
        issuer: Hash,
        pub_key: Address,
    ) -> Result<Transaction, LightClientError> {
        self.check_fee(fee)?;
        Ok(Transaction::Acc(AccTx {
            header,
            issuer,
            fee,
            pub_key,
            sig: EMPTY_SIGNATURE,
        }))
    }

    fn construct_config_tx(
        &self,
        header: u8,
        id: u8,
        payload: u64,
        fee: u64,
        tx_cnt: u8,
    ) -> Result<Transaction, LightClientError> {
        ConfigOption::try_from(id).map_err(|id| {
            LightClientError::InvalidTransaction(format!("unknown parameter id {}", id))
        })?;
        if payload == 0 {
            return Err(LightClientError::InvalidTransaction(
                "parameter value must be nonzero".into(),
            ));
        }
        self.check_fee(fee)?;
        Ok(Transaction::Config(ConfigTx {
            header,
            id,
            payload,
            fee,
            tx_cnt,
            sig: EMPTY_SIGNATURE,
        }))
    }

    fn construct_funds_tx(
        &self,
        header: u8,
        amount: u64,
        fee: u64,
        tx_cnt: u32,
        from: Hash,
        to: Hash,
    ) -> Result<Transaction, LightClientError> {
        if from == to {
            return Err(LightClientError::InvalidTransaction(format!(
                "sender and recipient are both {}",
                short_hex(&from)
            )));
        }
        self.check_fee(fee)?;
        Ok(Transaction::Funds(FundsTx {
            header,
            amount,
            fee,
            tx_cnt,
            from,
            to,
            sig1: EMPTY_SIGNATURE,
            sig2: EMPTY_SIGNATURE,
        }))
    }

    fn construct_stake_tx(
        &self,
        header: u8,
        fee: u64,
        is_staking: bool,
        hashed_seed: Hash,
        account: Hash,
    ) -> Result<Transaction, LightClientError> {
        self.check_fee(fee)?;
        Ok(Transaction::Stake(StakeTx {
            header,
            fee,
            is_staking,
            hashed_seed,
            account,
            sig: EMPTY_SIGNATURE,
        }))
    }

    fn construct_iot_tx(
        &self,
        header: u8,
        tx_cnt: u32,
        from: Hash,
        to: Hash,
        data: Vec<u8>,
        fee: u64,
    ) -> Result<Transaction, LightClientError> {
        self.check_fee(fee)?;
        Ok(Transaction::Iot(IotTx {
            header,
            tx_cnt,
            from,
            to,
            data,
            fee,
            sig1: EMPTY_SIGNATURE,
            sig2: EMPTY_SIGNATURE,
        }))
    }

    fn stage(&self, tx: Transaction) -> Hash {
        let hash = self.stage.stage(tx);
        debug!("[lc-stage] Staged tx {}", short_hex(&hash));
        hash
    }

    async fn finalize(
        &self,
        hash: Hash,
        signature: Signature,
    ) -> Result<FinalizeOutcome, LightClientError> {
        self.stage
            .finalize(self.node.as_ref(), hash, signature)
            .await
    }

    async fn query_account(
        &self,
        address: &Address,
    ) -> Result<(AccountProjection, Vec<FundsTxView>), LightClientError> {
        let result = self.reconstructor.reconstruct(address).await?;
        *self.active_parameters.write() = result.parameters;
        let recent = result.projection.recent.to_vec();
        Ok((result.projection, recent))
    }
}
