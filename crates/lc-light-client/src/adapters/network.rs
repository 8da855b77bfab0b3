//! # Network Client
//!
//! Implements [`FullNodeConnection`] over the peer pool. Requests go to a
//! random live session and are answered through the router; transaction
//! submissions and co-signer queries dial a fresh connection and read one
//! reply.

use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lc_types::{
    address_hash, decode, short_hex, Account, Block, BlockHeader, FundsTx, Hash, Transaction,
    TxKind,
};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::LightClientConfig;
use crate::domain::{BroadcastTarget, LightClientError};
use crate::ports::FullNodeConnection;
use crate::wire::{encode_intermediate_nodes_req, read_frame, write_frame, Frame, MessageType};

use super::pool::PeerPool;
use super::router::{Response, ResponseKind, Router};
use super::session::PeerSession;

/// Network-backed full node connection.
pub struct NetworkClient {
    config: LightClientConfig,
    pool: Arc<PeerPool>,
    router: Arc<Router>,
    next_id: AtomicU64,
}

impl NetworkClient {
    /// Create a client with an empty pool.
    pub fn new(config: LightClientConfig) -> Self {
        let router = Arc::new(Router::new(config.channel_capacity));
        Self {
            config,
            pool: Arc::new(PeerPool::new()),
            router,
            next_id: AtomicU64::new(1),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &LightClientConfig {
        &self.config
    }

    /// Live sessions.
    pub fn pool(&self) -> &Arc<PeerPool> {
        &self.pool
    }

    /// Inbound router.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dial and handshake `addr`, register the session and start its
    /// receive loop. The session leaves the pool when the loop ends.
    pub async fn connect(&self, addr: &str) -> Result<(), LightClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (session, reader) = PeerSession::connect(
            id,
            addr,
            self.config.listen_port,
            self.config.connect_timeout,
        )
        .await?;

        self.pool.add(Arc::clone(&session));

        let pool = Arc::clone(&self.pool);
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            let addr = session.addr().to_string();
            let err = session.run_receive_loop(reader, router).await;
            warn!("[lc-net] Peer {} disconnected: {}", addr, err);
            pool.remove(id);
        });
        Ok(())
    }

    async fn request<F>(
        &self,
        kind: ResponseKind,
        msg_type: MessageType,
        payload: &[u8],
        accept: F,
    ) -> Result<Response, LightClientError>
    where
        F: FnMut(&Response) -> bool,
    {
        let pending = self.router.begin(kind).await;
        let peer = self
            .pool
            .random_peer()
            .ok_or(LightClientError::NoPeerAvailable)?;

        if let Err(e) = peer.send(msg_type, payload).await {
            self.pool.remove(peer.id());
            return Err(e);
        }
        pending.wait(self.config.fetch_timeout, accept).await
    }

    /// Ask a random peer for its neighbors.
    pub async fn neighbor_req(&self) -> Result<Vec<SocketAddrV4>, LightClientError> {
        match self
            .request(ResponseKind::Neighbors, MessageType::NeighborReq, &[], |_| true)
            .await?
        {
            Response::Neighbors(addrs) => Ok(addrs),
            _ => Err(unexpected(ResponseKind::Neighbors)),
        }
    }

    /// Dial `addr`, write one frame and read exactly one reply.
    ///
    /// # Errors
    /// - `HandshakeFailed` if the dial fails or times out
    /// - `NotFound` with the remote's reason on a `NOT_FOUND` reply
    /// - `FetchTimedOut` if no reply arrives in time
    pub async fn send_tx(
        &self,
        addr: &str,
        payload: &[u8],
        msg_type: MessageType,
    ) -> Result<Frame, LightClientError> {
        let mut stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| LightClientError::HandshakeFailed {
                peer: addr.to_string(),
                reason: "dial timed out".to_string(),
            })?
            .map_err(|e| LightClientError::HandshakeFailed {
                peer: addr.to_string(),
                reason: e.to_string(),
            })?;

        write_frame(&mut stream, addr, msg_type, payload).await?;

        let reply = tokio::time::timeout(self.config.fetch_timeout, read_frame(&mut stream, addr))
            .await
            .map_err(|_| LightClientError::FetchTimedOut { kind: "reply" })??;

        if reply.message_type() == Some(MessageType::NotFound) {
            return Err(LightClientError::NotFound(
                String::from_utf8_lossy(&reply.payload).into_owned(),
            ));
        }
        Ok(reply)
    }
}

fn unexpected(kind: ResponseKind) -> LightClientError {
    LightClientError::FetchTimedOut { kind: kind.name() }
}

fn tx_response_kind(kind: TxKind) -> Option<ResponseKind> {
    match kind {
        TxKind::Funds => Some(ResponseKind::FundsTx),
        TxKind::Acc => Some(ResponseKind::AccTx),
        TxKind::Config => Some(ResponseKind::ConfigTx),
        TxKind::Stake => Some(ResponseKind::StakeTx),
        TxKind::Iot => None,
    }
}

#[async_trait]
impl FullNodeConnection for NetworkClient {
    async fn fetch_header(&self, hash: Option<Hash>) -> Result<BlockHeader, LightClientError> {
        let payload = hash.map(|h| h.to_vec()).unwrap_or_default();
        let response = self
            .request(
                ResponseKind::Header,
                MessageType::BlockHeaderReq,
                &payload,
                |r| match (r, hash) {
                    (Response::Header(h), Some(want)) => h.hash == want,
                    (Response::Header(_), None) => true,
                    _ => false,
                },
            )
            .await?;
        match response {
            Response::Header(header) => {
                debug!("[lc-net] Fetched header with height {}", header.height);
                Ok(header)
            }
            _ => Err(unexpected(ResponseKind::Header)),
        }
    }

    async fn fetch_block(&self, hash: Hash) -> Result<Block, LightClientError> {
        let response = self
            .request(ResponseKind::Block, MessageType::BlockReq, &hash, |r| {
                matches!(r, Response::Block(b) if b.header.hash == hash)
            })
            .await?;
        match response {
            Response::Block(block) => Ok(block),
            _ => Err(unexpected(ResponseKind::Block)),
        }
    }

    async fn fetch_tx(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError> {
        let (Some(response_kind), Some(msg_type)) =
            (tx_response_kind(kind), MessageType::request_for(kind))
        else {
            return Err(LightClientError::NotFound(format!(
                "{:?} transactions are not served by full nodes",
                kind
            )));
        };
        let response = self
            .request(response_kind, msg_type, &hash, |r| {
                matches!(r, Response::Tx(tx) if tx.hash() == hash)
            })
            .await?;
        match response {
            Response::Tx(tx) => Ok(tx),
            _ => Err(unexpected(response_kind)),
        }
    }

    async fn fetch_account(
        &self,
        account_hash: Hash,
        root: bool,
    ) -> Result<Option<Account>, LightClientError> {
        let msg_type = if root {
            MessageType::RootAccReq
        } else {
            MessageType::AccReq
        };
        let response = self
            .request(ResponseKind::Account, msg_type, &account_hash, |r| match r {
                Response::Account(Some(acc)) => address_hash(&acc.address) == account_hash,
                Response::Account(None) => true,
                _ => false,
            })
            .await?;
        match response {
            Response::Account(account) => Ok(account),
            _ => Err(unexpected(ResponseKind::Account)),
        }
    }

    async fn fetch_merkle_path(
        &self,
        block_hash: Hash,
        tx_hash: Hash,
    ) -> Result<Vec<Hash>, LightClientError> {
        let response = self
            .request(
                ResponseKind::IntermediateNodes,
                MessageType::IntermediateNodesReq,
                &encode_intermediate_nodes_req(&block_hash, &tx_hash),
                |_| true,
            )
            .await?;
        match response {
            Response::IntermediateNodes(nodes) => Ok(nodes),
            _ => Err(unexpected(ResponseKind::IntermediateNodes)),
        }
    }

    async fn fetch_non_verified_txs(
        &self,
        account_hash: Hash,
    ) -> Result<Vec<FundsTx>, LightClientError> {
        let reply = self
            .send_tx(
                &self.config.cosigning_addr,
                &account_hash,
                MessageType::FundsTxReq,
            )
            .await?;
        if reply.message_type() != Some(MessageType::FundsTxRes) {
            warn!(
                "[lc-net] Requesting non verified tx for {} failed: reply type {}",
                short_hex(&account_hash),
                reply.type_id
            );
            return Ok(Vec::new());
        }
        Ok(decode::<Vec<FundsTx>>(&reply.payload)?)
    }

    async fn broadcast_tx(
        &self,
        target: BroadcastTarget,
        tx: &Transaction,
    ) -> Result<(), LightClientError> {
        let addr = match target {
            BroadcastTarget::Bootstrap => &self.config.bootstrap_addr,
            BroadcastTarget::CoSigner => &self.config.cosigning_addr,
        };
        let msg_type = MessageType::broadcast_for(tx.kind());
        let reply = self.send_tx(addr, &tx.encode_inner()?, msg_type).await?;
        info!(
            "[lc-net] Sent {} {} to {} (reply type {})",
            msg_type,
            short_hex(&tx.hash()),
            addr,
            reply.type_id
        );
        Ok(())
    }

    fn subscribe_headers(&self) -> broadcast::Receiver<BlockHeader> {
        self.router.subscribe_announcements()
    }
}
