//! # Loopback Full Node
//!
//! Serves a [`MockFullNode`] over TCP with the node wire protocol, so a
//! [`lc_light_client::NetworkClient`] can be driven end to end.
//!
//! One listener plays both remote roles:
//!
//! | Request | Reply |
//! |---------|-------|
//! | `CLIENT_PING` | `CLIENT_PONG`, then header announcements are pushed |
//! | `BLOCK_HEADER_REQ` | `BLOCK_HEADER_RES` (empty payload asks for the tip) |
//! | `BLOCK_REQ` | `BLOCK_RES` |
//! | `*TX_REQ` | matching `*TX_RES`; an unknown `FUNDSTX_REQ` hash is read as an account and answered with its non-verified transfers |
//! | `ACC_REQ` / `ROOTACC_REQ` | `ACC_RES` / `ROOTACC_RES`, empty if unknown |
//! | `INTERMEDIATE_NODES_REQ` | `INTERMEDIATE_NODES_RES` |
//! | `*_BRDCST` | `TX_BRDCST_ACK`; the transaction is recorded |
//!
//! Anything the backend cannot answer is left unanswered, which the client
//! sees as a fetch timeout.

use std::sync::Arc;

use lc_light_client::wire::{
    decode_intermediate_nodes_req, encode_neighbors, join_hashes, read_frame, write_frame, Frame,
};
use lc_light_client::{FullNodeConnection, MessageType, MockFullNode};
use lc_types::{encode, Hash, Transaction, TxKind};
use parking_lot::Mutex;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

const PEER: &str = "light-client";

/// Full node stub bound to a loopback port.
pub struct StubFullNode {
    addr: String,
    backend: Arc<MockFullNode>,
    submissions: Arc<Mutex<Vec<Transaction>>>,
    accept_loop: JoinHandle<()>,
}

impl StubFullNode {
    /// Bind `127.0.0.1:0` and start accepting connections.
    pub async fn spawn(backend: Arc<MockFullNode>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();
        let submissions = Arc::new(Mutex::new(Vec::new()));

        let accept_backend = Arc::clone(&backend);
        let accept_submissions = Arc::clone(&submissions);
        let accept_loop = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(
                    socket,
                    Arc::clone(&accept_backend),
                    Arc::clone(&accept_submissions),
                ));
            }
        });

        Ok(Self {
            addr,
            backend,
            submissions,
            accept_loop,
        })
    }

    /// `host:port` to dial.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The node state behind the socket.
    pub fn backend(&self) -> &Arc<MockFullNode> {
        &self.backend
    }

    /// Transactions received through broadcast frames, in arrival order.
    pub fn submissions(&self) -> Vec<Transaction> {
        self.submissions.lock().clone()
    }
}

impl Drop for StubFullNode {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(
    socket: TcpStream,
    backend: Arc<MockFullNode>,
    submissions: Arc<Mutex<Vec<Transaction>>>,
) {
    let (mut reader, writer) = socket.into_split();
    let writer = Arc::new(tokio::sync::Mutex::new(writer));
    let mut forwarder: Option<JoinHandle<()>> = None;

    while let Ok(frame) = read_frame(&mut reader, PEER).await {
        if frame.message_type() == Some(MessageType::ClientPing) && forwarder.is_none() {
            forwarder = Some(forward_announcements(&backend, Arc::clone(&writer)));
        }

        let Some((reply_type, payload)) = respond(&backend, &submissions, &frame).await else {
            debug!("[stub-node] No reply for message type {}", frame.type_id);
            continue;
        };
        let mut guard = writer.lock().await;
        if write_frame(&mut *guard, PEER, reply_type, &payload)
            .await
            .is_err()
        {
            break;
        }
    }

    if let Some(task) = forwarder {
        task.abort();
    }
}

/// Push every header announced on the backend to this connection.
fn forward_announcements(
    backend: &MockFullNode,
    writer: Arc<tokio::sync::Mutex<OwnedWriteHalf>>,
) -> JoinHandle<()> {
    let mut announcements = backend.subscribe_headers();
    tokio::spawn(async move {
        loop {
            let header = match announcements.recv().await {
                Ok(header) => header,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            let Ok(payload) = encode(&header) else {
                continue;
            };
            let mut guard = writer.lock().await;
            if write_frame(&mut *guard, PEER, MessageType::BlockHeaderBrdcst, &payload)
                .await
                .is_err()
            {
                break;
            }
        }
    })
}

async fn respond(
    backend: &MockFullNode,
    submissions: &Mutex<Vec<Transaction>>,
    frame: &Frame,
) -> Option<(MessageType, Vec<u8>)> {
    let msg_type = frame.message_type()?;
    match msg_type {
        MessageType::ClientPing => Some((MessageType::ClientPong, Vec::new())),
        MessageType::NeighborReq => Some((MessageType::NeighborRes, encode_neighbors(&[]))),
        MessageType::BlockHeaderReq => {
            let hash = if frame.payload.is_empty() {
                None
            } else {
                Some(to_hash(&frame.payload)?)
            };
            let header = backend.fetch_header(hash).await.ok()?;
            Some((MessageType::BlockHeaderRes, encode(&header).ok()?))
        }
        MessageType::BlockReq => {
            let block = backend.fetch_block(to_hash(&frame.payload)?).await.ok()?;
            Some((MessageType::BlockRes, encode(&block).ok()?))
        }
        MessageType::FundsTxReq => {
            let hash = to_hash(&frame.payload)?;
            match backend.fetch_tx(TxKind::Funds, hash).await {
                Ok(tx) => Some((MessageType::FundsTxRes, tx.encode_inner().ok()?)),
                Err(_) => {
                    let pending = backend.fetch_non_verified_txs(hash).await.ok()?;
                    Some((MessageType::FundsTxRes, encode(&pending).ok()?))
                }
            }
        }
        MessageType::AccTxReq => tx_reply(backend, TxKind::Acc, MessageType::AccTxRes, frame).await,
        MessageType::ConfigTxReq => {
            tx_reply(backend, TxKind::Config, MessageType::ConfigTxRes, frame).await
        }
        MessageType::StakeTxReq => {
            tx_reply(backend, TxKind::Stake, MessageType::StakeTxRes, frame).await
        }
        MessageType::AccReq | MessageType::RootAccReq => {
            let root = msg_type == MessageType::RootAccReq;
            let reply_type = if root {
                MessageType::RootAccRes
            } else {
                MessageType::AccRes
            };
            let account = backend
                .fetch_account(to_hash(&frame.payload)?, root)
                .await
                .ok()?;
            let payload = match account {
                Some(account) => encode(&account).ok()?,
                None => Vec::new(),
            };
            Some((reply_type, payload))
        }
        MessageType::IntermediateNodesReq => {
            let (block_hash, tx_hash) = decode_intermediate_nodes_req(&frame.payload)?;
            let path = backend.fetch_merkle_path(block_hash, tx_hash).await.ok()?;
            Some((MessageType::IntermediateNodesRes, join_hashes(&path)))
        }
        MessageType::FundsTxBrdcst
        | MessageType::AccTxBrdcst
        | MessageType::ConfigTxBrdcst
        | MessageType::StakeTxBrdcst
        | MessageType::IotTxBrdcst => {
            let kind = broadcast_kind(msg_type)?;
            let tx = Transaction::decode(kind, &frame.payload).ok()?;
            submissions.lock().push(tx);
            Some((MessageType::TxBrdcstAck, Vec::new()))
        }
        _ => None,
    }
}

async fn tx_reply(
    backend: &MockFullNode,
    kind: TxKind,
    reply_type: MessageType,
    frame: &Frame,
) -> Option<(MessageType, Vec<u8>)> {
    let tx = backend.fetch_tx(kind, to_hash(&frame.payload)?).await.ok()?;
    Some((reply_type, tx.encode_inner().ok()?))
}

fn broadcast_kind(msg_type: MessageType) -> Option<TxKind> {
    [
        TxKind::Funds,
        TxKind::Acc,
        TxKind::Config,
        TxKind::Stake,
        TxKind::Iot,
    ]
    .into_iter()
    .find(|kind| MessageType::broadcast_for(*kind) == msg_type)
}

fn to_hash(payload: &[u8]) -> Option<Hash> {
    payload.try_into().ok()
}
