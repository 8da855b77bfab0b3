//! # Request/Response Router
//!
//! Inbound frames are decoded through a table keyed by message type and
//! pushed onto one bounded channel per response kind. Header broadcasts fan
//! out to every subscriber instead.
//!
//! A fetch first claims its kind's receiver, so at most one request per
//! kind is outstanding. Values left over from an earlier timed-out request
//! are drained when the next request claims the slot, and values rejected by
//! the caller's predicate are discarded.

use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::time::Duration;

use lc_types::{decode, Account, Block, BlockHeader, Hash, Transaction};
use tokio::sync::{broadcast, mpsc, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::LightClientError;
use crate::wire::{parse_neighbors, split_hashes, MessageType};

/// Capacity of the header announcement fan-out.
const ANNOUNCEMENT_CAPACITY: usize = 64;

/// Channel a response is delivered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ResponseKind {
    /// `BLOCK_RES`
    Block,
    /// `BLOCK_HEADER_RES`
    Header,
    /// `FUNDSTX_RES`
    FundsTx,
    /// `ACCTX_RES`
    AccTx,
    /// `CONFIGTX_RES`
    ConfigTx,
    /// `STAKETX_RES`
    StakeTx,
    /// `ACC_RES` and `ROOTACC_RES`
    Account,
    /// `INTERMEDIATE_NODES_RES`
    IntermediateNodes,
    /// `NEIGHBOR_RES`
    Neighbors,
}

impl ResponseKind {
    const ALL: [ResponseKind; 9] = [
        Self::Block,
        Self::Header,
        Self::FundsTx,
        Self::AccTx,
        Self::ConfigTx,
        Self::StakeTx,
        Self::Account,
        Self::IntermediateNodes,
        Self::Neighbors,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Label used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Header => "block header",
            Self::FundsTx => "funds tx",
            Self::AccTx => "acc tx",
            Self::ConfigTx => "config tx",
            Self::StakeTx => "stake tx",
            Self::Account => "account",
            Self::IntermediateNodes => "intermediate nodes",
            Self::Neighbors => "neighbors",
        }
    }
}

/// A decoded response.
#[derive(Clone, Debug)]
pub enum Response {
    /// Full block
    Block(Block),
    /// Single header
    Header(BlockHeader),
    /// Transaction of any kind
    Tx(Transaction),
    /// Account record; `None` when the node answered with an empty payload
    Account(Option<Account>),
    /// Flat Merkle path
    IntermediateNodes(Vec<Hash>),
    /// Neighbor addresses
    Neighbors(Vec<SocketAddrV4>),
}

/// Where a decoded frame goes.
#[derive(Debug)]
pub enum Routed {
    /// Deliver on a response channel.
    Response(ResponseKind, Response),
    /// Fan out as a new-tip announcement.
    Announcement(BlockHeader),
}

type Decoder = fn(&[u8]) -> Option<Routed>;

fn decode_block(payload: &[u8]) -> Option<Routed> {
    let block = decode::<Block>(payload).ok()?;
    Some(Routed::Response(ResponseKind::Block, Response::Block(block)))
}

fn decode_header(payload: &[u8]) -> Option<Routed> {
    let header = decode::<BlockHeader>(payload).ok()?;
    Some(Routed::Response(ResponseKind::Header, Response::Header(header)))
}

fn decode_announcement(payload: &[u8]) -> Option<Routed> {
    decode::<BlockHeader>(payload).ok().map(Routed::Announcement)
}

fn decode_tx(msg: MessageType, kind: ResponseKind, payload: &[u8]) -> Option<Routed> {
    if payload.is_empty() {
        return None;
    }
    let tx_kind = msg.response_tx_kind()?;
    let tx = Transaction::decode(tx_kind, payload).ok()?;
    Some(Routed::Response(kind, Response::Tx(tx)))
}

fn decode_funds_tx(payload: &[u8]) -> Option<Routed> {
    decode_tx(MessageType::FundsTxRes, ResponseKind::FundsTx, payload)
}

fn decode_acc_tx(payload: &[u8]) -> Option<Routed> {
    decode_tx(MessageType::AccTxRes, ResponseKind::AccTx, payload)
}

fn decode_config_tx(payload: &[u8]) -> Option<Routed> {
    decode_tx(MessageType::ConfigTxRes, ResponseKind::ConfigTx, payload)
}

fn decode_stake_tx(payload: &[u8]) -> Option<Routed> {
    decode_tx(MessageType::StakeTxRes, ResponseKind::StakeTx, payload)
}

fn decode_account(payload: &[u8]) -> Option<Routed> {
    let account = if payload.is_empty() {
        None
    } else {
        Some(decode::<Account>(payload).ok()?)
    };
    Some(Routed::Response(
        ResponseKind::Account,
        Response::Account(account),
    ))
}

fn decode_intermediate_nodes(payload: &[u8]) -> Option<Routed> {
    let nodes = split_hashes(payload)?;
    Some(Routed::Response(
        ResponseKind::IntermediateNodes,
        Response::IntermediateNodes(nodes),
    ))
}

fn decode_neighbors(payload: &[u8]) -> Option<Routed> {
    Some(Routed::Response(
        ResponseKind::Neighbors,
        Response::Neighbors(parse_neighbors(payload)),
    ))
}

fn decoder_table() -> HashMap<MessageType, Decoder> {
    let entries: [(MessageType, Decoder); 11] = [
        (MessageType::BlockHeaderBrdcst, decode_announcement),
        (MessageType::BlockRes, decode_block),
        (MessageType::BlockHeaderRes, decode_header),
        (MessageType::FundsTxRes, decode_funds_tx),
        (MessageType::AccTxRes, decode_acc_tx),
        (MessageType::ConfigTxRes, decode_config_tx),
        (MessageType::StakeTxRes, decode_stake_tx),
        (MessageType::AccRes, decode_account),
        (MessageType::RootAccRes, decode_account),
        (MessageType::IntermediateNodesRes, decode_intermediate_nodes),
        (MessageType::NeighborRes, decode_neighbors),
    ];
    entries.into_iter().collect()
}

struct Slot {
    tx: mpsc::Sender<Response>,
    rx: Mutex<mpsc::Receiver<Response>>,
}

/// Routes inbound frames to waiting requesters.
pub struct Router {
    decoders: HashMap<MessageType, Decoder>,
    slots: Vec<Slot>,
    announcements: broadcast::Sender<BlockHeader>,
}

impl Router {
    /// Create a router with `capacity` buffered values per response kind.
    pub fn new(capacity: usize) -> Self {
        let slots = ResponseKind::ALL
            .iter()
            .map(|_| {
                let (tx, rx) = mpsc::channel(capacity.max(1));
                Slot {
                    tx,
                    rx: Mutex::new(rx),
                }
            })
            .collect();
        let (announcements, _) = broadcast::channel(ANNOUNCEMENT_CAPACITY);

        Self {
            decoders: decoder_table(),
            slots,
            announcements,
        }
    }

    /// Decode and deliver one frame. Unknown and malformed frames are dropped.
    pub fn dispatch(&self, type_id: u8, payload: &[u8]) {
        let Ok(msg) = MessageType::try_from(type_id) else {
            debug!("[lc-net] Dropping frame with unknown type {}", type_id);
            return;
        };
        let Some(decoder) = self.decoders.get(&msg) else {
            debug!("[lc-net] No route for {}", msg);
            return;
        };
        match decoder(payload) {
            Some(Routed::Announcement(header)) => {
                // No subscriber yet is fine; nobody is following the chain.
                let _ = self.announcements.send(header);
            }
            Some(Routed::Response(kind, response)) => {
                if self.slots[kind.index()].tx.try_send(response).is_err() {
                    debug!("[lc-net] {} channel full, dropping response", kind.name());
                }
            }
            None => {
                debug!(
                    "[lc-net] Dropping malformed {} ({} bytes)",
                    msg,
                    payload.len()
                );
            }
        }
    }

    /// Subscribe to new-tip announcements.
    pub fn subscribe_announcements(&self) -> broadcast::Receiver<BlockHeader> {
        self.announcements.subscribe()
    }

    /// Claim the response slot for `kind`, discarding stale values.
    ///
    /// Hold the returned guard across sending the request and waiting.
    pub async fn begin(&self, kind: ResponseKind) -> PendingFetch<'_> {
        let mut rx = self.slots[kind.index()].rx.lock().await;
        while rx.try_recv().is_ok() {}
        PendingFetch { kind, rx }
    }

    /// Wait for any value on `kind`.
    pub async fn fetch(
        &self,
        kind: ResponseKind,
        timeout: Duration,
    ) -> Result<Response, LightClientError> {
        self.begin(kind).await.wait(timeout, |_| true).await
    }
}

/// A claimed response slot.
pub struct PendingFetch<'a> {
    kind: ResponseKind,
    rx: MutexGuard<'a, mpsc::Receiver<Response>>,
}

impl PendingFetch<'_> {
    /// Wait until a value accepted by `accept` arrives or `timeout` elapses.
    ///
    /// # Errors
    /// - `FetchTimedOut` when the deadline passes
    pub async fn wait<F>(
        mut self,
        timeout: Duration,
        mut accept: F,
    ) -> Result<Response, LightClientError>
    where
        F: FnMut(&Response) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(response)) if accept(&response) => return Ok(response),
                Ok(Some(_)) => {
                    debug!("[lc-net] Discarding unexpected {} response", self.kind.name());
                }
                Ok(None) | Err(_) => {
                    return Err(LightClientError::FetchTimedOut {
                        kind: self.kind.name(),
                    })
                }
            }
        }
    }
}
