//! # Peer Session
//!
//! One TCP connection to a full node. Outbound writes are serialized by an
//! async mutex over the write half; the read half is owned by a dedicated
//! receive loop that forwards every frame to the [`Router`].

use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::LightClientError;
use crate::wire::{encode_listen_port, read_frame, write_frame, MessageType};

use super::router::Router;

/// A live, handshaken connection.
#[derive(Debug)]
pub struct PeerSession {
    id: u64,
    addr: String,
    listener_port: u16,
    writer: Mutex<OwnedWriteHalf>,
}

impl PeerSession {
    /// Dial `addr`, send `CLIENT_PING` with `listen_port`, and wait for
    /// `CLIENT_PONG`.
    ///
    /// Returns the session and the read half for [`PeerSession::run_receive_loop`].
    ///
    /// # Errors
    /// - `HandshakeFailed` if `addr` has no port, on dial failure, timeout, or
    ///   any reply other than a pong
    pub async fn connect(
        id: u64,
        addr: &str,
        listen_port: u16,
        timeout: Duration,
    ) -> Result<(Arc<Self>, OwnedReadHalf), LightClientError> {
        // Full nodes are dialed on the port they listen on.
        let listener_port = listener_port_of(addr)
            .ok_or_else(|| handshake_failed(addr, "address has no valid port".to_string()))?;

        let handshake = async {
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| handshake_failed(addr, e.to_string()))?;
            let (mut reader, mut writer) = stream.into_split();

            write_frame(
                &mut writer,
                addr,
                MessageType::ClientPing,
                &encode_listen_port(listen_port),
            )
            .await
            .map_err(|e| handshake_failed(addr, e.to_string()))?;

            let reply = read_frame(&mut reader, addr)
                .await
                .map_err(|e| handshake_failed(addr, e.to_string()))?;
            if reply.message_type() != Some(MessageType::ClientPong) {
                return Err(handshake_failed(
                    addr,
                    format!("expected CLIENT_PONG, got type {}", reply.type_id),
                ));
            }
            Ok((reader, writer))
        };

        let (reader, writer) = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| handshake_failed(addr, "timed out".to_string()))??;

        info!("[lc-net] Connected to {}", addr);
        let session = Arc::new(Self {
            id,
            addr: addr.to_string(),
            listener_port,
            writer: Mutex::new(writer),
        });
        Ok((session, reader))
    }

    /// Pool identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Address this session was dialed on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Listening port of the remote, taken from the dialed address.
    pub fn listener_port(&self) -> u16 {
        self.listener_port
    }

    /// Send one frame. The write lock is held for the whole frame.
    pub async fn send(&self, msg_type: MessageType, payload: &[u8]) -> Result<(), LightClientError> {
        let mut writer = self.writer.lock().await;
        debug!(
            "[lc-net] Send {} to {} ({} bytes)",
            msg_type,
            self.addr,
            payload.len()
        );
        write_frame(&mut *writer, &self.addr, msg_type, payload).await
    }

    /// Read frames until the connection fails, forwarding each to `router`.
    ///
    /// Returns the error that ended the loop.
    pub async fn run_receive_loop(
        self: Arc<Self>,
        mut reader: OwnedReadHalf,
        router: Arc<Router>,
    ) -> LightClientError {
        loop {
            match read_frame(&mut reader, &self.addr).await {
                Ok(frame) => {
                    debug!(
                        "[lc-net] Receive message from {}: type {}, {} bytes",
                        self.addr,
                        frame.type_id,
                        frame.payload.len()
                    );
                    router.dispatch(frame.type_id, &frame.payload);
                }
                Err(e) => return e,
            }
        }
    }
}

fn listener_port_of(addr: &str) -> Option<u16> {
    let (_, port) = addr.rsplit_once(':')?;
    port.parse().ok().filter(|port| *port != 0)
}

fn handshake_failed(peer: &str, reason: String) -> LightClientError {
    LightClientError::HandshakeFailed {
        peer: peer.to_string(),
        reason,
    }
}
