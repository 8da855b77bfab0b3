//! # Wire Framer
//!
//! Reads block until the full header, then the full payload, is available.
//! A short read or reset surfaces as `ConnectionAborted`; there is no
//! partial-message return.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::LightClientError;

use super::message_type::MessageType;

/// Header size: 4-byte big-endian payload length plus 1-byte type id.
pub const HEADER_LEN: usize = 5;

/// Largest payload accepted from a peer.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// One decoded frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Raw type id; may be unknown to this client.
    pub type_id: u8,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Frame of a known type.
    pub fn new(msg_type: MessageType, payload: Vec<u8>) -> Self {
        Self {
            type_id: msg_type.id(),
            payload,
        }
    }

    /// Known message type, if any.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.type_id).ok()
    }

    /// Encoded bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        buf.push(self.type_id);
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Encode a frame of `msg_type` carrying `payload`.
pub fn encode_frame(msg_type: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.push(msg_type.id());
    buf.extend_from_slice(payload);
    buf
}

/// Read exactly one frame.
///
/// # Errors
/// - `ConnectionAborted` on EOF, reset, or a length above [`MAX_PAYLOAD_LEN`]
pub async fn read_frame<R>(reader: &mut R, peer: &str) -> Result<Frame, LightClientError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| aborted(peer, e))?;

    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(LightClientError::ConnectionAborted {
            peer: peer.to_string(),
            reason: format!("payload length {} exceeds limit", len),
        });
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| aborted(peer, e))?;

    Ok(Frame {
        type_id: header[4],
        payload,
    })
}

/// Write one frame and flush.
pub async fn write_frame<W>(
    writer: &mut W,
    peer: &str,
    msg_type: MessageType,
    payload: &[u8],
) -> Result<(), LightClientError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&encode_frame(msg_type, payload))
        .await
        .map_err(|e| aborted(peer, e))?;
    writer.flush().await.map_err(|e| aborted(peer, e))
}

fn aborted(peer: &str, err: std::io::Error) -> LightClientError {
    LightClientError::ConnectionAborted {
        peer: peer.to_string(),
        reason: err.to_string(),
    }
}
