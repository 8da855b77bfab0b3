//! Fixed-layout payloads that do not go through the entity codec.

use std::net::{Ipv4Addr, SocketAddrV4};

use lc_types::Hash;

/// Size of one neighbor entry: IPv4 octets plus a big-endian port.
pub const NEIGHBOR_ENTRY_LEN: usize = 6;

/// Handshake payload: the client's listening port, big-endian.
pub fn encode_listen_port(port: u16) -> [u8; 2] {
    port.to_be_bytes()
}

/// Listening port from a handshake payload.
pub fn decode_listen_port(payload: &[u8]) -> Option<u16> {
    match payload {
        [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

/// Parse a neighbor list. A trailing partial entry is ignored.
pub fn parse_neighbors(payload: &[u8]) -> Vec<SocketAddrV4> {
    payload
        .chunks_exact(NEIGHBOR_ENTRY_LEN)
        .map(|entry| {
            let ip = Ipv4Addr::new(entry[0], entry[1], entry[2], entry[3]);
            let port = u16::from_be_bytes([entry[4], entry[5]]);
            SocketAddrV4::new(ip, port)
        })
        .collect()
}

/// Encode a neighbor list.
pub fn encode_neighbors(addrs: &[SocketAddrV4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(addrs.len() * NEIGHBOR_ENTRY_LEN);
    for addr in addrs {
        buf.extend_from_slice(&addr.ip().octets());
        buf.extend_from_slice(&addr.port().to_be_bytes());
    }
    buf
}

/// `INTERMEDIATE_NODES_REQ` payload: `block_hash ‖ tx_hash`.
pub fn encode_intermediate_nodes_req(block_hash: &Hash, tx_hash: &Hash) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(block_hash);
    buf.extend_from_slice(tx_hash);
    buf
}

/// Inverse of [`encode_intermediate_nodes_req`].
pub fn decode_intermediate_nodes_req(payload: &[u8]) -> Option<(Hash, Hash)> {
    if payload.len() != 64 {
        return None;
    }
    let mut block_hash = [0u8; 32];
    let mut tx_hash = [0u8; 32];
    block_hash.copy_from_slice(&payload[..32]);
    tx_hash.copy_from_slice(&payload[32..]);
    Some((block_hash, tx_hash))
}

/// Split a concatenation of 32-byte hashes. `None` if the length is not a
/// multiple of 32.
pub fn split_hashes(payload: &[u8]) -> Option<Vec<Hash>> {
    if payload.len() % 32 != 0 {
        return None;
    }
    Some(
        payload
            .chunks_exact(32)
            .map(|chunk| {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect(),
    )
}

/// Concatenate hashes.
pub fn join_hashes(hashes: &[Hash]) -> Vec<u8> {
    hashes.iter().flat_map(|h| h.iter().copied()).collect()
}
