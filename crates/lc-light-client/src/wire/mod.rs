//! # Wire Protocol
//!
//! Frame layout and payload helpers shared with the full-node software.
//!
//! ```text
//! +----------------+---------+------------------+
//! | length: u32 BE | type:u8 | payload (length) |
//! +----------------+---------+------------------+
//! ```

pub mod frame;
pub mod message_type;
pub mod payloads;

pub use frame::{encode_frame, read_frame, write_frame, Frame, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use message_type::MessageType;
pub use payloads::*;
