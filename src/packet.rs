//! Wire-format definitions for protocol packets.
//!
//! Every datagram exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (header fields, flags, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning an
//!   error for truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Sequence Number        |     Acknowledgment Number     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             Flags             |          Payload ...          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 6 bytes (seq(2) + ack(2) + flags(2)),
//! followed by 0–[`MAX_PAYLOAD`] payload bytes.  There is no payload-length
//! field; the payload is whatever remains of the datagram after the header.
//!
//! Sequence and acknowledgment numbers are chunk indices, treated as plain
//! integers rather than a modular ring.  Transfers are therefore limited to
//! 65 535 chunks (~65 MB at the maximum payload size); the u16 field is never
//! allowed to wrap and no wrap-around arithmetic exists anywhere in the crate.

/// Bit-flag constants for the `flags` header field.
pub mod flags {
    /// Synchronise sequence numbers (handshake initiation).
    pub const SYN: u16 = 0b1000;
    /// Acknowledgement field is valid.
    pub const ACK: u16 = 0b0100;
    /// Finish — sender has no more data to send.
    pub const FIN: u16 = 0b0010;
    /// Reserved; never set by this implementation.
    pub const RESERVED: u16 = 0b0001;
}

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 6;

/// Maximum payload bytes per packet.
pub const MAX_PAYLOAD: usize = 994;

/// Maximum encoded packet size ([`HEADER_LEN`] + [`MAX_PAYLOAD`] = 1000).
pub const MAX_PACKET: usize = HEADER_LEN + MAX_PAYLOAD;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 2;
const OFF_FLAGS: usize = 4;

/// Fixed-size protocol header.
///
/// Fields are in host byte order; [`Packet::encode`] converts to big-endian
/// on the wire and [`Packet::decode`] converts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Chunk index of this packet's payload (0 for control packets).
    pub seq: u16,
    /// Acknowledgment number (chunk index being acknowledged).
    pub ack: u16,
    /// Bitmask of [`flags`] constants.  Data packets carry `0`.
    pub flags: u16,
}

impl Header {
    /// `true` when every flag bit in `mask` is set.
    pub fn has(&self, mask: u16) -> bool {
        self.flags & mask == mask
    }
}

/// A complete protocol datagram: header + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a packet from raw header fields and payload.
    pub fn new(seq: u16, ack: u16, flags: u16, payload: Vec<u8>) -> Self {
        Self {
            header: Header { seq, ack, flags },
            payload,
        }
    }

    /// Build a zero-payload control packet (SYN, SYN+ACK, ACK, FIN).
    pub fn control(seq: u16, ack: u16, flags: u16) -> Self {
        Self::new(seq, ack, flags, Vec::new())
    }

    /// Serialise this packet into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];
        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&self.header.seq.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 2].copy_from_slice(&self.header.ack.to_be_bytes());
        buf[OFF_FLAGS..OFF_FLAGS + 2].copy_from_slice(&self.header.flags.to_be_bytes());
        buf[HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Everything after the 6-byte header is the payload.  Returns
    /// [`PacketError::Malformed`] when `buf` is shorter than [`HEADER_LEN`].
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::Malformed { len: buf.len() });
        }

        let seq = u16::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 2].try_into().unwrap());
        let ack = u16::from_be_bytes(buf[OFF_ACK..OFF_ACK + 2].try_into().unwrap());
        let flags = u16::from_be_bytes(buf[OFF_FLAGS..OFF_FLAGS + 2].try_into().unwrap());

        Ok(Packet {
            header: Header { seq, ack, flags },
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    Malformed { len: usize },
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::Malformed { len } => {
                write!(f, "datagram of {len} bytes is too short to contain a header")
            }
        }
    }
}

impl std::error::Error for PacketError {}
