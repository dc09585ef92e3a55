//! `gbn-transfer` — reliable file transfer over UDP using Go-Back-N.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   data packets   ┌───────────┐
//!  │  client  │─────────────────▶│  server   │
//!  └────┬─────┘                  └─────┬─────┘
//!       │            ACKs              │
//!       │◀─────────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────┐
//!  │             Session               │
//!  │ (handshake, data loops, FIN;      │
//!  │  owns SendWindow / Sequencer)     │
//!  └────┬──────────────────────────────┘
//!       │ raw UDP datagrams
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]    — wire format (serialise / deserialise)
//! - [`socket`]    — async UDP socket abstraction
//! - [`window`]    — Go-Back-N outbound window state machine
//! - [`sequencer`] — in-order inbound state machine
//! - [`session`]   — handshake, data transfer, termination
//! - [`fault`]     — injectable staged-loss policies for demonstrations
//! - [`config`]    — CLI value validation
//! - [`report`]    — transfer statistics and throughput
//!
//! The state machines ([`window`], [`sequencer`]) never touch the socket;
//! [`session`] owns all I/O and drives them, one logical thread of execution
//! per side.

pub mod config;
pub mod fault;
pub mod packet;
pub mod report;
pub mod sequencer;
pub mod session;
pub mod socket;
pub mod window;
