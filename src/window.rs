//! Go-Back-N send-side state machine.
//!
//! [`SendWindow`] maintains a sliding window of up to `window_size` in-flight
//! data packets, indexed by chunk number.
//!
//! # Protocol contract
//!
//! - At most `window_size` packets may be in flight at once.
//! - An ACK is consumed only when its acknowledgment number equals the
//!   current `base` exactly; it then slides the window by **one** packet.
//!   Any other acknowledgment value is ignored.
//! - On timeout, the caller retransmits **all** unacked packets from `base`
//!   onwards, unchanged (go back to N).
//! - Sequence numbers are chunk indices counted up from 0; they never wrap
//!   (see the transfer-size bound documented in [`crate::packet`]).
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::collections::VecDeque;

use crate::packet::Packet;

/// Go-Back-N send-side state for one transfer.
///
/// # Invariants
///
/// ```text
///    base            next_seq
///      │                │
///  ────┼────────────────┼──────────────────▶ chunk index
///      │ <─ in flight ─▶│ <── sendable ───▶
/// ```
///
/// `base ≤ next_seq ≤ base + window_size` and
/// `unacked.len() == next_seq − base` hold between method calls.
#[derive(Debug)]
pub struct SendWindow {
    /// Chunk index of the **oldest** unacked packet (left window edge).
    base: u16,

    /// Chunk index to use for the **next** new packet.
    next_seq: u16,

    /// Maximum number of packets that may be in flight simultaneously (N).
    window_size: u16,

    /// Total number of chunks in the transfer.
    total: u16,

    /// In-flight packets ordered by sequence number (front = oldest).
    unacked: VecDeque<Packet>,
}

impl SendWindow {
    /// Create a new [`SendWindow`] for a transfer of `total` chunks.
    ///
    /// `window_size` is the GBN window size N (≥ 1).
    pub fn new(window_size: u16, total: u16) -> Self {
        assert!(window_size >= 1, "window_size must be at least 1");
        Self {
            base: 0,
            next_seq: 0,
            window_size,
            total,
            unacked: VecDeque::with_capacity(window_size as usize),
        }
    }

    /// `true` when the window has room and unsent chunks remain.
    pub fn can_send(&self) -> bool {
        // Widen before adding: base + window_size may not fit in u16 at the
        // very end of a maximum-length transfer.
        (self.next_seq as u32) < self.base as u32 + self.window_size as u32
            && self.next_seq < self.total
    }

    /// Number of packets currently awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.unacked.len()
    }

    /// `true` when at least one packet is awaiting acknowledgement.
    pub fn has_unacked(&self) -> bool {
        !self.unacked.is_empty()
    }

    /// `true` once every chunk has been sent and acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base >= self.total && self.unacked.is_empty()
    }

    /// Chunk index of the oldest unacked packet.
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Chunk index the next new packet will carry.
    pub fn next_seq(&self) -> u16 {
        self.next_seq
    }

    /// Build the data packet for the next chunk (seq = `next_seq`, ack = 0,
    /// flags = 0).
    ///
    /// Call [`admit`](Self::admit) with the returned packet to place it into
    /// the window and advance `next_seq`.
    pub fn build_data_packet(&self, payload: Vec<u8>) -> Packet {
        Packet::new(self.next_seq, 0, 0, payload)
    }

    /// Place a packet into the window and advance `next_seq`.
    ///
    /// The caller normally transmits the packet first; a fault-injection
    /// policy may instead admit it without transmitting, leaving delivery to
    /// the timeout-driven retransmission path.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the window is already full.  Check
    /// [`can_send`](Self::can_send) before calling.
    pub fn admit(&mut self, packet: Packet) {
        debug_assert!(
            self.can_send(),
            "admit called on a full window ({} / {})",
            self.unacked.len(),
            self.window_size
        );
        debug_assert_eq!(packet.header.seq, self.next_seq);
        self.unacked.push_back(packet);
        self.next_seq += 1;
    }

    /// Process an acknowledgment number from a pure-ACK packet.
    ///
    /// Consumes the ACK only when `ack` equals the current `base`: the oldest
    /// unacked packet is dropped and the window slides by one.  Returns `true`
    /// in that case.  Every other acknowledgment value (stale, duplicate, or
    /// ahead of `base`) returns `false` and leaves the window untouched.
    pub fn on_ack(&mut self, ack: u16) -> bool {
        if ack != self.base || self.unacked.is_empty() {
            return false;
        }
        self.unacked.pop_front();
        self.base += 1;
        true
    }

    /// Iterate over all in-flight packets from oldest to newest.
    ///
    /// Used by the session layer to retransmit every unacked packet on
    /// timeout (the "go back N" step).  The packets are returned exactly as
    /// first admitted, so retransmissions are byte-identical.
    pub fn unacked_packets(&self) -> impl Iterator<Item = &Packet> {
        self.unacked.iter()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: admit one chunk with a recognisable payload.
    fn admit_chunk(w: &mut SendWindow) -> Packet {
        let pkt = w.build_data_packet(vec![w.next_seq() as u8; 4]);
        w.admit(pkt.clone());
        pkt
    }

    #[test]
    fn initial_state() {
        let w = SendWindow::new(5, 10);
        assert_eq!(w.base(), 0);
        assert_eq!(w.next_seq(), 0);
        assert!(w.can_send());
        assert!(!w.has_unacked());
        assert!(!w.is_complete());
    }

    #[test]
    fn admit_advances_next_seq() {
        let mut w = SendWindow::new(5, 10);
        admit_chunk(&mut w);
        assert_eq!(w.next_seq(), 1);
        assert_eq!(w.base(), 0); // not acked yet
        assert_eq!(w.in_flight(), 1);
    }

    #[test]
    fn window_full_blocks_send() {
        let mut w = SendWindow::new(3, 10);
        for _ in 0..3 {
            admit_chunk(&mut w);
        }
        assert!(!w.can_send(), "window should be full");
        assert_eq!(w.in_flight(), 3);
    }

    #[test]
    fn in_flight_never_exceeds_window_size() {
        let mut w = SendWindow::new(3, 10);
        let mut acked = 0u16;
        while !w.is_complete() {
            while w.can_send() {
                admit_chunk(&mut w);
                assert!(w.in_flight() <= 3, "window bound violated");
            }
            assert!(w.on_ack(acked));
            acked += 1;
        }
        assert_eq!(acked, 10);
    }

    #[test]
    fn ack_at_base_slides_window_by_one() {
        let mut w = SendWindow::new(3, 10);
        for _ in 0..3 {
            admit_chunk(&mut w);
        }
        assert!(w.on_ack(0));
        assert_eq!(w.base(), 1);
        assert_eq!(w.in_flight(), 2);
        assert!(w.can_send(), "one slot should have opened");
    }

    #[test]
    fn ack_not_at_base_is_ignored() {
        let mut w = SendWindow::new(3, 10);
        for _ in 0..3 {
            admit_chunk(&mut w);
        }
        // Ahead of base: must not slide past the gap.
        assert!(!w.on_ack(2));
        assert_eq!(w.base(), 0);
        assert_eq!(w.in_flight(), 3);
        // Stale (behind base).
        assert!(w.on_ack(0));
        assert!(!w.on_ack(0));
        assert_eq!(w.base(), 1);
    }

    #[test]
    fn unacked_packets_are_byte_identical_on_retransmit() {
        let mut w = SendWindow::new(3, 10);
        let sent: Vec<Packet> = (0..3).map(|_| admit_chunk(&mut w)).collect();
        assert!(w.on_ack(0));

        // What remains for retransmission is exactly what was first admitted.
        let remaining: Vec<&Packet> = w.unacked_packets().collect();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].encode(), sent[1].encode());
        assert_eq!(remaining[1].encode(), sent[2].encode());
    }

    #[test]
    fn complete_after_all_acked() {
        let mut w = SendWindow::new(5, 2);
        admit_chunk(&mut w);
        admit_chunk(&mut w);
        assert!(!w.can_send(), "only two chunks in the transfer");
        assert!(w.on_ack(0));
        assert!(!w.is_complete());
        assert!(w.on_ack(1));
        assert!(w.is_complete());
    }

    #[test]
    fn invariant_unacked_len_tracks_edges() {
        let mut w = SendWindow::new(5, 8);
        for _ in 0..5 {
            admit_chunk(&mut w);
            assert_eq!(w.in_flight() as u16, w.next_seq() - w.base());
        }
        for ack in 0..3 {
            assert!(w.on_ack(ack));
            assert_eq!(w.in_flight() as u16, w.next_seq() - w.base());
        }
    }
}
