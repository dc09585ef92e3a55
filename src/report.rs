//! Transfer statistics and throughput reporting.
//!
//! The protocol core only counts bytes and measures elapsed time; turning
//! those into a throughput figure (and printing it) happens here, outside
//! the send/receive loops.

use std::time::Duration;

/// What the sending side accomplished.
#[derive(Debug)]
pub struct SendStats {
    /// Payload bytes placed on the wire, retransmissions included.
    pub bytes_sent: u64,
    /// Duration of the data phase (handshake excluded).
    pub elapsed: Duration,
}

/// What the receiving side accomplished.
#[derive(Debug)]
pub struct RecvStats {
    /// The reconstructed file contents.
    pub data: Vec<u8>,
    /// Payload bytes received, duplicates and discards included.
    pub bytes_received: u64,
    /// Duration from the first data packet to the FIN.
    pub elapsed: Duration,
}

/// Throughput in megabits per second.
///
/// Returns 0.0 for a zero-length interval rather than dividing by zero;
/// loopback transfers of tiny files can complete between two clock reads.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (secs * 1_000_000.0)
}
