//! Session lifecycle: handshake, Go-Back-N data transfer, termination.
//!
//! A [`Session`] owns the complete state for one file transfer — the socket,
//! the peer address, the window size, and the retransmit timeout.  It is
//! created by one of two one-shot handshakes:
//!
//! - [`Session::connect`] — active open (client): SYN → await SYN+ACK → ACK.
//! - [`Session::accept`] — passive open (server): await SYN → SYN+ACK.
//!
//! and then drives exactly one of the two data-phase loops:
//!
//! - [`Session::send_file`] — windowed transmission with timeout-driven
//!   retransmission of the whole outstanding window, followed by a FIN.
//! - [`Session::recv_file`] — strict in-order accept loop, one ACK per
//!   accepted packet, until a FIN arrives.
//!
//! Everything runs on one logical thread of execution: the loops alternate
//! strictly between filling the window and awaiting a response, so no other
//! task ever touches session state.
//!
//! # Timeouts vs. other failures
//!
//! A receive timeout on the sending side is the retransmission trigger, not
//! an error.  A datagram that fails to decode is a protocol violation and is
//! skipped.  Only genuine socket I/O errors abort the transfer.  The three
//! cases are matched explicitly rather than funnelled through one
//! catch-all.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::time;

use crate::fault::FaultPolicy;
use crate::packet::{flags, Packet};
use crate::report::{RecvStats, SendStats};
use crate::sequencer::{Sequencer, Verdict};
use crate::socket::{Socket, SocketError};
use crate::window::SendWindow;

/// Fixed retransmit timeout, also used for the client handshake wait.
pub const RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that abort a transfer.
#[derive(Debug)]
pub enum TransferError {
    /// Underlying socket failure.
    Socket(SocketError),
    /// The client's single handshake attempt received no reply in time.
    HandshakeTimeout,
    /// A handshake packet arrived with the wrong flags.
    HandshakeRejected { flags: u16 },
    /// The file needs more chunks than a 16-bit sequence number can index.
    TooManyChunks { count: usize },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "transfer aborted: {e}"),
            Self::HandshakeTimeout => write!(f, "handshake timed out waiting for a reply"),
            Self::HandshakeRejected { flags } => {
                write!(f, "handshake packet carried unexpected flags {flags:#06b}")
            }
            Self::TooManyChunks { count } => {
                write!(f, "file splits into {count} chunks, more than a u16 sequence number can index")
            }
        }
    }
}

impl std::error::Error for TransferError {}

impl From<SocketError> for TransferError {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One established transfer session.  Never reused: a `Session` carries a
/// single file and is consumed by [`send_file`](Self::send_file) or
/// [`recv_file`](Self::recv_file).
#[derive(Debug)]
pub struct Session {
    socket: Socket,
    peer: SocketAddr,
    window_size: u16,
    timeout: Duration,
}

impl Session {
    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Active open (client side).
    ///
    /// Sends a single SYN and waits [`RETRANSMIT_TIMEOUT`] for a reply with
    /// both SYN and ACK set, then acknowledges it.  There is exactly one
    /// attempt: timeout, a malformed reply, or wrong flags all fail the
    /// handshake immediately.
    pub async fn connect(
        socket: Socket,
        peer: SocketAddr,
        window_size: u16,
    ) -> Result<Self, TransferError> {
        let syn = Packet::control(0, 0, flags::SYN);
        socket.send_to(&syn, peer).await?;
        log::debug!("→ SYN");

        let (reply, from) = match time::timeout(RETRANSMIT_TIMEOUT, socket.recv_from()).await {
            Err(_elapsed) => return Err(TransferError::HandshakeTimeout),
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(v)) => v,
        };

        if !reply.header.has(flags::SYN | flags::ACK) {
            return Err(TransferError::HandshakeRejected {
                flags: reply.header.flags,
            });
        }

        // Acknowledge the SYN+ACK and declare success without waiting for
        // the server to confirm.
        let ack = Packet::control(0, reply.header.seq, flags::ACK);
        socket.send_to(&ack, from).await?;
        log::info!("connection established with {peer}");

        Ok(Self {
            socket,
            peer,
            window_size,
            timeout: RETRANSMIT_TIMEOUT,
        })
    }

    /// Passive open (server side).
    ///
    /// Blocks without a timeout until the first packet arrives.  A SYN is
    /// answered with SYN+ACK and the sender becomes the session peer; any
    /// other first packet fails the handshake.  The client's final ACK is
    /// never verified — the first data packet is proof enough.
    pub async fn accept(socket: Socket, window_size: u16) -> Result<Self, TransferError> {
        let (first, from) = socket.recv_from().await?;

        if !first.header.has(flags::SYN) {
            log::warn!("first packet from {from} was not a SYN");
            return Err(TransferError::HandshakeRejected {
                flags: first.header.flags,
            });
        }

        let syn_ack = Packet::control(0, 0, flags::SYN | flags::ACK);
        socket.send_to(&syn_ack, from).await?;
        log::info!("connection established with {from}");

        Ok(Self {
            socket,
            peer: from,
            window_size,
            timeout: RETRANSMIT_TIMEOUT,
        })
    }

    /// Remote peer of this session.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    // -----------------------------------------------------------------------
    // Sending side
    // -----------------------------------------------------------------------

    /// Transmit `chunks` with Go-Back-N, then terminate the session.
    ///
    /// The loop alternates between two steps until every chunk is
    /// acknowledged: fill the window with new data packets, then await one
    /// response with the session timeout.  An exact-base ACK slides the
    /// window by one; a timeout retransmits every outstanding packet
    /// unchanged.  On completion a single FIN is sent and the session ends
    /// without waiting for a reply.
    pub async fn send_file(
        self,
        chunks: &[Vec<u8>],
        fault: &mut dyn FaultPolicy,
    ) -> Result<SendStats, TransferError> {
        let total = u16::try_from(chunks.len())
            .map_err(|_| TransferError::TooManyChunks { count: chunks.len() })?;

        let mut window = SendWindow::new(self.window_size, total);
        let mut bytes_sent: u64 = 0;
        let started = Instant::now();

        while !window.is_complete() {
            // Fill the window.
            while window.can_send() {
                let seq = window.next_seq();
                let pkt = window.build_data_packet(chunks[seq as usize].clone());
                if fault.skip_send(seq) {
                    log::warn!("→ DATA seq={seq} suppressed (fault injection)");
                } else {
                    self.socket.send_to(&pkt, self.peer).await?;
                    bytes_sent += pkt.payload.len() as u64;
                    log::debug!(
                        "→ DATA seq={seq} len={} in_flight={}",
                        pkt.payload.len(),
                        window.in_flight() + 1
                    );
                }
                window.admit(pkt);
            }

            // Await one response.
            match time::timeout(self.timeout, self.socket.recv_from()).await {
                Err(_elapsed) => {
                    // Go-Back-N: resend every unacked packet, oldest first.
                    log::debug!(
                        "timeout — retransmitting {} packet(s) from base={}",
                        window.in_flight(),
                        window.base()
                    );
                    for pkt in window.unacked_packets() {
                        self.socket.send_to(pkt, self.peer).await?;
                        bytes_sent += pkt.payload.len() as u64;
                        log::debug!("↻ DATA seq={}", pkt.header.seq);
                    }
                }
                Ok(Ok((pkt, from))) => {
                    if from != self.peer {
                        log::debug!("datagram from unknown peer {from} ignored");
                        continue;
                    }
                    let h = &pkt.header;
                    if h.flags == flags::ACK && window.on_ack(h.ack) {
                        log::debug!("← ACK {}", h.ack);
                    } else {
                        log::debug!("← ignored flags={:#06b} ack={}", h.flags, h.ack);
                    }
                }
                Ok(Err(SocketError::Malformed(e))) => {
                    log::warn!("← malformed datagram skipped: {e}");
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        // Termination: one FIN, no acknowledgment awaited; the socket closes
        // when the session drops.
        self.socket
            .send_to(&Packet::control(0, 0, flags::FIN), self.peer)
            .await?;
        log::info!("→ FIN, transfer complete");

        Ok(SendStats {
            bytes_sent,
            elapsed: started.elapsed(),
        })
    }

    // -----------------------------------------------------------------------
    // Receiving side
    // -----------------------------------------------------------------------

    /// Receive a file until the peer's FIN arrives, then reconstruct it.
    ///
    /// Blocks without a timeout for the duration of the transfer.  Only the
    /// exactly-expected sequence number is accepted and acknowledged;
    /// everything else is discarded without a reply.  A zero-length packet
    /// without FIN is a handshake remnant: it is skipped and the
    /// transfer-start timestamp resets so the elapsed time covers only the
    /// data phase.
    pub async fn recv_file(
        self,
        fault: &mut dyn FaultPolicy,
    ) -> Result<RecvStats, TransferError> {
        let mut sequencer = Sequencer::new();
        let mut bytes_received: u64 = 0;
        let mut started = Instant::now();

        loop {
            let (pkt, from) = match self.socket.recv_from().await {
                Ok(v) => v,
                Err(SocketError::Malformed(e)) => {
                    log::debug!("malformed datagram discarded: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if from != self.peer {
                log::debug!("datagram from unknown peer {from} ignored");
                continue;
            }

            if pkt.payload.is_empty() {
                if pkt.header.has(flags::FIN) {
                    log::info!("← FIN");
                    break;
                }
                // Handshake remnant (the client's final ACK): the data phase
                // has not started yet.
                started = Instant::now();
                continue;
            }

            let seq = pkt.header.seq;
            bytes_received += pkt.payload.len() as u64;

            if seq == sequencer.expected() && fault.withhold_ack(seq) {
                // Dropped as if lost in transit: no ACK, no accept.  The
                // sender's timeout will bring it around again.
                log::warn!("← DATA seq={seq} — ACK withheld (fault injection)");
                continue;
            }

            match sequencer.on_data(seq, &pkt.payload) {
                Verdict::Accepted => {
                    let ack = sequencer.ack_packet();
                    self.socket.send_to(&ack, self.peer).await?;
                    log::debug!("← DATA seq={seq} accepted; → ACK {}", ack.header.ack);
                }
                Verdict::Discarded => {
                    log::debug!(
                        "← DATA seq={seq} discarded (expected {})",
                        sequencer.expected()
                    );
                }
            }
        }

        let elapsed = started.elapsed();
        let data = sequencer.reassemble();
        log::info!("reconstructed {} bytes", data.len());

        Ok(RecvStats {
            data,
            bytes_received,
            elapsed,
        })
    }
}
