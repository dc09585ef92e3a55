//! End-to-end transfer tests.
//!
//! Each test spins up both endpoints over loopback as separate tokio tasks
//! and moves a real byte sequence through handshake, Go-Back-N data phase,
//! and FIN, asserting the reconstructed output is byte-identical to the
//! input — with and without staged losses.

use std::net::SocketAddr;

use gbn_transfer::fault::{FaultPolicy, NoFault, SkipSendOnce, WithholdAckOnce};
use gbn_transfer::packet::MAX_PAYLOAD;
use gbn_transfer::report::{RecvStats, SendStats};
use gbn_transfer::session::Session;
use gbn_transfer::socket::Socket;

/// Bind a socket to an OS-assigned port on loopback.
async fn ephemeral() -> Socket {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    Socket::bind(addr).await.expect("bind failed")
}

/// Run one complete transfer of `data` and return both sides' statistics.
async fn run_transfer(
    data: Vec<u8>,
    window: u16,
    mut client_fault: Box<dyn FaultPolicy>,
    mut server_fault: Box<dyn FaultPolicy>,
) -> (SendStats, RecvStats) {
    let server_sock = ephemeral().await;
    let server_addr = server_sock.local_addr;

    let server = tokio::spawn(async move {
        let session = Session::accept(server_sock, window).await.expect("accept");
        session
            .recv_file(server_fault.as_mut())
            .await
            .expect("recv_file")
    });

    let client = tokio::spawn(async move {
        let chunks: Vec<Vec<u8>> = data.chunks(MAX_PAYLOAD).map(|c| c.to_vec()).collect();
        let sock = ephemeral().await;
        let session = Session::connect(sock, server_addr, window)
            .await
            .expect("connect");
        session
            .send_file(&chunks, client_fault.as_mut())
            .await
            .expect("send_file")
    });

    let (recv, send) = tokio::join!(server, client);
    (send.unwrap(), recv.unwrap())
}

/// A deterministic, non-repeating byte pattern of the given length.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// ---------------------------------------------------------------------------
// Test 1: single-chunk round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_single_chunk() {
    let data = b"hello over an unreliable wire".to_vec();
    let (send, recv) = run_transfer(data.clone(), 5, Box::new(NoFault), Box::new(NoFault)).await;

    assert_eq!(recv.data, data);
    assert_eq!(send.bytes_sent, data.len() as u64);
    assert_eq!(recv.bytes_received, data.len() as u64);
}

// ---------------------------------------------------------------------------
// Test 2: multi-chunk round trip, payload boundary exact
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_exact_chunk_boundary() {
    // Three full chunks, no remainder: the last packet is exactly MAX_PAYLOAD.
    let data = pattern(3 * MAX_PAYLOAD);
    let (send, recv) = run_transfer(data.clone(), 3, Box::new(NoFault), Box::new(NoFault)).await;

    assert_eq!(recv.data, data);
    assert_eq!(send.bytes_sent, data.len() as u64, "no retransmissions expected");
}

// ---------------------------------------------------------------------------
// Test 3: larger transfer with a partial final chunk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_partial_final_chunk() {
    let data = pattern(7 * MAX_PAYLOAD + 123);
    let (_send, recv) = run_transfer(data.clone(), 10, Box::new(NoFault), Box::new(NoFault)).await;
    assert_eq!(recv.data, data);
}

// ---------------------------------------------------------------------------
// Test 4: the staged ACK loss — window 3, 10 chunks, ACK for chunk 4 withheld
// ---------------------------------------------------------------------------

#[tokio::test]
async fn withheld_ack_forces_retransmit_and_completes() {
    let data = pattern(10 * MAX_PAYLOAD);
    let (send, recv) = run_transfer(
        data.clone(),
        3,
        Box::new(NoFault),
        Box::new(WithholdAckOnce::new(4)),
    )
    .await;

    assert_eq!(recv.data, data, "transfer must recover and deliver intact");
    assert!(
        send.bytes_sent > data.len() as u64,
        "the dropped chunk and its window successors must have been resent"
    );
}

// ---------------------------------------------------------------------------
// Test 5: staged send suppression on the client side
// ---------------------------------------------------------------------------

#[tokio::test]
async fn suppressed_send_recovers_via_timeout() {
    let data = pattern(10 * MAX_PAYLOAD);
    let (_send, recv) = run_transfer(
        data.clone(),
        3,
        Box::new(SkipSendOnce::new(4)),
        Box::new(NoFault),
    )
    .await;

    assert_eq!(recv.data, data, "the skipped chunk must arrive by retransmission");
}

// ---------------------------------------------------------------------------
// Test 6: smallest window still completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn window_three_many_chunks() {
    let data = pattern(12 * MAX_PAYLOAD + 1);
    let (_send, recv) = run_transfer(data.clone(), 3, Box::new(NoFault), Box::new(NoFault)).await;
    assert_eq!(recv.data, data);
}
