//! Frame codec tests

use appdeck::ws::frame::{encode_pong, encode_text, FrameStream, Opcode};
use tokio::io::AsyncWriteExt;

/// Build an unmasked server-side text frame (short length form).
fn server_text(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() < 126);
    let mut frame = vec![0x81, payload.len() as u8];
    frame.extend_from_slice(payload);
    frame
}

#[tokio::test]
async fn test_masked_round_trip() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&encode_text(b"hello world")).await.unwrap();

    let mut ws = FrameStream::new(rx, Vec::new());
    let frame = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.opcode, Opcode::Text);
    assert!(frame.fin);
    assert!(frame.masked);
    assert_eq!(frame.payload, b"hello world");
}

#[tokio::test]
async fn test_round_trip_at_length_boundaries() {
    for len in [0usize, 1, 125, 126, 65535, 65536] {
        let payload = vec![b'z'; len];
        let (mut tx, rx) = tokio::io::duplex(256 * 1024);
        tx.write_all(&encode_text(&payload)).await.unwrap();

        let mut ws = FrameStream::new(rx, Vec::new());
        let frame = ws.read_frame().await.unwrap().unwrap();
        assert_eq!(frame.payload.len(), len, "length {} mangled", len);
        assert_eq!(frame.payload, payload);
    }
}

#[tokio::test]
async fn test_decodes_unmasked_server_frame() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&server_text(b"from server")).await.unwrap();

    let mut ws = FrameStream::new(rx, Vec::new());
    let frame = ws.read_frame().await.unwrap().unwrap();
    assert!(!frame.masked);
    assert_eq!(frame.payload, b"from server");
}

#[tokio::test]
async fn test_pong_round_trip() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&encode_pong(b"heartbeat")).await.unwrap();

    let mut ws = FrameStream::new(rx, Vec::new());
    let frame = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.opcode, Opcode::Pong);
    assert_eq!(frame.payload, b"heartbeat");
}

#[tokio::test]
async fn test_leftover_bytes_are_drained_first() {
    // A whole frame arrived with the handshake response; the socket
    // itself carries the next one.
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&server_text(b"second")).await.unwrap();

    let mut ws = FrameStream::new(rx, server_text(b"first"));
    let first = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(first.payload, b"first");
    let second = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(second.payload, b"second");
}

#[tokio::test]
async fn test_frame_split_across_leftover_and_socket() {
    let full = server_text(b"split frame");
    let (head, tail) = full.split_at(5);

    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(tail).await.unwrap();

    let mut ws = FrameStream::new(rx, head.to_vec());
    let frame = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.payload, b"split frame");
}

#[tokio::test]
async fn test_short_reads_are_reassembled() {
    // TCP may deliver a frame in arbitrary segments; the decoder loops
    // until the header and payload are complete.
    let frame = server_text(b"chunked payload");
    let (head, rest) = frame.split_at(3);
    let (mid, tail) = rest.split_at(7);
    let mock = tokio_test::io::Builder::new()
        .read(head)
        .read(mid)
        .read(tail)
        .build();

    let mut ws = FrameStream::new(mock, Vec::new());
    let out = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(out.payload, b"chunked payload");
}

#[tokio::test]
async fn test_clean_eof_returns_none() {
    let (tx, rx) = tokio::io::duplex(1024);
    drop(tx);

    let mut ws = FrameStream::new(rx, Vec::new());
    assert!(ws.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_payload_returns_none() {
    // Header promises 10 payload bytes but the peer hangs up after 4.
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&[0x81, 10, b'a', b'b', b'c', b'd']).await.unwrap();
    drop(tx);

    let mut ws = FrameStream::new(rx, Vec::new());
    assert!(ws.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_header_returns_none() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&[0x81]).await.unwrap();
    drop(tx);

    let mut ws = FrameStream::new(rx, Vec::new());
    assert!(ws.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_close_frame_opcode() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&[0x88, 0x00]).await.unwrap();

    let mut ws = FrameStream::new(rx, Vec::new());
    let frame = ws.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.opcode, Opcode::Close);
    assert!(frame.payload.is_empty());
}

#[tokio::test]
async fn test_oversized_length_is_a_protocol_violation() {
    // 64-bit extended length far beyond any real log frame.
    let mut bytes = vec![0x81, 127];
    bytes.extend_from_slice(&u64::MAX.to_be_bytes());

    let (mut tx, rx) = tokio::io::duplex(1024);
    tx.write_all(&bytes).await.unwrap();

    let mut ws = FrameStream::new(rx, Vec::new());
    let err = ws.read_frame().await.unwrap_err();
    assert!(err.to_string().contains("Protocol violation"));
}

#[tokio::test]
async fn test_send_text_is_masked_on_the_wire() {
    let (tx, mut rx) = tokio::io::duplex(1024);
    let mut ws = FrameStream::new(tx, Vec::new());
    ws.send_text("subscribe").await.unwrap();

    use tokio::io::AsyncReadExt;
    let mut header = [0u8; 2];
    rx.read_exact(&mut header).await.unwrap();
    assert_eq!(header[0], 0x81);
    assert_ne!(header[1] & 0x80, 0, "client frame must carry the MASK bit");
    assert_eq!(header[1] & 0x7F, 9);
}
