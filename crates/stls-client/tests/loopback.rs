// ============================================
// File: crates/stls-client/tests/loopback.rs
// ============================================
//! End-to-end sessions against an in-process server on 127.0.0.1.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use stls_client::{Client, ClientConfig, ClientError, EndReason};
use stls_common::time::Timestamp;
use stls_core::crypto::mac::hmac_sha256;
use stls_core::crypto::{
    derive_key_schedule, seal_record, DefaultRecordCrypto, KeySchedule, Nonce, RecordCrypto,
    ServerIdentity,
};
use stls_core::protocol::{encode_frame, FrameLayout, MessageType, Record, HEADER_SIZE};

// ============================================
// Scripted Server
// ============================================

struct ServerOptions {
    identity: ServerIdentity,
    layout: FrameLayout,
    corrupt_tag: bool,
}

impl ServerOptions {
    fn new() -> Self {
        let now = Timestamp::now();
        Self {
            identity: ServerIdentity::generate("localhost", now.offset(-60), now.offset(3600))
                .unwrap(),
            layout: FrameLayout::Canonical,
            corrupt_tag: false,
        }
    }
}

fn send(stream: &mut TcpStream, message_type: MessageType, payload: &[u8]) -> Vec<u8> {
    let wire = encode_frame(message_type, payload, FrameLayout::Canonical).unwrap();
    stream.write_all(&wire).unwrap();
    wire.to_vec()
}

/// Reads a client message, parsing the length the way `layout` writes it.
fn read_message(stream: &mut TcpStream, layout: FrameLayout) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).ok()?;
    let length = match (layout, header[0]) {
        (FrameLayout::Legacy, 0x03) => u32::from_le_bytes([header[1], header[2], header[3], 0]),
        _ => u32::from_be_bytes([0, header[1], header[2], header[3]]),
    } as usize;
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).ok()?;
    Some((header.to_vec(), payload))
}

/// Server half of the handshake. `None` if the client gave up.
fn server_handshake(stream: &mut TcpStream, options: &ServerOptions) -> Option<KeySchedule> {
    let mut transcript = Vec::new();

    let mut hello = [0u8; HEADER_SIZE];
    stream.read_exact(&mut hello).ok()?;
    assert_eq!(hello, [0x01, 0x00, 0x00, 0x00]);
    transcript.extend_from_slice(&hello);

    let server_nonce = Nonce::generate();
    let mut payload = server_nonce.as_bytes().to_vec();
    payload.extend_from_slice(&options.identity.certificate().to_bytes());
    transcript.extend_from_slice(&send(stream, MessageType::Certificate, &payload));

    let (header, sealed) = read_message(stream, options.layout)?;
    assert_eq!(header[0], MessageType::EncryptedNonce.as_byte());
    transcript.extend_from_slice(&header);
    transcript.extend_from_slice(&sealed);

    let client_nonce = options.identity.open_nonce(&sealed).unwrap();
    let keys = derive_key_schedule(&client_nonce, &server_nonce).unwrap();

    let mut tag = hmac_sha256(&keys.server_integrity, &transcript).unwrap();
    if options.corrupt_tag {
        tag[0] ^= 0xFF;
    }
    send(stream, MessageType::Hash, &tag);

    let (header, client_tag) = read_message(stream, options.layout)?;
    assert_eq!(header, [0x04, 0x00, 0x00, 0x20]);
    let expected = hmac_sha256(&keys.client_integrity, &transcript).unwrap();
    assert_eq!(client_tag, expected);

    Some(keys)
}

fn spawn_server<F>(script: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        script(stream);
    });
    (port, handle)
}

fn client_config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.connection.host = "127.0.0.1".into();
    config.connection.port = port;
    config.connection.read_timeout_secs = Some(10);
    config
}

fn data_frame(stream: &mut TcpStream, keys: &KeySchedule, sequence: u32, chunk: &[u8]) {
    let payload = seal_record(&DefaultRecordCrypto::new(), keys, sequence, chunk).unwrap();
    send(stream, MessageType::Data, &payload);
}

fn forged_frame(stream: &mut TcpStream, keys: &KeySchedule, sequence: u32, chunk: &[u8]) {
    let record = Record {
        sequence,
        chunk: chunk.to_vec().into(),
        tag: [0u8; 32],
    };
    let payload = DefaultRecordCrypto::new()
        .encrypt(&keys.server_encryption, &record.to_plaintext())
        .unwrap();
    send(stream, MessageType::Data, &payload);
}

fn image() -> Vec<u8> {
    (0..10_000u32).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}

// ============================================
// Tests
// ============================================

#[test]
fn test_image_transfer() {
    let (port, server) = spawn_server(|mut stream| {
        let options = ServerOptions::new();
        let keys = server_handshake(&mut stream, &options).unwrap();

        let image = image();
        let chunks: Vec<&[u8]> = image.chunks(1024).collect();
        data_frame(&mut stream, &keys, 0, chunks[0]);
        // Replay, forgery and a skip-ahead are all ignored
        data_frame(&mut stream, &keys, 0, chunks[0]);
        forged_frame(&mut stream, &keys, 1, b"not part of the image");
        data_frame(&mut stream, &keys, 5, chunks[5]);
        for (i, chunk) in chunks.iter().enumerate().skip(1) {
            data_frame(&mut stream, &keys, i as u32, chunk);
        }
    });

    let transfer = Client::new(client_config(port)).run().unwrap();
    server.join().unwrap();

    assert_eq!(transfer.data, image());
    assert_eq!(transfer.report.accepted, 10);
    assert_eq!(transfer.report.dropped, 3);
    assert_eq!(transfer.report.last_sequence(), Some(9));
    assert_eq!(transfer.report.end, EndReason::Closed);
}

#[test]
fn test_legacy_framing() {
    let (port, server) = spawn_server(|mut stream| {
        let mut options = ServerOptions::new();
        options.layout = FrameLayout::Legacy;
        let keys = server_handshake(&mut stream, &options).unwrap();
        data_frame(&mut stream, &keys, 0, b"legacy ok");
    });

    let mut config = client_config(port);
    config.protocol.frame_layout = FrameLayout::Legacy;
    let transfer = Client::new(config).run().unwrap();
    server.join().unwrap();

    assert_eq!(transfer.data, b"legacy ok");
}

#[test]
fn test_expired_certificate() {
    let (port, server) = spawn_server(|mut stream| {
        let mut options = ServerOptions::new();
        options.identity = ServerIdentity::generate(
            "localhost",
            Timestamp::from_secs(0),
            Timestamp::from_secs(1),
        )
        .unwrap();
        assert!(server_handshake(&mut stream, &options).is_none());
    });

    let err = Client::new(client_config(port)).run().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::InvalidCertificate { .. }));
}

#[test]
fn test_forged_server_tag() {
    let (port, server) = spawn_server(|mut stream| {
        let mut options = ServerOptions::new();
        options.corrupt_tag = true;
        assert!(server_handshake(&mut stream, &options).is_none());
    });

    let err = Client::new(client_config(port)).run().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::ServerAuthenticationFailed));
}

#[test]
fn test_server_error_frame_keeps_output() {
    let (port, server) = spawn_server(|mut stream| {
        let keys = server_handshake(&mut stream, &ServerOptions::new()).unwrap();
        data_frame(&mut stream, &keys, 0, b"first half");
        send(&mut stream, MessageType::Error, b"source file vanished");
    });

    let transfer = Client::new(client_config(port)).run().unwrap();
    server.join().unwrap();

    assert_eq!(transfer.data, b"first half");
    assert_eq!(
        transfer.report.end,
        EndReason::PeerError("source file vanished".into())
    );
}

#[test]
fn test_read_timeout() {
    let (port, server) = spawn_server(|mut stream| {
        let mut hello = [0u8; HEADER_SIZE];
        stream.read_exact(&mut hello).unwrap();
        // Never answer; wait for the client to hang up
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut config = client_config(port);
    config.connection.read_timeout_secs = Some(1);
    let err = Client::new(config).run().unwrap_err();
    server.join().unwrap();

    assert!(err.is_transport_error());
}
