// ============================================
// File: crates/stls-client/src/test_support.rs
// ============================================
//! Scripted peers and stub crypto shared by the unit tests.

use std::io::{self, Cursor, Read, Write};

use stls_core::crypto::mac::hmac_sha256;
use stls_core::crypto::{
    derive_key_schedule, seal_record, DefaultRecordCrypto, HandshakeCrypto, KeySchedule, Nonce,
    RecordCrypto, ServerPublicKey,
};
use stls_core::error::{CoreError, Result};
use stls_core::protocol::{encode_frame, FrameLayout, MessageType, Record};

/// Certificate blob the stub accepts.
pub(crate) const STUB_CERTIFICATE: &[u8] = b"stub-certificate";

pub(crate) const CLIENT_NONCE: [u8; 32] = [0x00; 32];
pub(crate) const SERVER_NONCE: [u8; 32] = [0xFF; 32];

/// In-memory stream: reads from a fixed script, records writes.
pub(crate) struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    fail_with: Option<io::ErrorKind>,
    pub(crate) written: Vec<u8>,
}

impl ScriptedStream {
    pub(crate) fn new(input: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(input),
            fail_with: None,
            written: Vec::new(),
        }
    }

    /// Reads fail with `kind` once the script is used up.
    pub(crate) fn failing_after(input: Vec<u8>, kind: io::ErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::new(input)
        }
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.input.read(buf)? {
            0 if !buf.is_empty() => match self.fail_with {
                Some(kind) => Err(io::Error::new(kind, "scripted failure")),
                None => Ok(0),
            },
            n => Ok(n),
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Accepts only [`STUB_CERTIFICATE`] and "encrypts" by copying the nonce.
pub(crate) struct StubHandshakeCrypto;

impl HandshakeCrypto for StubHandshakeCrypto {
    fn validate_certificate(&self, certificate: &[u8]) -> Result<ServerPublicKey> {
        if certificate == STUB_CERTIFICATE {
            Ok(ServerPublicKey::from_bytes([7; 32]))
        } else {
            Err(CoreError::invalid_certificate("not the stub certificate"))
        }
    }

    fn encrypt_nonce(&self, _server_key: &ServerPublicKey, nonce: &Nonce) -> Result<Vec<u8>> {
        Ok(nonce.as_bytes().to_vec())
    }
}

/// What a well-behaved server sends and expects for one stub handshake.
pub(crate) struct ScriptedHandshake {
    /// Certificate message followed by the server tag message.
    pub(crate) inbound: Vec<u8>,
    /// Hello and encrypted-nonce messages as the client must send them.
    pub(crate) expected_outbound: Vec<u8>,
    /// Client tag message the client must send last.
    pub(crate) expected_client_tag: Vec<u8>,
    pub(crate) keys: KeySchedule,
}

pub(crate) fn frame(message_type: MessageType, payload: &[u8]) -> Vec<u8> {
    encode_frame(message_type, payload, FrameLayout::Canonical)
        .unwrap()
        .to_vec()
}

pub(crate) fn scripted_handshake(layout: FrameLayout) -> ScriptedHandshake {
    let hello = encode_frame(MessageType::Hello, &[], layout).unwrap();
    let mut certificate_payload = SERVER_NONCE.to_vec();
    certificate_payload.extend_from_slice(STUB_CERTIFICATE);
    let certificate = frame(MessageType::Certificate, &certificate_payload);
    let encrypted_nonce = encode_frame(MessageType::EncryptedNonce, &CLIENT_NONCE, layout).unwrap();

    let mut transcript = hello.to_vec();
    transcript.extend_from_slice(&certificate);
    transcript.extend_from_slice(&encrypted_nonce);

    let keys = derive_key_schedule(
        &Nonce::from_bytes(CLIENT_NONCE),
        &Nonce::from_bytes(SERVER_NONCE),
    )
    .unwrap();
    let server_tag = hmac_sha256(&keys.server_integrity, &transcript).unwrap();
    let client_tag = hmac_sha256(&keys.client_integrity, &transcript).unwrap();

    let mut inbound = certificate;
    inbound.extend_from_slice(&frame(MessageType::Hash, &server_tag));

    let mut expected_outbound = hello.to_vec();
    expected_outbound.extend_from_slice(&encrypted_nonce);

    ScriptedHandshake {
        inbound,
        expected_outbound,
        expected_client_tag: encode_frame(MessageType::Hash, &client_tag, layout).unwrap().to_vec(),
        keys,
    }
}

/// A correctly sealed data frame.
pub(crate) fn data_frame(keys: &KeySchedule, sequence: u32, chunk: &[u8]) -> Vec<u8> {
    let payload = seal_record(&DefaultRecordCrypto::new(), keys, sequence, chunk).unwrap();
    frame(MessageType::Data, &payload)
}

/// A data frame that decrypts fine but carries a wrong tag.
pub(crate) fn forged_data_frame(keys: &KeySchedule, sequence: u32, chunk: &[u8]) -> Vec<u8> {
    let record = Record {
        sequence,
        chunk: bytes::Bytes::copy_from_slice(chunk),
        tag: [0xAA; 32],
    };
    let payload = DefaultRecordCrypto::new()
        .encrypt(&keys.server_encryption, &record.to_plaintext())
        .unwrap();
    frame(MessageType::Data, &payload)
}
