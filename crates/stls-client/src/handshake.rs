// ============================================
// File: crates/stls-client/src/handshake.rs
// ============================================
//! # Client Handshake
//!
//! ## Creation Reason
//! Drives the client side of the four-message handshake over a blocking
//! stream and hands the derived keys to the record phase.
//!
//! ## State Machine
//! ```text
//! Init ──send Hello──► SentHello
//!   ──recv Certificate──► ReceivedServerNonceAndCert
//!   ──validate──► CertificateVerified
//!   ──send EncryptedNonce, derive keys──► SentEncryptedNonce
//!   ──recv Hash──► ReceivedServerTag
//!   ──verify tag──► ServerTagVerified
//!   ──send Hash──► SentClientTag ──► Established
//!
//! any failure ──► Aborted(reason)
//! ```
//!
//! ## Main Functionality
//! - `ClientHandshake::step`: One transition
//! - `ClientHandshake::run`: Step until established or aborted
//! - `Established`: Keys + frozen transcript
//!
//! ## ⚠️ Important Note for Next Developer
//! - The transcript holds the exact bytes of messages 1 to 3. In legacy
//!   layout the encrypted-nonce header differs from canonical, and the
//!   server MACs what it received, so never re-encode.
//! - On abort the keys are dropped (and zeroed) before returning
//! - A frame of type `Error` from the server aborts with `PeerError`
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake state machine

use std::fmt;
use std::io::{Read, Write};

use bytes::Bytes;
use tracing::{debug, info, warn};

use stls_common::error::CommonError;
use stls_core::crypto::mac::tags_equal;
use stls_core::crypto::{derive_key_schedule, HandshakeCrypto, KeySchedule, Nonce, ServerPublicKey};
use stls_core::protocol::{
    encode_frame, Frame, FrameLayout, FrameReader, HandshakeTranscript, MessageType, ServerHello,
    Transcript, MAX_PAYLOAD_LEN,
};

use crate::error::{ClientError, Result};

// ============================================
// HandshakeState
// ============================================

/// Position in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// Hello written.
    SentHello,
    /// Server nonce and certificate received.
    ReceivedServerNonceAndCert,
    /// Certificate accepted; its key is known.
    CertificateVerified,
    /// Sealed client nonce written; keys derived, transcript frozen.
    SentEncryptedNonce,
    /// Server tag received.
    ReceivedServerTag,
    /// Server tag matched.
    ServerTagVerified,
    /// Client tag written.
    SentClientTag,
    /// Ready for the record phase.
    Established,
    /// Terminal failure.
    Aborted(AbortReason),
}

impl HandshakeState {
    /// Returns `true` for `Established` and `Aborted`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Established | Self::Aborted(_))
    }
}

/// Why a handshake was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Connection failed, reset or closed early.
    Transport,
    /// A message of the wrong type or shape arrived.
    UnexpectedMessage,
    /// The certificate did not validate.
    InvalidCertificate,
    /// The server's transcript tag did not match.
    ServerAuthenticationFailed,
    /// The server sent an `Error` frame.
    PeerError,
    /// A local primitive failed.
    Crypto,
}

impl AbortReason {
    fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::InvalidCertificate { .. } => Self::InvalidCertificate,
            ClientError::ServerAuthenticationFailed => Self::ServerAuthenticationFailed,
            ClientError::PeerError { .. } => Self::PeerError,
            e if e.is_transport_error() => Self::Transport,
            e if e.is_protocol_error() => Self::UnexpectedMessage,
            _ => Self::Crypto,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Transport => "transport failure",
            Self::UnexpectedMessage => "unexpected message",
            Self::InvalidCertificate => "invalid certificate",
            Self::ServerAuthenticationFailed => "server authentication failed",
            Self::PeerError => "peer error",
            Self::Crypto => "crypto failure",
        };
        f.write_str(text)
    }
}

// ============================================
// Established
// ============================================

/// Result of a completed handshake.
#[derive(Debug)]
pub struct Established {
    /// Session keys.
    pub keys: KeySchedule,
    /// Messages 1 to 3 as exchanged.
    pub transcript: HandshakeTranscript,
    /// Key taken from the server certificate.
    pub server_key: ServerPublicKey,
}

// ============================================
// ClientHandshake
// ============================================

/// Client handshake over a blocking stream.
pub struct ClientHandshake<'a, S, C: ?Sized> {
    stream: &'a mut S,
    crypto: &'a C,
    layout: FrameLayout,
    max_frame_len: usize,
    state: HandshakeState,
    client_nonce: Option<Nonce>,
    server_nonce: Option<Nonce>,
    certificate: Option<Bytes>,
    server_key: Option<ServerPublicKey>,
    transcript: Transcript,
    frozen: Option<HandshakeTranscript>,
    keys: Option<KeySchedule>,
    server_tag: Option<Bytes>,
}

impl<'a, S, C> ClientHandshake<'a, S, C>
where
    S: Read + Write,
    C: HandshakeCrypto + ?Sized,
{
    /// Creates a handshake with a fresh random client nonce.
    pub fn new(stream: &'a mut S, crypto: &'a C) -> Self {
        Self::with_nonce(stream, crypto, Nonce::generate())
    }

    /// Creates a handshake with the given client nonce.
    pub fn with_nonce(stream: &'a mut S, crypto: &'a C, client_nonce: Nonce) -> Self {
        Self {
            stream,
            crypto,
            layout: FrameLayout::default(),
            max_frame_len: MAX_PAYLOAD_LEN,
            state: HandshakeState::Init,
            client_nonce: Some(client_nonce),
            server_nonce: None,
            certificate: None,
            server_key: None,
            transcript: Transcript::new(),
            frozen: None,
            keys: None,
            server_tag: None,
        }
    }

    /// Sets the outbound header layout.
    #[must_use]
    pub fn layout(mut self, layout: FrameLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the largest inbound payload accepted.
    #[must_use]
    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Performs one transition.
    ///
    /// Terminal states are sticky: stepping `Established` is a no-op and
    /// stepping `Aborted` fails with `HandshakeAborted`.
    ///
    /// # Errors
    /// Returns the failure that moved the handshake to `Aborted`.
    pub fn step(&mut self) -> Result<HandshakeState> {
        match self.state {
            HandshakeState::Established => return Ok(self.state),
            HandshakeState::Aborted(_) => return Err(ClientError::HandshakeAborted),
            _ => {}
        }

        let from = self.state;
        match self.advance() {
            Ok(next) => {
                debug!(from = ?from, to = ?next, "Handshake advanced");
                self.state = next;
                Ok(next)
            }
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    /// Steps until the handshake is established.
    ///
    /// # Errors
    /// Returns the failure that aborted the handshake.
    pub fn run(mut self) -> Result<Established> {
        while self.state != HandshakeState::Established {
            self.step()?;
        }

        let (Some(keys), Some(transcript), Some(server_key)) =
            (self.keys.take(), self.frozen.take(), self.server_key)
        else {
            return Err(lost("session material"));
        };

        info!(
            transcript_len = transcript.len(),
            server_key = %server_key.to_base64(),
            "Handshake established"
        );
        Ok(Established {
            keys,
            transcript,
            server_key,
        })
    }

    // ========================================
    // Transitions
    // ========================================

    fn advance(&mut self) -> Result<HandshakeState> {
        match self.state {
            HandshakeState::Init => {
                self.send(MessageType::Hello, &[], true)?;
                Ok(HandshakeState::SentHello)
            }
            HandshakeState::SentHello => {
                let frame = self.expect(MessageType::Certificate)?;
                self.transcript.append_received(&frame);
                let hello = ServerHello::parse(&frame.payload)?;
                debug!(
                    certificate_len = hello.certificate.len(),
                    "Server nonce and certificate received"
                );
                self.server_nonce = Some(Nonce::from_bytes(hello.server_nonce));
                self.certificate = Some(hello.certificate);
                Ok(HandshakeState::ReceivedServerNonceAndCert)
            }
            HandshakeState::ReceivedServerNonceAndCert => {
                let certificate = self.certificate.take().ok_or_else(|| lost("certificate"))?;
                let server_key = self.crypto.validate_certificate(&certificate)?;
                self.server_key = Some(server_key);
                Ok(HandshakeState::CertificateVerified)
            }
            HandshakeState::CertificateVerified => {
                let server_key = self.server_key.ok_or_else(|| lost("server key"))?;
                let client_nonce = self.client_nonce.take().ok_or_else(|| lost("client nonce"))?;
                let server_nonce = self.server_nonce.take().ok_or_else(|| lost("server nonce"))?;

                let sealed = self.crypto.encrypt_nonce(&server_key, &client_nonce)?;
                self.send(MessageType::EncryptedNonce, &sealed, true)?;

                self.keys = Some(derive_key_schedule(&client_nonce, &server_nonce)?);
                self.frozen = Some(std::mem::take(&mut self.transcript).finish());
                Ok(HandshakeState::SentEncryptedNonce)
            }
            HandshakeState::SentEncryptedNonce => {
                let frame = self.expect(MessageType::Hash)?;
                self.server_tag = Some(frame.payload);
                Ok(HandshakeState::ReceivedServerTag)
            }
            HandshakeState::ReceivedServerTag => {
                let keys = self.keys.as_ref().ok_or_else(|| lost("keys"))?;
                let transcript = self.frozen.as_ref().ok_or_else(|| lost("transcript"))?;
                let received = self.server_tag.take().ok_or_else(|| lost("server tag"))?;

                let expected = self
                    .crypto
                    .transcript_tag(&keys.server_integrity, transcript.as_bytes())?;
                if !tags_equal(&expected, &received) {
                    return Err(ClientError::ServerAuthenticationFailed);
                }
                Ok(HandshakeState::ServerTagVerified)
            }
            HandshakeState::ServerTagVerified => {
                let keys = self.keys.as_ref().ok_or_else(|| lost("keys"))?;
                let transcript = self.frozen.as_ref().ok_or_else(|| lost("transcript"))?;
                let tag = self
                    .crypto
                    .transcript_tag(&keys.client_integrity, transcript.as_bytes())?;
                self.send(MessageType::Hash, &tag, false)?;
                Ok(HandshakeState::SentClientTag)
            }
            HandshakeState::SentClientTag => Ok(HandshakeState::Established),
            HandshakeState::Established | HandshakeState::Aborted(_) => Ok(self.state),
        }
    }

    // ========================================
    // I/O Helpers
    // ========================================

    fn send(&mut self, message_type: MessageType, payload: &[u8], record: bool) -> Result<()> {
        let wire = encode_frame(message_type, payload, self.layout)?;
        self.stream
            .write_all(&wire)
            .and_then(|()| self.stream.flush())
            .map_err(|e| ClientError::transport(format!("sending {message_type}"), e))?;
        if record {
            self.transcript.append_sent(&wire);
        }
        Ok(())
    }

    fn expect(&mut self, expected: MessageType) -> Result<Frame> {
        let frame = FrameReader::new(&mut *self.stream)
            .with_max_payload_len(self.max_frame_len)
            .read_frame()?
            .ok_or(ClientError::ConnectionClosed { expected })?;

        match frame.message_type {
            got if got == expected => Ok(frame),
            MessageType::Error => Err(ClientError::PeerError {
                message: frame.error_message(),
            }),
            got => Err(ClientError::UnexpectedMessage { expected, got }),
        }
    }

    fn abort(&mut self, err: &ClientError) {
        let reason = AbortReason::from_error(err);
        warn!(state = ?self.state, %reason, error = %err, "Handshake aborted");
        self.keys = None;
        self.frozen = None;
        self.client_nonce = None;
        self.server_tag = None;
        self.state = HandshakeState::Aborted(reason);
    }
}

fn lost(what: &str) -> ClientError {
    CommonError::internal(format!("handshake lost its {what}")).into()
}

// ============================================
// Tests
// ============================================
