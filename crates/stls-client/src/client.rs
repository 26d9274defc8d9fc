// ============================================
// File: crates/stls-client/src/client.rs
// ============================================
//! # Client
//!
//! ## Creation Reason
//! Ties the pieces together: connect, run the handshake, run the record
//! reader, hand back the reassembled payload.
//!
//! ## Main Functionality
//! - `Client::connect`: TCP connect with optional timeouts
//! - `Client::run`: Connect + full session
//! - `Client::run_on_stream`: Full session over any `Read + Write`
//!
//! ## ⚠️ Important Note for Next Developer
//! - The crypto implementations are type parameters so tests can swap
//!   in stubs; production code uses the defaults
//! - A handshake failure returns an error and no data. Once the record
//!   phase starts, whatever was reassembled is returned.
//!
//! ## Last Modified
//! v0.1.0 - Initial client

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use stls_core::crypto::{
    DefaultHandshakeCrypto, DefaultRecordCrypto, HandshakeCrypto, Nonce, RecordCrypto,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::handshake::ClientHandshake;
use crate::record::{log_summary, EndReason, RecordReader, Session};

// ============================================
// Transfer
// ============================================

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Bytes reassembled
    pub bytes: usize,
    /// Records accepted
    pub accepted: u64,
    /// Frames dropped
    pub dropped: u64,
    /// Counter value when the session ended
    pub next_sequence: u64,
    /// How the record phase ended
    pub end: EndReason,
}

impl TransferReport {
    /// Sequence number of the last accepted record.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        self.next_sequence.checked_sub(1)
    }
}

/// Reassembled payload plus its report.
#[derive(Debug)]
pub struct Transfer {
    /// Reassembled bytes
    pub data: Vec<u8>,
    /// Session summary
    pub report: TransferReport,
}

// ============================================
// Client
// ============================================

/// stls client.
///
/// # Example
/// ```no_run
/// use stls_client::{Client, ClientConfig, Sink};
///
/// let client = Client::new(ClientConfig::default());
/// let transfer = client.run().unwrap();
/// Sink::from_arg("image", "png").write(&transfer.data).unwrap();
/// ```
#[derive(Debug)]
pub struct Client<H = DefaultHandshakeCrypto, R = DefaultRecordCrypto> {
    config: ClientConfig,
    handshake_crypto: H,
    record_crypto: R,
}

impl Client {
    /// Creates a client with the production crypto.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_crypto(config, DefaultHandshakeCrypto::new(), DefaultRecordCrypto::new())
    }
}

impl<H: HandshakeCrypto, R: RecordCrypto> Client<H, R> {
    /// Creates a client with explicit crypto implementations.
    pub fn with_crypto(config: ClientConfig, handshake_crypto: H, record_crypto: R) -> Self {
        Self {
            config,
            handshake_crypto,
            record_crypto,
        }
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens the TCP connection to the configured server.
    ///
    /// # Errors
    /// Returns `Connect` if no resolved address accepts the connection,
    /// or `Transport` if socket options cannot be set.
    pub fn connect(&self) -> Result<TcpStream> {
        let addr = self.config.server_addr();
        let resolved = addr.to_socket_addrs().map_err(|source| ClientError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let connect_timeout = self.config.connection.connect_timeout();
        let mut last_error = None;
        for socket_addr in resolved {
            debug!(%socket_addr, "Connecting");
            let attempt = match connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
                None => TcpStream::connect(socket_addr),
            };
            match attempt {
                Ok(stream) => {
                    stream
                        .set_read_timeout(self.config.connection.read_timeout())
                        .map_err(|e| ClientError::transport("setting the read timeout", e))?;
                    stream
                        .set_nodelay(true)
                        .map_err(|e| ClientError::transport("setting TCP_NODELAY", e))?;
                    info!(%socket_addr, "Connected");
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(ClientError::Connect {
            addr,
            source: last_error.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }

    /// Connects and runs a full session.
    ///
    /// Once the handshake succeeds a [`Transfer`] is returned; a later
    /// socket failure shows up as [`EndReason::Failed`] in the report.
    ///
    /// # Errors
    /// Returns `Connect` on connection failure, or the failure that
    /// aborted the handshake.
    pub fn run(&self) -> Result<Transfer> {
        let mut stream = self.connect()?;
        self.run_on_stream(&mut stream)
    }

    /// Runs a full session over an established stream.
    ///
    /// # Errors
    /// See [`Client::run`].
    pub fn run_on_stream<S: Read + Write>(&self, stream: &mut S) -> Result<Transfer> {
        self.run_with_nonce(stream, Nonce::generate())
    }

    /// Runs a full session with a caller-chosen client nonce.
    ///
    /// # Errors
    /// See [`Client::run`].
    pub fn run_with_nonce<S: Read + Write>(
        &self,
        stream: &mut S,
        client_nonce: Nonce,
    ) -> Result<Transfer> {
        let established = ClientHandshake::with_nonce(stream, &self.handshake_crypto, client_nonce)
            .layout(self.config.protocol.frame_layout)
            .max_frame_len(self.config.protocol.max_frame_len)
            .run()?;

        let mut session = Session::new(established.keys);
        let end = RecordReader::new(&mut *stream, &self.record_crypto)
            .with_max_payload_len(self.config.protocol.max_frame_len)
            .run(&mut session)?;
        log_summary(&session, &end);

        let stats = *session.stats();
        let next_sequence = session.expected_sequence();
        let data = session.into_output();
        Ok(Transfer {
            report: TransferReport {
                bytes: data.len(),
                accepted: stats.accepted,
                dropped: stats.dropped(),
                next_sequence,
                end,
            },
            data,
        })
    }
}

// ============================================
// Tests
// ============================================
