// ============================================
// File: crates/stls-client/src/lib.rs
// ============================================
//! # stls Client Library
//!
//! ## Creation Reason
//! Runs the client side of the stls transport: connect, authenticate the
//! server, then reassemble the payload the server streams back.
//!
//! ## Main Functionality
//! - [`handshake`]: Four-message handshake state machine
//! - [`record`]: Session state and the authenticated record reader
//! - [`client`]: Connects and drives handshake + record phase
//! - [`sink`]: Where the reassembled payload goes
//! - [`config`]: TOML configuration
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client::run                                                │
//! │    ├─ TcpStream::connect                                    │
//! │    ├─ ClientHandshake::run ──► Established { keys, ... }    │
//! │    ├─ RecordReader::run    ──► Session output               │
//! │    └─ Transfer { data, report }                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Everything is blocking and single-threaded; one session per socket
//! - Without a configured read timeout a stalled server blocks forever
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod record;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{Client, Transfer, TransferReport};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use handshake::{AbortReason, ClientHandshake, Established, HandshakeState};
pub use record::{EndReason, RecordOutcome, RecordReader, RecordRejection, Session, SessionStats};
pub use sink::Sink;
