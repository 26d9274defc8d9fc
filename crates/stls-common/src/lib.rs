// ============================================
// File: crates/stls-common/src/lib.rs
// ============================================
//! # stls Common - Shared Utilities
//!
//! ## Creation Reason
//! Holds the few types that both the protocol library and the client
//! binary need without depending on each other.
//!
//! ## Main Functionality
//! - [`error`]: `CommonError`, the base error wrapped by the other crates
//! - [`time`]: `Timestamp`, Unix seconds used for certificate validity
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              stls-client                │
//! │                   │                     │
//! │                   ▼                     │
//! │              stls-core                  │
//! │                   │                     │
//! │                   ▼                     │
//! │             stls-common  ◄── here       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;

pub use error::{CommonError, Result};
pub use time::Timestamp;
