// ============================================
// File: crates/stls-client/src/sink.rs
// ============================================
//! # Output Sink
//!
//! Where the reassembled payload goes: standard output for `-`, otherwise
//! a file named `<name>.<extension>`.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ClientError, Result};

/// Destination for the reassembled payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Standard output.
    Stdout,
    /// A file, created or truncated.
    File(PathBuf),
}

impl Sink {
    /// Resolves the command-line output argument.
    ///
    /// The extension is appended, not substituted: `shot.v2` with `png`
    /// becomes `shot.v2.png`. An empty extension leaves the name alone.
    #[must_use]
    pub fn from_arg(arg: &str, extension: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else if extension.is_empty() {
            Self::File(PathBuf::from(arg))
        } else {
            Self::File(PathBuf::from(format!("{arg}.{extension}")))
        }
    }

    /// Target path, if writing to a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::File(path) => Some(path),
        }
    }

    /// Writes the whole payload.
    ///
    /// # Errors
    /// Returns `Output` if the write fails.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(data)
                    .and_then(|()| out.flush())
                    .map_err(|e| ClientError::output("stdout", e))?;
            }
            Self::File(path) => {
                fs::write(path, data)
                    .map_err(|e| ClientError::output(path.display().to_string(), e))?;
            }
        }
        info!(target_sink = %self, bytes = data.len(), "Output written");
        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
