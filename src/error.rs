//! Errors reported by `hexload`.
//!
//! All failures are human-readable; there are no structured error codes beyond
//! the variant itself. Whether an error is fatal depends on where it surfaces:
//! open failures abort the console at startup, everything else is reported to
//! the operator and the session (or the encoder batch) carries on.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No port with that name exists on the system.
    #[error("port `{0}` is not available")]
    PortUnavailable(String),

    /// The name exists but does not designate a serial port.
    #[error("`{0}` is not a serial port")]
    NotASerialPort(String),

    /// The port exists but is currently owned by another process.
    #[error("port `{0}` is currently in use")]
    PortInUse(String),

    /// A character in a hex dump that is not a hex digit.
    #[error("invalid hex digit {found:?} at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("file `{}` doesn't exist", .0.display())]
    FileMissing(PathBuf),

    #[error("file `{}` must be exactly {expected} bytes (found {actual})", .path.display())]
    FileSizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// End of stream reached before a complete image could be read.
    #[error("end of file reached after {obtained} of {expected} bytes")]
    ShortRead { expected: usize, obtained: usize },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("serial port failure: {0}")]
    Serial(#[from] serialport::Error),

    /// A payload was submitted after the session stopped accepting them.
    #[error("the serial session is closed")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let e = Error::FileSizeMismatch {
            path: "fw.bin".into(),
            expected: 8192,
            actual: 12,
        };
        assert_eq!(
            e.to_string(),
            "file `fw.bin` must be exactly 8192 bytes (found 12)"
        );

        let e = Error::Parse {
            line: 3,
            column: 5,
            found: 'g',
        };
        assert_eq!(e.to_string(), "invalid hex digit 'g' at line 3, column 5");
    }

    #[test]
    fn io_errors_convert() {
        let e: Error = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(e, Error::Io(_)));
    }
}
