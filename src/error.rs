//! Error types for the excel2csv library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for excel2csv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Where in a sheet part a decode error happened, when known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Byte offset into the decompressed XML part
    pub offset: Option<u64>,
    /// Zero-based sheet row being decoded
    pub row: Option<u32>,
}

impl Position {
    /// A position with a byte offset and an optional row.
    pub fn at(offset: u64, row: Option<u32>) -> Self {
        Self {
            offset: Some(offset),
            row,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.offset, self.row) {
            (Some(offset), Some(row)) => write!(f, " at byte {} (row {})", offset, row + 1),
            (Some(offset), None) => write!(f, " at byte {}", offset),
            (None, Some(row)) => write!(f, " at row {}", row + 1),
            (None, None) => Ok(()),
        }
    }
}

/// Errors that can occur while converting a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source is not a zip/OOXML container.
    #[error("Not a spreadsheet archive: {0}")]
    NotAnArchive(String),

    /// The container is a zip archive but uses a feature we cannot read.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A required part is missing from the archive.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// No sheet matched the selector.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),

    /// Malformed or truncated markup.
    #[error("Decode error{position}: {message}")]
    Decode {
        /// Location of the failure
        position: Position,
        /// What went wrong
        message: String,
    },

    /// A shared string reference points past the end of the table.
    #[error("Shared string index {index} out of range (table has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of loaded strings
        len: usize,
    },

    /// I/O failure on the destination.
    #[error("Write error: {0}")]
    Write(#[source] io::Error),
}

impl Error {
    /// Decode error without position information.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            position: Position::default(),
            message: message.into(),
        }
    }

    /// Decode error at a known position.
    pub fn decode_at(position: Position, message: impl Into<String>) -> Self {
        Error::Decode {
            position,
            message: message.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingComponent("file not found in archive".to_string())
            }
            zip::result::ZipError::UnsupportedArchive(msg) => {
                Error::UnsupportedFormat(msg.to_string())
            }
            other => Error::NotAnArchive(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::decode(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Error::Write(e),
            other => Error::Write(io::Error::other(format!("{:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SheetNotFound("Summary".to_string());
        assert_eq!(err.to_string(), "Sheet not found: \"Summary\"");

        let err = Error::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "Shared string index 7 out of range (table has 3 entries)"
        );
    }

    #[test]
    fn test_decode_position_display() {
        let err = Error::decode_at(Position::at(120, Some(4)), "bad cell reference");
        assert_eq!(
            err.to_string(),
            "Decode error at byte 120 (row 5): bad cell reference"
        );

        let err = Error::decode("unexpected end of row");
        assert_eq!(err.to_string(), "Decode error: unexpected end of row");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_zip() {
        let err: Error = zip::result::ZipError::InvalidArchive("bad magic".into()).into();
        assert!(matches!(err, Error::NotAnArchive(_)));
    }
}
