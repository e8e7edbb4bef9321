//! Error types for the table crate.

use std::io;
use thiserror::Error;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while saving or loading tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// No serializer is registered for the file extension.
    #[error("format not supported: {extension:?}")]
    FormatNotSupported {
        /// The extension that was looked up, without the dot.
        extension: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] crmlink_codec::CodecError),

    /// Markup could not be read or written.
    #[error("XML error: {message}")]
    Xml {
        /// Description of the markup error.
        message: String,
    },

    /// Spreadsheet could not be read or written.
    #[error("spreadsheet error: {message}")]
    Spreadsheet {
        /// Description of the spreadsheet error.
        message: String,
    },

    /// The document parsed but does not describe a table.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },
}

impl TableError {
    /// Creates a format not supported error.
    pub fn format_not_supported(extension: impl Into<String>) -> Self {
        Self::FormatNotSupported {
            extension: extension.into(),
        }
    }

    /// Creates an XML error.
    pub fn xml(message: impl ToString) -> Self {
        Self::Xml {
            message: message.to_string(),
        }
    }

    /// Creates a spreadsheet error.
    pub fn spreadsheet(message: impl ToString) -> Self {
        Self::Spreadsheet {
            message: message.to_string(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
