//! Error types for the XML writer and reader

use thiserror::Error;

/// Errors produced while writing or reading XML
#[derive(Debug, Error)]
pub enum XmlError {
    /// I/O error from the underlying file or handle
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not allowed in the writer's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Escaped attribute value does not fit the scratch area
    #[error("Attribute '{name}' is too long: escaped value must stay below {limit} bytes")]
    AttributeTooLong { name: String, limit: usize },

    /// The sink rejected a write or could not be finalized
    #[error("Write error: {0}")]
    WriteError(String),

    /// A previous call failed; the writer accepts no further output
    #[error("Writer is in a failed state")]
    Failed,

    /// Finalized before the root element was closed
    #[error("Document incomplete: {depth} element(s) still open")]
    Incomplete { depth: usize },

    /// Malformed input document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error reported by the XML tokenizer
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Element or attribute name is not valid UTF-8
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An element handler rejected an event
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, XmlError>;

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        XmlError::Xml(e.into())
    }
}
