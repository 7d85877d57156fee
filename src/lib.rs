//! # xmlstream
//!
//! Streaming XML writer that never holds the document tree in memory and
//! never exposes a half-written file.
//!
//! - [`XmlWriter`] renders elements as they are opened and closed, keeping
//!   only the stack of open element names.
//! - File output goes to `<path>.part` and is renamed over `<path>` only
//!   when the document is complete and every call succeeded.
//! - Any failure is sticky: later calls are rejected and the partial file
//!   is deleted on [`XmlWriter::finalize`].
//! - [`parse_file`] / [`parse_buffer`] read documents back as start/end
//!   element events through an [`ElementHandler`].
//!
//! ## Quick start
//!
//! ```
//! use xmlstream::XmlWriter;
//!
//! let mut writer = XmlWriter::in_memory();
//! writer.open_element("library")?;
//! writer.attribute("name", "Tom & Jerry's")?;
//! writer.open_element("book")?;
//! writer.content("Rust in Action")?;
//! writer.close_element()?;
//! writer.close_element()?;
//!
//! let xml = String::from_utf8(writer.into_buffer().unwrap()).unwrap();
//! assert_eq!(
//!     xml,
//!     "<?xml version='1.0' encoding='UTF-8'?>\n\
//!      <library name=\"Tom &amp; Jerry&apos;s\">\n\
//!      \t<book>Rust in Action</book>\n\
//!      </library>"
//! );
//! # Ok::<(), xmlstream::XmlError>(())
//! ```
//!
//! ## Output format
//!
//! - `<?xml version='1.0' encoding='UTF-8'?>` and a newline, then the root
//! - one tab of indentation per depth
//! - elements without content or children are self-closing (`<a />`)
//! - attribute values are escaped; `\t`, `\n`, `\r` are dropped from them
//! - content is written verbatim, without escaping

pub mod error;
pub mod escape;
pub mod reader;
pub mod sink;
pub mod types;
pub mod writer;

pub use error::{Result, XmlError};
pub use reader::{parse_buffer, parse_file, parse_reader, ElementHandler};
pub use types::{Attribute, WriterState};
pub use writer::{XmlWriter, XmlWriterBuilder};
