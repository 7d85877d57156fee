//! Streaming XML writer with an element-stack state machine
//!
//! The writer never holds the document tree: each call renders its bytes
//! straight into the sink and only the stack of open element names is kept.
//! Output uses one tab of indentation per depth, attribute values are
//! escaped, content is written verbatim.

use crate::error::{Result, XmlError};
use crate::escape::AttrEscaper;
use crate::sink::{AtomicFile, Sink};
use crate::types::{WriterState, ATTR_CAPACITY, XML_DECLARATION};
use std::fmt::{self, Write as _};
use std::io::Write;
use std::path::Path;

const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;
const DEFAULT_FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming XML document writer
///
/// Any failure (illegal call order, oversized attribute, sink error) is
/// sticky: the failing call returns its cause, every later call returns
/// [`XmlError::Failed`], and a file document is discarded on
/// [`finalize`](XmlWriter::finalize) instead of committed.
///
/// # Examples
///
/// ```no_run
/// use xmlstream::XmlWriter;
///
/// let mut writer = XmlWriter::new("catalog.xml")?;
/// writer.open_element("catalog")?;
/// writer.attribute("version", "2")?;
/// writer.open_element("item")?;
/// writer.content("first")?;
/// writer.close_element()?;
/// writer.close_element()?;
/// writer.finalize()?; // renames catalog.xml.part to catalog.xml
/// # Ok::<(), xmlstream::XmlError>(())
/// ```
pub struct XmlWriter<'a> {
    sink: Sink<'a>,
    state: WriterState,
    stack: Vec<String>,
    error: bool,
    finalized: bool,
    escaper: AttrEscaper,
    // Reusable buffers
    scratch: Vec<u8>,
    fmt_buffer: String,
    bytes_written: u64,
}

impl XmlWriter<'static> {
    /// Create a writer that commits to `path` atomically
    ///
    /// Output goes to `<path>.part` until [`finalize`](Self::finalize)
    /// renames it over `path`. Fails if the part file cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        XmlWriterBuilder::new().to_file(path)
    }

    /// Create a writer that accumulates the document in memory
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlstream::XmlWriter;
    ///
    /// let mut writer = XmlWriter::in_memory();
    /// writer.open_element("doc")?;
    /// writer.attribute("v", "1&2")?;
    /// writer.close_element()?;
    /// assert_eq!(
    ///     writer.buffer().unwrap(),
    ///     b"<?xml version='1.0' encoding='UTF-8'?>\n<doc v=\"1&amp;2\" />"
    /// );
    /// # Ok::<(), xmlstream::XmlError>(())
    /// ```
    pub fn in_memory() -> Self {
        XmlWriterBuilder::new().to_buffer()
    }
}

impl<'a> XmlWriter<'a> {
    /// Wrap a caller-owned handle
    ///
    /// The writer never closes, renames or deletes anything behind the
    /// handle; the caller decides what to do with the bytes.
    pub fn from_writer(handle: &'a mut dyn Write) -> Self {
        XmlWriterBuilder::new().to_writer(handle)
    }

    fn with_sink(sink: Sink<'a>) -> Self {
        XmlWriter {
            sink,
            state: WriterState::Init,
            stack: Vec::new(),
            error: false,
            finalized: false,
            escaper: AttrEscaper::new(),
            scratch: Vec::with_capacity(256),
            fmt_buffer: String::new(),
            bytes_written: 0,
        }
    }

    /// Open a child element, or the root element on the first call
    ///
    /// The first call writes the XML declaration. The new tag is left
    /// unterminated so attributes can follow.
    pub fn open_element(&mut self, name: &str) -> Result<()> {
        self.ensure_usable()?;

        let depth = self.stack.len();
        self.scratch.clear();
        match self.state {
            WriterState::Init => {
                self.scratch.extend_from_slice(XML_DECLARATION);
                self.scratch.push(b'\n');
            }
            WriterState::Top => {
                self.scratch.extend_from_slice(b">\n");
                indent(&mut self.scratch, depth);
            }
            WriterState::Nested => {
                self.scratch.push(b'\n');
                indent(&mut self.scratch, depth);
            }
            WriterState::Content | WriterState::Eof => {
                let err = XmlError::InvalidState(format!(
                    "cannot open <{}> in {} state",
                    name, self.state
                ));
                return Err(self.fail(err));
            }
        }
        self.scratch.push(b'<');
        self.scratch.extend_from_slice(name.as_bytes());

        if let Err(e) = self.stack.try_reserve(1) {
            let err = XmlError::WriteError(format!("Failed to push <{}>: {}", name, e));
            return Err(self.fail(err));
        }

        self.flush_scratch()?;
        self.stack.push(name.to_owned());
        self.state = WriterState::Top;
        Ok(())
    }

    /// Write ` name="value"` with `value` escaped
    ///
    /// Legal while the last opened tag is unterminated, and also after a
    /// child element has been closed (where the output is not well formed).
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_usable()?;

        if !self.state.accepts_attribute() {
            let err = XmlError::InvalidState(format!(
                "cannot write attribute '{}' in {} state",
                name, self.state
            ));
            return Err(self.fail(err));
        }

        let Some(escaped) = self.escaper.escape(value) else {
            let err = XmlError::AttributeTooLong {
                name: name.to_owned(),
                limit: ATTR_CAPACITY,
            };
            return Err(self.fail(err));
        };

        self.scratch.clear();
        self.scratch.push(b' ');
        self.scratch.extend_from_slice(name.as_bytes());
        self.scratch.extend_from_slice(b"=\"");
        self.scratch.extend_from_slice(escaped);
        self.scratch.push(b'"');
        self.flush_scratch()
    }

    /// Write an attribute with an integer value
    pub fn attribute_int(&mut self, name: &str, value: i64) -> Result<()> {
        let mut buffer = itoa::Buffer::new();
        self.attribute(name, buffer.format(value))
    }

    /// Write an attribute with a formatted value
    ///
    /// ```
    /// # let mut writer = xmlstream::XmlWriter::in_memory();
    /// # writer.open_element("point")?;
    /// writer.attribute_fmt("xy", format_args!("{},{}", 3, 4))?;
    /// # Ok::<(), xmlstream::XmlError>(())
    /// ```
    pub fn attribute_fmt(&mut self, name: &str, args: fmt::Arguments<'_>) -> Result<()> {
        self.ensure_usable()?;
        let value = self.format(args)?;
        let result = self.attribute(name, &value);
        self.fmt_buffer = value;
        result
    }

    /// Append text inside the innermost element, unescaped
    ///
    /// Consecutive calls are concatenated with nothing in between.
    pub fn content(&mut self, text: &str) -> Result<()> {
        self.ensure_usable()?;

        self.scratch.clear();
        match self.state {
            WriterState::Top => self.scratch.push(b'>'),
            WriterState::Content => {}
            _ => {
                let err =
                    XmlError::InvalidState(format!("cannot write content in {} state", self.state));
                return Err(self.fail(err));
            }
        }
        self.scratch.extend_from_slice(text.as_bytes());

        self.flush_scratch()?;
        self.state = WriterState::Content;
        Ok(())
    }

    /// Append formatted text inside the innermost element, unescaped
    pub fn content_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.ensure_usable()?;
        let text = self.format(args)?;
        let result = self.content(&text);
        self.fmt_buffer = text;
        result
    }

    /// Close the innermost open element
    ///
    /// Renders ` />` for an element without content or children,
    /// `</name>` inline after content, and `</name>` on its own indented
    /// line after children.
    pub fn close_element(&mut self) -> Result<()> {
        self.ensure_usable()?;

        let Some(name) = self.stack.last() else {
            let err = XmlError::InvalidState("no open element to close".to_string());
            return Err(self.fail(err));
        };
        let remaining = self.stack.len() - 1;

        self.scratch.clear();
        match self.state {
            WriterState::Top => self.scratch.extend_from_slice(b" />"),
            WriterState::Nested => {
                self.scratch.push(b'\n');
                indent(&mut self.scratch, remaining);
                end_tag(&mut self.scratch, name);
            }
            WriterState::Content => end_tag(&mut self.scratch, name),
            WriterState::Init | WriterState::Eof => {
                let err =
                    XmlError::InvalidState(format!("cannot close element in {} state", self.state));
                return Err(self.fail(err));
            }
        }

        self.flush_scratch()?;
        self.stack.pop();
        self.state = if remaining == 0 {
            WriterState::Eof
        } else {
            WriterState::Nested
        };
        Ok(())
    }

    /// Finish the document; safe to call more than once
    ///
    /// - atomic file: commits `<path>.part` to `<path>` if the document is
    ///   complete and no call failed, otherwise deletes the part file
    /// - caller handle: flushed, never closed
    /// - buffer: bytes stay readable through [`buffer`](Self::buffer)
    ///
    /// Finalizing before the root element is closed marks the writer failed
    /// and discards the output.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let depth = self.stack.len();
        let incomplete = !self.error && !self.state.is_eof();
        if incomplete {
            self.fail_with(&XmlError::Incomplete { depth });
        }

        let commit = !self.error;
        let result = self.sink.finalize(commit);
        self.stack = Vec::new();

        match result {
            Err(e) => Err(self.fail(e)),
            Ok(()) if commit => Ok(()),
            Ok(()) if incomplete => Err(XmlError::Incomplete { depth }),
            Ok(()) => Err(XmlError::Failed),
        }
    }

    /// The finished document, for in-memory writers only
    ///
    /// Available once the root element is closed and no call has failed.
    pub fn buffer(&self) -> Option<&[u8]> {
        if self.error || !self.state.is_eof() {
            return None;
        }
        self.sink.as_bytes()
    }

    /// Take the finished document out of an in-memory writer
    pub fn into_buffer(mut self) -> Option<Vec<u8>> {
        if self.error || !self.state.is_eof() {
            return None;
        }
        let Sink::Buffer(buffer) = &mut self.sink else {
            return None;
        };
        let bytes = std::mem::take(buffer);
        self.finalized = true;
        Some(bytes)
    }

    /// Current state machine position
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether any call has failed
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Total bytes accepted by the sink
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.error {
            return Err(XmlError::Failed);
        }
        if self.finalized {
            return Err(XmlError::InvalidState("writer already finalized".to_string()));
        }
        Ok(())
    }

    fn flush_scratch(&mut self) -> Result<()> {
        match self.sink.write_bytes(&self.scratch) {
            Ok(()) => {
                self.bytes_written += self.scratch.len() as u64;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn format(&mut self, args: fmt::Arguments<'_>) -> Result<String> {
        let mut text = std::mem::take(&mut self.fmt_buffer);
        text.clear();
        if text.write_fmt(args).is_err() {
            let err = XmlError::WriteError("Failed to format value".to_string());
            return Err(self.fail(err));
        }
        Ok(text)
    }

    /// Set the sticky error and hand the cause back to the caller
    fn fail(&mut self, err: XmlError) -> XmlError {
        self.fail_with(&err);
        err
    }

    fn fail_with(&mut self, err: &XmlError) {
        tracing::error!(state = %self.state, depth = self.stack.len(), error = %err, "xml writer failed");
        self.error = true;
    }
}

impl Drop for XmlWriter<'_> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if let Err(e) = self.finalize() {
            tracing::warn!(error = %e, "xml writer dropped without a complete document");
        }
    }
}

#[inline]
fn indent(buffer: &mut Vec<u8>, depth: usize) {
    buffer.resize(buffer.len() + depth, b'\t');
}

#[inline]
fn end_tag(buffer: &mut Vec<u8>, name: &str) {
    buffer.extend_from_slice(b"</");
    buffer.extend_from_slice(name.as_bytes());
    buffer.push(b'>');
}

/// Builder for configured writers
///
/// # Examples
///
/// ```no_run
/// use xmlstream::XmlWriterBuilder;
///
/// let mut writer = XmlWriterBuilder::new()
///     .file_buffer_size(256 * 1024)
///     .sync_on_commit(false)
///     .to_file("large.xml")?;
/// # Ok::<(), xmlstream::XmlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlWriterBuilder {
    buffer_capacity: usize,
    file_buffer_size: usize,
    sync_on_commit: bool,
}

impl XmlWriterBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        XmlWriterBuilder {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            sync_on_commit: true,
        }
    }

    /// Initial capacity of the in-memory buffer (default 8 KiB)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Write buffer in front of the part file (default 64 KiB)
    pub fn file_buffer_size(mut self, size: usize) -> Self {
        self.file_buffer_size = size;
        self
    }

    /// Sync the part file to disk before renaming it (default on)
    pub fn sync_on_commit(mut self, sync: bool) -> Self {
        self.sync_on_commit = sync;
        self
    }

    /// Build a writer committing atomically to `path`
    pub fn to_file<P: AsRef<Path>>(self, path: P) -> Result<XmlWriter<'static>> {
        let file = AtomicFile::create(path, self.file_buffer_size, self.sync_on_commit)?;
        tracing::debug!(
            part = %file.part().display(),
            path = %file.target().display(),
            "opened xml document"
        );
        Ok(XmlWriter::with_sink(Sink::File(file)))
    }

    /// Build a writer over a caller-owned handle
    pub fn to_writer<'a>(self, handle: &'a mut dyn Write) -> XmlWriter<'a> {
        XmlWriter::with_sink(Sink::Handle(handle))
    }

    /// Build an in-memory writer
    pub fn to_buffer(self) -> XmlWriter<'static> {
        XmlWriter::with_sink(Sink::Buffer(Vec::with_capacity(self.buffer_capacity)))
    }
}

impl Default for XmlWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
