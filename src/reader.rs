//! Event-driven XML reader
//!
//! Streams a document through [`quick_xml`] and reports each element twice:
//! once at its start tag with the decoded attributes, and once at its end
//! tag with the character data collected in between. Memory use is bounded
//! by the text of the currently open elements, not by the document size.

use crate::error::{Result, XmlError};
use crate::types::Attribute;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Size of each read from a file
const READ_CHUNK: usize = 4096;

/// Characters stripped from the front of element content
const LEADING_WHITESPACE: [char; 4] = ['\t', '\n', '\r', ' '];

/// Receives element events from the reader
///
/// Returning an error from either callback aborts parsing; the error is
/// handed back to the caller of `parse_*` unchanged.
pub trait ElementHandler {
    /// Called at a start tag (or an empty tag) with 1-based line number
    fn start(&mut self, line: u64, name: &str, attributes: &[Attribute]) -> Result<()>;

    /// Called at the matching end tag with the element's own text
    ///
    /// `content` is the concatenation of all text and CDATA directly inside
    /// the element, with leading whitespace removed. Line endings are
    /// normalised to `\n`.
    fn end(&mut self, line: u64, name: &str, content: &str) -> Result<()>;
}

/// Parse the XML file at `path`
///
/// # Examples
///
/// ```no_run
/// use xmlstream::{parse_file, Attribute, ElementHandler, Result};
///
/// struct Titles(Vec<String>);
///
/// impl ElementHandler for Titles {
///     fn start(&mut self, _line: u64, _name: &str, _attrs: &[Attribute]) -> Result<()> {
///         Ok(())
///     }
///
///     fn end(&mut self, _line: u64, name: &str, content: &str) -> Result<()> {
///         if name == "title" {
///             self.0.push(content.to_string());
///         }
///         Ok(())
///     }
/// }
///
/// let mut titles = Titles(Vec::new());
/// parse_file("books.xml", &mut titles)?;
/// # Ok::<(), xmlstream::XmlError>(())
/// ```
pub fn parse_file<P, H>(path: P, handler: &mut H) -> Result<()>
where
    P: AsRef<Path>,
    H: ElementHandler + ?Sized,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to open xml file");
        XmlError::Io(e)
    })?;

    parse_reader(BufReader::with_capacity(READ_CHUNK, file), handler)
}

/// Parse an XML document held in memory
pub fn parse_buffer<H>(data: &[u8], handler: &mut H) -> Result<()>
where
    H: ElementHandler + ?Sized,
{
    parse_reader(data, handler)
}

/// Parse an XML document from any buffered reader
pub fn parse_reader<R, H>(input: R, handler: &mut H) -> Result<()>
where
    R: BufRead,
    H: ElementHandler + ?Sized,
{
    let mut reader = Reader::from_reader(LineCounter::new(input));
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.trim_text(false);

    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut attributes: Vec<Attribute> = Vec::new();
    // One content accumulator per open element
    let mut open: Vec<String> = Vec::new();
    let mut root_seen = false;

    loop {
        let line = reader.get_ref().line();

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if open.is_empty() && root_seen {
                    return Err(parse_error(line, "more than one root element"));
                }
                root_seen = true;

                let name = std::str::from_utf8(e.name().into_inner())?;
                attributes.clear();
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = std::str::from_utf8(attr.key.as_ref())?;
                    let value = attr.unescape_value()?;
                    attributes.push(Attribute::new(key, value));
                }

                tracing::debug!(line, name, attributes = attributes.len(), "element start");
                handler
                    .start(line, name, &attributes)
                    .map_err(|e| rejected(line, name, e))?;
                open.push(String::new());
            }
            Ok(Event::End(e)) => {
                let name = std::str::from_utf8(e.name().into_inner())?;
                let content = open
                    .pop()
                    .ok_or_else(|| parse_error(line, &format!("unexpected </{}>", name)))?;
                let content = content.trim_start_matches(LEADING_WHITESPACE);

                tracing::debug!(line, name, bytes = content.len(), "element end");
                handler
                    .end(line, name, content)
                    .map_err(|e| rejected(line, name, e))?;
            }
            Ok(Event::Text(e)) => match open.last_mut() {
                Some(content) => {
                    let raw = normalize_newlines(std::str::from_utf8(&e)?);
                    let text =
                        quick_xml::escape::unescape(&raw).map_err(quick_xml::Error::from)?;
                    content.push_str(&text);
                }
                None => {
                    if !e.iter().all(|b| b.is_ascii_whitespace()) {
                        return Err(parse_error(line, "text outside the root element"));
                    }
                }
            },
            Ok(Event::CData(e)) => match open.last_mut() {
                Some(content) => {
                    content.push_str(&normalize_newlines(std::str::from_utf8(&e)?));
                }
                None => return Err(parse_error(line, "CDATA outside the root element")),
            },
            Ok(Event::Eof) => break,
            // Declaration, comments, processing instructions, doctype
            Ok(_) => {}
            Err(e) => {
                tracing::error!(line, error = %e, "xml parse failed");
                return Err(e.into());
            }
        }

        buf.clear();
    }

    if !open.is_empty() {
        return Err(parse_error(
            reader.get_ref().line(),
            &format!("document ended with {} unclosed element(s)", open.len()),
        ));
    }
    if !root_seen {
        return Err(parse_error(reader.get_ref().line(), "no root element"));
    }

    Ok(())
}

/// `\r\n` and lone `\r` become `\n`
fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if memchr::memchr(b'\r', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

fn parse_error(line: u64, message: &str) -> XmlError {
    tracing::error!(line, reason = message, "xml parse failed");
    XmlError::ParseError(format!("line {}: {}", line, message))
}

fn rejected(line: u64, name: &str, err: XmlError) -> XmlError {
    tracing::error!(line, name, error = %err, "element handler rejected event");
    err
}

/// Counts newlines as the parser consumes input
struct LineCounter<R> {
    inner: R,
    line: u64,
}

impl<R: BufRead> LineCounter<R> {
    fn new(inner: R) -> Self {
        LineCounter { inner, line: 1 }
    }

    /// Line of the next unconsumed byte
    fn line(&self) -> u64 {
        self.line
    }

    fn count(&mut self, bytes: &[u8]) {
        self.line += memchr::memchr_iter(b'\n', bytes).count() as u64;
    }
}

impl<R: BufRead> Read for LineCounter<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(out)?;
        self.count(&out[..n]);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for LineCounter<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            if let Ok(available) = self.inner.fill_buf() {
                let consumed = memchr::memchr_iter(b'\n', &available[..amt.min(available.len())])
                    .count() as u64;
                self.line += consumed;
            }
        }
        self.inner.consume(amt);
    }
}
