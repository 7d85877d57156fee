//! Shared type definitions and fixed output constants

use std::fmt;

/// XML declaration written before the root element
pub const XML_DECLARATION: &[u8] = b"<?xml version='1.0' encoding='UTF-8'?>";

/// Suffix appended to the target path while a file document is being written
pub const PART_SUFFIX: &str = ".part";

/// Capacity of the attribute escape scratch area, terminator included.
///
/// An escaped value must be strictly shorter than this.
pub const ATTR_CAPACITY: usize = 256;

/// Position of the writer in the element state machine
///
/// | State     | Meaning                                                  |
/// |-----------|----------------------------------------------------------|
/// | `Init`    | nothing written yet                                      |
/// | `Top`     | last opened tag is still unterminated (`<name attr="v"`) |
/// | `Nested`  | last tag was closed; more siblings or a parent close next |
/// | `Content` | text was written inside the innermost element            |
/// | `Eof`     | root element closed, document complete                   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriterState {
    #[default]
    Init,
    Top,
    Nested,
    Content,
    Eof,
}

impl WriterState {
    /// Whether an attribute may be written in this state.
    ///
    /// `Nested` is accepted even though no tag is textually open there.
    pub fn accepts_attribute(&self) -> bool {
        matches!(self, WriterState::Top | WriterState::Nested)
    }

    /// Whether the document has been fully written
    pub fn is_eof(&self) -> bool {
        *self == WriterState::Eof
    }
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterState::Init => "init",
            WriterState::Top => "top",
            WriterState::Nested => "nested",
            WriterState::Content => "content",
            WriterState::Eof => "eof",
        };
        f.write_str(name)
    }
}

/// A decoded attribute delivered by the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written in the document
    pub name: String,
    /// Attribute value with entity references resolved
    pub value: String,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<(&str, &str)> for Attribute {
    fn from((name, value): (&str, &str)) -> Self {
        Attribute::new(name, value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        assert_eq!(WriterState::default(), WriterState::Init);
    }

    #[test]
    fn test_attribute_states() {
        assert!(WriterState::Top.accepts_attribute());
        assert!(WriterState::Nested.accepts_attribute());
        assert!(!WriterState::Init.accepts_attribute());
        assert!(!WriterState::Content.accepts_attribute());
        assert!(!WriterState::Eof.accepts_attribute());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WriterState::Content.to_string(), "content");
        assert_eq!(WriterState::Eof.to_string(), "eof");
    }

    #[test]
    fn test_attribute_from_tuple() {
        let attr = Attribute::from(("id", "7"));
        assert_eq!(attr, Attribute::new("id", "7"));
        assert_eq!(attr.to_string(), "id=\"7\"");
    }
}
