//! Bounded escaping for attribute values

use crate::types::ATTR_CAPACITY;

/// Escapes attribute values into a fixed-size scratch area
///
/// Reserved characters become entity references, `\t`, `\n` and `\r` are
/// dropped, everything else is copied unchanged. A value whose escaped form
/// would reach [`ATTR_CAPACITY`] bytes is rejected as a whole.
pub struct AttrEscaper {
    buf: [u8; ATTR_CAPACITY],
    len: usize,
}

impl AttrEscaper {
    pub fn new() -> Self {
        AttrEscaper {
            buf: [0u8; ATTR_CAPACITY],
            len: 0,
        }
    }

    /// Escape `value`, returning the escaped bytes or `None` on overflow
    pub fn escape(&mut self, value: &str) -> Option<&[u8]> {
        self.len = 0;

        for &byte in value.as_bytes() {
            let fragment: &[u8] = match byte {
                b'\t' | b'\n' | b'\r' => continue,
                b'&' => b"&amp;",
                b'"' => b"&quot;",
                b'\'' => b"&apos;",
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                _ => std::slice::from_ref(&byte),
            };

            if !self.push(fragment) {
                self.len = 0;
                return None;
            }
        }

        Some(&self.buf[..self.len])
    }

    /// Append a fragment if it leaves room for the terminator
    #[inline]
    fn push(&mut self, fragment: &[u8]) -> bool {
        let end = self.len + fragment.len();
        if end >= ATTR_CAPACITY {
            return false;
        }
        self.buf[self.len..end].copy_from_slice(fragment);
        self.len = end;
        true
    }
}

impl Default for AttrEscaper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(value: &str) -> Option<String> {
        let mut escaper = AttrEscaper::new();
        escaper
            .escape(value)
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
    }

    #[test]
    fn test_reserved_characters() {
        assert_eq!(
            escape(r#"<a href="x">&'"#).unwrap(),
            "&lt;a href=&quot;x&quot;&gt;&amp;&apos;"
        );
    }

    #[test]
    fn test_whitespace_controls_dropped() {
        assert_eq!(escape("a\tb\nc\r\nd").unwrap(), "abcd");
        assert_eq!(escape("keep spaces").unwrap(), "keep spaces");
    }

    #[test]
    fn test_utf8_passthrough() {
        assert_eq!(escape("Tiếng Việt ✓").unwrap(), "Tiếng Việt ✓");
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(escape("").unwrap(), "");
    }

    #[test]
    fn test_capacity_limit() {
        let fits = "x".repeat(ATTR_CAPACITY - 1);
        assert_eq!(escape(&fits).unwrap().len(), ATTR_CAPACITY - 1);

        let too_long = "x".repeat(ATTR_CAPACITY);
        assert!(escape(&too_long).is_none());
    }

    #[test]
    fn test_entity_overflow() {
        // 250 plain bytes + "&amp;" reaches 255: still fits
        let value = format!("{}&", "x".repeat(250));
        assert_eq!(escape(&value).unwrap().len(), 255);

        // 251 plain bytes + "&amp;" would reach the terminator slot
        let value = format!("{}&", "x".repeat(251));
        assert!(escape(&value).is_none());
    }

    #[test]
    fn test_dropped_characters_do_not_count() {
        let value = format!("{}{}", "x".repeat(ATTR_CAPACITY - 1), "\n".repeat(64));
        assert!(escape(&value).is_some());
    }

    #[test]
    fn test_reuse_after_overflow() {
        let mut escaper = AttrEscaper::new();
        assert!(escaper.escape(&"<".repeat(100)).is_none());
        assert_eq!(escaper.escape("ok").unwrap(), b"ok");
    }
}
