//! Source text snapshots for one tokenization pass.
//!
//! All offsets in the crate are 0-indexed, half-open `[start, end)` char
//! offsets into the normalized text held here (not the raw input). Regexes
//! report byte offsets, so `SourceText` keeps a char-to-byte table for
//! converting in both directions.

/// Immutable text snapshot with char/byte offset conversion.
///
/// Construction normalizes line endings: `\r\n` and lone `\r` become `\n`.
/// Every offset handed out by the rest of the crate refers to this
/// normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    /// Byte offset of each char, plus one trailing entry at `text.len()`.
    char_to_byte: Vec<usize>,
}

impl SourceText {
    /// Snapshot `raw`, normalizing line endings.
    pub fn new(raw: &str) -> Self {
        let text = normalize_line_endings(raw);
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        char_to_byte.push(text.len());
        Self { text, char_to_byte }
    }

    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of chars in the normalized text.
    pub fn len_chars(&self) -> usize {
        self.char_to_byte.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset of the char at `char_idx`. Offsets past the end clamp to
    /// `text.len()`.
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        let idx = char_idx.min(self.char_to_byte.len() - 1);
        self.char_to_byte[idx]
    }

    /// Char offset of the char starting at `byte_idx`. Bytes inside a
    /// multi-byte char round up to the next boundary.
    pub fn byte_to_char(&self, byte_idx: usize) -> usize {
        self.char_to_byte.partition_point(|&byte| byte < byte_idx)
    }

    /// Slice by char offsets.
    pub fn slice(&self, range: std::ops::Range<usize>) -> &str {
        let start = self.char_to_byte(range.start);
        let end = self.char_to_byte(range.end);
        &self.text[start..end]
    }
}

/// Replace `\r\n` and lone `\r` with `\n`.
fn normalize_line_endings(raw: &str) -> String {
    if !raw.contains('\r') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    out
}
