//! Caret-level text splicing for host inputs.
//!
//! Browsers report `selectionStart`/`selectionEnd` in UTF-16 code units while
//! Rust strings are indexed by byte, so offsets are converted at the edges.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl TextChange {
    pub fn new(start: usize, end: usize, insert: impl Into<String>) -> Self {
        Self {
            start,
            end,
            insert: insert.into(),
        }
    }

    /// Applies the change to `text`, returning the new text and the caret
    /// placed right after the inserted content. Byte offsets.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len() + self.insert.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.insert);
        out.push_str(&text[self.end..]);
        (out, self.start + self.insert.len())
    }
}

/// Byte offset of the UTF-16 offset `units`, clamped to the text and snapped
/// back to a char boundary.
pub fn utf16_to_byte(text: &str, units: usize) -> usize {
    let mut seen = 0usize;
    for (byte, ch) in text.char_indices() {
        if seen >= units {
            return byte;
        }
        seen += ch.len_utf16();
        if seen > units {
            return byte;
        }
    }
    text.len()
}

pub fn byte_to_utf16(text: &str, byte: usize) -> usize {
    text[..byte.min(text.len())].encode_utf16().count()
}

/// Replaces the UTF-16 `selection` of `value` with `insert`.
///
/// Returns the new value and the collapsed caret, in UTF-16 units.
pub fn splice_utf16(value: &str, selection: Selection, insert: &str) -> (String, usize) {
    let start = utf16_to_byte(value, selection.start);
    let end = utf16_to_byte(value, selection.end);
    let range = Selection::new(start, end).clamp(value.len());
    let (next, caret) = TextChange::new(range.start, range.end, insert).apply(value);
    let caret_units = byte_to_utf16(&next, caret);
    (next, caret_units)
}
