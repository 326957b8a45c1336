//! Borrowed source-slice primitives.
//!
//! A `Buffer` is a non-owning view into the original source text: a start/end
//! byte offset pair. Every later stage (tokens, AST leaves, IR string
//! constants) slices the source through a `Buffer` rather than copying bytes
//! around, so there is exactly one owner of the source text for the whole
//! compile: the `SourceFile`.

use std::fmt;

/// A borrowed, non-owning view into a source file.
///
/// Equality is byte-wise: two buffers over different source files or
/// different positions are equal iff their bytes match.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Buffer<'src> {
    bytes: &'src [u8],
}

impl<'src> Buffer<'src> {
    pub const EMPTY: Buffer<'static> = Buffer { bytes: &[] };

    pub fn new(bytes: &'src [u8]) -> Self {
        Buffer { bytes }
    }

    pub fn from_str(s: &'src str) -> Self {
        Buffer { bytes: s.as_bytes() }
    }

    pub fn as_bytes(&self) -> &'src [u8] {
        self.bytes
    }

    pub fn as_str(&self) -> &'src str {
        // The source file is read as UTF-8 up front (`SourceFile::new`), and every
        // Buffer is sliced at token boundaries the tokenizer already validated,
        // so this can only fail on a lexer bug.
        std::str::from_utf8(self.bytes).expect("Buffer must always slice valid UTF-8")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({:?})", self.as_str())
    }
}

impl fmt::Display for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole compiled source file: owns the text, hands out byte-offset
/// slices as `Buffer`s, and can map an offset back to a 1-indexed
/// `(line, column)` pair for diagnostics.
pub struct SourceFile {
    path: std::path::PathBuf,
    text: String,
    /// Byte offset of the start of each line, including line 0.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(path: impl Into<std::path::PathBuf>, text: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        SourceFile {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Slice the source by byte offsets. `start <= end <= text.len()` is a
    /// precondition enforced by every caller (tokenizer offsets are always
    /// byte-exact; there is no re-validation here).
    pub fn slice(&self, start: u32, end: u32) -> Buffer<'_> {
        Buffer::new(&self.text.as_bytes()[start as usize..end as usize])
    }

    /// 0-indexed line number containing `offset`.
    pub fn line_of(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        }
    }

    /// 0-indexed column within its line.
    pub fn column_of(&self, offset: u32) -> usize {
        let line = self.line_of(offset);
        (offset - self.line_starts[line]) as usize
    }

    /// The full text of the line containing `offset`, without its trailing newline.
    pub fn line_text(&self, offset: u32) -> &str {
        let line = self.line_of(offset);
        let start = self.line_starts[line] as usize;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|&e| e as usize)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches(['\n', '\r'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_byte_exact() {
        let src = SourceFile::new("t.sub", "fn main() {}".to_string());
        let b = src.slice(0, 2);
        assert_eq!(b.as_str(), "fn");
    }

    #[test]
    fn buffer_equality_is_byte_wise() {
        let a = Buffer::from_str("abc");
        let b = Buffer::from_str("abc");
        assert_eq!(a, b);
        assert_ne!(a, Buffer::from_str("abd"));
    }

    #[test]
    fn line_and_column_tracking() {
        let src = SourceFile::new("t.sub", "abc\ndef\nghi".to_string());
        // offset 5 is 'e' on the second line
        assert_eq!(src.line_of(5), 1);
        assert_eq!(src.column_of(5), 1);
        assert_eq!(src.line_text(5), "def");
    }

    #[test]
    fn empty_buffer_constant() {
        assert_eq!(Buffer::EMPTY.len(), 0);
        assert!(Buffer::EMPTY.is_empty());
    }
}
