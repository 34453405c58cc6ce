use std::rc::Rc;

use crate::eol::{EolStats, scan_line_starts};

/// An immutable run of text together with its line metadata.
///
/// The text is reference counted: every piece cut out of a chunk shares
/// the same allocation, which is freed once the last piece is gone.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub(crate) text: Rc<str>,
    pub(crate) line_starts: Vec<usize>,
    pub(crate) eol: EolStats,
}

impl Chunk {
    pub fn new(text: impl Into<Rc<str>>) -> Self {
        let text = text.into();
        let (line_starts, eol) = scan_line_starts(text.as_bytes());
        Self {
            text,
            line_starts,
            eol,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Offsets just past each terminator in this chunk.
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn eol_stats(&self) -> EolStats {
        self.eol
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_counts_lines_and_styles() {
        let chunk = Chunk::from("abc\r\ndef\nxyz\r");
        assert_eq!(chunk.len(), 13);
        assert_eq!(chunk.line_starts(), &[5, 9, 13]);
        assert_eq!(chunk.eol_stats(), EolStats { lf: 1, crlf: 1, cr: 1 });
    }

    #[test]
    fn empty_chunk() {
        let chunk = Chunk::from(String::new());
        assert!(chunk.is_empty());
        assert!(chunk.line_starts().is_empty());
    }
}
