use std::rc::Rc;

use crate::eol::{LineBreak, scan_line_starts};

/// A slice `start..end` of an immutable buffer, with the offsets (relative
/// to `start`) just past every terminator inside the slice.
///
/// A trailing `\r` is counted as a terminator of its own. The tree never
/// places a piece ending in `\r` right before a piece starting with `\n`,
/// so that count is always the one the document sees.
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    buffer: Rc<str>,
    start: usize,
    end: usize,
    line_starts: Vec<usize>,
    end_break: LineBreak,
}

impl Piece {
    /// Build a piece whose line starts are already known.
    pub(crate) fn from_parts(
        buffer: Rc<str>,
        start: usize,
        end: usize,
        line_starts: Vec<usize>,
    ) -> Self {
        let end_break = LineBreak::at_end_of(&buffer.as_bytes()[start..end]);
        Self {
            buffer,
            start,
            end,
            line_starts,
            end_break,
        }
    }

    pub(crate) fn new(buffer: Rc<str>, start: usize, end: usize) -> Self {
        let (line_starts, _) = scan_line_starts(&buffer.as_bytes()[start..end]);
        Self::from_parts(buffer, start, end, line_starts)
    }

    pub(crate) fn from_text(text: &str) -> Self {
        Self::new(Rc::from(text), 0, text.len())
    }

    /// Cut `text` into pieces of at most `max_len` bytes sharing one buffer.
    ///
    /// Cuts land on char boundaries and never between `\r` and `\n`.
    pub(crate) fn split_text(text: &str, max_len: usize) -> Vec<Piece> {
        let buffer: Rc<str> = Rc::from(text);
        let bytes = text.as_bytes();
        let len = text.len();
        let max_len = max_len.max(1);
        let mut pieces = Vec::with_capacity(len / max_len + 1);

        let mut start = 0;
        while start < len {
            let mut end = (start + max_len).min(len);
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if end <= start {
                end = start + 1;
                while !text.is_char_boundary(end) {
                    end += 1;
                }
            }
            if end < len && bytes[end - 1] == b'\r' && bytes[end] == b'\n' {
                end = if end - 1 > start { end - 1 } else { end + 1 };
            }
            pieces.push(Piece::new(Rc::clone(&buffer), start, end));
            start = end;
        }

        pieces
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub(crate) fn text(&self) -> &str {
        &self.buffer[self.start..self.end]
    }

    pub(crate) fn buffer(&self) -> &Rc<str> {
        &self.buffer
    }

    pub(crate) fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub(crate) fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    #[inline]
    pub(crate) fn line_break_count(&self) -> usize {
        self.line_starts.len()
    }

    pub(crate) fn end_break(&self) -> LineBreak {
        self.end_break
    }

    pub(crate) fn ends_with_cr(&self) -> bool {
        self.end_break == LineBreak::Cr
    }

    pub(crate) fn starts_with_lf(&self) -> bool {
        self.text().as_bytes().first() == Some(&b'\n')
    }

    pub(crate) fn is_char_boundary(&self, at: usize) -> bool {
        self.buffer.is_char_boundary(self.start + at)
    }

    /// Number of terminators that end at or before `at`.
    pub(crate) fn breaks_before(&self, at: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= at)
    }

    /// Split into `..at` and `at..`. `at` must be strictly inside the piece.
    pub(crate) fn split_at(&self, at: usize) -> (Piece, Piece) {
        debug_assert!(at > 0 && at < self.len());
        let bytes = self.text().as_bytes();
        let idx = self.breaks_before(at);

        let mut left_starts = self.line_starts[..idx].to_vec();
        if bytes[at - 1] == b'\r' && bytes[at] == b'\n' {
            // the CR is now bare on the left; the LF stays a break of its own
            left_starts.push(at);
        }
        let right_starts = self.line_starts[idx..].iter().map(|s| s - at).collect();

        let left = Piece::from_parts(
            Rc::clone(&self.buffer),
            self.start,
            self.start + at,
            left_starts,
        );
        let right = Piece::from_parts(
            Rc::clone(&self.buffer),
            self.start + at,
            self.end,
            right_starts,
        );
        (left, right)
    }

    fn joined_line_starts(&self, next: &Piece) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.line_starts.len() + next.line_starts.len());
        starts.extend_from_slice(&self.line_starts);
        if self.ends_with_cr() && next.starts_with_lf() {
            starts.pop();
        }
        let offset = self.len();
        starts.extend(next.line_starts.iter().map(|s| s + offset));
        starts
    }

    /// Join with `next` without copying, when both slice the same buffer
    /// back to back.
    pub(crate) fn join_contiguous(&self, next: &Piece) -> Option<Piece> {
        if !Rc::ptr_eq(&self.buffer, &next.buffer) || self.end != next.start {
            return None;
        }
        Some(Piece::from_parts(
            Rc::clone(&self.buffer),
            self.start,
            next.end,
            self.joined_line_starts(next),
        ))
    }

    /// Copy both slices into a fresh buffer.
    pub(crate) fn concat(&self, next: &Piece) -> Piece {
        let mut text = String::with_capacity(self.len() + next.len());
        text.push_str(self.text());
        text.push_str(next.text());
        let len = text.len();
        Piece::from_parts(Rc::from(text), 0, len, self.joined_line_starts(next))
    }
}
