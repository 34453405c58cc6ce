use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use piece_tree::{
    Edit, EditError, InvariantViolation, LineEnding, PieceTree, Position, PositionError,
};
use thiserror::Error;

use crate::buffer_builder::TextBufferBuilder;

/// Failure of a line/column addressed edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    tree: PieceTree,
    line_ending: LineEnding,
}

impl TextBuffer {
    pub(crate) fn from_parts(tree: PieceTree, line_ending: LineEnding) -> Self {
        Self { tree, line_ending }
    }

    /// The line ending detected when the buffer was built.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Insert `value` at byte `offset` in the document.
    pub fn insert(&mut self, offset: usize, value: &str) -> Result<(), EditError> {
        self.tree.insert(offset, value)
    }

    /// Delete `len` bytes starting at byte `offset`.
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<(), EditError> {
        self.tree.delete(offset, len)
    }

    /// Apply non-overlapping edits, all addressed in pre-batch offsets.
    pub fn replace_offset_len(&mut self, edits: &[Edit]) -> Result<(), EditError> {
        self.tree.replace_offset_len(edits)
    }

    /// Convenience: insert at (line, column), both 1-based.
    pub fn insert_at(&mut self, line: usize, column: usize, value: &str) -> Result<(), BufferError> {
        let offset = self.get_offset_at(line, column)?;
        Ok(self.insert(offset, value)?)
    }

    /// Convenience: delete `len` bytes starting at (line, column).
    pub fn delete_at(&mut self, line: usize, column: usize, len: usize) -> Result<(), BufferError> {
        let offset = self.get_offset_at(line, column)?;
        Ok(self.delete(offset, len)?)
    }

    /// Get complete text content.
    pub fn get_text(&self) -> String {
        self.tree.get_text()
    }

    pub fn get_value_in_range(&self, start: usize, end: usize) -> Result<String, PositionError> {
        self.tree.get_value_in_range(start, end)
    }

    /// Get the number of lines (1-based; empty doc => 1 line).
    pub fn get_line_count(&self) -> usize {
        self.tree.line_count()
    }

    /// Get the document byte length.
    pub fn get_length(&self) -> usize {
        self.tree.len()
    }

    /// Content of a 1-based line, terminator included.
    pub fn get_line_content(&self, line_number: usize) -> Result<String, PositionError> {
        self.tree.get_line_content(line_number)
    }

    /// Get all lines, terminators included.
    pub fn get_lines_content(&self) -> Vec<String> {
        self.tree.get_lines_content()
    }

    /// Get the byte length (without EOL) of a line (1-based).
    pub fn get_line_length(&self, line_number: usize) -> Result<usize, PositionError> {
        self.tree.get_line_length(line_number)
    }

    /// 1-based (line, column) to 0-based byte offset.
    pub fn get_offset_at(&self, line_number: usize, column: usize) -> Result<usize, PositionError> {
        self.tree.get_offset_at(line_number, column)
    }

    /// 0-based byte offset to 1-based position.
    pub fn get_position_at(&self, offset: usize) -> Result<Position, PositionError> {
        self.tree.get_position_at(offset)
    }

    /// Max column on a line (1-based).
    pub fn get_line_max_column(&self, line_number: usize) -> Result<usize, PositionError> {
        self.tree.get_line_max_column(line_number)
    }

    pub fn piece_count(&self) -> usize {
        self.tree.piece_count()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.tree.check_invariants()
    }

    /// Debug builds only; see [`PieceTree::assert_invariants`].
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

impl FromStr for TextBuffer {
    type Err = Infallible;

    /// Build from a single string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = TextBufferBuilder::new();
        builder.accept_chunk(s);
        Ok(builder.finish().build())
    }
}
