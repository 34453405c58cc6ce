use std::ops::Range;

use thiserror::Error;
use tracing::trace;

use crate::PieceTree;
use crate::piece::Piece;
use crate::tree::NodeId;

/// Seams are only copied into a fresh chunk up to this many bytes.
const MAX_MERGE_COPY: usize = 256;

/// Replace `length` bytes at `offset` with `text`.
///
/// Offsets of every edit in a batch refer to the document as it was
/// before the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edit {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl Edit {
    pub fn new(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    pub fn delete(offset: usize, length: usize) -> Self {
        Self::new(offset, length, String::new())
    }

    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    fn is_noop(&self) -> bool {
        self.length == 0 && self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit {offset}+{length} is out of bounds for a document of {len} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
    #[error("edits {first:?} and {second:?} overlap")]
    Overlapping {
        first: Range<usize>,
        second: Range<usize>,
    },
}

impl PieceTree {
    /// Insert `text` at byte `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
        self.replace_offset_len(&[Edit::insert(offset, text)])
    }

    /// Delete `length` bytes starting at `offset`.
    pub fn delete(&mut self, offset: usize, length: usize) -> Result<(), EditError> {
        self.replace_offset_len(&[Edit::delete(offset, length)])
    }

    /// Apply a batch of non-overlapping edits.
    ///
    /// The whole batch is validated before anything changes, so an error
    /// leaves the document untouched. Edits are ordered by offset (ties by
    /// length, then input order) and applied from the highest offset down.
    pub fn replace_offset_len(&mut self, edits: &[Edit]) -> Result<(), EditError> {
        let ordered = self.validate(edits)?;
        trace!(edits = edits.len(), len = self.len(), "applying edit batch");

        for edit in ordered.into_iter().rev() {
            if edit.is_noop() {
                continue;
            }
            self.apply(edit);
        }

        Ok(())
    }

    fn validate<'a>(&self, edits: &'a [Edit]) -> Result<Vec<&'a Edit>, EditError> {
        let len = self.len();
        for edit in edits {
            let end = edit
                .offset
                .checked_add(edit.length)
                .filter(|&end| end <= len)
                .ok_or(EditError::OutOfBounds {
                    offset: edit.offset,
                    length: edit.length,
                    len,
                })?;
            for at in [edit.offset, end] {
                if !self.is_char_boundary(at) {
                    return Err(EditError::NotCharBoundary { offset: at });
                }
            }
        }

        let mut ordered: Vec<&Edit> = edits.iter().collect();
        ordered.sort_by_key(|edit| (edit.offset, edit.length));
        for pair in ordered.windows(2) {
            if pair[0].offset + pair[0].length > pair[1].offset {
                return Err(EditError::Overlapping {
                    first: pair[0].range(),
                    second: pair[1].range(),
                });
            }
        }

        Ok(ordered)
    }

    pub(crate) fn is_char_boundary(&self, offset: usize) -> bool {
        match self.tree.locate_by_offset(offset) {
            Some((id, start)) => self.tree.piece(id).is_char_boundary(offset - start),
            None => offset == self.len(),
        }
    }

    fn apply(&mut self, edit: &Edit) {
        let start = edit.offset;
        let end = start + edit.length;

        self.split_at(end);
        self.split_at(start);
        if edit.length > 0 {
            self.remove_range(start, end);
        }

        if edit.text.is_empty() {
            self.repair_seam(start);
            return;
        }

        let pieces = Piece::split_text(&edit.text, self.config.max_piece_len);
        self.insert_pieces(start, pieces);
        self.repair_seam(start + edit.text.len());
        self.repair_seam(start);
    }

    /// The node holding the byte right before `offset`.
    fn node_before(&self, offset: usize) -> Option<NodeId> {
        offset
            .checked_sub(1)
            .and_then(|at| self.tree.locate_by_offset(at))
            .map(|(id, _)| id)
    }

    /// Make `offset` a piece boundary.
    fn split_at(&mut self, offset: usize) {
        let Some((id, node_start)) = self.tree.locate_by_offset(offset) else {
            return;
        };
        if node_start == offset {
            return;
        }
        let (left, right) = self.tree.piece(id).split_at(offset - node_start);
        self.tree.set_piece(id, left);
        self.tree.insert_after(Some(id), right);
    }

    /// Drop the pieces covering `start..end`. Both ends must be piece
    /// boundaries.
    fn remove_range(&mut self, start: usize, end: usize) {
        let mut remaining = end - start;
        while remaining > 0 {
            // removal may move pieces between nodes, so look up afresh
            let Some((id, node_start)) = self.tree.locate_by_offset(start) else {
                break;
            };
            debug_assert_eq!(node_start, start);
            remaining = remaining.saturating_sub(self.tree.piece(id).len());
            self.tree.remove(id);
        }
    }

    fn insert_pieces(&mut self, offset: usize, pieces: Vec<Piece>) {
        let mut anchor = self.node_before(offset);
        for piece in pieces {
            anchor = Some(self.tree.insert_after(anchor, piece));
        }
    }

    /// Re-resolve the piece boundary at `offset`, if there is one.
    ///
    /// A CR ending the left piece and an LF starting the right piece are
    /// brought into one piece. Neighbours that are small together are
    /// merged, by copying only when the copy stays short.
    fn repair_seam(&mut self, offset: usize) {
        if offset == 0 {
            return;
        }
        let Some((right_id, right_start)) = self.tree.locate_by_offset(offset) else {
            return;
        };
        if right_start != offset {
            return;
        }
        let Some(left_id) = self.tree.prev(right_id) else {
            return;
        };

        let left = self.tree.piece(left_id);
        let right = self.tree.piece(right_id);
        let combined = left.len() + right.len();
        let straddles = left.ends_with_cr() && right.starts_with_lf();
        let small = combined <= self.config.min_piece_len;
        if !straddles && !small {
            return;
        }

        let seg_start = offset - left.len();
        let seg_end = offset + right.len();
        let replacement = if let Some(joined) = left.join_contiguous(right) {
            vec![joined]
        } else if small && combined <= MAX_MERGE_COPY {
            vec![left.concat(right)]
        } else if straddles {
            let mut pieces = Vec::with_capacity(3);
            if left.len() > 1 {
                pieces.push(left.split_at(left.len() - 1).0);
            }
            pieces.push(Piece::from_text("\r\n"));
            if right.len() > 1 {
                pieces.push(right.split_at(1).1);
            }
            pieces
        } else {
            return;
        };

        trace!(offset, straddles, pieces = replacement.len(), "repairing seam");
        self.replace_run(seg_start, seg_end, replacement);
    }

    fn replace_run(&mut self, start: usize, end: usize, pieces: Vec<Piece>) {
        self.remove_range(start, end);
        self.insert_pieces(start, pieces);
    }
}
