use thiserror::Error;
use tracing::error;

use crate::PieceTree;
use crate::eol::{LineBreak, scan_line_starts};
use crate::tree::{NodeColor, NodeId, Tree};

/// A broken structural property. Always an engine bug, never user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root node is red")]
    RedRoot,
    #[error("red node at offset {offset} has a red child")]
    RedRed { offset: usize },
    #[error("black height differs below offset {offset}: {left} vs {right}")]
    BlackHeight {
        offset: usize,
        left: usize,
        right: usize,
    },
    #[error("node at offset {offset} has a broken parent link")]
    ParentLink { offset: usize },
    #[error("cached length {cached} at offset {offset}, expected {actual}")]
    LengthMismatch {
        offset: usize,
        cached: usize,
        actual: usize,
    },
    #[error("cached line-break count {cached} at offset {offset}, expected {actual}")]
    LineBreakMismatch {
        offset: usize,
        cached: usize,
        actual: usize,
    },
    #[error("empty piece at offset {offset}")]
    EmptyPiece { offset: usize },
    #[error("piece at offset {offset} slices {start}..{end} of a {buffer_len} byte chunk")]
    SliceOutOfBounds {
        offset: usize,
        start: usize,
        end: usize,
        buffer_len: usize,
    },
    #[error("piece at offset {offset} has stale line starts")]
    StaleLineStarts { offset: usize },
    #[error("piece at offset {offset} has a stale end break")]
    StaleEndBreak { offset: usize },
    #[error("CR/LF pair split across pieces at offset {offset}")]
    SplitCrLf { offset: usize },
}

struct Subtree {
    size: usize,
    lf: usize,
    black_height: usize,
}

impl PieceTree {
    /// Walk the whole tree and verify every cached aggregate, the
    /// red-black properties and the per-piece line metadata.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let tree = &self.tree;
        if let Some(root) = tree.root() {
            if tree.node(root).color == NodeColor::Red {
                return Err(InvariantViolation::RedRoot);
            }
            if tree.node(root).parent.is_some() {
                return Err(InvariantViolation::ParentLink { offset: 0 });
            }
        }
        check_subtree(tree, tree.root(), 0)?;
        check_pieces(tree)
    }

    /// Panic if [`check_invariants`](Self::check_invariants) fails. Does
    /// nothing in release builds.
    pub fn assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        if let Err(violation) = self.check_invariants() {
            error!(%violation, pieces = self.piece_count(), "piece tree invariant violated");
            panic!("piece tree invariant violated: {violation}");
        }
    }
}

fn check_subtree(
    tree: &Tree,
    node: Option<NodeId>,
    offset: usize,
) -> Result<Subtree, InvariantViolation> {
    let Some(id) = node else {
        return Ok(Subtree {
            size: 0,
            lf: 0,
            black_height: 1,
        });
    };
    let n = tree.node(id);

    for child in [n.left, n.right].into_iter().flatten() {
        if tree.node(child).parent != Some(id) {
            return Err(InvariantViolation::ParentLink { offset });
        }
        if n.color == NodeColor::Red && tree.node(child).color == NodeColor::Red {
            return Err(InvariantViolation::RedRed { offset });
        }
    }

    let left = check_subtree(tree, n.left, offset)?;
    let piece_offset = offset + left.size;
    let right = check_subtree(tree, n.right, piece_offset + n.piece.len())?;

    if left.black_height != right.black_height {
        return Err(InvariantViolation::BlackHeight {
            offset: piece_offset,
            left: left.black_height,
            right: right.black_height,
        });
    }

    let size = left.size + n.piece.len() + right.size;
    if n.size != size {
        return Err(InvariantViolation::LengthMismatch {
            offset: piece_offset,
            cached: n.size,
            actual: size,
        });
    }
    let lf = left.lf + n.piece.line_break_count() + right.lf;
    if n.lf != lf {
        return Err(InvariantViolation::LineBreakMismatch {
            offset: piece_offset,
            cached: n.lf,
            actual: lf,
        });
    }

    Ok(Subtree {
        size,
        lf,
        black_height: left.black_height + usize::from(n.color == NodeColor::Black),
    })
}

fn check_pieces(tree: &Tree) -> Result<(), InvariantViolation> {
    let mut offset = 0;
    let mut prev_ends_with_cr = false;

    for id in tree.iter() {
        let piece = tree.piece(id);
        let range = piece.range();
        let buffer_len = piece.buffer().len();

        if range.is_empty() {
            return Err(InvariantViolation::EmptyPiece { offset });
        }
        if range.end > buffer_len
            || !piece.buffer().is_char_boundary(range.start)
            || !piece.buffer().is_char_boundary(range.end)
        {
            return Err(InvariantViolation::SliceOutOfBounds {
                offset,
                start: range.start,
                end: range.end,
                buffer_len,
            });
        }

        let bytes = piece.text().as_bytes();
        let (line_starts, _) = scan_line_starts(bytes);
        if line_starts != piece.line_starts() {
            return Err(InvariantViolation::StaleLineStarts { offset });
        }
        if LineBreak::at_end_of(bytes) != piece.end_break() {
            return Err(InvariantViolation::StaleEndBreak { offset });
        }
        if prev_ends_with_cr && piece.starts_with_lf() {
            return Err(InvariantViolation::SplitCrLf { offset });
        }

        prev_ends_with_cr = piece.ends_with_cr();
        offset += piece.len();
    }

    Ok(())
}
