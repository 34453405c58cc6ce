//! An editable text document backed by a piece tree.

mod buffer;
mod buffer_builder;
mod io;

pub use crate::buffer::{BufferError, TextBuffer};
pub use crate::buffer_builder::{FinishedBuilder, TextBufferBuilder};
pub use crate::io::{load_from_path, load_from_reader};

pub use piece_tree::{
    Edit, EditError, EolStats, InvariantViolation, LineEnding, Position, PositionError,
    TreeConfig,
};
