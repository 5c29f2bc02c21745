//! Data model shared by the sheet decoder and the grid serializer.
//!
//! The decoder turns sheet markup into a stream of [`CellEvent`]s addressed by
//! [`CellAddress`]; the serializer lays those events out as delimited text.

mod address;
mod event;

pub use address::*;
pub use event::*;
