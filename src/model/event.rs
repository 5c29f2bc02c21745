//! Cell events produced while scanning a sheet.

use super::CellAddress;

/// One step of a sheet scan.
///
/// Events arrive in reading order: rows top to bottom, cells left to right
/// within a row. Cell text is already resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    /// A row element was opened.
    RowStart(u32),
    /// A cell with a value.
    Cell {
        /// Position of the cell
        address: CellAddress,
        /// Display text
        text: String,
    },
    /// A row element was closed.
    RowEnd(u32),
}

impl CellEvent {
    /// Shorthand for building a cell event.
    pub fn cell(row: u32, col: u32, text: impl Into<String>) -> Self {
        CellEvent::Cell {
            address: CellAddress::new(row, col),
            text: text.into(),
        }
    }
}
