//! # excel2csv
//!
//! Streaming conversion of a single XLSX worksheet to CSV.
//!
//! The sheet is decoded as a stream of cell events and written row by row, so
//! memory use does not grow with the size of the sheet. Empty rows and cells
//! are kept as empty lines and fields, numbers and dates are rendered with the
//! cell's number format.
//!
//! ## Quick Start
//!
//! ```no_run
//! // First sheet to CSV
//! let summary = excel2csv::convert("report.xlsx", "report.csv", None)?;
//! println!("{} rows, {} cells", summary.rows, summary.cells);
//!
//! // A named sheet, tab separated
//! let options = excel2csv::CsvOptions::tsv();
//! excel2csv::convert_with_options("report.xlsx", "q3.tsv", Some("Q3"), &options)?;
//! # Ok::<(), excel2csv::Error>(())
//! ```
//!
//! ## Lower-level APIs
//!
//! ```no_run
//! use excel2csv::{CellEvent, XlsxReader};
//!
//! let mut reader = XlsxReader::open("report.xlsx")?;
//! println!("Sheets: {:?}", reader.sheet_names());
//!
//! let sheet = reader.find_sheet(None)?.clone();
//! for event in reader.sheet_events(&sheet)? {
//!     if let CellEvent::Cell { address, text } = event? {
//!         println!("{} = {}", address, text);
//!     }
//! }
//! # Ok::<(), excel2csv::Error>(())
//! ```

pub mod container;
pub mod convert;
pub mod detect;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod xlsx;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use convert::{
    convert, convert_reader, convert_to_writer, convert_with_options, ConversionSummary,
};
pub use detect::WorkbookKind;
pub use error::{Error, Position, Result};
pub use format::{CellFormatter, DateSystem, FormatRule};
pub use model::{CellAddress, CellEvent};
pub use render::{CsvOptions, GridSerializer, GridStats, LineTerminator, QuoteStyle};
pub use xlsx::{SheetInfo, XlsxReader};

use std::path::Path;

/// List the worksheet names of a workbook in workbook order.
///
/// # Example
///
/// ```no_run
/// for name in excel2csv::sheet_names("report.xlsx")? {
///     println!("{}", name);
/// }
/// # Ok::<(), excel2csv::Error>(())
/// ```
pub fn sheet_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let reader = XlsxReader::open(path)?;
    Ok(reader.sheets().iter().map(|s| s.name.clone()).collect())
}
