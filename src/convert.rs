//! One-call conversion of a workbook sheet to a CSV file.

use crate::error::{Error, Result};
use crate::render::{CsvOptions, GridSerializer};
use crate::xlsx::XlsxReader;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

/// What a conversion wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Name of the converted sheet
    pub sheet: String,
    /// Sheet rows written
    pub rows: u32,
    /// Output lines, including blank lines for skipped rows
    pub lines: u64,
    /// Cells written
    pub cells: u64,
}

/// Convert one sheet of `source` into a CSV file at `dest`.
///
/// `selector` picks a sheet by exact name; `None` or `""` picks the first
/// sheet. The destination is created (or truncated) before the workbook is
/// opened, and is left as written so far if the conversion fails.
///
/// # Example
///
/// ```no_run
/// let summary = excel2csv::convert("report.xlsx", "report.csv", Some("Q3"))?;
/// println!("{} rows from {}", summary.rows, summary.sheet);
/// # Ok::<(), excel2csv::Error>(())
/// ```
pub fn convert(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    selector: Option<&str>,
) -> Result<ConversionSummary> {
    convert_with_options(source, dest, selector, &CsvOptions::default())
}

/// Convert one sheet into a CSV file with explicit output options.
pub fn convert_with_options(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    selector: Option<&str>,
    options: &CsvOptions,
) -> Result<ConversionSummary> {
    let dest = dest.as_ref();
    let file = File::create(dest).map_err(Error::Write)?;
    log::debug!("Writing {}", dest.display());
    convert_to_writer(source, BufWriter::new(file), selector, options)
}

/// Convert one sheet into any writer.
///
/// The writer is flushed before returning.
pub fn convert_to_writer<W: Write>(
    source: impl AsRef<Path>,
    writer: W,
    selector: Option<&str>,
    options: &CsvOptions,
) -> Result<ConversionSummary> {
    convert_reader(XlsxReader::open(source)?, writer, selector, options)
}

/// Convert one sheet of an opened workbook into any writer.
///
/// Both the reader and the writer are consumed and dropped before this
/// returns, whether the conversion succeeds or fails.
///
/// # Example
///
/// ```no_run
/// use excel2csv::{CsvOptions, XlsxReader};
///
/// let bytes = std::fs::read("report.xlsx")?;
/// let reader = XlsxReader::from_bytes(bytes)?;
/// let mut out = Vec::new();
/// excel2csv::convert_reader(reader, &mut out, None, &CsvOptions::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_reader<R: Read + Seek, W: Write>(
    mut reader: XlsxReader<R>,
    writer: W,
    selector: Option<&str>,
    options: &CsvOptions,
) -> Result<ConversionSummary> {
    let sheet = reader.find_sheet(selector)?.clone();

    let mut grid = GridSerializer::new(writer, options);
    grid.write_events(reader.sheet_events(&sheet)?)?;
    let stats = grid.finish()?;

    log::debug!(
        "Converted sheet {:?}: {} rows, {} lines, {} cells",
        sheet.name,
        stats.rows,
        stats.lines,
        stats.cells
    );
    Ok(ConversionSummary {
        sheet: sheet.name,
        rows: stats.rows,
        lines: stats.lines,
        cells: stats.cells,
    })
}
