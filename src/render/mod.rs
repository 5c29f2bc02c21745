//! Output rendering for cell event streams.
//!
//! The grid serializer turns the decoder's events into delimited text,
//! configured by [`CsvOptions`].
//!
//! # Example
//!
//! ```no_run
//! use excel2csv::render::{CsvOptions, GridSerializer, LineTerminator};
//! use excel2csv::xlsx::XlsxReader;
//!
//! let mut reader = XlsxReader::open("data.xlsx")?;
//! let sheet = reader.find_sheet(None)?.clone();
//!
//! let options = CsvOptions::new().with_line_terminator(LineTerminator::Lf);
//! let mut grid = GridSerializer::new(std::io::stdout().lock(), &options);
//! grid.write_events(reader.sheet_events(&sheet)?)?;
//! grid.finish()?;
//! # Ok::<(), excel2csv::Error>(())
//! ```

mod csv;
mod options;

pub use self::csv::{GridSerializer, GridStats};
pub use options::{CsvOptions, LineTerminator, QuoteStyle};
