//! XLSX (Excel) workbook reader.
//!
//! This module reads Office Open XML spreadsheets (.xlsx, .xlsm): the sheet
//! list, the shared string table, the number formats, and worksheet parts
//! decoded as a stream of cell events.
//!
//! # Example
//!
//! ```no_run
//! use excel2csv::xlsx::XlsxReader;
//!
//! let reader = XlsxReader::open("spreadsheet.xlsx")?;
//! for name in reader.sheet_names() {
//!     println!("Sheet: {}", name);
//! }
//! # Ok::<(), excel2csv::Error>(())
//! ```

mod reader;
mod shared_strings;
mod sheet;
mod styles;

pub use reader::{SheetInfo, XlsxReader};
pub use shared_strings::SharedStrings;
pub use sheet::SheetEvents;
pub use styles::Styles;

use crate::error::{Error, Result};
use quick_xml::events::BytesStart;

/// Unescaped value of the attribute with local name `name`.
pub(crate) fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| Error::decode(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
