//! Display formatting of numeric cell values.
//!
//! Numeric cells carry a raw `f64` and a style whose number format decides how
//! the value is shown. Date and time formats turn serial numbers into calendar
//! text; every other format goes through the numeric renderer. Formatting is
//! best effort: a format code that cannot be understood renders as General.
//!
//! # Example
//!
//! ```
//! use excel2csv::format::{CellFormatter, DateSystem, FormatRule};
//!
//! let formatter = CellFormatter::new(DateSystem::Excel1900);
//! let date = FormatRule::new(164, "yyyy-mm-dd");
//! assert_eq!(formatter.format(44197.0, &date), "2021-01-01");
//!
//! let money = FormatRule::new(4, "#,##0.00");
//! assert_eq!(formatter.format(44197.0, &money), "44,197.00");
//! ```

mod builtin;
mod date;
mod literal;
mod number;

pub use builtin::{builtin_format_code, is_builtin_date};

use serde::{Deserialize, Serialize};

/// Epoch used to interpret date serial numbers, fixed per workbook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01 (Windows default)
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01 (`workbookPr date1904="1"`)
    Excel1904,
}

impl DateSystem {
    /// Pick the epoch from the workbook's `date1904` flag.
    pub fn from_date1904(date1904: bool) -> Self {
        if date1904 {
            DateSystem::Excel1904
        } else {
            DateSystem::Excel1900
        }
    }

    /// First serial past 9999-12-31.
    fn serial_limit(&self) -> f64 {
        match self {
            DateSystem::Excel1900 => 2_958_466.0,
            DateSystem::Excel1904 => 2_957_004.0,
        }
    }

    /// Whether `serial` maps to a representable date in this system.
    pub fn is_valid_serial(&self, serial: f64) -> bool {
        serial.is_finite() && serial >= 0.0 && serial < self.serial_limit()
    }
}

/// A number format: its id and its format code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRule {
    /// `numFmtId`
    pub index: u32,
    /// Format code, e.g. `#,##0.00` or `yyyy-mm-dd`
    pub code: String,
}

impl FormatRule {
    /// Create a rule from an id and a code.
    pub fn new(index: u32, code: impl Into<String>) -> Self {
        Self {
            index,
            code: code.into(),
        }
    }

    /// The General format (id 0).
    pub fn general() -> Self {
        Self::new(0, "General")
    }

    /// A built-in format by id, if it is predefined.
    pub fn builtin(index: u32) -> Option<Self> {
        builtin_format_code(index).map(|code| Self::new(index, code))
    }

    /// Whether values with this rule render as dates or times.
    pub fn is_date(&self) -> bool {
        is_date_format(self.index, &self.code)
    }
}

impl Default for FormatRule {
    fn default() -> Self {
        Self::general()
    }
}

/// Whether a format id/code pair denotes a date or time format.
///
/// Built-in date ids always qualify. Otherwise the first section of the code
/// is scanned for date/time tokens outside quoted text, escapes and bracketed
/// color/locale tokens.
pub fn is_date_format(index: u32, code: &str) -> bool {
    if is_builtin_date(index) {
        return true;
    }
    let first = literal::split_sections(code)[0];
    if literal::is_general(first) {
        return false;
    }
    date::has_date_tokens(first)
}

/// Converts raw numeric cell values to display text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellFormatter {
    date_system: DateSystem,
}

impl CellFormatter {
    /// Create a formatter for a workbook's epoch.
    pub fn new(date_system: DateSystem) -> Self {
        Self { date_system }
    }

    /// The epoch in use.
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Render `value` with `rule`.
    pub fn format(&self, value: f64, rule: &FormatRule) -> String {
        if !rule.is_date() {
            return number::format_number(value, &rule.code);
        }

        let code = if literal::is_general(&rule.code) {
            // Built-in date id without a usable code.
            builtin_format_code(rule.index).unwrap_or("m/d/yy")
        } else {
            rule.code.as_str()
        };
        let (section, _) = literal::select_section(code, value);
        date::format_date(value, section, self.date_system)
            .unwrap_or_else(|| self.format_general(value))
    }

    /// Render `value` as General.
    pub fn format_general(&self, value: f64) -> String {
        number::format_number(value, "General")
    }
}
