//! CSV output options.

use serde::{Deserialize, Serialize};

/// When fields are wrapped in quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Only fields containing the delimiter, a quote or a line break
    #[default]
    Necessary,
    /// Every field, including empty ones
    Always,
}

/// Line ending written after each row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    /// `\r\n`, the Excel CSV dialect
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineTerminator {
    /// The terminator bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineTerminator::Crlf => b"\r\n",
            LineTerminator::Lf => b"\n",
        }
    }
}

/// Options for writing delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field separator
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// When to quote fields
    pub quote_style: QuoteStyle,

    /// Row terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            quote_style: QuoteStyle::Necessary,
            line_terminator: LineTerminator::Crlf,
        }
    }
}

impl CsvOptions {
    /// Create new CSV options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quoting policy.
    pub fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }

    /// Set the row terminator.
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Tab-separated output.
    pub fn tsv() -> Self {
        Self::default().with_delimiter(b'\t')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CsvOptions::default();
        assert_eq!(opts.delimiter, b',');
        assert_eq!(opts.quote, b'"');
        assert_eq!(opts.quote_style, QuoteStyle::Necessary);
        assert_eq!(opts.line_terminator.as_bytes(), b"\r\n");
    }

    #[test]
    fn test_builder_pattern() {
        let opts = CsvOptions::new()
            .with_delimiter(b';')
            .with_quote_style(QuoteStyle::Always)
            .with_line_terminator(LineTerminator::Lf);

        assert_eq!(opts.delimiter, b';');
        assert_eq!(opts.quote_style, QuoteStyle::Always);
        assert_eq!(opts.line_terminator, LineTerminator::Lf);
        assert_eq!(CsvOptions::tsv().delimiter, b'\t');
    }
}
