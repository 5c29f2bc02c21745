//! Cell addressing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest zero-based column index a worksheet may address (`XFD`).
pub const MAX_COL: u32 = 16_383;

/// Highest zero-based row index a worksheet may address.
pub const MAX_ROW: u32 = 1_048_575;

/// A zero-based (row, column) position in a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    /// Zero-based row index
    pub row: u32,
    /// Zero-based column index
    pub col: u32,
}

impl CellAddress {
    /// Create an address from zero-based indices.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference such as `"B3"` or `"$AA$10"`.
    pub fn parse(reference: &str) -> Result<Self> {
        let (col, rest) = split_column(reference)?;
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let row: u32 = rest
            .parse()
            .map_err(|_| Error::decode(format!("invalid cell reference {:?}", reference)))?;
        if row == 0 || row - 1 > MAX_ROW {
            return Err(Error::decode(format!(
                "row out of range in cell reference {:?}",
                reference
            )));
        }
        Ok(Self { row: row - 1, col })
    }

    /// Parse only the column part of an A1-style reference.
    ///
    /// Sheet rows are addressed by their `<row>` element, so cell references
    /// only contribute a column.
    pub fn parse_column(reference: &str) -> Result<u32> {
        split_column(reference).map(|(col, _)| col)
    }

    /// The column letters for this address (`0` -> `"A"`).
    pub fn column_name(&self) -> String {
        column_name(self.col)
    }
}

/// Convert a zero-based column index to letters.
pub fn column_name(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn split_column(reference: &str) -> Result<(u32, &str)> {
    let trimmed = reference.strip_prefix('$').unwrap_or(reference);
    let letters = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    if letters == 0 || letters > 3 {
        return Err(Error::decode(format!(
            "invalid cell reference {:?}",
            reference
        )));
    }

    let mut col: u32 = 0;
    for b in trimmed[..letters].bytes() {
        col = col * 26 + (b.to_ascii_uppercase() - b'A') as u32 + 1;
    }
    let col = col - 1;
    if col > MAX_COL {
        return Err(Error::decode(format!(
            "column out of range in cell reference {:?}",
            reference
        )));
    }
    Ok((col, &trimmed[letters..]))
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(CellAddress::parse("A1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(CellAddress::parse("B3").unwrap(), CellAddress::new(2, 1));
        assert_eq!(CellAddress::parse("Z10").unwrap(), CellAddress::new(9, 25));
        assert_eq!(CellAddress::parse("AA1").unwrap(), CellAddress::new(0, 26));
        assert_eq!(CellAddress::parse("$C$7").unwrap(), CellAddress::new(6, 2));
        assert_eq!(
            CellAddress::parse("XFD1048576").unwrap(),
            CellAddress::new(MAX_ROW, MAX_COL)
        );
    }

    #[test]
    fn test_parse_invalid_reference() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("12").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
        assert!(CellAddress::parse("ABCD1").is_err());
    }

    #[test]
    fn test_parse_column_only() {
        assert_eq!(CellAddress::parse_column("C12").unwrap(), 2);
        assert_eq!(CellAddress::parse_column("AB").unwrap(), 27);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(2, 27).to_string(), "AB3");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }
}
