//! XLSX styles parsing for number formats.

use crate::error::{Error, Position, Result};
use crate::format::FormatRule;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

use super::attr_value;

/// Number format table parsed from xl/styles.xml.
///
/// Only the parts that decide how a numeric value is displayed are kept:
/// the custom `<numFmt>` declarations and the `numFmtId` of every cell format.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell formats: style index -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from xl/styles.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            let position = Position::at(reader.buffer_position(), None);
            let event = reader
                .read_event()
                .map_err(|e| Error::decode_at(position, e.to_string()))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    match e.local_name().as_ref() {
                        b"numFmts" if !is_empty => in_num_fmts = true,
                        b"cellXfs" if !is_empty => in_cell_xfs = true,
                        b"numFmt" if in_num_fmts => {
                            if let Some((id, code)) = parse_num_fmt(e)? {
                                styles.num_fmts.insert(id, code);
                            }
                        }
                        b"xf" if in_cell_xfs => {
                            let id = attr_value(e, b"numFmtId")?
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(0);
                            styles.cell_xfs.push(id);
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        log::debug!(
            "Loaded {} number formats, {} cell formats",
            styles.num_fmts.len(),
            styles.cell_xfs.len()
        );
        Ok(styles)
    }

    /// Get the numFmtId for a cell style index.
    pub fn num_fmt_id(&self, style_index: usize) -> Option<u32> {
        self.cell_xfs.get(style_index).copied()
    }

    /// Resolve the number format for a cell's `s` attribute.
    ///
    /// Unknown style indices and undeclared format ids resolve to General.
    pub fn format_rule(&self, style_index: Option<usize>) -> FormatRule {
        let Some(id) = style_index.and_then(|idx| self.num_fmt_id(idx)) else {
            return FormatRule::general();
        };
        if let Some(code) = self.num_fmts.get(&id) {
            return FormatRule::new(id, code.clone());
        }
        FormatRule::builtin(id).unwrap_or_else(|| FormatRule::new(id, "General"))
    }

    /// Number of cell formats.
    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    /// Check if no cell formats were declared.
    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }
}

fn parse_num_fmt(e: &BytesStart<'_>) -> Result<Option<(u32, String)>> {
    let id = attr_value(e, b"numFmtId")?.and_then(|v| v.parse().ok());
    let code = attr_value(e, b"formatCode")?.unwrap_or_default();
    Ok(id.map(|id| (id, code)))
}
