//! Streaming worksheet decoder.
//!
//! A worksheet part is read as XML events and turned into [`CellEvent`]s one at
//! a time, so memory use does not grow with the size of the sheet.

use crate::error::{Error, Position, Result};
use crate::format::CellFormatter;
use crate::model::{CellAddress, CellEvent, MAX_COL, MAX_ROW};
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

use super::attr_value;
use super::shared_strings::{decode_escapes, SharedStrings};
use super::styles::Styles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InRow,
    InCell,
}

/// Per-cell scratch state, reused across cells.
#[derive(Debug, Default)]
struct CellScratch {
    col: u32,
    cell_type: Option<String>,
    style: Option<usize>,
    text: String,
    in_value: bool,
    in_inline: bool,
    in_text: bool,
    phonetic_depth: usize,
}

impl CellScratch {
    fn reset(&mut self, col: u32, cell_type: Option<String>, style: Option<usize>) {
        self.col = col;
        self.cell_type = cell_type;
        self.style = style;
        self.text.clear();
        self.in_value = false;
        self.in_inline = false;
        self.in_text = false;
        self.phonetic_depth = 0;
    }

    fn capturing(&self) -> bool {
        self.in_value || (self.in_text && self.phonetic_depth == 0)
    }
}

/// Pull-based decoder over one worksheet part.
///
/// Yields `RowStart`, `Cell` and `RowEnd` events in document order. Rows must
/// be strictly increasing, and so must columns within a row; anything else is
/// reported as a decode error. After the first error the iterator is
/// exhausted.
pub struct SheetEvents<'a, R: BufRead> {
    reader: quick_xml::Reader<R>,
    buf: Vec<u8>,
    shared_strings: &'a SharedStrings,
    styles: &'a Styles,
    formatter: CellFormatter,
    state: State,
    depth: usize,
    last_row: Option<u32>,
    current_row: u32,
    last_col: Option<u32>,
    cell: CellScratch,
    pending: Option<CellEvent>,
    finished: bool,
}

impl<'a, R: BufRead> SheetEvents<'a, R> {
    /// Decode a worksheet part read from `source`.
    pub fn new(
        source: R,
        shared_strings: &'a SharedStrings,
        styles: &'a Styles,
        formatter: CellFormatter,
    ) -> Self {
        let mut reader = quick_xml::Reader::from_reader(source);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            buf: Vec::new(),
            shared_strings,
            styles,
            formatter,
            state: State::Idle,
            depth: 0,
            last_row: None,
            current_row: 0,
            last_col: None,
            cell: CellScratch::default(),
            pending: None,
            finished: false,
        }
    }

    fn advance(&mut self) -> Result<Option<CellEvent>> {
        let mut buf = std::mem::take(&mut self.buf);
        let result = self.advance_with(&mut buf);
        self.buf = buf;
        result
    }

    fn advance_with(&mut self, buf: &mut Vec<u8>) -> Result<Option<CellEvent>> {
        loop {
            buf.clear();
            let offset = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(buf)
                .map_err(|e| self.error_at(offset, e.to_string()))?;

            let produced = match event {
                Event::Start(e) => {
                    self.depth += 1;
                    self.on_open(&e, false, offset)?
                }
                Event::Empty(e) => self.on_open(&e, true, offset)?,
                Event::End(e) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.on_close(e.local_name().as_ref(), offset)?
                }
                Event::Text(e) => {
                    if self.cell.capturing() {
                        let text = e
                            .unescape()
                            .map_err(|err| self.error_at(offset, err.to_string()))?;
                        self.cell.text.push_str(&text);
                    }
                    None
                }
                Event::CData(e) => {
                    if self.cell.capturing() {
                        self.cell
                            .text
                            .push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                    None
                }
                Event::Eof => {
                    if self.depth != 0 || self.state != State::Idle {
                        return Err(self.error_at(offset, "truncated worksheet part"));
                    }
                    return Ok(None);
                }
                _ => None,
            };

            if produced.is_some() {
                return Ok(produced);
            }
        }
    }

    fn on_open(
        &mut self,
        e: &BytesStart<'_>,
        empty: bool,
        offset: u64,
    ) -> Result<Option<CellEvent>> {
        match (self.state, e.local_name().as_ref()) {
            (State::Idle, b"row") => {
                let row = self.next_row(e, offset)?;
                log::trace!("row {}", row + 1);
                self.last_row = Some(row);
                self.current_row = row;
                self.last_col = None;
                if empty {
                    self.pending = Some(CellEvent::RowEnd(row));
                } else {
                    self.state = State::InRow;
                }
                Ok(Some(CellEvent::RowStart(row)))
            }
            (State::InRow | State::InCell, b"row") => {
                Err(self.error_at(offset, "row element nested in another row"))
            }
            (State::InRow, b"c") => {
                let col = self.next_col(e, offset)?;
                let cell_type = attr_value(e, b"t")?;
                let style = match attr_value(e, b"s")? {
                    Some(s) => Some(s.trim().parse::<usize>().map_err(|_| {
                        self.error_at(offset, format!("invalid style index {:?}", s))
                    })?),
                    None => None,
                };
                self.last_col = Some(col);
                self.cell.reset(col, cell_type, style);
                if !empty {
                    self.state = State::InCell;
                }
                Ok(None)
            }
            (State::Idle, b"c") => Err(self.error_at(offset, "cell element outside of a row")),
            (State::InCell, name) if !empty => {
                match name {
                    b"v" => self.cell.in_value = true,
                    b"is" => self.cell.in_inline = true,
                    b"t" if self.cell.in_inline => self.cell.in_text = true,
                    b"rPh" => self.cell.phonetic_depth += 1,
                    _ => {}
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn on_close(&mut self, name: &[u8], offset: u64) -> Result<Option<CellEvent>> {
        match (self.state, name) {
            (State::InCell, b"c") => {
                self.state = State::InRow;
                self.finish_cell(offset)
            }
            (State::InCell, b"v") => {
                self.cell.in_value = false;
                Ok(None)
            }
            (State::InCell, b"t") => {
                self.cell.in_text = false;
                Ok(None)
            }
            (State::InCell, b"is") => {
                self.cell.in_inline = false;
                Ok(None)
            }
            (State::InCell, b"rPh") => {
                self.cell.phonetic_depth = self.cell.phonetic_depth.saturating_sub(1);
                Ok(None)
            }
            (State::InRow, b"row") => {
                self.state = State::Idle;
                Ok(Some(CellEvent::RowEnd(self.current_row)))
            }
            _ => Ok(None),
        }
    }

    fn next_row(&self, e: &BytesStart<'_>, offset: u64) -> Result<u32> {
        let row = match attr_value(e, b"r")? {
            Some(r) => {
                let number: u32 = r
                    .trim()
                    .parse()
                    .map_err(|_| self.error_at(offset, format!("invalid row number {:?}", r)))?;
                if number == 0 || number - 1 > MAX_ROW {
                    return Err(self.error_at(offset, format!("row number {} out of range", r)));
                }
                number - 1
            }
            None => self.last_row.map_or(0, |last| last + 1),
        };

        if let Some(last) = self.last_row {
            if row <= last {
                return Err(Error::decode_at(
                    Position::at(offset, Some(row)),
                    format!("row {} follows row {}", row + 1, last + 1),
                ));
            }
        }
        if row > MAX_ROW {
            return Err(self.error_at(offset, "row beyond the sheet limit"));
        }
        Ok(row)
    }

    fn next_col(&self, e: &BytesStart<'_>, offset: u64) -> Result<u32> {
        let col = match attr_value(e, b"r")? {
            Some(reference) => CellAddress::parse_column(reference.trim()).map_err(|_| {
                self.error_at(offset, format!("invalid cell reference {:?}", reference))
            })?,
            None => self.last_col.map_or(0, |last| last + 1),
        };

        if let Some(last) = self.last_col {
            if col <= last {
                return Err(self.error_at(
                    offset,
                    format!(
                        "column {} follows column {}",
                        crate::model::column_name(col),
                        crate::model::column_name(last)
                    ),
                ));
            }
        }
        if col > MAX_COL {
            return Err(self.error_at(offset, "column beyond the sheet limit"));
        }
        Ok(col)
    }

    fn finish_cell(&mut self, offset: u64) -> Result<Option<CellEvent>> {
        if self.cell.text.is_empty() {
            return Ok(None);
        }
        let text = self.resolve_value(offset)?;
        Ok(Some(CellEvent::Cell {
            address: CellAddress::new(self.current_row, self.cell.col),
            text,
        }))
    }

    /// Turn the collected `<v>`/`<is>` text into the field text.
    ///
    /// Error cells (`t="e"`) are written exactly as stored, e.g. `#DIV/0!`,
    /// with no `ERROR:` prefix or other marker, so they cannot be told apart
    /// from a string cell holding the same text.
    fn resolve_value(&self, offset: u64) -> Result<String> {
        let raw = self.cell.text.as_str();
        match self.cell.cell_type.as_deref() {
            Some("s") => {
                let index: usize = raw.trim().parse().map_err(|_| {
                    self.error_at(offset, format!("invalid shared string index {:?}", raw))
                })?;
                Ok(self.shared_strings.get(index)?.to_string())
            }
            Some("inlineStr") => Ok(decode_escapes(raw)),
            Some("str") | Some("e") | Some("d") => Ok(raw.to_string()),
            Some("b") => Ok(if raw.trim() == "0" { "FALSE" } else { "TRUE" }.to_string()),
            None | Some("n") => {
                let value: f64 = raw.trim().parse().map_err(|_| {
                    self.error_at(offset, format!("invalid numeric value {:?}", raw))
                })?;
                if !value.is_finite() {
                    return Err(self.error_at(offset, format!("invalid numeric value {:?}", raw)));
                }
                let rule = self.styles.format_rule(self.cell.style);
                Ok(self.formatter.format(value, &rule))
            }
            Some(other) => {
                log::debug!("Unknown cell type {:?}, keeping raw value", other);
                Ok(raw.to_string())
            }
        }
    }

    fn error_at(&self, offset: u64, message: impl Into<String>) -> Error {
        let row = match self.state {
            State::Idle => None,
            State::InRow | State::InCell => Some(self.current_row),
        };
        Error::decode_at(Position::at(offset, row), message)
    }
}

impl<R: BufRead> Iterator for SheetEvents<'_, R> {
    type Item = Result<CellEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        match self.advance() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for SheetEvents<'_, R> {}
