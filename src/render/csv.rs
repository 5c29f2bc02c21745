//! Grid serializer: lays cell events out as delimited text.

use super::options::{CsvOptions, LineTerminator, QuoteStyle};
use crate::error::{Error, Position, Result};
use crate::model::{CellAddress, CellEvent};
use serde::Serialize;
use std::io::Write;

/// Encoded bytes held before they are handed to the output writer.
const DRAIN_THRESHOLD: usize = 64 * 1024;

/// Counts of what a serializer wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GridStats {
    /// Sheet rows written
    pub rows: u32,
    /// Output lines, including blank lines for skipped rows
    pub lines: u64,
    /// Cells written
    pub cells: u64,
}

/// Writes [`CellEvent`]s as a dense grid of delimited text.
///
/// Rows missing from the event stream become empty lines and missing cells
/// become empty fields, so every value lands at the line and field position of
/// its address. Nothing is padded after the last cell of a row or after the
/// last row. A line with no content is written as a bare terminator.
///
/// # Example
///
/// ```
/// use excel2csv::model::CellEvent;
/// use excel2csv::render::{CsvOptions, GridSerializer, LineTerminator};
///
/// let options = CsvOptions::new().with_line_terminator(LineTerminator::Lf);
/// let mut grid = GridSerializer::new(Vec::new(), &options);
/// for event in [
///     CellEvent::RowStart(0),
///     CellEvent::cell(0, 0, "A"),
///     CellEvent::RowEnd(0),
///     CellEvent::RowStart(2),
///     CellEvent::cell(2, 2, "B"),
///     CellEvent::RowEnd(2),
/// ] {
///     grid.write_event(&event)?;
/// }
/// grid.finish()?;
/// assert_eq!(grid.into_inner()?, b"A\n\n,,B\n");
/// # Ok::<(), excel2csv::Error>(())
/// ```
pub struct GridSerializer<W: Write> {
    out: W,
    builder: csv::WriterBuilder,
    /// Encoded lines not yet handed to `out`
    buf: Vec<u8>,
    terminator: &'static [u8],
    /// Field slots of the open row; only the first `field_count` are live
    fields: Vec<String>,
    field_count: usize,
    open_row: Option<u32>,
    last_row: Option<u32>,
    last_col: Option<u32>,
    /// Empty fields owed before the next non-empty field
    pending_blanks: u32,
    stats: GridStats,
}

impl<W: Write> GridSerializer<W> {
    /// Create a serializer writing to `out`.
    pub fn new(out: W, options: &CsvOptions) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(options.delimiter)
            .quote(options.quote)
            .double_quote(true)
            .flexible(true)
            .buffer_capacity(1024)
            .quote_style(match options.quote_style {
                QuoteStyle::Necessary => csv::QuoteStyle::Necessary,
                QuoteStyle::Always => csv::QuoteStyle::Always,
            })
            .terminator(match options.line_terminator {
                LineTerminator::Crlf => csv::Terminator::CRLF,
                LineTerminator::Lf => csv::Terminator::Any(b'\n'),
            });

        Self {
            out,
            builder,
            buf: Vec::new(),
            terminator: options.line_terminator.as_bytes(),
            fields: Vec::new(),
            field_count: 0,
            open_row: None,
            last_row: None,
            last_col: None,
            pending_blanks: 0,
            stats: GridStats::default(),
        }
    }

    /// Apply one event.
    pub fn write_event(&mut self, event: &CellEvent) -> Result<()> {
        match event {
            CellEvent::RowStart(row) => self.start_row(*row),
            CellEvent::Cell { address, text } => self.write_cell(*address, text),
            CellEvent::RowEnd(row) => self.end_row(*row),
        }
    }

    /// Apply every event of a stream, stopping at the first error.
    pub fn write_events<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<CellEvent>>,
    {
        for event in events {
            self.write_event(&event?)?;
        }
        Ok(())
    }

    fn start_row(&mut self, row: u32) -> Result<()> {
        if let Some(open) = self.open_row {
            return Err(ordering_error(
                row,
                format!("row {} started before row {} ended", row + 1, open + 1),
            ));
        }
        let skipped = match self.last_row {
            Some(last) if row <= last => {
                return Err(ordering_error(
                    row,
                    format!("row {} follows row {}", row + 1, last + 1),
                ));
            }
            Some(last) => row - last - 1,
            None => row,
        };
        for _ in 0..skipped {
            self.blank_line()?;
        }

        self.open_row = Some(row);
        self.last_col = None;
        self.pending_blanks = 0;
        self.field_count = 0;
        Ok(())
    }

    fn write_cell(&mut self, address: CellAddress, text: &str) -> Result<()> {
        match self.open_row {
            Some(open) if open == address.row => {}
            Some(open) => {
                return Err(ordering_error(
                    address.row,
                    format!("cell {} inside row {}", address, open + 1),
                ));
            }
            None => {
                return Err(ordering_error(
                    address.row,
                    format!("cell {} outside of a row", address),
                ));
            }
        }
        let gap = match self.last_col {
            Some(last) if address.col <= last => {
                return Err(ordering_error(
                    address.row,
                    format!(
                        "cell {} is left of column {}",
                        address,
                        crate::model::column_name(last)
                    ),
                ));
            }
            Some(last) => address.col - last - 1,
            None => address.col,
        };

        self.pending_blanks += gap;
        if text.is_empty() {
            self.pending_blanks += 1;
        } else {
            self.flush_blanks();
            self.push_field(text);
        }
        self.last_col = Some(address.col);
        self.stats.cells += 1;
        Ok(())
    }

    fn end_row(&mut self, row: u32) -> Result<()> {
        if self.open_row != Some(row) {
            return Err(ordering_error(
                row,
                format!("row {} ended without being started", row + 1),
            ));
        }

        if self.field_count == 0 && self.pending_blanks <= 1 {
            // The encoder would write a lone empty field as `""`
            self.blank_line()?;
        } else {
            self.flush_blanks();
            self.encode_row()?;
            self.stats.lines += 1;
        }

        self.open_row = None;
        self.last_row = Some(row);
        self.stats.rows += 1;
        log::trace!("wrote row {}", row + 1);
        self.drain_if_full()
    }

    fn push_field(&mut self, text: &str) {
        match self.fields.get_mut(self.field_count) {
            Some(slot) => {
                slot.clear();
                slot.push_str(text);
            }
            None => self.fields.push(text.to_string()),
        }
        self.field_count += 1;
    }

    fn flush_blanks(&mut self) {
        for _ in 0..self.pending_blanks {
            self.push_field("");
        }
        self.pending_blanks = 0;
    }

    /// Encode the live fields of the open row, terminator included.
    fn encode_row(&mut self) -> Result<()> {
        let mut encoder = self.builder.from_writer(&mut self.buf);
        encoder.write_record(&self.fields[..self.field_count])?;
        encoder.flush().map_err(Error::Write)?;
        Ok(())
    }

    /// A line terminator with nothing before it.
    fn blank_line(&mut self) -> Result<()> {
        self.buf.extend_from_slice(self.terminator);
        self.stats.lines += 1;
        self.drain_if_full()
    }

    fn drain_if_full(&mut self) -> Result<()> {
        if self.buf.len() >= DRAIN_THRESHOLD {
            self.drain()
        } else {
            Ok(())
        }
    }

    fn drain(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.out.write_all(&self.buf).map_err(Error::Write)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Write out everything buffered and flush the output.
    ///
    /// Fails if a row is still open.
    pub fn finish(&mut self) -> Result<GridStats> {
        if let Some(open) = self.open_row {
            return Err(ordering_error(
                open,
                format!("row {} was never ended", open + 1),
            ));
        }
        self.drain()?;
        self.out.flush().map_err(Error::Write)?;
        Ok(self.stats)
    }

    /// Write out buffered bytes and return the output writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.drain()?;
        Ok(self.out)
    }
}

fn ordering_error(row: u32, message: String) -> Error {
    Error::decode_at(
        Position {
            offset: None,
            row: Some(row),
        },
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_with(events: &[CellEvent], options: &CsvOptions) -> Result<String> {
        let mut grid = GridSerializer::new(Vec::new(), options);
        for event in events {
            grid.write_event(event)?;
        }
        grid.finish()?;
        Ok(String::from_utf8(grid.into_inner()?).unwrap())
    }

    fn render(events: &[CellEvent]) -> Result<String> {
        render_with(events, &CsvOptions::default())
    }

    fn row(index: u32, cells: &[(u32, &str)]) -> Vec<CellEvent> {
        let mut events = vec![CellEvent::RowStart(index)];
        events.extend(
            cells
                .iter()
                .map(|(col, text)| CellEvent::cell(index, *col, *text)),
        );
        events.push(CellEvent::RowEnd(index));
        events
    }

    #[test]
    fn test_sparse_grid() {
        let mut events = row(0, &[(0, "A")]);
        events.extend(row(2, &[(2, "B")]));
        assert_eq!(render(&events).unwrap(), "A\r\n\r\n,,B\r\n");
    }

    #[test]
    fn test_leading_rows_and_columns() {
        let events = row(2, &[(1, "x"), (3, "y")]);
        assert_eq!(render(&events).unwrap(), "\r\n\r\n,x,,y\r\n");
    }

    #[test]
    fn test_quoting() {
        let events = row(
            0,
            &[
                (0, "plain"),
                (1, "a,b"),
                (2, "say \"hi\""),
                (3, "two\nlines"),
                (4, "cr\rhere"),
            ],
        );
        assert_eq!(
            render(&events).unwrap(),
            "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\",\"cr\rhere\"\r\n"
        );
    }

    #[test]
    fn test_options() {
        let events = row(0, &[(0, "a"), (2, "b;c")]);
        let options = CsvOptions::new()
            .with_delimiter(b';')
            .with_line_terminator(LineTerminator::Lf);
        assert_eq!(render_with(&events, &options).unwrap(), "a;;\"b;c\"\n");

        let options = CsvOptions::new().with_quote_style(QuoteStyle::Always);
        assert_eq!(
            render_with(&row(0, &[(0, "a"), (1, "b")]), &options).unwrap(),
            "\"a\",\"b\"\r\n"
        );
    }

    #[test]
    fn test_empty_lines_are_bare() {
        // A row with no cells and a row holding only an empty string
        let mut events = row(0, &[]);
        events.extend(row(1, &[(0, "")]));
        events.extend(row(2, &[(0, ""), (1, "")]));
        assert_eq!(render(&events).unwrap(), "\r\n\r\n,\r\n");
    }

    #[test]
    fn test_trailing_empty_cell_kept() {
        let events = row(0, &[(0, "x"), (1, "")]);
        assert_eq!(render(&events).unwrap(), "x,\r\n");
    }

    #[test]
    fn test_no_events() {
        assert_eq!(render(&[]).unwrap(), "");
    }

    #[test]
    fn test_stats() {
        let mut events = row(1, &[(0, "a"), (3, "b")]);
        events.extend(row(4, &[(2, "c")]));
        let mut grid = GridSerializer::new(Vec::new(), &CsvOptions::default());
        grid.write_events(events.into_iter().map(Ok)).unwrap();
        let stats = grid.finish().unwrap();
        assert_eq!(
            stats,
            GridStats {
                rows: 2,
                lines: 5,
                cells: 3
            }
        );
    }

    #[test]
    fn test_ordering_errors() {
        // Negative gap
        let events = row(0, &[(2, "a"), (1, "b")]);
        assert!(matches!(render(&events), Err(Error::Decode { .. })));

        // Repeated column
        let events = row(0, &[(1, "a"), (1, "b")]);
        assert!(matches!(render(&events), Err(Error::Decode { .. })));

        // Rows out of order
        let mut events = row(3, &[]);
        events.extend(row(1, &[]));
        assert!(matches!(render(&events), Err(Error::Decode { .. })));

        // Cell outside a row
        assert!(matches!(
            render(&[CellEvent::cell(0, 0, "a")]),
            Err(Error::Decode { .. })
        ));

        // Mismatched row end
        assert!(matches!(
            render(&[CellEvent::RowStart(0), CellEvent::RowEnd(1)]),
            Err(Error::Decode { .. })
        ));

        // Unclosed row
        assert!(matches!(
            render(&[CellEvent::RowStart(0)]),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_large_gap_drains() {
        let events = row(100_000, &[(0, "end")]);
        let out = render_with(
            &events,
            &CsvOptions::new().with_line_terminator(LineTerminator::Lf),
        )
        .unwrap();
        assert_eq!(out.len(), 100_000 + 4);
        assert!(out.ends_with("\nend\n"));
    }

    #[test]
    fn test_output_drained_before_finish() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counting(Rc<Cell<usize>>);
        impl Write for Counting {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.set(self.0.get() + data.len());
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let written = Rc::new(Cell::new(0));
        let mut grid = GridSerializer::new(Counting(written.clone()), &CsvOptions::default());
        for index in 0..20_000 {
            let events = row(index, &[(0, "value"), (2, "x,y")]);
            grid.write_events(events.into_iter().map(Ok)).unwrap();
        }
        // Full chunks reach the writer while rows are still coming in
        assert!(written.get() >= DRAIN_THRESHOLD);
        let before = written.get();
        grid.finish().unwrap();
        assert_eq!(written.get(), 20_000 * "value,,\"x,y\"\r\n".len());
        assert!(written.get() > before);
    }

    #[test]
    fn test_write_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut grid = GridSerializer::new(Broken, &CsvOptions::default());
        grid.write_events(row(0, &[(0, "a")]).into_iter().map(Ok)).unwrap();
        assert!(matches!(grid.finish(), Err(Error::Write(_))));
    }
}
