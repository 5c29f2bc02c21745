//! Workbook-level access: sheet listing and per-sheet decoding.

use crate::container::{resolve_path, OoxmlContainer};
use crate::detect::{detect_kind, WorkbookKind};
use crate::error::{Error, Result};
use crate::format::{CellFormatter, DateSystem};
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::Path;

use super::attr_value;
use super::shared_strings::SharedStrings;
use super::sheet::SheetEvents;
use super::styles::Styles;

const DEFAULT_WORKBOOK: &str = "xl/workbook.xml";
const DEFAULT_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const DEFAULT_STYLES: &str = "xl/styles.xml";

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_WORKSHEET: &str = "/worksheet";
const REL_SHARED_STRINGS: &str = "/sharedStrings";
const REL_STYLES: &str = "/styles";

/// A worksheet listed in the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    /// Sheet name as shown on the tab
    pub name: String,
    /// Zero-based position in workbook order
    pub index: usize,
    /// `sheetId` attribute
    pub sheet_id: Option<u32>,
    /// Archive path of the worksheet part
    pub path: String,
    /// `state` attribute (`hidden`, `veryHidden`), if not visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Reader for XLSX (Excel) workbooks.
///
/// Opening a reader loads the sheet list, the shared strings and the number
/// formats once; sheets are then decoded on demand as event streams.
///
/// # Example
///
/// ```no_run
/// use excel2csv::xlsx::XlsxReader;
///
/// let mut reader = XlsxReader::open("report.xlsx")?;
/// let sheet = reader.find_sheet(Some("Summary"))?.clone();
/// for event in reader.sheet_events(&sheet)? {
///     println!("{:?}", event?);
/// }
/// # Ok::<(), excel2csv::Error>(())
/// ```
pub struct XlsxReader<R: Read + Seek = BufReader<File>> {
    container: OoxmlContainer<R>,
    kind: WorkbookKind,
    sheets: Vec<SheetInfo>,
    shared_strings: SharedStrings,
    styles: Styles,
    date_system: DateSystem,
}

impl XlsxReader<BufReader<File>> {
    /// Open an XLSX file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening workbook {}", path.display());
        let container = OoxmlContainer::open(path)?;
        Self::from_container(container)
    }
}

impl XlsxReader<Cursor<Vec<u8>>> {
    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(container)
    }
}

impl<R: Read + Seek> XlsxReader<R> {
    /// Create a reader from an opened container.
    pub fn from_container(mut container: OoxmlContainer<R>) -> Result<Self> {
        let kind = detect_kind(&mut container)?;
        let workbook_path = Self::locate_workbook(&mut container)?;
        let workbook_rels = container.read_relationships(&workbook_path)?;

        let xml = container.read_xml(&workbook_path)?;
        let workbook = parse_workbook(&xml)?;

        let mut sheets = Vec::new();
        for entry in workbook.sheets {
            let Some(rel) = workbook_rels.get(&entry.rel_id) else {
                log::debug!("Sheet {:?} has no relationship, skipping", entry.name);
                continue;
            };
            if !rel.rel_type.ends_with(REL_WORKSHEET) {
                log::debug!("Sheet {:?} is not a worksheet, skipping", entry.name);
                continue;
            }
            sheets.push(SheetInfo {
                name: entry.name,
                index: sheets.len(),
                sheet_id: entry.sheet_id,
                path: resolve_path(&workbook_path, &rel.target),
                state: entry.state,
            });
        }

        let shared_strings_path = workbook_rels
            .find_by_type_suffix(REL_SHARED_STRINGS)
            .map(|rel| resolve_path(&workbook_path, &rel.target))
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS.to_string());
        let shared_strings = if container.exists(&shared_strings_path) {
            SharedStrings::load(container.open_part(&shared_strings_path)?)?
        } else {
            SharedStrings::default()
        };

        let styles_path = workbook_rels
            .find_by_type_suffix(REL_STYLES)
            .map(|rel| resolve_path(&workbook_path, &rel.target))
            .unwrap_or_else(|| DEFAULT_STYLES.to_string());
        let styles = if container.exists(&styles_path) {
            Styles::parse(&container.read_xml(&styles_path)?)?
        } else {
            Styles::default()
        };

        let date_system = DateSystem::from_date1904(workbook.date1904);
        log::debug!(
            "{} {} has {} worksheets, {:?} dates",
            kind,
            workbook_path,
            sheets.len(),
            date_system
        );

        Ok(Self {
            container,
            kind,
            sheets,
            shared_strings,
            styles,
            date_system,
        })
    }

    fn locate_workbook(container: &mut OoxmlContainer<R>) -> Result<String> {
        let rels = container.read_package_relationships()?;
        let path = rels
            .find_by_type_suffix(REL_OFFICE_DOCUMENT)
            .map(|rel| resolve_path("", &rel.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK.to_string());
        if container.exists(&path) {
            Ok(path)
        } else {
            Err(Error::NotAnArchive(format!(
                "no workbook part found (expected {})",
                path
            )))
        }
    }

    /// Detected workbook flavour.
    pub fn kind(&self) -> WorkbookKind {
        self.kind
    }

    /// Worksheets in workbook order.
    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    /// Worksheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Get the number of worksheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Pick a sheet by exact, case-sensitive name.
    ///
    /// `None` or an empty name selects the first sheet. When several sheets
    /// share a name, the first one in workbook order wins.
    pub fn find_sheet(&self, selector: Option<&str>) -> Result<&SheetInfo> {
        let selector = selector.unwrap_or("");
        let found = if selector.is_empty() {
            self.sheets.first()
        } else {
            self.sheets.iter().find(|s| s.name == selector)
        };
        found.ok_or_else(|| Error::SheetNotFound(selector.to_string()))
    }

    /// The loaded shared strings table.
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// The loaded number format table.
    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    /// Date epoch declared by the workbook.
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Decode a worksheet as a stream of cell events.
    pub fn sheet_events(
        &mut self,
        sheet: &SheetInfo,
    ) -> Result<SheetEvents<'_, impl BufRead + '_>> {
        log::debug!("Reading sheet {:?} from {}", sheet.name, sheet.path);
        let Self {
            container,
            shared_strings,
            styles,
            date_system,
            ..
        } = self;
        let part = container.open_part(&sheet.path)?;
        Ok(SheetEvents::new(
            part,
            shared_strings,
            styles,
            CellFormatter::new(*date_system),
        ))
    }
}

impl<R: Read + Seek> std::fmt::Debug for XlsxReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxReader")
            .field("kind", &self.kind)
            .field("sheets", &self.sheets)
            .field("shared_strings", &self.shared_strings.len())
            .field("date_system", &self.date_system)
            .finish()
    }
}

#[derive(Debug)]
struct SheetEntry {
    name: String,
    sheet_id: Option<u32>,
    rel_id: String,
    state: Option<String>,
}

#[derive(Debug, Default)]
struct Workbook {
    sheets: Vec<SheetEntry>,
    date1904: bool,
}

fn parse_workbook(xml: &str) -> Result<Workbook> {
    let mut workbook = Workbook::default();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    workbook.date1904 = matches!(
                        attr_value(e, b"date1904")?.as_deref(),
                        Some("1") | Some("true")
                    );
                }
                b"sheet" => {
                    let name = attr_value(e, b"name")?.unwrap_or_default();
                    // `r:id`; local-name matching also covers strict namespaces
                    let rel_id = attr_value(e, b"id")?.unwrap_or_default();
                    if name.is_empty() || rel_id.is_empty() {
                        continue;
                    }
                    workbook.sheets.push(SheetEntry {
                        name,
                        sheet_id: attr_value(e, b"sheetId")?.and_then(|v| v.parse().ok()),
                        rel_id,
                        state: attr_value(e, b"state")?.filter(|s| s != "visible"),
                    });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(workbook)
}
