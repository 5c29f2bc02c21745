//! Workbook kind detection.
//!
//! Tells the supported OOXML workbook flavours apart and rejects containers
//! that only look like workbooks (binary `.xlsb`, legacy `.xls`, other Office
//! documents) with a specific error.

use crate::container::OoxmlContainer;
use crate::error::{Error, Result};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// End of central directory signature, the first record of an empty archive.
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// OLE2 compound file magic, used by legacy `.xls` workbooks.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";
const XLTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";
const XLTM_CONTENT_TYPE: &str = "application/vnd.ms-excel.template.macroEnabled.main+xml";
const XLSB_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.binary.macroEnabled.main";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Detected workbook flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkbookKind {
    /// Excel workbook (.xlsx)
    Xlsx,
    /// Macro-enabled workbook (.xlsm)
    Xlsm,
    /// Workbook template (.xltx)
    Xltx,
    /// Macro-enabled template (.xltm)
    Xltm,
}

impl WorkbookKind {
    /// Returns the file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            WorkbookKind::Xlsx => "xlsx",
            WorkbookKind::Xlsm => "xlsm",
            WorkbookKind::Xltx => "xltx",
            WorkbookKind::Xltm => "xltm",
        }
    }

    /// Returns a human-readable name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            WorkbookKind::Xlsx => "Excel Workbook",
            WorkbookKind::Xlsm => "Excel Macro-Enabled Workbook",
            WorkbookKind::Xltx => "Excel Template",
            WorkbookKind::Xltm => "Excel Macro-Enabled Template",
        }
    }

    /// Kind implied by a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(WorkbookKind::Xlsx),
            "xlsm" => Some(WorkbookKind::Xlsm),
            "xltx" => Some(WorkbookKind::Xltx),
            "xltm" => Some(WorkbookKind::Xltm),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkbookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Check the leading bytes of a source before it is opened as a zip archive.
///
/// The reader is rewound afterwards.
pub fn check_signature<R: Read + Seek>(reader: &mut R) -> Result<()> {
    let mut head = [0u8; 8];
    let mut filled = 0;
    while filled < head.len() {
        let n = reader.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    reader.seek(SeekFrom::Start(0))?;

    if filled == OLE_MAGIC.len() && head == OLE_MAGIC {
        return Err(Error::UnsupportedFormat("legacy binary workbook (.xls)".to_string()));
    }
    if !is_zip_file(&head[..filled]) {
        return Err(Error::NotAnArchive("missing zip signature".to_string()));
    }
    Ok(())
}

/// Detect the workbook kind of an opened container.
///
/// Uses `[Content_Types].xml`, falling back to the presence of an `xl/`
/// folder when the content types part is missing.
pub fn detect_kind<R: Read + Seek>(container: &mut OoxmlContainer<R>) -> Result<WorkbookKind> {
    if !container.exists("[Content_Types].xml") {
        return detect_by_folder_structure(container);
    }

    let content_types = container.read_xml("[Content_Types].xml")?;
    if content_types.contains(XLSX_CONTENT_TYPE) {
        Ok(WorkbookKind::Xlsx)
    } else if content_types.contains(XLSM_CONTENT_TYPE) {
        Ok(WorkbookKind::Xlsm)
    } else if content_types.contains(XLTX_CONTENT_TYPE) {
        Ok(WorkbookKind::Xltx)
    } else if content_types.contains(XLTM_CONTENT_TYPE) {
        Ok(WorkbookKind::Xltm)
    } else if content_types.contains(XLSB_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("binary workbook (.xlsb)".to_string()))
    } else if content_types.contains(DOCX_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("Word document".to_string()))
    } else if content_types.contains(PPTX_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("PowerPoint presentation".to_string()))
    } else {
        detect_by_folder_structure(container)
    }
}

fn detect_by_folder_structure<R: Read + Seek>(
    container: &OoxmlContainer<R>,
) -> Result<WorkbookKind> {
    if container.list_files().iter().any(|n| n.starts_with("xl/")) {
        Ok(WorkbookKind::Xlsx)
    } else {
        Err(Error::NotAnArchive(
            "archive does not contain a workbook".to_string(),
        ))
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && (data[..4] == ZIP_MAGIC || data[..4] == ZIP_EMPTY_MAGIC)
}
