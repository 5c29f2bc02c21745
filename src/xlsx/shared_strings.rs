//! XLSX shared strings parsing.

use crate::error::{Error, Position, Result};
use quick_xml::events::Event;
use std::io::BufRead;

/// Shared strings table.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse shared strings from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::load(xml.as_bytes())
    }

    /// Stream shared strings from a part reader.
    ///
    /// Only the resulting strings are kept in memory.
    pub fn load<R: BufRead>(source: R) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = quick_xml::Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0usize;
        let mut current_text = String::new();

        loop {
            let position = Position::at(reader.buffer_position(), None);
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::decode_at(position, e.to_string()))?;
            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_text.clear();
                    }
                    b"rPh" if in_si => phonetic_depth += 1,
                    b"t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ => {}
                },
                Event::Empty(e) => {
                    // `<si/>` is an empty entry; it still takes an index.
                    if e.local_name().as_ref() == b"si" {
                        strings.push(String::new());
                    }
                }
                Event::Text(e) => {
                    if in_t {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::decode_at(position, err.to_string()))?;
                        current_text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if in_t {
                        current_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_escapes(&current_text));
                        in_si = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if in_si {
            return Err(Error::decode("truncated shared strings part"));
        }

        log::debug!("Loaded {} shared strings", strings.len());
        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Result<&str> {
        self.strings
            .get(index)
            .map(|s| s.as_str())
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.strings.len(),
            })
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Decode `_xHHHH_` character escapes used for characters XML cannot carry.
///
/// `_x005F_` escapes a literal underscore, so `_x005F_x0041_` stays
/// `_x0041_`. Invalid code points are left as written.
pub(crate) fn decode_escapes(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("_x") {
        out.push_str(&rest[..idx]);
        let candidate = &rest[idx..];
        match parse_escape(candidate) {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_escape(candidate: &str) -> Option<char> {
    let bytes = candidate.as_bytes();
    if bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    let hex = &candidate[2..6];
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="3">
    <si><t>Hello</t></si>
    <si><t>World</t></si>
    <si><t>Test</t></si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 3);
        assert_eq!(ss.get(0).unwrap(), "Hello");
        assert_eq!(ss.get(1).unwrap(), "World");
        assert_eq!(ss.get(2).unwrap(), "Test");
    }

    #[test]
    fn test_out_of_range() {
        let ss = SharedStrings::parse("<sst><si><t>only</t></si></sst>").unwrap();
        match ss.get(3) {
            Err(Error::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 3);
                assert_eq!(len, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rich_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <si>
        <r><t xml:space="preserve">Hello </t></r>
        <r><rPr><b/></rPr><t>World</t></r>
    </si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 1);
        // Whitespace between runs is not part of any <t>
        assert_eq!(ss.get(0).unwrap(), "Hello World");
    }

    #[test]
    fn test_phonetic_runs_excluded() {
        let xml = r#"<sst><si><t>東京</t><rPh sb="0" eb="2"><t>トウキョウ</t></rPh><phoneticPr fontId="1"/></si></sst>"#;
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.get(0).unwrap(), "東京");
    }

    #[test]
    fn test_entities_and_escapes() {
        let xml = r#"<sst><si><t>a &amp; b</t></si><si><t>tab_x0009_here</t></si><si/></sst>"#;
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.get(0).unwrap(), "a & b");
        assert_eq!(ss.get(1).unwrap(), "tab\there");
        assert_eq!(ss.get(2).unwrap(), "");
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_escapes("plain"), "plain");
        assert_eq!(decode_escapes("_x000D__x000A_"), "\r\n");
        assert_eq!(decode_escapes("_x005F_x0041_"), "_x0041_");
        assert_eq!(decode_escapes("_xZZZZ_"), "_xZZZZ_");
        assert_eq!(decode_escapes("my_x"), "my_x");
    }

    #[test]
    fn test_malformed() {
        let result = SharedStrings::parse("<sst><si><t>open</si></sst>");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
