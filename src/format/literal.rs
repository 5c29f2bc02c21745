//! Format code lexing shared by the number and date renderers.

/// Split a format code into its `;`-separated sections.
///
/// Separators inside quotes, brackets or after an escape do not count.
pub(crate) fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_bracket = false;
    let mut escape = false;

    for (idx, ch) in code.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if in_bracket {
            if ch == ']' {
                in_bracket = false;
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '[' => in_bracket = true,
            '\\' | '_' | '*' => escape = true,
            ';' => {
                sections.push(&code[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Pick the section that applies to `value`.
///
/// Returns the section pattern and whether a leading minus sign must be
/// added (only when a negative value falls back to the first section).
pub(crate) fn select_section(code: &str, value: f64) -> (&str, bool) {
    let sections = split_sections(code);
    match sections.len() {
        1 => (sections[0], value < 0.0),
        2 => {
            if value < 0.0 {
                (sections[1], false)
            } else {
                (sections[0], false)
            }
        }
        _ => {
            if value > 0.0 {
                (sections[0], false)
            } else if value < 0.0 {
                (sections[1], false)
            } else {
                (sections[2], false)
            }
        }
    }
}

/// Byte offsets and characters of a pattern that carry meaning.
///
/// Quoted text, escaped characters, `_x` spacers, `*x` fills and bracket
/// tokens are skipped.
pub(crate) fn active_chars(pattern: &str) -> Vec<(usize, char)> {
    let mut out = Vec::new();
    let mut chars = pattern.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => {
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for (_, c) in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            _ => out.push((idx, ch)),
        }
    }
    out
}

/// Render the literal parts of a pattern segment.
pub(crate) fn render_literal(segment: &str) -> String {
    let mut out = String::new();
    let mut chars = segment.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    out.push(c);
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' => {
                let mut content = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    content.push(c);
                }
                if closed {
                    if let Some(symbol) = currency_symbol(&content) {
                        out.push_str(symbol);
                    }
                } else {
                    out.push('[');
                    out.push_str(&content);
                }
            }
            '_' => {
                chars.next();
                out.push(' ');
            }
            '*' => {
                chars.next();
            }
            _ => out.push(ch),
        }
    }

    out
}

/// The symbol of a `[$SYM-LCID]` token (`[$€-407]` -> `€`).
pub(crate) fn currency_symbol(content: &str) -> Option<&str> {
    let after = content.strip_prefix('$')?;
    let symbol = after.split_once('-').map(|(s, _)| s).unwrap_or(after);
    if symbol.is_empty() {
        None
    } else {
        Some(symbol)
    }
}

/// Whether a section is the `General` keyword, ignoring bracket tokens.
pub(crate) fn is_general(pattern: &str) -> bool {
    let mut rest = String::new();
    let mut in_bracket = false;
    for ch in pattern.chars() {
        match ch {
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            _ if !in_bracket => rest.push(ch),
            _ => {}
        }
    }
    let rest = rest.trim();
    rest.is_empty() || rest.eq_ignore_ascii_case("general")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sections() {
        assert_eq!(split_sections("0.00"), vec!["0.00"]);
        assert_eq!(
            split_sections("#,##0;(#,##0);\"-\""),
            vec!["#,##0", "(#,##0)", "\"-\""]
        );
        assert_eq!(split_sections("\"a;b\"0"), vec!["\"a;b\"0"]);
        assert_eq!(split_sections("0\\;0"), vec!["0\\;0"]);
    }

    #[test]
    fn test_select_section() {
        assert_eq!(select_section("0.0", -1.0), ("0.0", true));
        assert_eq!(select_section("0;(0)", -1.0), ("(0)", false));
        assert_eq!(select_section("0;(0);\"zero\"", 0.0), ("\"zero\"", false));
        assert_eq!(select_section("0;(0);\"zero\"", 2.0), ("0", false));
    }

    #[test]
    fn test_render_literal() {
        assert_eq!(render_literal("\"$\""), "$");
        assert_eq!(render_literal("[$€-407] "), "€ ");
        assert_eq!(render_literal("[Red]_("), " ");
        assert_eq!(render_literal("\\-*x"), "-");
    }

    #[test]
    fn test_active_chars_skip_literals() {
        let active: String = active_chars("[$-409]\"yy\"d\\m_)")
            .into_iter()
            .map(|(_, c)| c)
            .collect();
        assert_eq!(active, "d");
    }

    #[test]
    fn test_is_general() {
        assert!(is_general("General"));
        assert!(is_general("[Red]general"));
        assert!(!is_general("0.00"));
    }
}
