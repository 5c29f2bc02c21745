//! Numeric format codes.

use super::literal::{active_chars, is_general, render_literal, select_section};

/// Render `value` with a numeric format code.
pub(crate) fn format_number(value: f64, code: &str) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let (pattern, negative_sign) = select_section(code, value);
    let body = if is_general(pattern) {
        format_general(value.abs())
    } else if let Some(body) = format_pattern(value.abs(), pattern) {
        body
    } else {
        format_general(value.abs())
    };

    if negative_sign && has_nonzero_digit(&body) {
        format!("-{}", body)
    } else {
        body
    }
}

/// Excel's "General" rendering: up to 11 significant digits.
pub(crate) fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if !(1e-9..1e11).contains(&abs) {
        return format_general_scientific(value);
    }

    let int_digits = abs.log10().floor() as i32 + 1;
    let decimals = (11 - int_digits).clamp(0, 10) as usize;
    let s = format!("{:.*}", decimals, value);
    // Rounding can carry into a twelfth integer digit.
    let int_len = s.split('.').next().unwrap_or("").trim_start_matches('-').len();
    if int_len > 11 {
        return format_general_scientific(value);
    }
    let s = trim_fraction(&s);
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}

fn format_general_scientific(value: f64) -> String {
    let s = format!("{:.5E}", value);
    let (mantissa, exponent) = s.split_once('E').unwrap_or((s.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!(
        "{}E{}{:02}",
        trim_fraction(mantissa),
        sign,
        exponent.abs()
    )
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn has_nonzero_digit(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '1'..='9'))
}

/// Render a non-negative value with a single pattern section.
///
/// Returns `None` for constructs this renderer does not understand, so the
/// caller can fall back to General.
fn format_pattern(value: f64, pattern: &str) -> Option<String> {
    let active = active_chars(pattern);

    if active.iter().any(|&(_, c)| c == '@') {
        return Some(render_literal(&pattern.replace('@', &format_general(value))));
    }
    if active.iter().any(|&(_, c)| c == '/') {
        // Fractions are not rendered.
        return None;
    }

    let placeholders: Vec<usize> = active
        .iter()
        .filter(|(_, c)| matches!(c, '0' | '#' | '?'))
        .map(|&(idx, _)| idx)
        .collect();
    let (Some(&start), Some(&last)) = (placeholders.first(), placeholders.last()) else {
        return Some(render_literal(pattern));
    };

    // Trailing commas directly after the last placeholder scale by 1000.
    let mut end = last + 1;
    while pattern[end..].starts_with(',') {
        end += 1;
    }

    let prefix = render_literal(&pattern[..start]);
    let suffix = render_literal(&pattern[end..]);
    let number_raw = &pattern[start..end];

    let percent = active.iter().filter(|&&(_, c)| c == '%').count();
    let mut v = value;
    for _ in 0..percent {
        v *= 100.0;
    }

    let body = match parse_scientific(number_raw) {
        Some(spec) => format_scientific(v, &spec),
        None => format_fixed(v, &parse_fixed(number_raw)),
    };
    Some(format!("{}{}{}", prefix, body, suffix))
}

#[derive(Debug, Clone)]
struct FixedSpec {
    min_int: usize,
    int_placeholders: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: bool,
    scale_commas: usize,
    has_decimal_point: bool,
    /// Literal text in the integer part, keyed by the number of integer
    /// placeholders to its right.
    int_literals: Vec<(usize, String)>,
    /// Literal text in the fraction, keyed by the number of fraction
    /// placeholders to its left.
    frac_literals: Vec<(usize, String)>,
}

/// Literal runs between the placeholders of one side of the decimal point.
///
/// Each run is paired with the number of placeholders before it.
fn embedded_literals(part: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut seen = 0;
    let mut gap_start = 0;
    for (idx, c) in active_chars(part) {
        if !matches!(c, '0' | '#' | '?' | ',') {
            continue;
        }
        let text = render_literal(&part[gap_start..idx]);
        if !text.is_empty() && seen > 0 {
            out.push((seen, text));
        }
        if c != ',' {
            seen += 1;
        }
        gap_start = idx + 1;
    }
    out
}

fn parse_fixed(number_raw: &str) -> FixedSpec {
    let mut raw = number_raw;
    let mut scale_commas = 0;
    while let Some(stripped) = raw.strip_suffix(',') {
        raw = stripped;
        scale_commas += 1;
    }

    let active = active_chars(raw);
    let decimal_pos = active.iter().find(|&&(_, c)| c == '.').map(|&(idx, _)| idx);
    let (int_pat, frac_pat) = match decimal_pos {
        Some(pos) => (&raw[..pos], &raw[pos + 1..]),
        None => (raw, ""),
    };

    let count = |s: &str, f: fn(char) -> bool| {
        active_chars(s)
            .into_iter()
            .filter(|&(_, c)| f(c))
            .count()
    };

    let int_placeholders = count(int_pat, |c| matches!(c, '0' | '#' | '?'));
    let int_literals = embedded_literals(int_pat)
        .into_iter()
        .map(|(left, text)| (int_placeholders - left, text))
        .collect();

    FixedSpec {
        min_int: count(int_pat, |c| c == '0'),
        int_placeholders,
        min_frac: count(frac_pat, |c| c == '0'),
        max_frac: count(frac_pat, |c| matches!(c, '0' | '#' | '?')),
        grouping: count(int_pat, |c| c == ',') > 0,
        scale_commas,
        has_decimal_point: decimal_pos.is_some(),
        int_literals,
        frac_literals: embedded_literals(frac_pat),
    }
}

fn format_fixed(mut value: f64, spec: &FixedSpec) -> String {
    for _ in 0..spec.scale_commas {
        value /= 1000.0;
    }

    let formatted = format!("{:.*}", spec.max_frac, round_half_up(value, spec.max_frac));
    let (int_raw, frac_raw) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), ""));
    let mut int_part = int_raw.to_string();
    let mut frac_part = frac_raw.to_string();

    if spec.int_placeholders == 0 || (spec.min_int == 0 && int_part == "0") {
        int_part.clear();
    }
    while int_part.len() < spec.min_int {
        int_part.insert(0, '0');
    }
    if spec.int_literals.is_empty() {
        if spec.grouping && !int_part.is_empty() {
            int_part = group_thousands(&int_part);
        }
    } else {
        // Nearest to the decimal point first so earlier offsets stay valid.
        let len = int_part.len();
        for (right, text) in spec.int_literals.iter().rev() {
            int_part.insert_str(len.saturating_sub(*right), text);
        }
    }

    while frac_part.len() > spec.min_frac && frac_part.ends_with('0') {
        frac_part.pop();
    }
    let digits = frac_part.len();
    for (left, text) in spec.frac_literals.iter().rev() {
        frac_part.insert_str((*left).min(digits), text);
    }

    let mut out = int_part;
    if spec.has_decimal_point && (spec.max_frac == 0 || !frac_part.is_empty()) {
        out.push('.');
    }
    out.push_str(&frac_part);
    out
}

fn round_half_up(value: f64, decimals: usize) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        out.push(ch);
        let remaining = len - i - 1;
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

#[derive(Debug, Clone)]
struct ScientificSpec {
    mantissa: FixedSpec,
    exp_width: usize,
    exp_sign_always: bool,
}

fn parse_scientific(number_raw: &str) -> Option<ScientificSpec> {
    let (e_idx, _) = active_chars(number_raw)
        .into_iter()
        .find(|&(_, c)| c == 'E' || c == 'e')?;
    let exponent_raw = &number_raw[e_idx + 1..];
    let (exp_sign_always, digits) = match exponent_raw.chars().next() {
        Some('+') => (true, &exponent_raw[1..]),
        Some('-') => (false, &exponent_raw[1..]),
        _ => return None,
    };
    let exp_width = digits
        .chars()
        .filter(|c| matches!(c, '0' | '#' | '?'))
        .count();
    if exp_width == 0 {
        return None;
    }

    Some(ScientificSpec {
        mantissa: parse_fixed(&number_raw[..e_idx]),
        exp_width,
        exp_sign_always,
    })
}

fn format_scientific(value: f64, spec: &ScientificSpec) -> String {
    let mut exponent = if value == 0.0 {
        0
    } else {
        value.log10().floor() as i32
    };
    let mut mantissa = value / 10_f64.powi(exponent);
    mantissa = round_half_up(mantissa, spec.mantissa.max_frac);
    if mantissa >= 10.0 {
        mantissa /= 10.0;
        exponent += 1;
    }

    let sign = if exponent < 0 {
        "-"
    } else if spec.exp_sign_always {
        "+"
    } else {
        ""
    };
    format!(
        "{}E{}{:0width$}",
        format_fixed(mantissa, &spec.mantissa),
        sign,
        exponent.abs(),
        width = spec.exp_width
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general() {
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(42.0), "42");
        assert_eq!(format_general(-3.5), "-3.5");
        assert_eq!(format_general(0.1), "0.1");
        assert_eq!(format_general(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_general(123456.789), "123456.789");
        assert_eq!(format_general(123456789012.0), "1.23457E+11");
        assert_eq!(format_general(0.0000000001), "1E-10");
    }

    #[test]
    fn test_fixed_decimals() {
        assert_eq!(format_number(3.14159, "0.00"), "3.14");
        assert_eq!(format_number(3.0, "0.00"), "3.00");
        assert_eq!(format_number(2.5, "0"), "3");
        assert_eq!(format_number(0.5, "#.##"), ".5");
        assert_eq!(format_number(7.0, "000"), "007");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(format_number(1234567.891, "#,##0.00"), "1,234,567.89");
        assert_eq!(format_number(999.0, "#,##0"), "999");
        assert_eq!(format_number(-1234.0, "#,##0"), "-1,234");
        assert_eq!(format_number(1234567.0, "#,##0,"), "1,235");
    }

    #[test]
    fn test_percent() {
        assert_eq!(format_number(0.256, "0%"), "26%");
        assert_eq!(format_number(0.256, "0.00%"), "25.60%");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(format_number(12345.0, "0.00E+00"), "1.23E+04");
        assert_eq!(format_number(0.00012, "0.00E+00"), "1.20E-04");
    }

    #[test]
    fn test_sections_and_literals() {
        assert_eq!(format_number(-1234.0, "#,##0_);(#,##0)"), "(1,234)");
        assert_eq!(format_number(1234.0, "#,##0_);(#,##0)"), "1,234 ");
        assert_eq!(format_number(5.0, "\"$\"#,##0.00"), "$5.00");
        assert_eq!(format_number(5.0, "[$€-407] #,##0.00"), "€ 5.00");
        assert_eq!(format_number(0.0, "0;-0;\"zero\""), "zero");
        assert_eq!(format_number(-2.0, "[Red]0.0"), "-2.0");
    }

    #[test]
    fn test_literals_between_placeholders() {
        assert_eq!(format_number(123.456, "000-00-0000"), "000-00-0123");
        assert_eq!(format_number(5551234567.0, "(000) 000-0000"), "(555) 123-4567");
        assert_eq!(format_number(12345.0, "0\"-\"0000"), "1-2345");
        assert_eq!(format_number(1.25, "0.0\" \"0"), "1.2 5");
    }

    #[test]
    fn test_general_rounding_carry() {
        assert_eq!(format_general(99999999999.6), "1E+11");
        assert_eq!(format_general(99999999999.4), "99999999999");
        assert_eq!(format_general(-99999999999.6), "-1E+11");
    }

    #[test]
    fn test_unsupported_falls_back_to_general() {
        assert_eq!(format_number(1.5, "# ?/?"), "1.5");
        assert_eq!(format_number(1.5, "General"), "1.5");
    }
}
