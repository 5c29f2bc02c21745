//! Date serial numbers and date/time format codes.
//!
//! Spreadsheets store dates as a count of days since an epoch, with the time
//! of day as the fractional part. In the 1900 system serial 1 is 1900-01-01
//! and the non-existent 1900-02-29 occupies serial 60, so every later serial is
//! one day ahead of the real calendar. The 1904 system counts from 1904-01-01
//! (serial 0) and has no such gap.

use chrono::{Datelike, Duration, NaiveDate};

use super::literal::{active_chars, currency_symbol};
use super::DateSystem;

const MS_PER_DAY: i64 = 86_400_000;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const JA_WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Japanese eras, newest first: first day, name, romaji initial.
const ERAS: [((i32, u32, u32), &str, &str); 5] = [
    ((2019, 5, 1), "令和", "R"),
    ((1989, 1, 8), "平成", "H"),
    ((1926, 12, 25), "昭和", "S"),
    ((1912, 7, 30), "大正", "T"),
    ((1868, 9, 8), "明治", "M"),
];

/// The era of a calendar date and the year within it.
fn japanese_era(year: i32, month: u32, day: u32) -> Option<(&'static str, &'static str, i32)> {
    ERAS.iter()
        .find(|(start, _, _)| (year, month, day) >= *start)
        .map(|((start_year, _, _), name, initial)| (*name, *initial, year - start_year + 1))
}

/// Calendar fields of a serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateTimeParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 0 = Sunday
    pub weekday: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millis: u32,
    /// Whole days since the epoch, for elapsed-time tokens
    pub days: i64,
}

/// Split a serial into calendar fields, rounding the time of day to `unit_ms`.
pub(crate) fn serial_to_parts(
    serial: f64,
    system: DateSystem,
    unit_ms: i64,
) -> Option<DateTimeParts> {
    if !system.is_valid_serial(serial) {
        return None;
    }

    let unit_ms = unit_ms.max(1);
    let total_ms = ((serial * MS_PER_DAY as f64) / unit_ms as f64).round() as i64 * unit_ms;
    let days = total_ms.div_euclid(MS_PER_DAY);
    // Rounding the time of day can carry past the last valid day.
    if !system.is_valid_serial(days as f64) {
        return None;
    }
    let ms_of_day = total_ms.rem_euclid(MS_PER_DAY);

    let (year, month, day, weekday) = match system {
        DateSystem::Excel1900 => {
            // Weekdays follow the serial itself, so serial 1 is a Sunday.
            let weekday = ((days + 6) % 7) as u32;
            if days == 60 {
                (1900, 2, 29, weekday)
            } else {
                let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
                let offset = if days > 60 { days - 1 } else { days };
                let date = base.checked_add_signed(Duration::days(offset))?;
                (date.year(), date.month(), date.day(), weekday)
            }
        }
        DateSystem::Excel1904 => {
            let base = NaiveDate::from_ymd_opt(1904, 1, 1)?;
            let date = base.checked_add_signed(Duration::days(days))?;
            (
                date.year(),
                date.month(),
                date.day(),
                date.weekday().num_days_from_sunday(),
            )
        }
    };

    let seconds_of_day = (ms_of_day / 1000) as u32;
    Some(DateTimeParts {
        year,
        month,
        day,
        weekday,
        hour: seconds_of_day / 3600,
        minute: seconds_of_day % 3600 / 60,
        second: seconds_of_day % 60,
        millis: (ms_of_day % 1000) as u32,
        days,
    })
}

/// Whether a pattern section contains date or time tokens.
pub(crate) fn has_date_tokens(pattern: &str) -> bool {
    if has_elapsed_token(pattern) {
        return true;
    }
    let active: Vec<char> = active_chars(pattern)
        .into_iter()
        .map(|(_, c)| c.to_ascii_lowercase())
        .collect();
    let has_general = pattern.to_ascii_lowercase().contains("general");
    active
        .iter()
        .any(|&c| matches!(c, 'y' | 'm' | 'd' | 'h' | 's') || (c == 'g' && !has_general))
        || active.windows(3).any(|w| w == ['a', 'a', 'a'])
}

fn has_elapsed_token(pattern: &str) -> bool {
    let mut rest = pattern;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let content = after[..close].to_ascii_lowercase();
        if is_elapsed(&content) {
            return true;
        }
        rest = &after[close + 1..];
    }
    false
}

fn is_elapsed(content: &str) -> bool {
    !content.is_empty()
        && (content.chars().all(|c| c == 'h')
            || content.chars().all(|c| c == 'm')
            || content.chars().all(|c| c == 's'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Year(usize),
    Month(usize),
    Minute(usize),
    /// `m` before resolution into a month or a minute
    MonthOrMinute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    FracSecond(usize),
    AmPm { short: bool, lower: bool },
    ElapsedHours(usize),
    ElapsedMinutes(usize),
    ElapsedSeconds(usize),
    /// `aaa` (short) or `aaaa` (long) Japanese weekday
    JaWeekday { long: bool },
    /// `g`, `gg`, `ggg`: era initial, first character, full name
    Era(usize),
    /// `e`, `ee`: year within the era
    EraYear(usize),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut japanese = false;
    let mut i = 0;

    let run = |start: usize, target: char| {
        chars[start..]
            .iter()
            .take_while(|c| c.to_ascii_lowercase() == target)
            .count()
    };

    while i < chars.len() {
        let ch = chars[i];
        match ch.to_ascii_lowercase() {
            '"' => {
                let text: String = chars[i + 1..].iter().take_while(|&&c| c != '"').collect();
                i += text.chars().count() + 2;
                tokens.push(Token::Literal(text));
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    tokens.push(Token::Literal(next.to_string()));
                }
                i += 2;
            }
            '_' => {
                tokens.push(Token::Literal(" ".to_string()));
                i += 2;
            }
            '*' => i += 2,
            '[' => {
                let content: String = chars[i + 1..].iter().take_while(|&&c| c != ']').collect();
                i += content.chars().count() + 2;
                let lower = content.to_ascii_lowercase();
                let n = lower.len();
                if is_elapsed(&lower) {
                    tokens.push(match lower.as_bytes()[0] {
                        b'h' => Token::ElapsedHours(n),
                        b'm' => Token::ElapsedMinutes(n),
                        _ => Token::ElapsedSeconds(n),
                    });
                } else if let Some(symbol) = currency_symbol(&content) {
                    tokens.push(Token::Literal(symbol.to_string()));
                } else if is_japanese_locale(&content) {
                    japanese = true;
                }
            }
            'a' => {
                let long: String = chars[i..].iter().take(5).collect();
                let short: String = chars[i..].iter().take(3).collect();
                if long.eq_ignore_ascii_case("am/pm") {
                    tokens.push(Token::AmPm {
                        short: false,
                        lower: ch.is_ascii_lowercase(),
                    });
                    i += 5;
                } else if short.eq_ignore_ascii_case("a/p") {
                    tokens.push(Token::AmPm {
                        short: true,
                        lower: ch.is_ascii_lowercase(),
                    });
                    i += 3;
                } else if run(i, 'a') >= 3 {
                    let n = run(i, 'a');
                    tokens.push(Token::JaWeekday { long: n >= 4 });
                    i += n;
                } else {
                    tokens.push(Token::Literal(ch.to_string()));
                    i += 1;
                }
            }
            'g' => {
                let n = run(i, 'g');
                tokens.push(Token::Era(n));
                i += n;
            }
            'e' => {
                let n = run(i, 'e');
                tokens.push(Token::EraYear(n));
                i += n;
            }
            '.' if matches!(
                tokens.last(),
                Some(Token::Second(_)) | Some(Token::ElapsedSeconds(_))
            ) && chars.get(i + 1) == Some(&'0') =>
            {
                let n = chars[i + 1..].iter().take_while(|&&c| c == '0').count();
                tokens.push(Token::FracSecond(n.min(3)));
                i += 1 + n;
            }
            'y' => {
                let n = run(i, 'y');
                tokens.push(Token::Year(n));
                i += n;
            }
            'm' => {
                let n = run(i, 'm');
                tokens.push(Token::MonthOrMinute(n));
                i += n;
            }
            'd' => {
                let n = run(i, 'd');
                tokens.push(Token::Day(n));
                i += n;
            }
            'h' => {
                let n = run(i, 'h');
                tokens.push(Token::Hour(n));
                i += n;
            }
            's' => {
                let n = run(i, 's');
                tokens.push(Token::Second(n));
                i += n;
            }
            '@' | ';' => i += 1,
            _ => {
                tokens.push(Token::Literal(ch.to_string()));
                i += 1;
            }
        }
    }

    resolve_minutes(&mut tokens);
    // Outside a Japanese calendar `e` is the four-digit year.
    if !japanese && !tokens.iter().any(|t| matches!(t, Token::Era(_))) {
        for token in tokens.iter_mut() {
            if matches!(token, Token::EraYear(_)) {
                *token = Token::Year(4);
            }
        }
    }
    tokens
}

/// Whether a `[$-...]` token selects a Japanese locale (`[$-411]`, `[$-ja-JP]`).
fn is_japanese_locale(content: &str) -> bool {
    let Some(rest) = content.strip_prefix('$') else {
        return false;
    };
    let Some((_, locale)) = rest.split_once('-') else {
        return false;
    };
    let locale = locale.split(',').next().unwrap_or("");
    locale.to_ascii_lowercase().starts_with("ja")
        || u32::from_str_radix(locale, 16).is_ok_and(|lcid| lcid & 0xFFFF == 0x411)
}

/// `m` means minutes right after an hour token or right before a seconds token.
fn resolve_minutes(tokens: &mut [Token]) {
    let is_field = |t: &Token| !matches!(t, Token::Literal(_));

    for i in 0..tokens.len() {
        let Token::MonthOrMinute(n) = tokens[i] else {
            continue;
        };
        let prev = tokens[..i].iter().rev().find(|t| is_field(t));
        let next = tokens[i + 1..].iter().find(|t| is_field(t));
        let after_hour = matches!(prev, Some(Token::Hour(_) | Token::ElapsedHours(_)));
        let before_second = matches!(next, Some(Token::Second(_) | Token::ElapsedSeconds(_)));
        tokens[i] = if (after_hour || before_second) && n <= 2 {
            Token::Minute(n)
        } else {
            Token::Month(n)
        };
    }
}

/// Render a serial with a date/time pattern section.
///
/// Returns `None` when the serial is outside the epoch's range.
pub(crate) fn format_date(serial: f64, pattern: &str, system: DateSystem) -> Option<String> {
    let tokens = tokenize(pattern);

    let frac_digits = tokens
        .iter()
        .filter_map(|t| match t {
            Token::FracSecond(n) => Some(*n),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let unit_ms = 10_i64.pow(3 - frac_digits as u32);
    let parts = serial_to_parts(serial, system, unit_ms)?;
    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::AmPm { .. }));

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Year(n) => {
                if *n <= 2 {
                    out.push_str(&format!("{:02}", parts.year.rem_euclid(100)));
                } else {
                    out.push_str(&format!("{:04}", parts.year));
                }
            }
            Token::Month(n) | Token::MonthOrMinute(n) => {
                let name = MONTHS[(parts.month - 1) as usize];
                match n {
                    1 => out.push_str(&parts.month.to_string()),
                    2 => out.push_str(&format!("{:02}", parts.month)),
                    3 => out.push_str(&name[..3]),
                    5 => out.push_str(&name[..1]),
                    _ => out.push_str(name),
                }
            }
            Token::Minute(n) => push_padded(&mut out, parts.minute as i64, *n),
            Token::Day(n) => {
                let name = WEEKDAYS[parts.weekday as usize];
                match n {
                    1 => out.push_str(&parts.day.to_string()),
                    2 => out.push_str(&format!("{:02}", parts.day)),
                    3 => out.push_str(&name[..3]),
                    _ => out.push_str(name),
                }
            }
            Token::Hour(n) => {
                let hour = if twelve_hour {
                    match parts.hour % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    parts.hour
                };
                push_padded(&mut out, hour as i64, *n);
            }
            Token::Second(n) => push_padded(&mut out, parts.second as i64, *n),
            Token::FracSecond(n) => {
                let digits = format!("{:03}", parts.millis);
                out.push('.');
                out.push_str(&digits[..*n]);
            }
            Token::AmPm { short, lower } => {
                let text = match (parts.hour < 12, *short) {
                    (true, false) => "AM",
                    (false, false) => "PM",
                    (true, true) => "A",
                    (false, true) => "P",
                };
                if *lower {
                    out.push_str(&text.to_ascii_lowercase());
                } else {
                    out.push_str(text);
                }
            }
            Token::JaWeekday { long } => {
                out.push_str(JA_WEEKDAYS[parts.weekday as usize]);
                if *long {
                    out.push_str("曜日");
                }
            }
            Token::Era(n) => {
                let (name, initial, _) = japanese_era(parts.year, parts.month, parts.day)?;
                match n {
                    1 => out.push_str(initial),
                    2 => out.extend(name.chars().take(1)),
                    _ => out.push_str(name),
                }
            }
            Token::EraYear(n) => {
                let (_, _, year) = japanese_era(parts.year, parts.month, parts.day)?;
                push_padded(&mut out, year as i64, *n);
            }
            Token::ElapsedHours(n) => {
                let hours = parts.days * 24 + parts.hour as i64;
                push_padded(&mut out, hours, *n);
            }
            Token::ElapsedMinutes(n) => {
                let minutes = (parts.days * 24 + parts.hour as i64) * 60 + parts.minute as i64;
                push_padded(&mut out, minutes, *n);
            }
            Token::ElapsedSeconds(n) => {
                let seconds = ((parts.days * 24 + parts.hour as i64) * 60 + parts.minute as i64)
                    * 60
                    + parts.second as i64;
                push_padded(&mut out, seconds, *n);
            }
        }
    }

    Some(out)
}

fn push_padded(out: &mut String, value: i64, width: usize) {
    if width >= 2 {
        out.push_str(&format!("{:0width$}", value, width = width.min(2)));
    } else {
        out.push_str(&value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(serial: f64, pattern: &str) -> String {
        format_date(serial, pattern, DateSystem::Excel1900).unwrap()
    }

    #[test]
    fn test_serial_to_parts_1900() {
        let parts = serial_to_parts(1.0, DateSystem::Excel1900, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (1900, 1, 1));
        assert_eq!(parts.weekday, 0);

        let parts = serial_to_parts(60.0, DateSystem::Excel1900, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (1900, 2, 29));

        let parts = serial_to_parts(61.0, DateSystem::Excel1900, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (1900, 3, 1));
        assert_eq!(parts.weekday, 4);

        let parts = serial_to_parts(44197.75, DateSystem::Excel1900, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (2021, 1, 1));
        assert_eq!((parts.hour, parts.minute, parts.second), (18, 0, 0));
        assert_eq!(parts.weekday, 5);
    }

    #[test]
    fn test_serial_to_parts_1904() {
        let parts = serial_to_parts(0.0, DateSystem::Excel1904, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (1904, 1, 1));

        let parts = serial_to_parts(42735.0, DateSystem::Excel1904, 1000).unwrap();
        assert_eq!((parts.year, parts.month, parts.day), (2021, 1, 1));
    }

    #[test]
    fn test_invalid_serial() {
        assert!(serial_to_parts(-1.0, DateSystem::Excel1900, 1000).is_none());
        assert!(serial_to_parts(3_000_000.0, DateSystem::Excel1900, 1000).is_none());
        assert!(format_date(-5.0, "yyyy", DateSystem::Excel1900).is_none());
    }

    #[test]
    fn test_date_patterns() {
        assert_eq!(fmt(44197.0, "yyyy-mm-dd"), "2021-01-01");
        assert_eq!(fmt(44211.0, "m/d/yy"), "1/15/21");
        assert_eq!(fmt(44211.0, "d-mmm-yy"), "15-Jan-21");
        assert_eq!(fmt(44211.0, "dddd, mmmm d, yyyy"), "Friday, January 15, 2021");
        assert_eq!(fmt(44211.0, "ddd mmmmm"), "Fri J");
        assert_eq!(fmt(44211.0, "yyyy\"年\"m\"月\"d\"日\""), "2021年1月15日");
        assert_eq!(fmt(44211.0, "[$-409]mmmm\\ d\\,\\ yyyy;@"), "January 15, 2021");
    }

    #[test]
    fn test_time_patterns() {
        assert_eq!(fmt(0.5, "h:mm"), "12:00");
        assert_eq!(fmt(0.75, "h:mm AM/PM"), "6:00 PM");
        assert_eq!(fmt(0.25, "hh:mm:ss am/pm"), "06:00:00 am");
        assert_eq!(fmt(44197.5, "yyyy-mm-dd hh:mm:ss"), "2021-01-01 12:00:00");
        assert_eq!(fmt(1.5 / 24.0, "mm:ss"), "30:00");
        assert_eq!(fmt(1.25, "[h]:mm:ss"), "30:00:00");
        assert_eq!(fmt(0.5 + 1.5 / 86400.0, "hh:mm:ss.0"), "12:00:01.5");
    }

    #[test]
    fn test_minute_month_disambiguation() {
        assert_eq!(fmt(44211.0 + 0.5 + 7.0 / 1440.0, "m/d h:m"), "1/15 12:7");
        assert_eq!(fmt(44211.0 + 7.0 / 1440.0, "mm:ss"), "07:00");
    }

    #[test]
    fn test_japanese_tokens() {
        assert_eq!(fmt(44211.0, "yyyy/m/d(aaa)"), "2021/1/15(金)");
        assert_eq!(fmt(44211.0, "aaaa"), "金曜日");
        assert_eq!(fmt(44211.0, "[$-411]ggge\"年\"m\"月\"d\"日\""), "令和3年1月15日");
        assert_eq!(fmt(44211.0, "[$-411]gge.mm.dd"), "令3.01.15");
        assert_eq!(fmt(44211.0, "[$-411]gee/m/d"), "R03/1/15");
        // Heisei ended on 2019-04-30
        assert_eq!(fmt(43585.0, "[$-411]ggge"), "平成31");
        assert_eq!(fmt(43586.0, "[$-411]ggge"), "令和1");
        assert_eq!(fmt(1.0, "ggge"), "明治33");
    }

    #[test]
    fn test_era_year_outside_japanese_locale() {
        assert_eq!(fmt(44211.0, "m/d/e"), "1/15/2021");
    }

    #[test]
    fn test_rounding_past_last_day() {
        assert!(format_date(2958465.9999999, "yyyy-mm-dd", DateSystem::Excel1900).is_none());
        assert_eq!(fmt(2958465.0, "yyyy-mm-dd"), "9999-12-31");
        assert!(format_date(2957003.9999999, "yyyy-mm-dd", DateSystem::Excel1904).is_none());
    }

    #[test]
    fn test_has_date_tokens() {
        assert!(has_date_tokens("yyyy-mm-dd"));
        assert!(has_date_tokens("h:mm"));
        assert!(has_date_tokens("[h]:mm:ss"));
        assert!(has_date_tokens("[$-409]mmmm\\ d\\,\\ yyyy;@"));
        assert!(!has_date_tokens("0.00"));
        assert!(!has_date_tokens("#,##0\"days\""));
        assert!(!has_date_tokens("[Red]0.0"));
        assert!(!has_date_tokens("General"));
        assert!(has_date_tokens("(aaa)"));
        assert!(has_date_tokens("[$-411]ge"));
        assert!(!has_date_tokens("General\"件\""));
        assert!(!has_date_tokens("0.00E+00"));
    }
}
