//! Fixed-width field encoding.
//!
//! Every function here returns a string of exactly the requested width for
//! every input: over-long values are truncated, short ones padded. Record
//! builders rely on this to produce fixed-length lines by construction.
//!
//! Text is folded to printable ASCII before it is measured, so widths hold
//! in bytes as well as characters: accented Latin letters lose their marks,
//! ligatures expand (`ß` -> `ss`), line breaks and tabs become spaces, and
//! anything else becomes `?`.

use chrono::{NaiveDate, NaiveDateTime};

/// Fold text to printable ASCII.
pub fn to_ascii(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_graphic() || c == ' ' {
            out.push(c);
            continue;
        }
        let folded = match c {
            c if c.is_whitespace() || c.is_control() => " ",
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
            'Ç' | 'Ć' | 'Č' => "C",
            'ç' | 'ć' | 'č' => "c",
            'Ð' | 'Ď' | 'Đ' => "D",
            'ð' | 'ď' | 'đ' => "d",
            'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
            'Ğ' => "G",
            'ğ' => "g",
            'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "I",
            'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
            'Ł' | 'Ľ' | 'Ĺ' => "L",
            'ł' | 'ľ' | 'ĺ' => "l",
            'Ñ' | 'Ń' | 'Ň' => "N",
            'ñ' | 'ń' | 'ň' => "n",
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
            'Ř' => "R",
            'ř' => "r",
            'Ś' | 'Š' | 'Ş' => "S",
            'ś' | 'š' | 'ş' => "s",
            'Ť' | 'Ţ' => "T",
            'ť' | 'ţ' => "t",
            'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "U",
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
            'Ý' | 'Ÿ' => "Y",
            'ý' | 'ÿ' => "y",
            'Ź' | 'Ż' | 'Ž' => "Z",
            'ź' | 'ż' | 'ž' => "z",
            'Æ' => "AE",
            'æ' => "ae",
            'Œ' => "OE",
            'œ' => "oe",
            'Þ' => "TH",
            'þ' => "th",
            'ß' => "ss",
            '\u{2018}' | '\u{2019}' | '\u{00B4}' => "'",
            '\u{201C}' | '\u{201D}' => "\"",
            '\u{2013}' | '\u{2014}' => "-",
            '\u{2026}' => "...",
            _ => "?",
        };
        out.push_str(folded);
    }
    out
}

/// Fold to ASCII, truncate to `n` characters, then right-pad with spaces to
/// exactly `n`.
pub fn left_just(value: &str, n: usize) -> String {
    let mut out: String = to_ascii(value).chars().take(n).collect();
    let len = out.len();
    out.extend(std::iter::repeat(' ').take(n - len));
    out
}

/// Fold to ASCII, truncate to `n` characters, then left-pad with `pad` to
/// exactly `n`.
pub fn right_just(value: &str, n: usize, pad: char) -> String {
    let taken: String = to_ascii(value).chars().take(n).collect();
    let len = taken.len();
    let mut out: String = std::iter::repeat(pad).take(n - len).collect();
    out.push_str(&taken);
    out
}

/// Zero-padded unsigned number.
pub fn numeric(value: u64, n: usize) -> String {
    right_just(&value.to_string(), n, '0')
}

/// Blank (space-filled) field.
pub fn blank(n: usize) -> String {
    " ".repeat(n)
}

/// Encode a percentage as hundredths of a percent, 5 digits, zero-padded.
///
/// This is the single rounding rule for every share field: `percent * 100`
/// rounded half-up to the nearest integer (`33.333` -> `03333`,
/// `100` -> `10000`). Negative and non-finite values encode as `00000`.
pub fn format_share(percent: f64) -> String {
    if !percent.is_finite() || percent <= 0.0 {
        return "00000".to_string();
    }
    // Settle binary noise first so 0.145 * 100 = 14.4999.. still rounds to 15.
    let scaled = (percent * 100.0 * 1e6).round() / 1e6;
    let hundredths = (scaled + 0.5).floor() as u64;
    numeric(hundredths, 5)
}

/// `YYYYMMDD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `HHMMSS`
pub fn format_time(timestamp: NaiveDateTime) -> String {
    timestamp.format("%H%M%S").to_string()
}

/// `HHMMSS` from whole seconds. Absent or zero durations encode as `000000`.
pub fn format_duration(seconds: Option<u32>) -> String {
    let Some(seconds) = seconds.filter(|s| *s > 0) else {
        return "000000".to_string();
    };
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!(
        "{}{}{}",
        numeric(u64::from(hours), 2),
        numeric(u64::from(minutes), 2),
        numeric(u64::from(secs), 2)
    )
}
