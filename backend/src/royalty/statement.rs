//! Royalty statement import and work matching.

use serde::{Deserialize, Serialize};

use crate::error::{StatementError, StatementResult};
use crate::models::{normalize_iswc, RightType, RoyaltyLineItem, Work};
use crate::parser::{parse_bytes_auto, CsvError, TableRow};

/// Statement column names, matched case-insensitively against the header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMapping {
    pub work_title: Option<String>,
    pub iswc: Option<String>,
    pub territory: Option<String>,
    pub right_type: Option<String>,
    pub usage_type: Option<String>,
    pub units: Option<String>,
    /// Required.
    pub gross_amount: String,
    pub net_amount: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            work_title: Some("Title".into()),
            iswc: Some("ISWC".into()),
            territory: Some("Territory".into()),
            right_type: Some("Right Type".into()),
            usage_type: Some("Usage Type".into()),
            units: Some("Units".into()),
            gross_amount: "Gross Amount".into(),
            net_amount: Some("Net Amount".into()),
        }
    }
}

/// Imported line items plus the problems found along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementImport {
    pub line_items: Vec<RoyaltyLineItem>,
    /// Per-row problems. Rows are still imported.
    pub errors: Vec<String>,
    pub encoding: String,
    pub delimiter: char,
}

/// Parse a statement export. Fails only when the file is unreadable, has no
/// data rows, or lacks the gross-amount column.
pub fn parse_royalty_csv(bytes: &[u8], mapping: &ColumnMapping) -> StatementResult<StatementImport> {
    let parsed = parse_bytes_auto(bytes)?;
    let table = &parsed.table;
    if table.rows.is_empty() {
        return Err(StatementError::Empty);
    }

    let gross_idx = table
        .column_index(&mapping.gross_amount)
        .ok_or_else(|| StatementError::MissingColumn(mapping.gross_amount.clone()))?;
    let col = |name: &Option<String>| name.as_deref().and_then(|n| table.column_index(n));
    let title_idx = col(&mapping.work_title);
    let iswc_idx = col(&mapping.iswc);
    let territory_idx = col(&mapping.territory);
    let right_idx = col(&mapping.right_type);
    let usage_idx = col(&mapping.usage_type);
    let units_idx = col(&mapping.units);
    let net_idx = col(&mapping.net_amount);

    let mut errors = Vec::new();
    let mut line_items = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let text = |idx: Option<usize>| idx.map(|i| row.get(i)).filter(|v| !v.is_empty()).map(String::from);

        let gross = row.get(gross_idx);
        let gross_amount = match parse_amount(gross) {
            Some(amount) => amount,
            None => {
                if !gross.is_empty() {
                    errors.push(row_error(row, &mapping.gross_amount, gross, "not a number, read as 0"));
                }
                0.0
            }
        };

        let right_type = match text(right_idx) {
            Some(code) => RightType::from_code(&code).unwrap_or_else(|| {
                errors.push(row_error(row, right_column(mapping), &code, "unknown right type, read as PR"));
                RightType::Performance
            }),
            None => RightType::Performance,
        };

        line_items.push(RoyaltyLineItem {
            id: format!("line-{}", row.line),
            work_id: None,
            work_title: text(title_idx),
            iswc: text(iswc_idx),
            territory: text(territory_idx),
            right_type,
            usage_type: text(usage_idx),
            units: text(units_idx).and_then(|u| u.replace([',', ' '], "").parse().ok()),
            gross_amount,
            net_amount: text(net_idx).and_then(|n| parse_amount(&n)),
            matched: false,
        });
    }

    Ok(StatementImport {
        line_items,
        errors,
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
    })
}

fn right_column(mapping: &ColumnMapping) -> &str {
    mapping.right_type.as_deref().unwrap_or("")
}

fn row_error(row: &TableRow, column: &str, value: &str, message: &str) -> String {
    CsvError::new(row.line, message)
        .with_column(column)
        .with_value(value)
        .to_string()
}

/// Parse a money amount. Accepts a leading currency sign and either
/// `1,234.56` or `1.234,56` grouping. A lone comma followed by one or two
/// digits is a decimal comma; comma-separated three-digit groups are
/// thousands.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        // Whichever separator comes last is the decimal one.
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            let decimals = cleaned.len() - c - 1;
            if cleaned.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Link line items to catalog works: by ISWC first, then by main or
/// alternate title (trimmed, case-insensitive).
pub fn match_line_items(mut items: Vec<RoyaltyLineItem>, works: &[Work]) -> Vec<RoyaltyLineItem> {
    for item in &mut items {
        match_line_item(item, works);
    }
    items
}

/// Match a single line item in place. A miss clears any previous match.
pub fn match_line_item(item: &mut RoyaltyLineItem, works: &[Work]) {
    let by_iswc = item.iswc.as_deref().map(normalize_iswc).filter(|i| !i.is_empty()).and_then(|iswc| {
        works
            .iter()
            .find(|w| w.iswc.as_deref().map(normalize_iswc).as_deref() == Some(iswc.as_str()))
    });
    let work = by_iswc.or_else(|| {
        item.work_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .and_then(|title| works.iter().find(|w| w.has_title(title)))
    });

    item.work_id = work.map(|w| w.id.clone());
    item.matched = work.is_some();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlternateTitle, TitleType};

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            work_title: Some("Title".into()),
            iswc: Some("ISWC".into()),
            right_type: Some("Type".into()),
            gross_amount: "Amount".into(),
            ..ColumnMapping::default()
        }
    }

    #[test]
    fn test_parse_statement() {
        let csv = "Title,ISWC,Type,Amount,Units\n\
                   \"Midnight City, Pt. 2\",T-123.456.789-0,mr,\"1,234.50\",1200\n\
                   Daybreak,,PR,12,\n";
        let import = parse_royalty_csv(csv.as_bytes(), &mapping()).unwrap();

        assert!(import.errors.is_empty());
        assert_eq!(import.delimiter, ',');
        assert_eq!(import.line_items.len(), 2);

        let first = &import.line_items[0];
        assert_eq!(first.work_title.as_deref(), Some("Midnight City, Pt. 2"));
        assert_eq!(first.right_type, RightType::Mechanical);
        assert_eq!(first.gross_amount, 1234.5);
        assert_eq!(first.units, Some(1200));
        assert_eq!(first.id, "line-2");
        assert!(!first.matched);

        assert_eq!(import.line_items[1].iswc, None);
        assert_eq!(import.line_items[1].units, None);
    }

    #[test]
    fn test_bad_rows_are_collected() {
        let csv = "Title;Type;Amount\nA;PR;abc\nB;XX;3,5\n";
        let import = parse_royalty_csv(csv.as_bytes(), &mapping()).unwrap();

        assert_eq!(import.line_items.len(), 2);
        assert_eq!(import.line_items[0].gross_amount, 0.0);
        assert_eq!(import.line_items[1].gross_amount, 3.5);
        assert_eq!(import.line_items[1].right_type, RightType::Performance);
        assert_eq!(import.errors.len(), 2);
        assert!(import.errors[0].contains("Line 2, column 'Amount' (value 'abc')"));
    }

    #[test]
    fn test_thousands_separator_in_csv() {
        let import = parse_royalty_csv(b"Title,Amount\nMidnight City,\"1,000\"\n", &mapping()).unwrap();
        assert!(import.errors.is_empty());
        assert_eq!(import.line_items[0].gross_amount, 1000.0);
    }

    #[test]
    fn test_missing_gross_column() {
        let err = parse_royalty_csv(b"Title,Total\nA,1\n", &mapping()).unwrap_err();
        assert!(matches!(err, StatementError::MissingColumn(ref c) if c == "Amount"));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = parse_royalty_csv(b"Title,Amount\n", &mapping()).unwrap_err();
        assert!(matches!(err, StatementError::Empty));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,000.25"), Some(1000.25));
        assert_eq!(parse_amount("12,5"), Some(12.5));
        assert_eq!(parse_amount("3,5"), Some(3.5));
        assert_eq!(parse_amount("1,000"), Some(1000.0));
        assert_eq!(parse_amount("$12,500"), Some(12500.0));
        assert_eq!(parse_amount("1,234,567"), Some(1234567.0));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("€1.234.567"), Some(1234567.0));
        assert_eq!(parse_amount("-1,000.50"), Some(-1000.5));
        assert_eq!(parse_amount(" 7 "), Some(7.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_match_line_items() {
        let mut midnight = Work::new("w-1", "RWOR10001", "Midnight City");
        midnight.iswc = Some("T-123.456.789-0".into());
        let mut daybreak = Work::new("w-2", "RWOR10002", "Daybreak");
        daybreak.alternate_titles.push(AlternateTitle {
            title: "Lever du jour".into(),
            title_type: TitleType::Alternate,
            language: None,
        });
        let works = vec![midnight, daybreak];

        let items = vec![
            RoyaltyLineItem { id: "a".into(), iswc: Some("T1234567890".into()), ..RoyaltyLineItem::default() },
            RoyaltyLineItem { id: "b".into(), work_title: Some("  LEVER DU JOUR ".into()), ..RoyaltyLineItem::default() },
            RoyaltyLineItem { id: "c".into(), work_title: Some("Unknown".into()), ..RoyaltyLineItem::default() },
            RoyaltyLineItem { id: "d".into(), work_title: Some("".into()), ..RoyaltyLineItem::default() },
        ];

        let matched = match_line_items(items, &works);
        assert_eq!(matched[0].work_id.as_deref(), Some("w-1"));
        assert!(matched[0].matched);
        assert_eq!(matched[1].work_id.as_deref(), Some("w-2"));
        assert!(!matched[2].matched);
        assert_eq!(matched[2].work_id, None);
        assert!(!matched[3].matched);
    }
}
