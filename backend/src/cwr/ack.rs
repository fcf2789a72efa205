//! Acknowledgment parsing.
//!
//! Societies answer a transmission with a file of the same envelope shape
//! whose transactions are `ACK` (one outcome per submitted work) and `MSG`
//! (free-text diagnostics) records. Parsing is line by line: a malformed
//! line lands in the error list and never stops the rest of the file.
//!
//! # Column layout
//!
//! | Record | Columns | Field |
//! |--------|---------|-------|
//! | both   | 3..11   | Transaction sequence |
//! | ACK    | 19..21  | Transaction status |
//! | ACK    | 21..35  | Submitter work number |
//! | ACK    | 35..49  | Society work number |
//! | ACK    | 49..60  | ISWC |
//! | MSG    | 19..21  | Message type |
//! | MSG    | 21..22  | Message level |
//! | MSG    | 22..27  | Validation number |
//! | MSG    | 27..    | Message text |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AckLineError;
use crate::models::Work;

/// ACK lines must reach the end of the status field.
const ACK_MIN_LEN: usize = 21;
/// MSG lines must reach the end of the level field.
const MSG_MIN_LEN: usize = 22;

// =============================================================================
// Parsed records
// =============================================================================

/// One decoded acknowledgment line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgmentRecord {
    pub record_type: String,
    pub transaction_sequence: u64,
    /// Outcome code (`RA`, `DU`, ...). Empty for MSG and unknown records.
    pub transaction_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_work_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub society_work_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iswc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    /// Verbatim line for record types this parser does not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_record: Option<String>,
}

impl AcknowledgmentRecord {
    pub fn is_ack(&self) -> bool {
        self.record_type == "ACK"
    }

    pub fn is_message(&self) -> bool {
        self.record_type == "MSG"
    }
}

/// Result of parsing one acknowledgment file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckParseResult {
    /// True when no line failed.
    pub success: bool,
    pub records: Vec<AcknowledgmentRecord>,
    pub errors: Vec<String>,
}

impl AckParseResult {
    pub fn acks(&self) -> impl Iterator<Item = &AcknowledgmentRecord> {
        self.records.iter().filter(|r| r.is_ack())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse an acknowledgment file. Blank lines are ignored; `\n` and `\r\n`
/// line endings are both accepted.
pub fn parse_ack(content: &str) -> AckParseResult {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in content.split('\n').enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => errors.push(format!("Line {}: {} ({})", idx + 1, e, preview(line))),
        }
    }

    AckParseResult {
        success: errors.is_empty(),
        records,
        errors,
    }
}

/// Decode one non-blank line. Envelope records yield `Ok(None)`.
fn parse_line(line: &str) -> Result<Option<AcknowledgmentRecord>, AckLineError> {
    let len = line.chars().count();
    if len < 3 {
        return Err(AckLineError::TooShort(len));
    }

    let record = match column(line, 0, 3) {
        "HDR" | "GRH" | "GRT" | "TRL" => return Ok(None),
        "ACK" => {
            require("ACK", len, ACK_MIN_LEN)?;
            AcknowledgmentRecord {
                record_type: "ACK".to_string(),
                transaction_sequence: sequence(line)?,
                transaction_status: column(line, 19, 21).trim().to_string(),
                submitter_work_number: optional(line, 21, 35),
                society_work_number: optional(line, 35, 49),
                iswc: optional(line, 49, 60),
                ..AcknowledgmentRecord::default()
            }
        }
        "MSG" => {
            require("MSG", len, MSG_MIN_LEN)?;
            AcknowledgmentRecord {
                record_type: "MSG".to_string(),
                transaction_sequence: sequence(line)?,
                message_type: optional(line, 19, 21),
                message_level: optional(line, 21, 22),
                validation_number: optional(line, 22, 27),
                message_text: optional(line, 27, len),
                ..AcknowledgmentRecord::default()
            }
        }
        other => AcknowledgmentRecord {
            record_type: other.to_string(),
            original_record: Some(line.to_string()),
            ..AcknowledgmentRecord::default()
        },
    };
    Ok(Some(record))
}

fn require(tag: &'static str, len: usize, min: usize) -> Result<(), AckLineError> {
    if len < min {
        return Err(AckLineError::Truncated { tag, len, min });
    }
    Ok(())
}

fn sequence(line: &str) -> Result<u64, AckLineError> {
    let raw = column(line, 3, 11);
    raw.trim()
        .parse()
        .map_err(|_| AckLineError::InvalidSequence(raw.to_string()))
}

/// Character columns `start..end`, clamped to the line.
fn column(line: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| line.char_indices().nth(n).map(|(i, _)| i).unwrap_or(line.len());
    let from = byte_at(start);
    let to = byte_at(end.max(start));
    &line[from..to]
}

fn optional(line: &str, start: usize, end: usize) -> Option<String> {
    let value = column(line, start, end).trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn preview(line: &str) -> String {
    let head: String = line.chars().take(50).collect();
    if head.len() < line.len() {
        format!("{}...", head)
    } else {
        head
    }
}

// =============================================================================
// Status dictionary
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Display information for a transaction status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDescription {
    pub code: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub severity: Severity,
}

const STATUS_DESCRIPTIONS: [StatusDescription; 8] = [
    StatusDescription {
        code: "RA",
        label: "Registration Accepted",
        description: "Work has been successfully registered",
        severity: Severity::Success,
    },
    StatusDescription {
        code: "AS",
        label: "Accepted with Changes",
        description: "Work accepted but with modifications",
        severity: Severity::Warning,
    },
    StatusDescription {
        code: "AC",
        label: "Accepted with Conflict",
        description: "Work accepted but conflicts exist",
        severity: Severity::Warning,
    },
    StatusDescription {
        code: "RC",
        label: "Claim Rejected",
        description: "Registration claim was rejected",
        severity: Severity::Error,
    },
    StatusDescription {
        code: "DU",
        label: "Duplicate",
        description: "Work already exists in database",
        severity: Severity::Warning,
    },
    StatusDescription {
        code: "CO",
        label: "Conflict",
        description: "Conflicting information detected",
        severity: Severity::Error,
    },
    StatusDescription {
        code: "NP",
        label: "Not Processed",
        description: "Transaction was not processed",
        severity: Severity::Error,
    },
    StatusDescription {
        code: "PA",
        label: "Partial Agreement",
        description: "Partial agreement on shares",
        severity: Severity::Warning,
    },
];

/// Look up a 2-letter transaction status code (case-insensitive).
pub fn status_description(code: &str) -> Option<&'static StatusDescription> {
    let code = code.trim();
    STATUS_DESCRIPTIONS
        .iter()
        .find(|d| d.code.eq_ignore_ascii_case(code))
}

/// All known status codes, for display.
pub fn status_descriptions() -> &'static [StatusDescription] {
    &STATUS_DESCRIPTIONS
}

// =============================================================================
// Outcome matching
// =============================================================================

/// A free-text message attached to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    pub message_type: Option<String>,
    pub level: Option<String>,
    pub validation_number: Option<String>,
    pub text: Option<String>,
}

/// Society response for one submitted work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkOutcome {
    /// Catalog id of the work.
    pub work_id: String,
    pub title: String,
    pub transaction_sequence: u64,
    pub status: String,
    pub status_label: Option<String>,
    pub severity: Option<Severity>,
    pub society_work_number: Option<String>,
    pub iswc: Option<String>,
    pub messages: Vec<AckMessage>,
}

/// Outcomes for a whole acknowledgment file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub outcomes: Vec<WorkOutcome>,
    /// ACK and MSG records that could not be tied to a submitted work.
    pub unmatched: Vec<AcknowledgmentRecord>,
}

/// Fold parsed ACK/MSG records into per-work outcomes.
///
/// `works` must be in transmission order: an ACK whose submitter work number
/// names no work is matched by its transaction sequence (1-based position).
pub fn match_outcomes(result: &AckParseResult, works: &[Work]) -> OutcomeReport {
    let mut report = OutcomeReport::default();
    let mut by_sequence: HashMap<u64, usize> = HashMap::new();

    for ack in result.acks() {
        let work = ack
            .submitter_work_number
            .as_deref()
            .and_then(|number| {
                works
                    .iter()
                    .find(|w| w.work_id.trim().eq_ignore_ascii_case(number))
            })
            .or_else(|| position(works, ack.transaction_sequence));

        let Some(work) = work else {
            report.unmatched.push(ack.clone());
            continue;
        };

        let status = status_description(&ack.transaction_status);
        by_sequence.insert(ack.transaction_sequence, report.outcomes.len());
        report.outcomes.push(WorkOutcome {
            work_id: work.id.clone(),
            title: work.title.clone(),
            transaction_sequence: ack.transaction_sequence,
            status: ack.transaction_status.clone(),
            status_label: status.map(|s| s.label.to_string()),
            severity: status.map(|s| s.severity),
            society_work_number: ack.society_work_number.clone(),
            iswc: ack.iswc.clone(),
            messages: Vec::new(),
        });
    }

    for msg in result.records.iter().filter(|r| r.is_message()) {
        match by_sequence.get(&msg.transaction_sequence) {
            Some(&idx) => report.outcomes[idx].messages.push(AckMessage {
                message_type: msg.message_type.clone(),
                level: msg.message_level.clone(),
                validation_number: msg.validation_number.clone(),
                text: msg.message_text.clone(),
            }),
            None => report.unmatched.push(msg.clone()),
        }
    }

    report
}

fn position(works: &[Work], sequence: u64) -> Option<&Work> {
    let idx = usize::try_from(sequence).ok()?.checked_sub(1)?;
    works.get(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(seq: u64, status: &str, submitter: &str, society: &str, iswc: &str) -> String {
        format!(
            "ACK{:08}{:08}{:<2}{:<14}{:<14}{:<11}",
            seq, 0, status, submitter, society, iswc
        )
    }

    fn msg(seq: u64, level: &str, text: &str) -> String {
        format!("MSG{:08}{:08}T {}00123{}", seq, 1, level, text)
    }

    #[test]
    fn test_parse_full_acknowledgment() {
        let content = [
            "HDRSO000000021ASCAP".to_string(),
            "GRHACK0000102.10".to_string(),
            ack(1, "RA", "RWOR10001", "886543210", "T1234567894"),
            msg(1, "F", "Writer IPI unknown"),
            "GRT000010000000100000004".to_string(),
            "TRL000010000000100000006".to_string(),
        ]
        .join("\r\n");

        let result = parse_ack(&content);
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.records.len(), 2);

        let a = &result.records[0];
        assert_eq!(a.record_type, "ACK");
        assert_eq!(a.transaction_sequence, 1);
        assert_eq!(a.transaction_status, "RA");
        assert_eq!(a.submitter_work_number.as_deref(), Some("RWOR10001"));
        assert_eq!(a.society_work_number.as_deref(), Some("886543210"));
        assert_eq!(a.iswc.as_deref(), Some("T1234567894"));

        let m = &result.records[1];
        assert_eq!(m.record_type, "MSG");
        assert_eq!(m.message_type.as_deref(), Some("T"));
        assert_eq!(m.message_level.as_deref(), Some("F"));
        assert_eq!(m.validation_number.as_deref(), Some("00123"));
        assert_eq!(m.message_text.as_deref(), Some("Writer IPI unknown"));
    }

    #[test]
    fn test_one_bad_line_does_not_abort() {
        let content = format!("{}\nACK0000\n", ack(1, "RA", "RWOR10001", "", ""));
        let result = parse_ack(&content);

        assert!(!result.success);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Line 2:"));
        assert!(result.errors[0].contains("truncated ACK"));
    }

    #[test]
    fn test_line_errors() {
        assert_eq!(parse_line("AC"), Err(AckLineError::TooShort(2)));
        assert_eq!(
            parse_line("MSG00000001"),
            Err(AckLineError::Truncated { tag: "MSG", len: 11, min: MSG_MIN_LEN })
        );
        assert!(matches!(
            parse_line("ACKxxxxxxxx00000000RA"),
            Err(AckLineError::InvalidSequence(_))
        ));
    }

    #[test]
    fn test_short_optional_fields() {
        let result = parse_ack("ACK0000000200000000DU");
        let a = &result.records[0];
        assert_eq!(a.transaction_status, "DU");
        assert_eq!(a.submitter_work_number, None);
        assert_eq!(a.iswc, None);
    }

    #[test]
    fn test_unknown_records_preserved_verbatim() {
        let line = "XYZ some future record";
        let result = parse_ack(line);
        assert!(result.success);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].record_type, "XYZ");
        assert_eq!(result.records[0].original_record.as_deref(), Some(line));
    }

    #[test]
    fn test_non_ascii_text_does_not_panic() {
        let result = parse_ack(&msg(1, "W", "Titre modifié: « Été »"));
        assert!(result.success);
        assert_eq!(result.records[0].message_text.as_deref(), Some("Titre modifié: « Été »"));

        let result = parse_ack("ACKé");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_status_dictionary() {
        let ra = status_description("RA").unwrap();
        assert_eq!(ra.label, "Registration Accepted");
        assert_eq!(ra.severity, Severity::Success);
        assert_eq!(status_description("du").unwrap().severity, Severity::Warning);
        assert_eq!(status_description("NP").unwrap().severity, Severity::Error);
        assert!(status_description("ZZ").is_none());
        assert_eq!(status_descriptions().len(), 8);
    }

    #[test]
    fn test_match_outcomes() {
        let works = vec![
            Work::new("w-1", "RWOR10001", "Midnight City"),
            Work::new("w-2", "RWOR10002", "Daybreak"),
        ];
        let content = [
            // Matched by submitter work number despite the sequence.
            ack(9, "RA", "rwor10001", "886543210", ""),
            // No work number: matched by position.
            ack(2, "DU", "", "", ""),
            msg(2, "E", "Duplicate of 771"),
            msg(7, "E", "Orphan"),
            ack(5, "NP", "UNKNOWN", "", ""),
        ]
        .join("\n");

        let report = match_outcomes(&parse_ack(&content), &works);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].work_id, "w-1");
        assert_eq!(report.outcomes[0].status_label.as_deref(), Some("Registration Accepted"));
        assert_eq!(report.outcomes[0].society_work_number.as_deref(), Some("886543210"));
        assert_eq!(report.outcomes[1].work_id, "w-2");
        assert_eq!(report.outcomes[1].severity, Some(Severity::Warning));
        assert_eq!(report.outcomes[1].messages.len(), 1);
        assert_eq!(report.outcomes[1].messages[0].text.as_deref(), Some("Duplicate of 771"));

        assert_eq!(report.unmatched.len(), 2);
        assert!(report.unmatched.iter().any(|r| r.is_message()));
        assert!(report.unmatched.iter().any(|r| r.transaction_status == "NP"));
    }
}
