//! Structural checks on a transmission.
//!
//! Independent of the assembler: works on any text, generated or received.
//! Errors block acceptance, warnings do not.

use serde::{Deserialize, Serialize};

use super::records::RecordKind;

/// Outcome of [`validate_cwr`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate_cwr(content: &str) -> ValidationReport {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if lines.len() < 4 {
        errors.push("CWR file must contain at least HDR, GRH, GRT, and TRL records".to_string());
        return ValidationReport {
            valid: false,
            errors,
            warnings,
        };
    }

    let kind_of = |line: &str| line.get(0..3).and_then(RecordKind::from_tag);

    if kind_of(lines[0]) != Some(RecordKind::TransmissionHeader) {
        errors.push("First record must be HDR (Header)".to_string());
    }
    if kind_of(lines[lines.len() - 1]) != Some(RecordKind::TransmissionTrailer) {
        errors.push("Last record must be TRL (Trailer)".to_string());
    }

    let kinds: Vec<RecordKind> = lines.iter().filter_map(|l| kind_of(*l)).collect();
    let has = |wanted: &[RecordKind]| kinds.iter().any(|k| wanted.contains(k));

    if !has(&[RecordKind::NewWork, RecordKind::RevisedWork]) {
        errors.push("No NWR or REV records found".to_string());
    }
    if !has(&[RecordKind::PublisherShare]) {
        warnings.push("No SPU records found".to_string());
    }
    if !has(&[RecordKind::WriterShare, RecordKind::OtherWriter]) {
        warnings.push("No SWR or OWR records found".to_string());
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(tags: &[&str]) -> String {
        tags.iter()
            .map(|t| format!("{}0000000100000000", t))
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    #[test]
    fn test_too_few_records() {
        let report = validate_cwr(&lines(&["HDR", "GRH", "TRL"]));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("at least"));
    }

    #[test]
    fn test_envelope_order() {
        let report = validate_cwr(&lines(&["GRH", "HDR", "NWR", "SPU", "SWR", "TRL", "GRT"]));
        assert!(!report.valid);
        assert!(report.errors.contains(&"First record must be HDR (Header)".to_string()));
        assert!(report.errors.contains(&"Last record must be TRL (Trailer)".to_string()));
    }

    #[test]
    fn test_missing_work_is_error_missing_parties_are_warnings() {
        let report = validate_cwr(&lines(&["HDR", "GRH", "ALT", "GRT", "TRL"]));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["No NWR or REV records found".to_string()]);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_other_writer_counts_as_writer() {
        let report = validate_cwr(&lines(&["HDR", "GRH", "REV", "SPU", "OWR", "GRT", "TRL"]));
        assert!(report.valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_blank_lines_ignored() {
        let content = format!("\n{}\n\n", lines(&["HDR", "GRH", "NWR", "SPU", "SWR", "GRT", "TRL"]));
        assert!(validate_cwr(&content).valid);
    }
}
