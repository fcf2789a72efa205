//! Encoding session state.
//!
//! A [`CwrContext`] is created once per generation call, threaded through
//! the record builders by reference, and dropped when the transmission is
//! assembled. Nothing here is shared between calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::PublisherSettings;

/// Supported CWR format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CwrVersion {
    #[default]
    #[serde(rename = "2.1")]
    V21,
    #[serde(rename = "2.2")]
    V22,
    #[serde(rename = "3.0")]
    V30,
    #[serde(rename = "3.1")]
    V31,
}

impl CwrVersion {
    /// EDI version string carried in the header records (`02.10`, ..., `03.01`).
    pub fn edi_version(&self) -> &'static str {
        match self {
            Self::V21 => "02.10",
            Self::V22 => "02.20",
            Self::V30 => "03.00",
            Self::V31 => "03.01",
        }
    }

    /// Two-digit code used in the transmission filename extension.
    pub fn file_code(&self) -> &'static str {
        match self {
            Self::V21 => "21",
            Self::V22 => "22",
            Self::V30 => "30",
            Self::V31 => "31",
        }
    }

    /// Performer and recording records exist from 3.0 on.
    pub fn carries_recordings(&self) -> bool {
        matches!(self, Self::V30 | Self::V31)
    }
}

impl fmt::Display for CwrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::V21 => "2.1",
            Self::V22 => "2.2",
            Self::V30 => "3.0",
            Self::V31 => "3.1",
        };
        f.write_str(label)
    }
}

impl FromStr for CwrVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "2.1" | "21" => Ok(Self::V21),
            "2.2" | "22" => Ok(Self::V22),
            "3.0" | "30" => Ok(Self::V30),
            "3.1" | "31" => Ok(Self::V31),
            other => Err(other.to_string()),
        }
    }
}

/// Kind of transaction carried by the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransactionType {
    /// New work registration.
    #[default]
    #[serde(rename = "NWR")]
    NewRegistration,
    /// Revised registration.
    #[serde(rename = "REV")]
    Revision,
}

impl TransactionType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NewRegistration => "NWR",
            Self::Revision => "REV",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NWR" => Ok(Self::NewRegistration),
            "REV" => Ok(Self::Revision),
            other => Err(other.to_string()),
        }
    }
}

/// Mutable state of one generation run.
#[derive(Debug, Clone)]
pub struct CwrContext<'a> {
    /// Sequence of the current transaction, 1-based once the first work starts.
    pub transaction_sequence: u64,
    /// Sequence of the current record within its transaction.
    pub record_sequence: u64,
    pub version: CwrVersion,
    pub transaction_type: TransactionType,
    pub settings: &'a PublisherSettings,
    pub submitter_code: String,
    pub recipient_society: String,
}

impl<'a> CwrContext<'a> {
    pub fn new(
        settings: &'a PublisherSettings,
        version: CwrVersion,
        transaction_type: TransactionType,
        submitter_code: impl Into<String>,
        recipient_society: impl Into<String>,
    ) -> Self {
        Self {
            transaction_sequence: 0,
            record_sequence: 0,
            version,
            transaction_type,
            settings,
            submitter_code: submitter_code.into(),
            recipient_society: recipient_society.into(),
        }
    }

    /// Start the next transaction; its header record carries record sequence 0.
    pub fn begin_transaction(&mut self) {
        self.transaction_sequence += 1;
        self.record_sequence = 0;
    }

    /// Advance to the next detail record of the current transaction.
    pub fn next_record(&mut self) {
        self.record_sequence += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!("3.1".parse::<CwrVersion>(), Ok(CwrVersion::V31));
        assert_eq!("V22".parse::<CwrVersion>(), Ok(CwrVersion::V22));
        assert_eq!("21".parse::<CwrVersion>(), Ok(CwrVersion::V21));
        assert!("4.0".parse::<CwrVersion>().is_err());
    }

    #[test]
    fn test_version_gating() {
        assert!(!CwrVersion::V21.carries_recordings());
        assert!(!CwrVersion::V22.carries_recordings());
        assert!(CwrVersion::V30.carries_recordings());
        assert!(CwrVersion::V31.carries_recordings());
    }

    #[test]
    fn test_sequence_counters() {
        let settings = PublisherSettings::default();
        let mut ctx = CwrContext::new(
            &settings,
            CwrVersion::V21,
            TransactionType::NewRegistration,
            "NFM",
            "ASC",
        );
        ctx.begin_transaction();
        ctx.next_record();
        ctx.next_record();
        assert_eq!((ctx.transaction_sequence, ctx.record_sequence), (1, 2));

        ctx.begin_transaction();
        assert_eq!((ctx.transaction_sequence, ctx.record_sequence), (2, 0));
    }
}
