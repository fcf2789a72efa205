//! Royalty statement models.
//!
//! Statements are produced by import/matching ([`crate::royalty::statement`])
//! and consumed read-only by the distribution calculator.

use serde::{Deserialize, Serialize};

/// Royalty category. Each has independently tracked ownership/collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum RightType {
    /// Performance (PR)
    #[default]
    Performance,
    /// Mechanical (MR)
    Mechanical,
    /// Synchronization (SR)
    Synchronization,
}

impl RightType {
    /// Parse a right type code. Returns `None` for anything but PR/MR/SR.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "PR" => Some(Self::Performance),
            "MR" => Some(Self::Mechanical),
            "SR" => Some(Self::Synchronization),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Performance => "PR",
            Self::Mechanical => "MR",
            Self::Synchronization => "SR",
        }
    }
}

// Unrecognized codes fall back to performance.
impl From<String> for RightType {
    fn from(code: String) -> Self {
        Self::from_code(&code).unwrap_or_default()
    }
}

impl From<RightType> for String {
    fn from(right: RightType) -> Self {
        right.to_code().to_string()
    }
}

/// One line of a society or DSP royalty statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoyaltyLineItem {
    #[serde(default)]
    pub id: String,
    /// Catalog id of the matched work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iswc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default)]
    pub right_type: RightType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u64>,
    pub gross_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<f64>,
    #[serde(default)]
    pub matched: bool,
}

/// A full royalty statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoyaltyStatement {
    #[serde(default)]
    pub id: String,
    /// Society or DSP name.
    #[serde(default)]
    pub source: String,
    /// e.g. "2024-Q1"
    #[serde(default)]
    pub period: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<RoyaltyLineItem>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_right_type_codes() {
        assert_eq!(RightType::from_code("mr"), Some(RightType::Mechanical));
        assert_eq!(RightType::from_code("XX"), None);
        assert_eq!(RightType::Synchronization.to_code(), "SR");
    }

    #[test]
    fn test_unknown_right_type_deserializes_as_performance() {
        let item: RoyaltyLineItem = serde_json::from_value(json!({
            "grossAmount": 10.0,
            "rightType": "DIGITAL"
        }))
        .unwrap();
        assert_eq!(item.right_type, RightType::Performance);
    }

    #[test]
    fn test_right_type_serializes_as_code() {
        let json = serde_json::to_value(RightType::Mechanical).unwrap();
        assert_eq!(json, json!("MR"));
    }

    #[test]
    fn test_statement_currency_default() {
        let statement: RoyaltyStatement = serde_json::from_value(json!({ "id": "s1" })).unwrap();
        assert_eq!(statement.currency, "USD");
        assert!(statement.line_items.is_empty());
    }
}
