//! Domain models for the catalog side of the registration and royalty engine.
//!
//! This module contains the entities the core reads:
//!
//! - [`Work`] - Musical work with its writer/publisher shares, alternate titles and recordings
//! - [`Writer`] / [`Publisher`] - Interested parties referenced by shares
//! - [`WriterShare`] / [`PublisherShare`] - Ownership (and collection) percentages
//! - [`Territory`] - TIS territory inclusion/exclusion
//! - [`PublisherSettings`] - Identity of the submitting organization
//! - [`Catalog`] - A complete catalog document with foreign-key resolution
//!
//! Royalty statement types live in [`royalty`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};

pub mod royalty;

pub use royalty::{RightType, RoyaltyLineItem, RoyaltyStatement};

// =============================================================================
// Writer Capacity
// =============================================================================

/// Capacity in which a writer contributed to a work.
///
/// Based on CISAC role codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WriterCapacity {
    /// Composer/Author (CA) - music and lyrics
    #[default]
    #[serde(rename = "CA")]
    ComposerAuthor,
    /// Composer (C)
    #[serde(rename = "C")]
    Composer,
    /// Author (A) - lyrics
    #[serde(rename = "A")]
    Author,
    /// Adapter (AD)
    #[serde(rename = "AD")]
    Adapter,
    /// Arranger (AR)
    #[serde(rename = "AR")]
    Arranger,
    /// Sub-Author (SA)
    #[serde(rename = "SA")]
    SubAuthor,
    /// Sub-Arranger (SR)
    #[serde(rename = "SR")]
    SubArranger,
    /// Translator (TR)
    #[serde(rename = "TR")]
    Translator,
}

impl WriterCapacity {
    /// Parse capacity from a CISAC code or spelled-out name.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_uppercase();
        match normalized.as_str() {
            "CA" | "COMPOSER_AUTHOR" | "COMPOSER/AUTHOR" => Some(Self::ComposerAuthor),
            "C" | "COMPOSER" => Some(Self::Composer),
            "A" | "AUTHOR" | "LYRICIST" => Some(Self::Author),
            "AD" | "ADAPTER" => Some(Self::Adapter),
            "AR" | "ARRANGER" => Some(Self::Arranger),
            "SA" | "SUB_AUTHOR" => Some(Self::SubAuthor),
            "SR" | "SUB_ARRANGER" => Some(Self::SubArranger),
            "TR" | "TRANSLATOR" => Some(Self::Translator),
            _ => None,
        }
    }

    /// Convert to CISAC code.
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::ComposerAuthor => "CA",
            Self::Composer => "C",
            Self::Author => "A",
            Self::Adapter => "AD",
            Self::Arranger => "AR",
            Self::SubAuthor => "SA",
            Self::SubArranger => "SR",
            Self::Translator => "TR",
        }
    }
}

// =============================================================================
// Publisher Role
// =============================================================================

/// Role a publisher plays on a work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PublisherRole {
    /// Original publisher (E)
    #[default]
    #[serde(rename = "E")]
    OriginalPublisher,
    /// Administrator (AM)
    #[serde(rename = "AM")]
    Administrator,
    /// Sub-publisher (SE)
    #[serde(rename = "SE")]
    SubPublisher,
    /// Income participant (PA)
    #[serde(rename = "PA")]
    IncomeParticipant,
}

impl PublisherRole {
    /// Two-character publisher type as carried on the wire.
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::OriginalPublisher => "E ",
            Self::Administrator => "AM",
            Self::SubPublisher => "SE",
            Self::IncomeParticipant => "PA",
        }
    }
}

// =============================================================================
// Work classification
// =============================================================================

/// Version type of a work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VersionType {
    /// Original work (ORI)
    #[default]
    #[serde(rename = "ORI")]
    Original,
    /// Modified version of another work (MOD)
    #[serde(rename = "MOD")]
    Modified,
    /// Arrangement (ARR)
    #[serde(rename = "ARR")]
    Arrangement,
}

/// Kind of alternate title.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TitleType {
    /// Alternate title (AT)
    #[default]
    #[serde(rename = "AT")]
    Alternate,
    /// First line of text (FT)
    #[serde(rename = "FT")]
    FirstLine,
    /// Incorrect title (IT)
    #[serde(rename = "IT")]
    Incorrect,
    /// Original title in original language (OL)
    #[serde(rename = "OL")]
    OriginalLanguage,
    /// Original title (OT)
    #[serde(rename = "OT")]
    Original,
    /// Part title (PT)
    #[serde(rename = "PT")]
    Part,
    /// Registered title (RT)
    #[serde(rename = "RT")]
    Registered,
    /// Extra search title (ET)
    #[serde(rename = "ET")]
    ExtraSearch,
    /// Title for excerpt (TE)
    #[serde(rename = "TE")]
    Excerpt,
}

impl TitleType {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Alternate => "AT",
            Self::FirstLine => "FT",
            Self::Incorrect => "IT",
            Self::OriginalLanguage => "OL",
            Self::Original => "OT",
            Self::Part => "PT",
            Self::Registered => "RT",
            Self::ExtraSearch => "ET",
            Self::Excerpt => "TE",
        }
    }
}

// =============================================================================
// Interested parties
// =============================================================================

/// A songwriter known to the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Writer {
    /// Catalog identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    /// Whether this organization administers the writer's royalties.
    #[serde(default)]
    pub controlled: bool,
    /// IPI name number (11 digits).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_name_number: Option<String>,
    /// IPI base number (13 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_base_number: Option<String>,
    /// Performance rights society code (CISAC numeric, e.g. "021").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_society: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_society: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr_society: Option<String>,
    /// Administration fee percentage from the writer's agreement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_admin_fee: Option<f64>,
}

impl Writer {
    /// "Last, First" display name.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name.as_deref().unwrap_or(""))
    }
}

/// A music publisher known to the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_name_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_base_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_society: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_society: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr_society: Option<String>,
}

// =============================================================================
// Shares
// =============================================================================

/// A TIS territory attached to a publisher share.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    /// TIS numeric code (e.g. "2136" for World).
    pub code: String,
    /// Inclusion (`true`) or exclusion (`false`).
    #[serde(default = "default_true")]
    pub included: bool,
}

fn default_true() -> bool {
    true
}

/// A writer's ownership of a work.
///
/// `writer_id` is a foreign key into the catalog; `writer` is filled in by
/// [`Catalog::resolve`] before the share reaches the encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriterShare {
    pub writer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<Writer>,
    #[serde(default)]
    pub capacity: WriterCapacity,
    /// Performance ownership (0-100).
    #[serde(default)]
    pub pr_ownership: f64,
    /// Mechanical ownership (0-100).
    #[serde(default)]
    pub mr_ownership: f64,
    /// Synchronization ownership (0-100).
    #[serde(default)]
    pub sr_ownership: f64,
    /// Society-assigned agreement number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saan: Option<String>,
}

impl WriterShare {
    /// Whether the referenced writer is controlled. Unresolved writers are not.
    pub fn is_controlled(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| w.controlled)
    }

    /// Ownership percentage for a right type.
    pub fn ownership(&self, right: RightType) -> f64 {
        match right {
            RightType::Performance => self.pr_ownership,
            RightType::Mechanical => self.mr_ownership,
            RightType::Synchronization => self.sr_ownership,
        }
    }
}

/// A publisher's ownership and collection on a work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublisherShare {
    pub publisher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(default)]
    pub role: PublisherRole,
    #[serde(default)]
    pub pr_ownership: f64,
    #[serde(default)]
    pub mr_ownership: f64,
    #[serde(default)]
    pub sr_ownership: f64,
    #[serde(default)]
    pub pr_collection: f64,
    #[serde(default)]
    pub mr_collection: f64,
    #[serde(default)]
    pub sr_collection: f64,
    #[serde(default)]
    pub territories: Vec<Territory>,
}

impl PublisherShare {
    /// Collection percentage for a right type.
    pub fn collection(&self, right: RightType) -> f64 {
        match right {
            RightType::Performance => self.pr_collection,
            RightType::Mechanical => self.mr_collection,
            RightType::Synchronization => self.sr_collection,
        }
    }
}

// =============================================================================
// Titles and recordings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternateTitle {
    pub title: String,
    #[serde(default, rename = "type")]
    pub title_type: TitleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A performing artist credited on a recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isni: Option<String>,
}

impl Artist {
    /// Name as registered on performer records: "LAST, FIRST" or just the last name.
    pub fn performer_name(&self) -> String {
        let last = self.last_name.as_deref().unwrap_or("");
        match self.first_name.as_deref().filter(|f| !f.is_empty()) {
            Some(first) => format!("{}, {}", last, first).trim().to_string(),
            None => last.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    /// Duration in whole seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

// =============================================================================
// Work
// =============================================================================

/// A musical work as held in the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    /// Catalog identifier (used for selection and statement matching).
    pub id: String,
    /// Submitter work number carried on the wire (e.g. "RWOR10001").
    #[serde(default)]
    pub work_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iswc: Option<String>,
    #[serde(default)]
    pub version_type: VersionType,
    /// Two-letter language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Musical work distribution category (JAZ, POP, SER, UNC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_category: Option<String>,
    #[serde(default)]
    pub writer_shares: Vec<WriterShare>,
    #[serde(default)]
    pub publisher_shares: Vec<PublisherShare>,
    #[serde(default)]
    pub alternate_titles: Vec<AlternateTitle>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

impl Work {
    /// Create a new work with minimal required fields.
    pub fn new(id: impl Into<String>, work_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            work_id: work_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether `title` names this work, by main or alternate title.
    pub fn has_title(&self, title: &str) -> bool {
        let wanted = title.trim().to_lowercase();
        self.title.trim().to_lowercase() == wanted
            || self
                .alternate_titles
                .iter()
                .any(|at| at.title.trim().to_lowercase() == wanted)
    }
}

static ISWC_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.\-]").expect("Invalid ISWC separator pattern"));

/// Strip the separators from a formatted ISWC ("T-123.456.789-0" -> "T1234567890").
pub fn normalize_iswc(iswc: &str) -> String {
    ISWC_SEPARATORS.replace_all(iswc, "").to_uppercase()
}

// =============================================================================
// Publisher settings
// =============================================================================

/// Identity and defaults of the organization submitting registrations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublisherSettings {
    pub name: String,
    #[serde(default)]
    pub ipi_name_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_base_number: Option<String>,
    /// Three-character submitter code agreed with the recipient society.
    #[serde(default)]
    pub delivery_code: String,
    #[serde(default)]
    pub pr_society: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_society: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr_society: Option<String>,
    /// Catalog-wide administration fee percentage, used when a writer has no
    /// agreement fee and the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_admin_fee: Option<f64>,
}

// =============================================================================
// Catalog document
// =============================================================================

/// A complete catalog document: settings, parties and works.
///
/// Shares reference parties by id. Call [`Catalog::resolve`] (or
/// [`Catalog::resolve_strict`]) before handing works to the encoder or the
/// distribution calculator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub settings: PublisherSettings,
    #[serde(default)]
    pub writers: Vec<Writer>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub works: Vec<Work>,
}

impl Catalog {
    /// Attach referenced writers and publishers to every share.
    ///
    /// Shares whose id is unknown keep whatever was embedded (usually nothing).
    pub fn resolve(&mut self) {
        let writers: HashMap<&str, &Writer> =
            self.writers.iter().map(|w| (w.id.as_str(), w)).collect();
        let publishers: HashMap<&str, &Publisher> =
            self.publishers.iter().map(|p| (p.id.as_str(), p)).collect();

        for work in &mut self.works {
            for share in &mut work.writer_shares {
                if let Some(w) = writers.get(share.writer_id.as_str()) {
                    share.writer = Some((*w).clone());
                }
            }
            for share in &mut work.publisher_shares {
                if let Some(p) = publishers.get(share.publisher_id.as_str()) {
                    share.publisher = Some((*p).clone());
                }
            }
        }
    }

    /// Like [`Catalog::resolve`], but fails on the first dangling reference
    /// without touching any share.
    pub fn resolve_strict(&mut self) -> CatalogResult<()> {
        if let Some(err) = self.first_dangling_reference() {
            return Err(err);
        }
        self.resolve();
        Ok(())
    }

    /// A share whose id matches no party and that carries no embedded party.
    fn first_dangling_reference(&self) -> Option<CatalogError> {
        for work in &self.works {
            for share in &work.writer_shares {
                if share.writer.is_none() && !self.writers.iter().any(|w| w.id == share.writer_id) {
                    return Some(CatalogError::UnresolvedReference {
                        work: work.work_id.clone(),
                        kind: "writer",
                        id: share.writer_id.clone(),
                    });
                }
            }
            for share in &work.publisher_shares {
                if share.publisher.is_none() && !self.publishers.iter().any(|p| p.id == share.publisher_id) {
                    return Some(CatalogError::UnresolvedReference {
                        work: work.work_id.clone(),
                        kind: "publisher",
                        id: share.publisher_id.clone(),
                    });
                }
            }
        }
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
