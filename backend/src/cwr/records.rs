//! Record builders.
//!
//! One pure function per record kind. Each concatenates fixed-width fields in
//! wire order and returns exactly one line of [`RecordKind::width`]
//! characters. Sequence numbers are read from the [`CwrContext`]; advancing
//! them is the assembler's job.
//!
//! # Record kinds
//!
//! | Tag | Width | Content |
//! |-----|-------|---------|
//! | HDR | 103 | Transmission header |
//! | GRH | 26  | Group header |
//! | NWR/REV | 261 | Work transaction header |
//! | SPU | 181 | Publisher share |
//! | SPT | 52  | Publisher collection per territory |
//! | SWR | 178 | Controlled writer share |
//! | SWT | 52  | Controlled writer collection |
//! | OWR | 176 | Other (uncontrolled) writer |
//! | PWR | 110 | Publisher for writer |
//! | ALT | 83  | Alternate title |
//! | PER | 134 | Performing artist (3.0+) |
//! | REC | 230 | Recording detail (3.0+) |
//! | GRT | 24  | Group trailer |
//! | TRL | 24  | Transmission trailer |

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{CwrContext, CwrVersion, TransactionType};
use super::fields::{
    blank, format_date, format_duration, format_share, format_time, left_just, numeric, right_just,
};
use crate::models::{
    normalize_iswc, AlternateTitle, Artist, PublisherShare, Recording, Territory, VersionType, Work,
    WriterShare,
};

/// TIS code for the world, used for writer collection records.
pub const WORLD_TERRITORY: &str = "2136";

static ISRC_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("Invalid ISRC separator pattern"));

// =============================================================================
// Record kinds and dispatch
// =============================================================================

/// The closed set of record kinds this encoder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    TransmissionHeader,
    GroupHeader,
    NewWork,
    RevisedWork,
    PublisherShare,
    PublisherTerritory,
    WriterShare,
    WriterTerritory,
    OtherWriter,
    PublisherForWriter,
    AlternateTitle,
    Performer,
    Recording,
    GroupTrailer,
    TransmissionTrailer,
}

impl RecordKind {
    /// Three-character record type tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TransmissionHeader => "HDR",
            Self::GroupHeader => "GRH",
            Self::NewWork => "NWR",
            Self::RevisedWork => "REV",
            Self::PublisherShare => "SPU",
            Self::PublisherTerritory => "SPT",
            Self::WriterShare => "SWR",
            Self::WriterTerritory => "SWT",
            Self::OtherWriter => "OWR",
            Self::PublisherForWriter => "PWR",
            Self::AlternateTitle => "ALT",
            Self::Performer => "PER",
            Self::Recording => "REC",
            Self::GroupTrailer => "GRT",
            Self::TransmissionTrailer => "TRL",
        }
    }

    /// Line length of this record kind.
    pub fn width(&self) -> usize {
        match self {
            Self::TransmissionHeader => 103,
            Self::GroupHeader => 26,
            Self::NewWork | Self::RevisedWork => 261,
            Self::PublisherShare => 181,
            Self::PublisherTerritory | Self::WriterTerritory => 52,
            Self::WriterShare => 178,
            Self::OtherWriter => 176,
            Self::PublisherForWriter => 110,
            Self::AlternateTitle => 83,
            Self::Performer => 134,
            Self::Recording => 230,
            Self::GroupTrailer | Self::TransmissionTrailer => 24,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.tag() == tag)
    }

    /// Records emitted for one writer share, keyed by controlled status.
    ///
    /// Controlled writers collect through this organization and get the full
    /// share/collection/link triple; everyone else is informational only.
    pub fn writer_plan(controlled: bool) -> &'static [RecordKind] {
        if controlled {
            &[Self::WriterShare, Self::WriterTerritory, Self::PublisherForWriter]
        } else {
            &[Self::OtherWriter]
        }
    }

    /// Whether `version` carries this record kind at all.
    pub fn supported_by(&self, version: CwrVersion) -> bool {
        match self {
            Self::Performer | Self::Recording => version.carries_recordings(),
            _ => true,
        }
    }

    /// Header, trailer and group envelope records.
    pub fn is_envelope(&self) -> bool {
        matches!(
            self,
            Self::TransmissionHeader | Self::GroupHeader | Self::GroupTrailer | Self::TransmissionTrailer
        )
    }
}

const ALL_KINDS: [RecordKind; 15] = [
    RecordKind::TransmissionHeader,
    RecordKind::GroupHeader,
    RecordKind::NewWork,
    RecordKind::RevisedWork,
    RecordKind::PublisherShare,
    RecordKind::PublisherTerritory,
    RecordKind::WriterShare,
    RecordKind::WriterTerritory,
    RecordKind::OtherWriter,
    RecordKind::PublisherForWriter,
    RecordKind::AlternateTitle,
    RecordKind::Performer,
    RecordKind::Recording,
    RecordKind::GroupTrailer,
    RecordKind::TransmissionTrailer,
];

// =============================================================================
// Helpers
// =============================================================================

/// Record type + transaction sequence + record sequence.
fn transaction_prefix(kind: RecordKind, ctx: &CwrContext<'_>) -> String {
    format!(
        "{}{}{}",
        kind.tag(),
        numeric(ctx.transaction_sequence, 8),
        numeric(ctx.record_sequence, 8)
    )
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

fn upper(value: &str) -> String {
    value.to_uppercase()
}

fn ip_number(prefix: char, seq: usize) -> String {
    left_just(&format!("{}{}", prefix, seq), 9)
}

// =============================================================================
// Envelope records
// =============================================================================

/// HDR: sender identity, EDI version, creation date/time.
pub fn transmission_header(ctx: &CwrContext<'_>, created: NaiveDateTime) -> String {
    let date = format_date(created.date());
    let mut line = String::with_capacity(RecordKind::TransmissionHeader.width());
    line.push_str(RecordKind::TransmissionHeader.tag());
    line.push_str("PB");
    line.push_str(&left_just(&ctx.settings.ipi_name_number, 11));
    line.push_str(&left_just(&ctx.settings.name, 45));
    line.push_str(&left_just(ctx.version.edi_version(), 5));
    line.push_str(&date);
    line.push_str(&format_time(created));
    line.push_str(&date); // transmission date
    line.push_str(&left_just("ASCII", 15));
    line
}

/// GRH: transaction type, group id, version.
pub fn group_header(ctx: &CwrContext<'_>, group_id: u64) -> String {
    format!(
        "{}{}{}{}{}",
        RecordKind::GroupHeader.tag(),
        ctx.transaction_type.tag(),
        numeric(group_id, 5),
        left_just(ctx.version.edi_version(), 5),
        blank(10) // batch request
    )
}

/// GRT: group id, transaction count, record count.
pub fn group_trailer(group_id: u64, transactions: u64, records: u64) -> String {
    format!(
        "{}{}{}{}",
        RecordKind::GroupTrailer.tag(),
        numeric(group_id, 5),
        numeric(transactions, 8),
        numeric(records, 8)
    )
}

/// TRL: group count, transaction count, record count.
pub fn transmission_trailer(groups: u64, transactions: u64, records: u64) -> String {
    format!(
        "{}{}{}{}",
        RecordKind::TransmissionTrailer.tag(),
        numeric(groups, 5),
        numeric(transactions, 8),
        numeric(records, 8)
    )
}

// =============================================================================
// Work transaction
// =============================================================================

/// NWR/REV: the work's transaction header record.
pub fn work_header(ctx: &CwrContext<'_>, work: &Work) -> String {
    let kind = match ctx.transaction_type {
        TransactionType::NewRegistration => RecordKind::NewWork,
        TransactionType::Revision => RecordKind::RevisedWork,
    };
    let duration = format_duration(work.recordings.first().and_then(|r| r.duration_seconds));
    let recorded = if work.recordings.is_empty() { "U" } else { "Y" };
    let (version_type, arrangement) = match work.version_type {
        VersionType::Original => ("ORI", ""),
        VersionType::Modified => ("MOD", ""),
        VersionType::Arrangement => ("MOD", "ARR"),
    };
    let iswc = work.iswc.as_deref().map(normalize_iswc).unwrap_or_default();
    let language = work
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("EN");

    let mut line = String::with_capacity(kind.width());
    line.push_str(&transaction_prefix(kind, ctx));
    line.push_str(&left_just(&upper(&work.title), 60));
    line.push_str(&left_just(&upper(language), 2));
    line.push_str(&left_just(&work.work_id, 14));
    line.push_str(&left_just(&iswc, 11));
    line.push_str(&blank(8)); // copyright date
    line.push_str(&blank(12)); // copyright number
    line.push_str(&left_just(work.distribution_category.as_deref().unwrap_or("UNC"), 3));
    line.push_str(&duration);
    line.push_str(recorded);
    line.push_str("MTX"); // text-music relationship
    line.push_str(&blank(3)); // composite type
    line.push_str(version_type);
    line.push_str(&blank(3)); // excerpt type
    line.push_str(&left_just(arrangement, 3));
    line.push_str(&blank(3)); // lyric adaptation
    line.push_str(&blank(30)); // contact name
    line.push_str(&blank(11)); // contact id
    line.push_str(&blank(2)); // CWR work type
    line.push(' '); // grand rights
    line.push_str(&blank(3)); // composite component count
    line.push_str(&blank(8)); // date of printed edition
    line.push(' '); // exceptional clause
    line.push_str(&blank(25)); // opus number
    line.push_str(&blank(25)); // catalogue number
    line.push(' '); // priority flag
    line
}

// =============================================================================
// Publisher records
// =============================================================================

/// SPU: publisher identity and ownership shares.
pub fn publisher_share(ctx: &CwrContext<'_>, share: &PublisherShare, publisher_seq: usize) -> String {
    let publisher = share.publisher.as_ref();
    let settings = ctx.settings;
    let name = publisher.map(|p| p.name.as_str()).unwrap_or(&settings.name);
    let ipi_name = publisher
        .and_then(|p| p.ipi_name_number.as_deref())
        .unwrap_or(&settings.ipi_name_number);
    let ipi_base = publisher
        .and_then(|p| p.ipi_base_number.as_deref())
        .or(settings.ipi_base_number.as_deref());
    let pr_society = publisher
        .and_then(|p| p.pr_society.as_deref())
        .unwrap_or(&settings.pr_society);
    let mr_society = publisher
        .and_then(|p| p.mr_society.as_deref())
        .or(settings.mr_society.as_deref());
    let sr_society = publisher.and_then(|p| p.sr_society.as_deref());

    let mut line = String::with_capacity(RecordKind::PublisherShare.width());
    line.push_str(&transaction_prefix(RecordKind::PublisherShare, ctx));
    line.push_str(&numeric(publisher_seq as u64, 2));
    line.push_str(&ip_number('P', publisher_seq));
    line.push_str(&left_just(&upper(name), 45));
    line.push_str(share.role.to_code());
    line.push_str(&blank(9)); // tax id
    line.push_str(&left_just(ipi_name, 11));
    line.push_str(&blank(14)); // submitter agreement number
    line.push_str(&left_just(pr_society, 3));
    line.push_str(&format_share(share.pr_ownership));
    line.push_str(&left_just(opt(mr_society), 3));
    line.push_str(&format_share(share.mr_ownership));
    line.push_str(&left_just(opt(sr_society), 3));
    line.push_str(&format_share(share.sr_ownership));
    line.push(' '); // special agreements
    line.push(' '); // first recording refusal
    line.push_str(&left_just(opt(ipi_base), 13));
    line.push_str(&blank(14)); // international standard agreement code
    line.push_str(&blank(14)); // society-assigned agreement number
    line.push_str(&blank(2)); // agreement type
    line.push(' '); // USA license
    line
}

/// SPT: publisher collection shares for one territory.
pub fn publisher_territory(
    ctx: &CwrContext<'_>,
    share: &PublisherShare,
    publisher_seq: usize,
    territory: &Territory,
    territory_seq: usize,
) -> String {
    collection_record(
        RecordKind::PublisherTerritory,
        ctx,
        ip_number('P', publisher_seq),
        [share.pr_collection, share.mr_collection, share.sr_collection],
        territory.included,
        &territory.code,
        territory_seq,
    )
}

fn collection_record(
    kind: RecordKind,
    ctx: &CwrContext<'_>,
    ip_number: String,
    shares: [f64; 3],
    included: bool,
    tis_code: &str,
    seq: usize,
) -> String {
    format!(
        "{}{}{}{}{}{}{} {}",
        transaction_prefix(kind, ctx),
        ip_number,
        format_share(shares[0]),
        format_share(shares[1]),
        format_share(shares[2]),
        if included { "I" } else { "E" },
        right_just(tis_code.trim(), 4, '0'),
        numeric(seq as u64, 3)
    )
}

// =============================================================================
// Writer records
// =============================================================================

struct WriterFields {
    last_name: String,
    first_name: String,
    ipi_name: String,
    ipi_base: String,
    societies: [String; 3],
}

impl WriterFields {
    fn of(share: &WriterShare) -> Self {
        let writer = share.writer.as_ref();
        Self {
            last_name: upper(opt(writer.map(|w| w.last_name.as_str()))),
            first_name: upper(opt(writer.and_then(|w| w.first_name.as_deref()))),
            ipi_name: opt(writer.and_then(|w| w.ipi_name_number.as_deref())).to_string(),
            ipi_base: opt(writer.and_then(|w| w.ipi_base_number.as_deref())).to_string(),
            societies: [
                opt(writer.and_then(|w| w.pr_society.as_deref())).to_string(),
                opt(writer.and_then(|w| w.mr_society.as_deref())).to_string(),
                opt(writer.and_then(|w| w.sr_society.as_deref())).to_string(),
            ],
        }
    }

    /// Society/ownership triple shared by SWR and OWR.
    fn ownership_block(&self, share: &WriterShare) -> String {
        format!(
            "{}{}{}{}{}{}",
            left_just(&self.societies[0], 3),
            format_share(share.pr_ownership),
            left_just(&self.societies[1], 3),
            format_share(share.mr_ownership),
            left_just(&self.societies[2], 3),
            format_share(share.sr_ownership),
        )
    }
}

/// SWR: controlled writer with ownership shares.
pub fn writer_share(ctx: &CwrContext<'_>, share: &WriterShare, writer_seq: usize) -> String {
    let w = WriterFields::of(share);
    let mut line = String::with_capacity(RecordKind::WriterShare.width());
    line.push_str(&transaction_prefix(RecordKind::WriterShare, ctx));
    line.push_str(&ip_number('W', writer_seq));
    line.push_str(&left_just(&w.last_name, 45));
    line.push_str(&left_just(&w.first_name, 30));
    line.push_str(&left_just(share.capacity.to_code(), 2));
    line.push_str(&blank(9)); // tax id
    line.push_str(&left_just(&w.ipi_name, 11));
    line.push_str(&w.ownership_block(share));
    line.push(' '); // reversionary
    line.push(' '); // first recording refusal
    line.push(' '); // work for hire
    line.push_str(&left_just(&w.ipi_base, 13));
    line.push_str(&blank(12)); // personal number
    line.push(' '); // USA license
    line
}

/// SWT: the controlled writer's collected portion (half of each ownership
/// share) for the world.
pub fn writer_territory(ctx: &CwrContext<'_>, share: &WriterShare, writer_seq: usize) -> String {
    collection_record(
        RecordKind::WriterTerritory,
        ctx,
        ip_number('W', writer_seq),
        [
            share.pr_ownership / 2.0,
            share.mr_ownership / 2.0,
            share.sr_ownership / 2.0,
        ],
        true,
        WORLD_TERRITORY,
        1,
    )
}

/// OWR: writer not controlled by the submitter, informational only.
pub fn other_writer(ctx: &CwrContext<'_>, share: &WriterShare, writer_seq: usize) -> String {
    let w = WriterFields::of(share);
    let mut line = String::with_capacity(RecordKind::OtherWriter.width());
    line.push_str(&transaction_prefix(RecordKind::OtherWriter, ctx));
    line.push_str(&ip_number('W', writer_seq));
    line.push_str(&left_just(&w.last_name, 45));
    line.push_str(&left_just(&w.first_name, 30));
    line.push(if share.writer.is_none() { 'T' } else { ' ' }); // writer unknown
    line.push_str(&left_just(share.capacity.to_code(), 2));
    line.push_str(&blank(9)); // tax id
    line.push_str(&left_just(&w.ipi_name, 11));
    line.push_str(&w.ownership_block(share));
    line.push_str(&left_just(&w.ipi_base, 13));
    line.push_str(&blank(12)); // personal number
    line.push(' '); // USA license
    line
}

/// PWR: links a controlled writer to the submitting publisher.
pub fn publisher_for_writer(
    ctx: &CwrContext<'_>,
    share: &WriterShare,
    writer_seq: usize,
    publisher_seq: usize,
) -> String {
    format!(
        "{}{}{}{}{}{}",
        transaction_prefix(RecordKind::PublisherForWriter, ctx),
        ip_number('P', publisher_seq),
        left_just(&upper(&ctx.settings.name), 45),
        blank(14), // submitter agreement number
        left_just(opt(share.saan.as_deref()), 14),
        ip_number('W', writer_seq)
    )
}

// =============================================================================
// Titles, performers, recordings
// =============================================================================

/// ALT: one alternate title.
pub fn alternate_title(ctx: &CwrContext<'_>, title: &AlternateTitle) -> String {
    let language = title.language.as_deref().filter(|l| !l.trim().is_empty()).unwrap_or("EN");
    format!(
        "{}{}{}{}",
        transaction_prefix(RecordKind::AlternateTitle, ctx),
        left_just(&upper(&title.title), 60),
        title.title_type.to_code(),
        left_just(&upper(language), 2)
    )
}

/// PER: one performing artist of a recording.
pub fn performer(ctx: &CwrContext<'_>, artist: &Artist) -> String {
    let name = artist.performer_name();
    let name = if name.is_empty() { "UNKNOWN ARTIST".to_string() } else { name };
    format!(
        "{}{}{}{}{}{}",
        transaction_prefix(RecordKind::Performer, ctx),
        left_just(&upper(&name), 45),
        blank(30), // first name (carried in the last-name field)
        blank(11), // IPI name number
        blank(13), // IPI base number
        left_just(opt(artist.isni.as_deref()), 16)
    )
}

/// REC: recording detail.
pub fn recording(ctx: &CwrContext<'_>, recording: &Recording) -> String {
    let release = recording.release_date.map(format_date).unwrap_or_else(|| blank(8));
    let isrc = recording
        .isrc
        .as_deref()
        .map(|i| ISRC_SEPARATORS.replace_all(i, "").to_uppercase())
        .unwrap_or_default();

    let mut line = String::with_capacity(RecordKind::Recording.width());
    line.push_str(&transaction_prefix(RecordKind::Recording, ctx));
    line.push_str(&release);
    line.push_str(&format_duration(recording.duration_seconds));
    line.push_str(&left_just(&upper(&recording.title), 60));
    line.push_str(&blank(60)); // version title
    line.push_str(&blank(60)); // display artist
    line.push_str(&left_just(&isrc, 12));
    line.push('A'); // recording format: audio
    line.push('U'); // recording technique: unknown
    line.push_str(&blank(3)); // media type
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Publisher, PublisherRole, PublisherSettings, TitleType, Writer, WriterCapacity};
    use chrono::NaiveDate;

    fn settings() -> PublisherSettings {
        PublisherSettings {
            name: "Nightfall Music".into(),
            ipi_name_number: "00123456789".into(),
            delivery_code: "NFM".into(),
            pr_society: "021".into(),
            ..PublisherSettings::default()
        }
    }

    fn ctx(settings: &PublisherSettings) -> CwrContext<'_> {
        let mut ctx = CwrContext::new(settings, CwrVersion::V31, TransactionType::NewRegistration, "NFM", "ASC");
        ctx.begin_transaction();
        ctx
    }

    fn writer_share(controlled: bool) -> WriterShare {
        WriterShare {
            writer_id: "w1".into(),
            writer: Some(Writer {
                id: "w1".into(),
                first_name: Some("Ada".into()),
                last_name: "Stone".into(),
                controlled,
                ipi_name_number: Some("00987654321".into()),
                pr_society: Some("021".into()),
                ..Writer::default()
            }),
            capacity: WriterCapacity::Composer,
            pr_ownership: 50.0,
            mr_ownership: 33.333,
            sr_ownership: 0.0,
            saan: Some("AGR-1".into()),
        }
    }

    fn publisher_share() -> PublisherShare {
        PublisherShare {
            publisher_id: "p1".into(),
            publisher: Some(Publisher {
                id: "p1".into(),
                name: "Nightfall Music".into(),
                ..Publisher::default()
            }),
            role: PublisherRole::OriginalPublisher,
            pr_ownership: 50.0,
            mr_ownership: 100.0,
            sr_ownership: 100.0,
            pr_collection: 100.0,
            mr_collection: 100.0,
            sr_collection: 100.0,
            territories: vec![Territory { code: "2136".into(), included: true }],
        }
    }

    #[test]
    fn test_every_builder_matches_declared_width() {
        let s = settings();
        let c = ctx(&s);
        let created = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let mut work = Work::new("1", "RWOR10001", "Midnight City");
        work.recordings.push(Recording {
            title: "Midnight City".into(),
            isrc: Some("US-ABC-24-00001".into()),
            duration_seconds: Some(243),
            release_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Recording::default()
        });
        let pubs = publisher_share();
        let ws = writer_share(true);
        let title = AlternateTitle { title: "Minuit".into(), title_type: TitleType::Alternate, language: None };

        let cases = [
            (RecordKind::TransmissionHeader, transmission_header(&c, created)),
            (RecordKind::GroupHeader, group_header(&c, 1)),
            (RecordKind::NewWork, work_header(&c, &work)),
            (RecordKind::PublisherShare, super::publisher_share(&c, &pubs, 1)),
            (RecordKind::PublisherTerritory, publisher_territory(&c, &pubs, 1, &pubs.territories[0], 1)),
            (RecordKind::WriterShare, super::writer_share(&c, &ws, 1)),
            (RecordKind::WriterTerritory, writer_territory(&c, &ws, 1)),
            (RecordKind::OtherWriter, other_writer(&c, &ws, 1)),
            (RecordKind::PublisherForWriter, publisher_for_writer(&c, &ws, 1, 1)),
            (RecordKind::AlternateTitle, alternate_title(&c, &title)),
            (RecordKind::Performer, performer(&c, &Artist::default())),
            (RecordKind::Recording, super::recording(&c, &work.recordings[0])),
            (RecordKind::GroupTrailer, group_trailer(1, 1, 10)),
            (RecordKind::TransmissionTrailer, transmission_trailer(1, 1, 12)),
        ];
        for (kind, line) in cases {
            assert_eq!(line.len(), kind.width(), "{} has wrong width", kind.tag());
            assert!(line.starts_with(kind.tag()));
        }
    }

    #[test]
    fn test_overlong_and_empty_values_keep_width() {
        let s = PublisherSettings {
            name: "N".repeat(200),
            ..PublisherSettings::default()
        };
        let c = ctx(&s);
        let mut work = Work::new("1", "W".repeat(40), "T".repeat(300));
        work.iswc = Some("T-123.456.789-0-EXTRA".into());
        assert_eq!(work_header(&c, &work).len(), RecordKind::NewWork.width());

        let empty = PublisherShare::default();
        assert_eq!(super::publisher_share(&c, &empty, 1).len(), RecordKind::PublisherShare.width());
        let unknown = WriterShare::default();
        assert_eq!(other_writer(&c, &unknown, 99).len(), RecordKind::OtherWriter.width());
    }

    #[test]
    fn test_accented_text_keeps_byte_width() {
        let s = PublisherSettings {
            name: "Éditions Nöel".into(),
            ..settings()
        };
        let c = ctx(&s);
        let work = Work::new("1", "RWOR10001", "Café Noël");
        let line = work_header(&c, &work);
        assert_eq!(line.len(), RecordKind::NewWork.width());
        assert_eq!(line[19..79].trim_end(), "CAFE NOEL");

        let mut ws = writer_share(true);
        if let Some(writer) = ws.writer.as_mut() {
            writer.first_name = Some("Zoë".into());
            writer.last_name = "Brontë-Åström".into();
        }
        let cases = [
            (RecordKind::TransmissionHeader, transmission_header(&c, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap())),
            (RecordKind::WriterShare, super::writer_share(&c, &ws, 1)),
            (RecordKind::OtherWriter, other_writer(&c, &ws, 1)),
            (RecordKind::PublisherForWriter, publisher_for_writer(&c, &ws, 1, 1)),
        ];
        for (kind, line) in cases {
            assert_eq!(line.len(), kind.width(), "{} has wrong width", kind.tag());
            assert!(line.is_ascii());
        }
    }

    #[test]
    fn test_work_header_fields() {
        let s = settings();
        let c = ctx(&s);
        let mut work = Work::new("1", "RWOR10001", "Midnight City");
        work.iswc = Some("T-123.456.789-0".into());

        let line = work_header(&c, &work);
        assert_eq!(&line[0..3], "NWR");
        assert_eq!(&line[3..11], "00000001");
        assert_eq!(&line[11..19], "00000000");
        assert_eq!(line[19..79].trim_end(), "MIDNIGHT CITY");
        assert_eq!(&line[79..81], "EN");
        assert_eq!(line[81..95].trim_end(), "RWOR10001");
        assert_eq!(&line[95..106], "T1234567890");
        assert_eq!(&line[126..129], "UNC");
        assert_eq!(&line[129..135], "000000");
        assert_eq!(&line[135..136], "U");
        assert_eq!(&line[136..139], "MTX");
        assert_eq!(&line[142..145], "ORI");
    }

    #[test]
    fn test_arrangement_encodes_as_modified() {
        let s = settings();
        let c = ctx(&s);
        let mut work = Work::new("1", "RWOR1", "Song");
        work.version_type = VersionType::Arrangement;
        let line = work_header(&c, &work);
        assert_eq!(&line[142..145], "MOD");
        assert_eq!(&line[148..151], "ARR");
    }

    #[test]
    fn test_revision_tag() {
        let s = settings();
        let mut c = CwrContext::new(&s, CwrVersion::V21, TransactionType::Revision, "NFM", "ASC");
        c.begin_transaction();
        assert!(work_header(&c, &Work::new("1", "W", "T")).starts_with("REV"));
    }

    #[test]
    fn test_writer_share_fields() {
        let s = settings();
        let mut c = ctx(&s);
        c.next_record();
        let line = super::writer_share(&c, &writer_share(true), 2);

        assert_eq!(&line[11..19], "00000001");
        assert_eq!(line[19..28].trim_end(), "W2");
        assert_eq!(line[28..73].trim_end(), "STONE");
        assert_eq!(line[73..103].trim_end(), "ADA");
        assert_eq!(&line[103..105], "C ");
        assert_eq!(&line[114..125], "00987654321");
        assert_eq!(&line[125..128], "021");
        assert_eq!(&line[128..133], "05000");
        assert_eq!(&line[136..141], "03333");
        assert_eq!(&line[144..149], "00000");
    }

    #[test]
    fn test_writer_territory_is_half_of_ownership() {
        let s = settings();
        let c = ctx(&s);
        let line = writer_territory(&c, &writer_share(true), 1);
        assert_eq!(&line[28..33], "02500");
        assert_eq!(&line[33..38], "01667");
        assert_eq!(&line[43..48], "I2136");
    }

    #[test]
    fn test_publisher_territory_exclusion() {
        let s = settings();
        let c = ctx(&s);
        let share = publisher_share();
        let excluded = Territory { code: "840".into(), included: false };
        let line = publisher_territory(&c, &share, 1, &excluded, 2);
        assert_eq!(line[19..28].trim_end(), "P1");
        assert_eq!(&line[43..48], "E0840");
        assert_eq!(&line[49..52], "002");
    }

    #[test]
    fn test_publisher_share_falls_back_to_settings() {
        let s = settings();
        let c = ctx(&s);
        let line = super::publisher_share(&c, &PublisherShare::default(), 1);
        assert_eq!(line[30..75].trim_end(), "NIGHTFALL MUSIC");
        assert_eq!(&line[75..77], "E ");
        assert_eq!(&line[86..97], "00123456789");
        assert_eq!(&line[111..114], "021");
    }

    #[test]
    fn test_publisher_for_writer_links_parties() {
        let s = settings();
        let c = ctx(&s);
        let line = publisher_for_writer(&c, &writer_share(true), 3, 1);
        assert_eq!(line[19..28].trim_end(), "P1");
        assert_eq!(line[87..101].trim_end(), "AGR-1");
        assert_eq!(line[101..110].trim_end(), "W3");
    }

    #[test]
    fn test_recording_strips_isrc_separators() {
        let s = settings();
        let c = ctx(&s);
        let rec = Recording {
            title: "Midnight City".into(),
            isrc: Some("US-ABC-24-00001".into()),
            duration_seconds: Some(243),
            release_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Recording::default()
        };
        let line = super::recording(&c, &rec);
        assert_eq!(&line[19..27], "20240501");
        assert_eq!(&line[27..33], "000403");
        assert_eq!(&line[213..225], "USABC2400001");
    }

    #[test]
    fn test_performer_unknown_artist() {
        let s = settings();
        let c = ctx(&s);
        let line = performer(&c, &Artist::default());
        assert_eq!(line[19..64].trim_end(), "UNKNOWN ARTIST");
    }

    #[test]
    fn test_writer_plan_dispatch() {
        assert_eq!(
            RecordKind::writer_plan(true),
            &[RecordKind::WriterShare, RecordKind::WriterTerritory, RecordKind::PublisherForWriter]
        );
        assert_eq!(RecordKind::writer_plan(false), &[RecordKind::OtherWriter]);
        assert!(!RecordKind::Recording.supported_by(CwrVersion::V22));
        assert!(RecordKind::Performer.supported_by(CwrVersion::V30));
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(RecordKind::from_tag("SPT"), Some(RecordKind::PublisherTerritory));
        assert_eq!(RecordKind::from_tag("XYZ"), None);
    }
}
