//! Text decoding and delimited-table parsing with auto-detection.
//!
//! Royalty statements and acknowledgment files arrive from societies and
//! DSPs in whatever encoding their systems export. Everything here turns raw
//! bytes into UTF-8 text, and CSV text into header-addressed rows. No
//! royalty-specific logic here.

use std::path::Path;

/// CSV parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decoded text and the encoding it was read as.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub content: String,
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the named encoding. Unknown encodings and invalid
/// UTF-8 are decoded lossily rather than rejected.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the encoding, then decode. A leading UTF-8 byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let encoding = if std::str::from_utf8(bytes).is_ok() {
        "utf-8".to_string()
    } else {
        detect_encoding(bytes)
    };
    DecodedText {
        content: decode_content(bytes, &encoding),
        encoding,
    }
}

/// Read and decode a file.
pub fn read_text_file<P: AsRef<Path>>(path: P) -> Result<DecodedText, CsvError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| CsvError::new(0, format!("Cannot read file: {}", e)))?;
    Ok(decode_text(&bytes))
}

// =============================================================================
// Tables
// =============================================================================

/// Detect the delimiter by counting occurrences in the first line.
/// Ties go to the earlier candidate; no candidate at all means comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;
    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }
    best_sep
}

/// One data row, with its 1-based line number in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub line: usize,
    pub values: Vec<String>,
}

impl TableRow {
    /// Value at `index`, empty when the row is short.
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Case-insensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Parse delimited text. Quoted fields may contain the delimiter; blank
/// lines are skipped; rows may be shorter or longer than the header.
pub fn parse_table(content: &str, delimiter: char) -> Result<Table, CsvError> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::new(0, format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::new(1, format!("Cannot read header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::new(1, "Empty CSV file"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            CsvError::new(line, format!("Cannot read row: {}", e))
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        rows.push(TableRow {
            line,
            values: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Table { headers, rows })
}

/// Decode bytes and parse them as a table, detecting encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    let decoded = decode_text(bytes);
    let delimiter = detect_delimiter(&decoded.content);
    let table = parse_table(&decoded.content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding: decoded.encoding,
        delimiter,
    })
}
