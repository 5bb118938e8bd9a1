//! CSV mapping-table loader with encoding and delimiter auto-detection.
//!
//! Turns a two-column table (source unit, target unit) into a [`Mapping`].
//! Rows where either side is blank after trimming are skipped silently.

use std::path::Path;

use crate::error::{MappingError, MappingResult};
use crate::models::Mapping;

/// Default header of the source column.
pub const DEFAULT_SOURCE_COLUMN: &str = "変換元";

/// Default header of the target column.
pub const DEFAULT_TARGET_COLUMN: &str = "変換先";

/// Placeholder path used in errors for tables that did not come from a file.
const INLINE_ORIGIN: &str = "<inline>";

/// Names of the two columns read from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingColumns {
    pub source: String,
    pub target: String,
}

impl MappingColumns {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Default for MappingColumns {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_COLUMN, DEFAULT_TARGET_COLUMN)
    }
}

/// Result of loading a table, with the metadata that was detected on the way
#[derive(Debug, Clone)]
pub struct LoadedMapping {
    /// The substitution table
    pub mapping: Mapping,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
    /// Data rows dropped because a side was blank
    pub skipped_rows: usize,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    // chardet guesses poorly on short tables; valid UTF-8 (BOM or not) is taken as-is.
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) || std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" | "eucjp" => "euc-jp".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// A leading byte-order mark is stripped and wins over the label. Unknown
/// labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let encoding = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => encoding_rs::UTF_8,
        // WHATWG resolves the Latin-1 labels to windows-1252.
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252
        }
        label => encoding_rs::Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8),
    };
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Comma wins ties, including the no-delimiter case.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load a mapping table from a CSV file.
///
/// # Example
/// ```ignore
/// let loaded = load_mapping("taiouhyou.csv", &MappingColumns::default())?;
/// println!("{} entries ({})", loaded.mapping.len(), loaded.encoding);
/// ```
pub fn load_mapping<P: AsRef<Path>>(path: P, columns: &MappingColumns) -> MappingResult<LoadedMapping> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| MappingError::from_io(path, e))?;

    parse_mapping_bytes(&bytes, columns).map_err(|e| e.at_path(path))
}

/// Parse table bytes with auto-detection of encoding and delimiter.
pub fn parse_mapping_bytes(bytes: &[u8], columns: &MappingColumns) -> MappingResult<LoadedMapping> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    parse_mapping_str(&content, delimiter, encoding, columns)
}

/// Parse an already-decoded table with an explicit delimiter.
pub fn parse_mapping_str(
    content: &str,
    delimiter: char,
    encoding: String,
    columns: &MappingColumns,
) -> MappingResult<LoadedMapping> {
    if !delimiter.is_ascii() {
        return Err(MappingError::read(
            INLINE_ORIGIN,
            format!("delimiter '{}' is not ASCII", delimiter),
        ));
    }

    // encoding_rs strips the BOM, but tables handed over as &str may still carry it.
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| MappingError::read(INLINE_ORIGIN, format!("cannot read header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(MappingError::read(INLINE_ORIGIN, "no header row found"));
    }

    let source_idx = column_index(&headers, &columns.source)?;
    let target_idx = column_index(&headers, &columns.target)?;

    let mut mapping = Mapping::new();
    let mut skipped_rows = 0;

    for (row_idx, record) in reader.records().enumerate() {
        let line_num = row_idx + 2; // +1 for 0-index, +1 for header
        let record = record
            .map_err(|e| MappingError::read(INLINE_ORIGIN, format!("line {}: {}", line_num, e)))?;

        let source = record.get(source_idx).unwrap_or("").trim();
        let target = record.get(target_idx).unwrap_or("").trim();

        if !mapping.insert(source, target) {
            skipped_rows += 1;
        }
    }

    Ok(LoadedMapping {
        mapping,
        encoding,
        delimiter,
        headers,
        skipped_rows,
    })
}

fn column_index(headers: &[String], name: &str) -> MappingResult<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        MappingError::read(
            INLINE_ORIGIN,
            format!("missing column '{}' (found: {})", name, headers.join(", ")),
        )
    })
}
