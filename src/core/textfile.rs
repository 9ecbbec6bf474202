//! Delimited material-list exports: two fixed dialects, selected by file
//! extension.
//!
//! Dialect A (`.txt`) is the pipe-framed table dump with banner lines at both
//! ends; dialect B (`.csv`) is the quoted comma export. Both reduce to
//! `(name, total)` rows in file order.

use crate::core::error::StockpileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: char,
    /// Lines skipped from the head (banner/header).
    pub head: usize,
    /// Lines skipped from the tail (summary/footer).
    pub tail: usize,
    /// Column holding the display name.
    pub name_column: usize,
    pub strip_quotes: bool,
}

pub const DIALECT_TXT: Dialect = Dialect {
    delimiter: '|',
    head: 5,
    tail: 4,
    name_column: 1,
    strip_quotes: false,
};

pub const DIALECT_CSV: Dialect = Dialect {
    delimiter: ',',
    head: 2,
    tail: 1,
    name_column: 0,
    strip_quotes: true,
};

impl Dialect {
    pub fn for_extension(ext: &str) -> Option<Dialect> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(DIALECT_TXT),
            "csv" => Some(DIALECT_CSV),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ParsedText {
    /// `(display_name, total)` rows in file order.
    pub entries: Vec<(String, u64)>,
    /// Dropped-line notices; reported, never fatal to the batch.
    pub warnings: Vec<String>,
}

/// Detect the text encoding from a leading byte sample and decode the whole
/// buffer. BOM wins, then strict UTF-8, then the configured fallback label.
fn decode_text(bytes: &[u8], fallback_label: &str) -> Result<String, StockpileError> {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, had_errors) = encoding.decode(&bytes[bom_len..]);
        if had_errors {
            return Err(StockpileError::Decode(format!(
                "undecodable bytes under {}",
                encoding.name()
            )));
        }
        return Ok(text.into_owned());
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    let encoding = encoding_rs::Encoding::for_label(fallback_label.as_bytes())
        .ok_or_else(|| StockpileError::Config(format!("unknown encoding: {}", fallback_label)))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(StockpileError::Decode(format!(
            "undecodable bytes under {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Parse raw export bytes under `dialect`. Rejects when there are too few
/// lines to hold even one data row; drops unparsable rows with a warning.
pub fn parse_bytes(
    bytes: &[u8],
    dialect: Dialect,
    fallback_encoding: &str,
) -> Result<ParsedText, StockpileError> {
    let text = decode_text(bytes, fallback_encoding)?;
    let lines: Vec<&str> = text.split('\n').collect();

    let minimum = dialect.head + dialect.tail + 1;
    if lines.len() < minimum {
        return Err(StockpileError::Decode(format!(
            "file too short: {} lines, need at least {}",
            lines.len(),
            minimum
        )));
    }

    let retained = &lines[dialect.head..lines.len() - dialect.tail];
    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    for (line_no, line) in retained.iter().enumerate() {
        match parse_line(line, dialect) {
            Some(entry) => entries.push(entry),
            None => {
                if !line.trim().is_empty() {
                    warnings.push(format!(
                        "skipped unparsable line {}: {}",
                        dialect.head + line_no + 1,
                        line.trim()
                    ));
                }
            }
        }
    }
    Ok(ParsedText { entries, warnings })
}

fn parse_line(line: &str, dialect: Dialect) -> Option<(String, u64)> {
    let columns: Vec<&str> = line.split(dialect.delimiter).collect();
    let mut name = columns.get(dialect.name_column)?.trim().to_string();
    if dialect.strip_quotes && name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        name = name[1..name.len() - 1].to_string();
    }
    if name.is_empty() {
        return None;
    }
    let total: u64 = columns.get(dialect.name_column + 1)?.trim().parse().ok()?;
    Some((name, total))
}
