//! Line format: `OPERATION;BOOK_CODE;USER_ID;YYYY-MM-DD` (spec §6). Blank
//! lines and lines starting with `#` are ignored; `OPERATION` is
//! case-insensitive.

use chrono::NaiveDate;
use loan_net::envelope::{OP_DEVOLUCION, OP_PRESTAMO, OP_RENOVACION};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub operation: String,
    pub book_code: String,
    pub user_id: String,
    pub as_of_date: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 4 ';'-separated fields, got {0}")]
    WrongFieldCount(usize),
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),
    #[error("invalid date {0:?}: {1}")]
    InvalidDate(String, String),
}

/// Parse one line. Returns `Ok(None)` for blank lines and comments, which
/// the caller should silently skip.
pub fn parse_line(line: &str) -> Result<Option<ParsedRequest>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split(';').collect();
    if fields.len() != 4 {
        return Err(ParseError::WrongFieldCount(fields.len()));
    }

    let operation = match fields[0].to_ascii_uppercase().as_str() {
        "PRESTAMO" => OP_PRESTAMO.to_string(),
        "DEVOLUCION" => OP_DEVOLUCION.to_string(),
        "RENOVACION" => OP_RENOVACION.to_string(),
        other => return Err(ParseError::UnknownOperation(other.to_string())),
    };

    let as_of_date = NaiveDate::parse_from_str(fields[3], "%Y-%m-%d")
        .map_err(|e| ParseError::InvalidDate(fields[3].to_string(), e.to_string()))?;

    Ok(Some(ParsedRequest {
        operation,
        book_code: fields[1].to_string(),
        user_id: fields[2].to_string(),
        as_of_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_happy_line() {
        let parsed = parse_line("PRESTAMO;L0001;U0001;2025-11-20").unwrap().unwrap();
        assert_eq!(parsed.operation, OP_PRESTAMO);
        assert_eq!(parsed.book_code, "L0001");
        assert_eq!(parsed.user_id, "U0001");
    }

    #[test]
    fn operation_is_case_insensitive() {
        let parsed = parse_line("prestamo;L0001;U0001;2025-11-20").unwrap().unwrap();
        assert_eq!(parsed.operation, OP_PRESTAMO);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# a comment").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_operation() {
        let err = parse_line("PRESTAR;L0001;U0001;2025-11-20").unwrap_err();
        assert_eq!(err, ParseError::UnknownOperation("PRESTAR".to_string()));
    }

    #[test]
    fn rejects_malformed_field_count() {
        let err = parse_line("PRESTAMO;L0001;U0001").unwrap_err();
        assert_eq!(err, ParseError::WrongFieldCount(3));
    }
}
