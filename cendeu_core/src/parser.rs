//! Parser for one line of the regulator's bulk debtor ledger format.
//!
//! Each record is a semi-fixed-width text line: a header token (the first
//! whitespace-delimited field) carrying the fixed-offset identification
//! fields, followed by a variable number of amount columns. The format
//! predates any published schema, so the parser is deliberately
//! defensive: anything it cannot make sense of becomes a typed error and
//! the caller decides what to do with the line.

use snafu::Snafu;

use crate::import::ErrorCategory;

/// Minimum width of the header token for a line to be parseable at all.
pub const MIN_HEADER_WIDTH: usize = 24;

const ENTITY_CODE: (usize, usize) = (0, 5);
const INFO_DATE: (usize, usize) = (5, 11);
const ID_TYPE: (usize, usize) = (11, 13);
const DEBTOR_ID: (usize, usize) = (13, 24);
const ACTIVITY_CODE: (usize, usize) = (24, 27);
const SEVERITY_CODE: (usize, usize) = (27, 29);

/// A structurally valid ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Reporting financial entity code.
    pub entity_code: String,
    /// Information period, YYYYMM.
    pub info_date: String,
    /// Identification type code.
    pub id_type: String,
    /// Debtor identifier (nominally an 11-digit CUIT).
    pub debtor_id: String,
    /// Economic activity code.
    pub activity_code: String,
    /// Delinquency classification, 0 through 9.
    pub severity: u8,
    /// Loan/guarantee amount in integer-scaled minor units.
    pub loan_amount: u64,
}

/// Errors produced while parsing a single ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ParseError {
    #[snafu(display("empty line"))]
    EmptyLine,
    #[snafu(display(
        "header token too short: {length} characters, expected at least {MIN_HEADER_WIDTH}"
    ))]
    HeaderTooShort { length: usize },
    #[snafu(display("debtor id is empty"))]
    MissingDebtorId,
    #[snafu(display("invalid severity code: '{code}'"))]
    InvalidSeverity { code: String },
    #[snafu(display("severity {severity} outside the 0-9 range"))]
    SeverityOutOfRange { severity: i64 },
}

impl ParseError {
    /// Import-error category for this failure.
    ///
    /// Structural failures are parsing errors; a line that parses but
    /// carries out-of-range values is a validation error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ParseError::EmptyLine
            | ParseError::HeaderTooShort { .. }
            | ParseError::MissingDebtorId
            | ParseError::InvalidSeverity { .. } => ErrorCategory::Parsing,
            ParseError::SeverityOutOfRange { .. } => ErrorCategory::Validation,
        }
    }
}

/// Parse one raw ledger line into a [`ParsedRecord`].
///
/// Pure and deterministic: the same input always produces the same
/// output, and every failure is a typed [`ParseError`].
pub fn parse_line(line: &str) -> Result<ParsedRecord, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyLine);
    }

    let mut tokens = trimmed.split_whitespace();
    let Some(header) = tokens.next() else {
        return Err(ParseError::EmptyLine);
    };

    if header.len() < MIN_HEADER_WIDTH {
        return Err(ParseError::HeaderTooShort {
            length: header.len(),
        });
    }

    let debtor_id = header_field(header, DEBTOR_ID);
    if debtor_id.is_empty() {
        return Err(ParseError::MissingDebtorId);
    }

    let severity_code = header_field(header, SEVERITY_CODE);
    let severity: i64 = severity_code
        .parse()
        .map_err(|_| ParseError::InvalidSeverity {
            code: severity_code.clone(),
        })?;
    if !(0..=9).contains(&severity) {
        return Err(ParseError::SeverityOutOfRange { severity });
    }

    Ok(ParsedRecord {
        entity_code: header_field(header, ENTITY_CODE),
        info_date: header_field(header, INFO_DATE),
        id_type: header_field(header, ID_TYPE),
        debtor_id,
        activity_code: header_field(header, ACTIVITY_CODE),
        severity: severity as u8,
        loan_amount: extract_loan_amount(tokens),
    })
}

/// Extract a fixed-offset field from the header token, trimmed.
///
/// The slice is clamped to the token length: legacy files truncate the
/// trailing columns of short records rather than padding them.
fn header_field(header: &str, (start, end): (usize, usize)) -> String {
    header
        .get(start..end.min(header.len()))
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Recover the loan amount from the remainder tokens.
///
/// Legacy compatibility rule: strip thousands/decimal punctuation from
/// each token, parse as an integer, and take the first strictly positive
/// value ("1,234.56" reads as 123456). Non-numeric and non-positive
/// tokens are skipped; if none qualifies the amount is 0.
fn extract_loan_amount<'a>(tokens: impl Iterator<Item = &'a str>) -> u64 {
    for token in tokens {
        let digits: String = token.chars().filter(|c| *c != ',' && *c != '.').collect();
        if digits.is_empty() {
            continue;
        }
        if let Ok(value) = digits.parse::<i64>() {
            if value > 0 {
                return value as u64;
            }
        }
    }
    0
}
