// Canonical normalization - the single place bank-specific date formats,
// currency markers, and sign conventions are translated into the canonical
// transaction schema. Extractors emit raw cell strings and declare their
// conventions; they never parse amounts or dates themselves.

use chrono::NaiveDate;

use crate::banks::BankId;
use crate::model::Transaction;

/// How a single-amount column encodes direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignConvention {
    /// Amount is already signed: minus = debit.
    Signed,
    /// Positive numbers are debits (card-statement convention); credits are
    /// marked with a trailing CR suffix instead of a sign.
    DebitPositive,
}

/// Conventions one bank variant declares for its rows.
#[derive(Debug, Clone, Copy)]
pub struct RowSpec {
    pub date_format: &'static str,
    pub sign: SignConvention,
}

/// One candidate row as lifted from the document, all cells still raw text.
/// Either `amount` or one of `debit`/`credit` is populated.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub date: String,
    pub description: String,
    pub amount: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    /// Line (or record) number in the source document, for warnings.
    pub line: usize,
}

/// Trailing direction marker on an amount cell ("1,234.56 Cr").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Credit,
    Debit,
}

fn split_suffix(raw: &str) -> (&str, Option<Suffix>) {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if let Some(body) = lower.strip_suffix("cr") {
        if body.is_empty() || body.ends_with(|c: char| !c.is_ascii_alphabetic()) {
            return (&trimmed[..body.len()], Some(Suffix::Credit));
        }
    }
    if let Some(body) = lower.strip_suffix("dr") {
        if body.is_empty() || body.ends_with(|c: char| !c.is_ascii_alphabetic()) {
            return (&trimmed[..body.len()], Some(Suffix::Debit));
        }
    }
    (trimmed, None)
}

/// Strip currency symbols and thousands separators, then parse.
pub fn clean_number(raw: &str) -> Option<f64> {
    let cleaned = raw
        .trim()
        .replace(['₹', '$', ',', '\u{a0}'], "")
        .trim()
        .to_string();
    if cleaned.is_empty() || cleaned == "-" || cleaned == "+" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an amount cell into the canonical signed value.
pub fn clean_amount(raw: &str, sign: SignConvention) -> Option<f64> {
    let (body, suffix) = split_suffix(raw);
    let value = clean_number(body)?;
    let canonical = match suffix {
        Some(Suffix::Credit) => value.abs(),
        Some(Suffix::Debit) => -value.abs(),
        None => match sign {
            SignConvention::Signed => value,
            SignConvention::DebitPositive => -value.abs(),
        },
    };
    Some(canonical)
}

/// Parse a date with the bank's declared format. Tolerates trailing
/// time-of-day text after the date portion; never infers a format.
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
        return Some(date);
    }
    // "15/10/2025 14:03" style: try the first whitespace token.
    if let Some(first) = trimmed.split_whitespace().next() {
        if first != trimmed {
            if let Ok(date) = NaiveDate::parse_from_str(first, format) {
                return Some(date);
            }
        }
    }
    None
}

fn non_empty(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Map a raw row into a canonical transaction.
///
/// Returns a human-readable reason on failure; callers record it as a
/// warning and continue (a malformed row never aborts the document).
pub fn normalize_row(
    row: &RawRow,
    spec: &RowSpec,
    bank: BankId,
    source_file: &str,
) -> std::result::Result<Transaction, String> {
    let date = parse_date(&row.date, spec.date_format)
        .ok_or_else(|| format!("line {}: unparseable date {:?}", row.line, row.date))?;

    let description = row.description.trim();
    if description.is_empty() {
        return Err(format!("line {}: empty description", row.line));
    }

    let amount = match (non_empty(&row.amount), non_empty(&row.debit), non_empty(&row.credit)) {
        (Some(raw), _, _) => clean_amount(raw, spec.sign)
            .ok_or_else(|| format!("line {}: unparseable amount {:?}", row.line, raw))?,
        (None, Some(_), Some(_)) => {
            return Err(format!(
                "line {}: both debit and credit columns populated",
                row.line
            ));
        }
        (None, Some(debit), None) => {
            let value = clean_number(debit)
                .ok_or_else(|| format!("line {}: unparseable debit {:?}", row.line, debit))?;
            -value.abs()
        }
        (None, None, Some(credit)) => {
            let value = clean_number(credit)
                .ok_or_else(|| format!("line {}: unparseable credit {:?}", row.line, credit))?;
            value.abs()
        }
        (None, None, None) => {
            return Err(format!("line {}: no amount present", row.line));
        }
    };

    Ok(Transaction {
        date,
        description: description.to_string(),
        amount,
        category: None,
        source_bank: bank,
        source_file: source_file.to_string(),
    })
}
