// PDF statement extractors.
//
// Statements arrive as password-protected tabular PDFs with inconsistent
// page-to-page table boundaries, running headers/footers, and trailing
// summary blocks. Rows are recognized structurally: a transaction line
// starts with a parseable date; everything else on the page (boilerplate,
// column headers, subtotals) has a non-date leading cell and is excluded.
//
// The pack's usual pdf_extract crate cannot open encrypted documents, so
// lopdf (its underlying library) is used directly: load, decrypt with the
// resolved password, then extract text page by page.

use std::path::Path;

use lopdf::Document;

use crate::banks::BankId;
use crate::error::{Error, Result};
use crate::extract::{Extraction, StatementExtractor};
use crate::normalize::{self, RawRow, RowSpec, SignConvention};

/// Card statements: bare amounts are charges, "Cr" marks a credit.
const CARD_SPEC: RowSpec = RowSpec {
    date_format: "%d/%m/%Y",
    sign: SignConvention::DebitPositive,
};

/// Amazon Pay statements only list transactions on pages carrying this
/// column header; other pages are terms/summary boilerplate.
const AMAZON_PAGE_MARKER: &str = "Transaction Details";

fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement.pdf")
        .to_string()
}

/// Open the document, decrypt if needed, and return per-page text.
///
/// A wrong or missing password is a `Decryption` error, distinct from a
/// document that opens but contains no parsable table.
fn load_pages(path: &Path, password: Option<&str>) -> Result<Vec<String>> {
    let mut doc = Document::load(path).map_err(|source| Error::Pdf {
        path: path.to_path_buf(),
        source,
    })?;

    if doc.is_encrypted() {
        let password = password.ok_or_else(|| Error::Decryption {
            path: path.to_path_buf(),
        })?;
        doc.decrypt(password).map_err(|_| Error::Decryption {
            path: path.to_path_buf(),
        })?;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        // A page that fails text extraction contributes nothing; the
        // document as a whole may still have parsable pages.
        pages.push(doc.extract_text(&[number]).unwrap_or_default());
    }
    Ok(pages)
}

fn is_direction_marker(token: &str) -> bool {
    matches!(token.to_lowercase().as_str(), "cr" | "dr")
}

/// Split a date-led line into a raw row. Returns None for lines whose
/// leading token is not a date (headers, footers, summary blocks).
fn card_row(line: &str, line_no: usize) -> Option<RawRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let date = *tokens.first()?;
    normalize::parse_date(date, CARD_SPEC.date_format)?;

    let (amount, amount_start) = match tokens.as_slice() {
        [.., value, marker] if is_direction_marker(marker) => {
            (Some(format!("{value} {marker}")), tokens.len() - 2)
        }
        [.., value] if tokens.len() >= 2 => (Some((*value).to_string()), tokens.len() - 1),
        _ => (None, tokens.len()),
    };

    Some(RawRow {
        date: date.to_string(),
        description: tokens[1..amount_start.max(1)].join(" "),
        amount,
        line: line_no,
        ..Default::default()
    })
}

/// Amazon Pay row: date, serial number, description tokens, reward points,
/// amount, optional CR. Lines without a plausible serial number are
/// boilerplate and skipped.
fn amazon_row(line: &str, line_no: usize) -> Option<RawRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    let date = tokens[0];
    normalize::parse_date(date, CARD_SPEC.date_format)?;

    let serial = tokens[1];
    if serial.len() < 8 || !serial.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (amount, amount_start) = match tokens.as_slice() {
        [.., value, marker] if is_direction_marker(marker) => {
            (format!("{value} {marker}"), tokens.len() - 2)
        }
        [.., value] => ((*value).to_string(), tokens.len() - 1),
        [] => unreachable!(),
    };

    // Drop the reward-points / intl-marker columns: pure numeric or
    // percentage tokens between the description and the amount.
    let description: Vec<&str> = tokens[2..amount_start]
        .iter()
        .copied()
        .filter(|t| !t.trim_end_matches('%').chars().all(|c| c.is_ascii_digit()))
        .collect();
    let description = if description.is_empty() {
        tokens[2..amount_start].join(" ")
    } else {
        description.join(" ")
    };

    Some(RawRow {
        date: date.to_string(),
        description,
        amount: Some(amount),
        line: line_no,
        ..Default::default()
    })
}

fn extract_card_pages(pages: &[String], bank: BankId, source_file: &str) -> Extraction {
    let mut out = Extraction::default();
    let mut line_no = 0;
    for page in pages {
        for line in page.lines() {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(row) = card_row(line, line_no) else {
                continue;
            };
            match normalize::normalize_row(&row, &CARD_SPEC, bank, source_file) {
                Ok(tx) => out.transactions.push(tx),
                Err(warning) => out.warnings.push(warning),
            }
        }
    }
    out
}

fn extract_amazon_pages(pages: &[String], source_file: &str) -> Extraction {
    let mut out = Extraction::default();
    let mut line_no = 0;
    for page in pages {
        let has_transactions = page.contains(AMAZON_PAGE_MARKER);
        for line in page.lines() {
            line_no += 1;
            if !has_transactions {
                continue;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(row) = amazon_row(line, line_no) else {
                continue;
            };
            match normalize::normalize_row(&row, &CARD_SPEC, BankId::AmazonPay, source_file) {
                Ok(tx) => out.transactions.push(tx),
                Err(warning) => out.warnings.push(warning),
            }
        }
    }
    out
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// HDFC credit card bill: tabular PDF, one date-led line per transaction.
pub struct HdfcCardPdfExtractor;

impl StatementExtractor for HdfcCardPdfExtractor {
    fn bank(&self) -> BankId {
        BankId::HdfcCredit
    }

    fn extract(&self, path: &Path, password: Option<&str>) -> Result<Extraction> {
        let pages = load_pages(path, password)?;
        let extraction = extract_card_pages(&pages, self.bank(), &source_name(path));
        if extraction.transactions.is_empty() {
            return Err(Error::NoTransactionsFound {
                path: path.to_path_buf(),
            });
        }
        Ok(extraction)
    }
}

/// Amazon Pay card statement: transaction lines carry a serial number and
/// appear only on pages with the transaction column header.
pub struct AmazonPayPdfExtractor;

impl StatementExtractor for AmazonPayPdfExtractor {
    fn bank(&self) -> BankId {
        BankId::AmazonPay
    }

    fn extract(&self, path: &Path, password: Option<&str>) -> Result<Extraction> {
        let pages = load_pages(path, password)?;
        let extraction = extract_amazon_pages(&pages, &source_name(path));
        if extraction.transactions.is_empty() {
            return Err(Error::NoTransactionsFound {
                path: path.to_path_buf(),
            });
        }
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[test]
    fn test_card_pages_skip_headers_and_summaries() {
        let pages = page(
            "HDFC Bank Credit Card Statement\n\
             Date Transaction Description Amount\n\
             01/03/2024 SWIGGY BANGALORE 450.00\n\
             02/03/2024 AMAZON PAY REFUND 310.00 Cr\n\
             Total Dues 140.00\n\
             Page 1 of 2",
        );
        let out = extract_card_pages(&pages, BankId::HdfcCredit, "bill.pdf");

        assert_eq!(out.transactions.len(), 2);
        assert!(out.warnings.is_empty());

        let swiggy = &out.transactions[0];
        assert_eq!(swiggy.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(swiggy.description, "SWIGGY BANGALORE");
        assert_eq!(swiggy.amount, -450.0);

        let refund = &out.transactions[1];
        assert_eq!(refund.amount, 310.0);
    }

    #[test]
    fn test_card_malformed_row_is_warned_not_fatal() {
        let pages = page(
            "01/03/2024 SWIGGY BANGALORE 450.00\n\
             02/03/2024 BROKEN ROW NOTANUMBER\n\
             03/03/2024 UBER TRIP 230.00",
        );
        let out = extract_card_pages(&pages, BankId::HdfcCredit, "bill.pdf");
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("line 2"));
    }

    #[test]
    fn test_amazon_rows_need_marker_page_and_serial() {
        let pages = vec![
            // Terms page: no transaction header, its lines are ignored.
            "15/10/2025 99999999999 NOT A TRANSACTION 0 10.00".to_string(),
            format!(
                "Date SerNo. {AMAZON_PAGE_MARKER} Reward Intl.# Amount\n\
                 15/10/2025 12158779277 IGST-CI@18% 0 31.59\n\
                 16/10/2025 12158779300 MOVIE TICKETS 12 250.00 CR\n\
                 16/10/2025 short MALFORMED 0 1.00"
            ),
        ];
        let out = extract_amazon_pages(&pages, "amazon.pdf");

        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.transactions[0].description, "IGST-CI@18%");
        assert_eq!(out.transactions[0].amount, -31.59);
        assert_eq!(out.transactions[1].amount, 250.0);
    }

    #[test]
    fn test_amazon_reward_column_dropped_from_description() {
        let pages = page(&format!(
            "{AMAZON_PAGE_MARKER}\n\
             15/10/2025 12158779277 SWIGGY INSTAMART 25 450.00"
        ));
        let out = extract_amazon_pages(&pages, "amazon.pdf");
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].description, "SWIGGY INSTAMART");
    }
}
