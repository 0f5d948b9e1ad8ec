// Extraction strategies - one per (bank, format) pair.
//
// Extractors lift candidate rows out of a raw document and hand them to the
// normalizer; all date/amount/sign canonicalization happens there, never
// here. Row-level failures are recorded as warnings and never abort the
// document.

pub mod csv;
pub mod pdf;

use std::path::Path;

use crate::banks::BankId;
use crate::error::Result;
use crate::model::Transaction;

/// Result of extracting one document: the canonical transactions plus any
/// skipped-row warnings (partial-failure semantics).
#[derive(Debug, Default)]
pub struct Extraction {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
}

/// One bank/format strategy. Selected once by the router; callers never
/// branch on bank identifiers themselves.
pub trait StatementExtractor {
    fn bank(&self) -> BankId;

    /// Extract all transactions from the document. `password` is only
    /// relevant for encrypted PDFs and ignored by delimited extractors.
    fn extract(&self, path: &Path, password: Option<&str>) -> Result<Extraction>;
}
