// Delimited-file extractors for bank CSV exports.
//
// Each bank variant declares its own column schema (which columns hold the
// date, description, debit and credit, under which header spellings) and a
// date-format string. The header row is located by matching those names,
// after skipping any bank preamble rows; locale-specific dates are parsed
// with the declared format only, never inferred.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;

use crate::banks::BankId;
use crate::error::{Error, Result};
use crate::extract::{Extraction, StatementExtractor};
use crate::normalize::{self, RawRow, RowSpec, SignConvention};

/// Column schema for one bank's delimited export. Aliases are tried in
/// declared order, matched case-insensitively against trimmed header cells.
#[derive(Debug, Clone, Copy)]
pub struct CsvSchema {
    pub date_columns: &'static [&'static str],
    pub description_columns: &'static [&'static str],
    pub debit_columns: &'static [&'static str],
    pub credit_columns: &'static [&'static str],
    pub date_format: &'static str,
}

pub const SBI_SCHEMA: CsvSchema = CsvSchema {
    date_columns: &["Txn Date", "Date"],
    description_columns: &["Description", "Details", "Narration"],
    debit_columns: &["Debit", "Dr", "Withdrawal Amt."],
    credit_columns: &["Credit", "Cr", "Deposit Amt."],
    date_format: "%Y-%m-%d",
};

pub const HDFC_BANK_SCHEMA: CsvSchema = CsvSchema {
    date_columns: &["Date", "Txn Date"],
    description_columns: &["Description", "Details", "Narration"],
    debit_columns: &["Debit", "Dr", "Withdrawal Amt."],
    credit_columns: &["Credit", "Cr", "Deposit Amt."],
    date_format: "%d-%m-%Y",
};

/// Resolved column indexes for one file.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    description: usize,
    debit: Option<usize>,
    credit: Option<usize>,
}

fn find_column(header: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(index) = header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(alias))
        {
            return Some(index);
        }
    }
    None
}

/// A record is the header row when it carries both a date column and a
/// description column under the bank's known names.
fn map_columns(header: &csv::StringRecord, schema: &CsvSchema) -> Option<ColumnMap> {
    let date = find_column(header, schema.date_columns)?;
    let description = find_column(header, schema.description_columns)?;
    Some(ColumnMap {
        date,
        description,
        debit: find_column(header, schema.debit_columns),
        credit: find_column(header, schema.credit_columns),
    })
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Generic column-mapped extractor, parameterized by bank and schema.
pub struct DelimitedExtractor {
    bank: BankId,
    schema: CsvSchema,
}

impl DelimitedExtractor {
    pub fn new(bank: BankId, schema: CsvSchema) -> Self {
        DelimitedExtractor { bank, schema }
    }

    pub fn sbi() -> Self {
        DelimitedExtractor::new(BankId::Sbi, SBI_SCHEMA)
    }

    pub fn hdfc_bank() -> Self {
        DelimitedExtractor::new(BankId::HdfcBank, HDFC_BANK_SCHEMA)
    }
}

impl StatementExtractor for DelimitedExtractor {
    fn bank(&self) -> BankId {
        self.bank
    }

    fn extract(&self, path: &Path, _password: Option<&str>) -> Result<Extraction> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let source_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("statement.csv")
            .to_string();

        let spec = RowSpec {
            date_format: self.schema.date_format,
            sign: SignConvention::Signed,
        };

        let mut out = Extraction::default();
        let mut columns: Option<ColumnMap> = None;
        let mut saw_date = false;
        let mut saw_description = false;

        for (index, record) in reader.records().enumerate() {
            let line = index + 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    out.warnings.push(format!("line {line}: unreadable record: {e}"));
                    continue;
                }
            };

            let Some(map) = columns else {
                // Still hunting for the header; anything before it is bank
                // preamble (account holder block, statement period, etc.).
                saw_date |= find_column(&record, self.schema.date_columns).is_some();
                saw_description |=
                    find_column(&record, self.schema.description_columns).is_some();
                columns = map_columns(&record, &self.schema);
                continue;
            };

            let row = RawRow {
                date: cell(&record, map.date).unwrap_or_default(),
                description: cell(&record, map.description).unwrap_or_default(),
                debit: map.debit.and_then(|i| cell(&record, i)),
                credit: map.credit.and_then(|i| cell(&record, i)),
                amount: None,
                line,
            };

            // Blank separator rows are not worth a warning.
            if row.date.is_empty() && row.description.is_empty() {
                continue;
            }

            match normalize::normalize_row(&row, &spec, self.bank, &source_file) {
                Ok(tx) => out.transactions.push(tx),
                Err(warning) => out.warnings.push(warning),
            }
        }

        if columns.is_none() {
            // Name only the column groups that never matched; if each
            // matched somewhere but never on the same row, name both.
            let mut missing: Vec<String> = Vec::new();
            if !saw_date {
                missing.push(self.schema.date_columns[0].to_string());
            }
            if !saw_description {
                missing.push(self.schema.description_columns[0].to_string());
            }
            if missing.is_empty() {
                missing.push(self.schema.date_columns[0].to_string());
                missing.push(self.schema.description_columns[0].to_string());
            }
            return Err(Error::SchemaMismatch {
                path: path.to_path_buf(),
                missing,
            });
        }

        if out.transactions.is_empty() && out.warnings.is_empty() {
            return Err(Error::NoTransactionsFound {
                path: path.to_path_buf(),
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_sbi_rows_normalize_to_signed_amounts() {
        let file = write_file(
            "Txn Date,Description,Debit,Credit,Balance\n\
             2024-01-01,ATM WDL,500.00,,9500.00\n\
             2024-01-02,SALARY,,50000.00,59500.00\n",
        );
        let out = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap();

        assert_eq!(out.transactions.len(), 2);
        assert!(out.warnings.is_empty());
        assert_eq!(out.transactions[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(out.transactions[0].amount, -500.0);
        assert_eq!(out.transactions[1].amount, 50000.0);
        assert_eq!(out.transactions[0].source_bank, BankId::Sbi);
    }

    #[test]
    fn test_preamble_rows_before_header_are_skipped() {
        let file = write_file(
            "Account Name:,J DOE\n\
             Statement Period:,Jan 2024\n\
             \n\
             Txn Date,Description,Debit,Credit\n\
             2024-01-05,UPI-SWIGGY,450.00,\n",
        );
        let out = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap();
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].description, "UPI-SWIGGY");
    }

    #[test]
    fn test_malformed_row_skipped_not_fatal() {
        // N well-formed rows plus one malformed row yield exactly N.
        let file = write_file(
            "Txn Date,Description,Debit,Credit\n\
             2024-01-01,ATM WDL,500.00,\n\
             not-a-date,GARBAGE,1.00,\n\
             2024-01-03,UPI-ZOMATO,320.00,\n",
        );
        let out = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap();
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("unparseable date"));
    }

    #[test]
    fn test_missing_columns_is_schema_mismatch() {
        let file = write_file(
            "Timestamp,Memo,Value\n\
             2024-01-01,ATM WDL,-500.00\n",
        );
        let err = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_schema_mismatch_names_only_absent_columns() {
        // Date column present, description column absent: the error must
        // not claim the date column is missing.
        let file = write_file(
            "Txn Date,Memo,Value\n\
             2024-01-01,ATM WDL,-500.00\n",
        );
        let err = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap_err();
        match err {
            Error::SchemaMismatch { missing, .. } => {
                assert_eq!(missing, vec!["Description".to_string()]);
            }
            other => panic!("expected SchemaMismatch, got {other}"),
        }
    }

    #[test]
    fn test_header_only_file_is_no_transactions() {
        let file = write_file("Txn Date,Description,Debit,Credit\n");
        let err = DelimitedExtractor::sbi()
            .extract(file.path(), None)
            .unwrap_err();
        assert!(matches!(err, Error::NoTransactionsFound { .. }));
    }

    #[test]
    fn test_hdfc_bank_date_format() {
        let file = write_file(
            "Date,Narration,Debit,Credit\n\
             05-01-2024,POS PURCHASE,1250.50,\n",
        );
        let out = DelimitedExtractor::hdfc_bank()
            .extract(file.path(), None)
            .unwrap();
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(
            out.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(out.transactions[0].amount, -1250.5);
        assert_eq!(out.transactions[0].source_bank, BankId::HdfcBank);
    }
}
