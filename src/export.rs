// CSV export / re-import of the canonical ledger schema.
//
// The exported file is itself a valid ingestion source: re-importing it
// reproduces the same dedup keys, so an export/import cycle inserts nothing
// new. Category travels with the row; source_file does not (the reading
// side re-derives it from the file being read).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::banks::BankId;
use crate::error::Result;
use crate::model::Transaction;

/// One row of the canonical export schema.
#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    date: chrono::NaiveDate,
    description: String,
    amount: f64,
    category: Option<String>,
    source_bank: BankId,
}

/// Result of reading an exported file back in.
#[derive(Debug, Default)]
pub struct LoadedCsv {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
}

/// Write transactions to `path` in the canonical export schema.
pub fn write_csv(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for tx in transactions {
        writer.serialize(ExportRow {
            date: tx.date,
            description: tx.description.clone(),
            amount: tx.amount,
            category: tx.category.clone(),
            source_bank: tx.source_bank,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a canonical export back into transactions. Malformed rows are
/// skipped with a warning, same as statement extraction.
pub fn read_csv(path: &Path) -> Result<LoadedCsv> {
    let source_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export.csv")
        .to_string();

    let mut reader = csv::Reader::from_path(path)?;
    let mut out = LoadedCsv::default();

    for (index, record) in reader.deserialize::<ExportRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        match record {
            Ok(row) => out.transactions.push(Transaction {
                date: row.date,
                description: row.description,
                amount: row.amount,
                category: row.category,
                source_bank: row.source_bank,
                source_file: source_file.clone(),
            }),
            Err(e) => out.warnings.push(format!("line {line}: {e}")),
        }
    }

    Ok(out)
}
