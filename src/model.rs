use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::banks::BankId;

/// Canonical transaction, bank-agnostic.
///
/// Sign convention: negative = debit/outflow, positive = credit/inflow,
/// regardless of how the source statement notates it. The normalizer is the
/// only place source conventions are translated into this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    /// Assigned post-hoc by a `CategoryClassifier`; never set by extractors.
    pub category: Option<String>,
    pub source_bank: BankId,
    pub source_file: String,
}

impl Transaction {
    /// Stable hash identifying the logical transaction for deduplication.
    ///
    /// Built from (date, amount, description, source_bank) only - the same
    /// economic event parsed from two overlapping statements, or from a PDF
    /// and its re-exported CSV, produces the same key. Category and source
    /// file are deliberately excluded.
    pub fn dedup_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{:.2}|{}|{}",
            self.date,
            self.amount,
            self.description.trim(),
            self.source_bank.code(),
        ));
        format!("{:x}", hasher.finalize())
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, description: &str, amount: f64) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            description: description.to_string(),
            amount,
            category: None,
            source_bank: BankId::Sbi,
            source_file: "statement.csv".to_string(),
        }
    }

    #[test]
    fn test_dedup_key_is_stable() {
        let a = tx("2024-01-01", "ATM WDL", -500.0);
        let b = tx("2024-01-01", "ATM WDL", -500.0);
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key().len(), 64);
    }

    #[test]
    fn test_dedup_key_ignores_source_file_and_category() {
        let a = tx("2024-01-01", "ATM WDL", -500.0);
        let mut b = tx("2024-01-01", "ATM WDL", -500.0);
        b.source_file = "re-export.csv".to_string();
        b.category = Some("Bank Fees".to_string());
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_separates_different_events() {
        let a = tx("2024-01-01", "ATM WDL", -500.0);
        let b = tx("2024-01-02", "ATM WDL", -500.0);
        let c = tx("2024-01-01", "ATM WDL", -501.0);
        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
    }
}
