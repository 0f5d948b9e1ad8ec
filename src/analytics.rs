// In-memory spend analytics.
//
// Operates on a slice of canonical transactions rather than the database,
// so reports compose with any query the caller already ran. Sign
// convention throughout: negative amounts are spend, positive are credits.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{merchant_for, CategoryClassifier};
use crate::model::Transaction;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize)]
pub struct NamedTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

/// Spend breakdown over one set of transactions.
#[derive(Debug, Clone, Serialize)]
pub struct SpendReport {
    /// Sum of absolute debit amounts; credits are excluded.
    pub total_spend: f64,
    pub total_credits: f64,
    pub debit_count: usize,
    pub average_debit: f64,
    /// Spend per category, highest first.
    pub by_category: Vec<NamedTotal>,
    /// Spend per canonical merchant, highest first, capped at `top_n`.
    pub top_merchants: Vec<NamedTotal>,
    /// Spend per calendar month ("YYYY-MM"), chronological.
    pub monthly: Vec<(String, f64)>,
}

fn sorted_totals(map: BTreeMap<String, (f64, usize)>) -> Vec<NamedTotal> {
    let mut totals: Vec<NamedTotal> = map
        .into_iter()
        .map(|(name, (total, count))| NamedTotal { name, total, count })
        .collect();
    totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    totals
}

/// Build the spend report. Stored categories win; the classifier only fills
/// gaps, so re-running analytics never relabels ledger data.
pub fn spend_report(
    transactions: &[Transaction],
    classifier: &dyn CategoryClassifier,
    top_n: usize,
) -> SpendReport {
    let mut total_spend = 0.0;
    let mut total_credits = 0.0;
    let mut debit_count = 0;
    let mut by_category: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut by_merchant: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();

    for tx in transactions {
        if !tx.is_debit() {
            total_credits += tx.amount;
            continue;
        }
        let spend = tx.amount.abs();
        total_spend += spend;
        debit_count += 1;

        let category = tx
            .category
            .clone()
            .or_else(|| classifier.classify(&tx.description))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let entry = by_category.entry(category).or_insert((0.0, 0));
        entry.0 += spend;
        entry.1 += 1;

        let merchant = merchant_for(&tx.description)
            .map(str::to_string)
            .unwrap_or_else(|| tx.description.clone());
        let entry = by_merchant.entry(merchant).or_insert((0.0, 0));
        entry.0 += spend;
        entry.1 += 1;

        *monthly.entry(tx.date.format("%Y-%m").to_string()).or_insert(0.0) += spend;
    }

    let average_debit = if debit_count > 0 {
        total_spend / debit_count as f64
    } else {
        0.0
    };

    let mut top_merchants = sorted_totals(by_merchant);
    top_merchants.truncate(top_n);

    SpendReport {
        total_spend,
        total_credits,
        debit_count,
        average_debit,
        by_category: sorted_totals(by_category),
        top_merchants,
        monthly: monthly.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::BankId;
    use crate::classify::KeywordClassifier;
    use chrono::NaiveDate;

    fn tx(date: &str, description: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: description.to_string(),
            amount,
            category: None,
            source_bank: BankId::HdfcCredit,
            source_file: "bill.pdf".to_string(),
        }
    }

    #[test]
    fn test_credits_excluded_from_spend() {
        let transactions = vec![
            tx("2024-01-05", "UPI-SWIGGY", -450.0),
            tx("2024-01-06", "REFUND AMAZON", 310.0),
            tx("2024-02-01", "UBER TRIP", -230.0),
        ];
        let report = spend_report(&transactions, &KeywordClassifier::builtin(), 5);

        assert!((report.total_spend - 680.0).abs() < 1e-9);
        assert!((report.total_credits - 310.0).abs() < 1e-9);
        assert_eq!(report.debit_count, 2);
        assert!((report.average_debit - 340.0).abs() < 1e-9);
    }

    #[test]
    fn test_stored_category_wins_over_classifier() {
        let mut labeled = tx("2024-01-05", "UPI-SWIGGY", -450.0);
        labeled.category = Some("Office Lunches".to_string());
        let report = spend_report(&[labeled], &KeywordClassifier::builtin(), 5);

        assert_eq!(report.by_category.len(), 1);
        assert_eq!(report.by_category[0].name, "Office Lunches");
    }

    #[test]
    fn test_classifier_fills_missing_categories() {
        let transactions = vec![
            tx("2024-01-05", "UPI-SWIGGY", -450.0),
            tx("2024-01-06", "NEFT MYSTERY VENDOR", -100.0),
        ];
        let report = spend_report(&transactions, &KeywordClassifier::builtin(), 5);

        let names: Vec<&str> = report.by_category.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Food & Dining"));
        assert!(names.contains(&"Uncategorized"));
    }

    #[test]
    fn test_merchants_canonicalized_and_capped() {
        let transactions = vec![
            tx("2024-01-05", "UPI-SWIGGY-987@ybl", -450.0),
            tx("2024-01-12", "SWIGGY BANGALORE", -350.0),
            tx("2024-01-13", "UBER TRIP", -230.0),
        ];
        let report = spend_report(&transactions, &KeywordClassifier::builtin(), 1);

        // Both narration spellings fold into one merchant.
        assert_eq!(report.top_merchants.len(), 1);
        assert_eq!(report.top_merchants[0].name, "Swiggy");
        assert!((report.top_merchants[0].total - 800.0).abs() < 1e-9);
        assert_eq!(report.top_merchants[0].count, 2);
    }

    #[test]
    fn test_monthly_series_is_chronological() {
        let transactions = vec![
            tx("2024-02-01", "UBER TRIP", -230.0),
            tx("2024-01-05", "UPI-SWIGGY", -450.0),
            tx("2024-01-20", "UPI-ZOMATO", -150.0),
        ];
        let report = spend_report(&transactions, &KeywordClassifier::builtin(), 5);

        assert_eq!(report.monthly.len(), 2);
        assert_eq!(report.monthly[0].0, "2024-01");
        assert!((report.monthly[0].1 - 600.0).abs() < 1e-9);
        assert_eq!(report.monthly[1].0, "2024-02");
    }
}
