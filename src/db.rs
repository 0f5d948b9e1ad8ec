// SQLite ledger store.
//
// All persistence goes through free functions over a `&Connection`; there is
// no connection pool or ORM layer. Dates are stored as ISO-8601 text so
// lexicographic comparison in SQL matches chronological order. Duplicate
// detection rides on the UNIQUE dedup_key column: a constraint violation on
// insert means "already ingested" and is counted, never raised.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::path::Path;

use crate::banks::BankId;
use crate::error::Result;
use crate::model::Transaction;

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dedup_key TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT,
            source_bank TEXT NOT NULL,
            source_file TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    // One row per ingestion run, for auditability of where ledger rows
    // came from and how many were skipped as duplicates.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS imports (
            id TEXT PRIMARY KEY,
            source_file TEXT NOT NULL,
            source_bank TEXT NOT NULL,
            inserted INTEGER NOT NULL,
            duplicates INTEGER NOT NULL,
            warnings INTEGER NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_dedup_key ON transactions(dedup_key)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_date ON transactions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_source_bank ON transactions(source_bank)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the ledger database at `path` and ensure the schema.
pub fn open_ledger(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

// ============================================================================
// INGESTION
// ============================================================================

/// Outcome of storing one extracted document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportReport {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Insert a batch of canonical transactions, skipping rows whose dedup key
/// is already present. Records the run in the imports audit table.
pub fn store_transactions(
    conn: &Connection,
    transactions: &[Transaction],
    warnings: usize,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let imported_at = Utc::now().to_rfc3339();

    for tx in transactions {
        let result = conn.execute(
            "INSERT INTO transactions (
                dedup_key, date, description, amount, category,
                source_bank, source_file, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                tx.dedup_key(),
                tx.date.to_string(),
                tx.description,
                tx.amount,
                tx.category,
                tx.source_bank.code(),
                tx.source_file,
                imported_at,
            ],
        );

        match result {
            Ok(_) => report.inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                report.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(first) = transactions.first() {
        conn.execute(
            "INSERT INTO imports (
                id, source_file, source_bank, inserted, duplicates, warnings, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                first.source_file,
                first.source_bank.code(),
                report.inserted as i64,
                report.duplicates as i64,
                warnings as i64,
                imported_at,
            ],
        )?;
    }

    Ok(report)
}

/// Whether a file of this name has already produced an import run. The sync
/// flow uses this as its processed ledger: several banks' acquisition
/// filters can match the same document (every PDF bank shares `*.pdf`), and
/// a second pass under another bank would store the same rows with
/// different dedup keys.
pub fn already_imported(conn: &Connection, source_file: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM imports WHERE source_file = ?1",
        params![source_file],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ============================================================================
// QUERIES
// ============================================================================

/// A stored transaction plus its ledger bookkeeping columns.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    #[serde(flatten)]
    pub transaction: Transaction,
    pub imported_at: DateTime<Utc>,
}

/// Filter set for `query_transactions`. All fields optional; unset fields
/// do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub bank: Option<BankId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

fn parse_stored_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| rusqlite::Error::InvalidQuery)
}

fn parse_stored_bank(raw: &str) -> rusqlite::Result<BankId> {
    BankId::from_code(raw).ok_or(rusqlite::Error::InvalidQuery)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let date_str: String = row.get(1)?;
    let bank_str: String = row.get(5)?;
    let imported_at_str: String = row.get(7)?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        transaction: Transaction {
            date: parse_stored_date(&date_str)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            source_bank: parse_stored_bank(&bank_str)?,
            source_file: row.get(6)?,
        },
        imported_at: DateTime::parse_from_rfc3339(&imported_at_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
    })
}

/// Fetch stored transactions matching the filter set, newest first.
pub fn query_transactions(
    conn: &Connection,
    query: &TransactionQuery,
) -> Result<Vec<LedgerEntry>> {
    let mut sql = String::from(
        "SELECT id, date, description, amount, category, source_bank, source_file, imported_at
         FROM transactions WHERE 1=1",
    );
    let mut bindings: Vec<String> = Vec::new();

    if let Some(bank) = query.bank {
        sql.push_str(" AND source_bank = ?");
        bindings.push(bank.code().to_string());
    }
    if let Some(from) = query.date_from {
        sql.push_str(" AND date >= ?");
        bindings.push(from.to_string());
    }
    if let Some(to) = query.date_to {
        sql.push_str(" AND date <= ?");
        bindings.push(to.to_string());
    }
    if let Some(category) = &query.category {
        sql.push_str(" AND category = ?");
        bindings.push(category.clone());
    }

    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bindings.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params_from_iter(bindings.iter()), row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Absolute spend in the category (debits only).
    pub total: f64,
    pub count: i64,
}

/// Spending summary over a trailing window of `months` * 30 days, anchored
/// at the latest stored transaction date rather than the wall clock, so the
/// summary of a historical ledger is stable.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingSummary {
    pub months: u32,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total_transactions: i64,
    /// Sum of absolute amounts in the window (debits and credits).
    pub total_amount: f64,
    pub average_amount: f64,
    pub top_categories: Vec<CategoryTotal>,
}

pub fn spending_summary(
    conn: &Connection,
    bank: Option<BankId>,
    months: u32,
) -> Result<SpendingSummary> {
    let empty = SpendingSummary {
        months,
        from: None,
        to: None,
        total_transactions: 0,
        total_amount: 0.0,
        average_amount: 0.0,
        top_categories: Vec::new(),
    };

    let (latest, bank_filter, bank_code): (Option<String>, &str, String) = match bank {
        Some(bank) => (
            conn.query_row(
                "SELECT MAX(date) FROM transactions WHERE source_bank = ?1",
                params![bank.code()],
                |row| row.get(0),
            )?,
            " AND source_bank = ?3",
            bank.code().to_string(),
        ),
        None => (
            conn.query_row("SELECT MAX(date) FROM transactions", [], |row| row.get(0))?,
            "",
            String::new(),
        ),
    };

    let Some(latest) = latest else {
        return Ok(empty);
    };
    let to = parse_stored_date(&latest)?;
    let from = to - Duration::days(i64::from(months) * 30);

    let totals_sql = format!(
        "SELECT COUNT(*), COALESCE(SUM(ABS(amount)), 0), COALESCE(AVG(ABS(amount)), 0)
         FROM transactions WHERE date >= ?1 AND date <= ?2{bank_filter}"
    );
    let categories_sql = format!(
        "SELECT COALESCE(category, 'Uncategorized'), SUM(ABS(amount)), COUNT(*)
         FROM transactions
         WHERE amount < 0 AND date >= ?1 AND date <= ?2{bank_filter}
         GROUP BY COALESCE(category, 'Uncategorized')
         ORDER BY SUM(ABS(amount)) DESC
         LIMIT 5"
    );

    let mut bindings = vec![from.to_string(), to.to_string()];
    if bank.is_some() {
        bindings.push(bank_code);
    }

    let (total_transactions, total_amount, average_amount) = conn.query_row(
        &totals_sql,
        params_from_iter(bindings.iter()),
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?)),
    )?;

    let mut stmt = conn.prepare(&categories_sql)?;
    let top_categories = stmt
        .query_map(params_from_iter(bindings.iter()), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(SpendingSummary {
        months,
        from: Some(from),
        to: Some(to),
        total_transactions,
        total_amount,
        average_amount,
        top_categories,
    })
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BankStat {
    pub bank: BankId,
    pub count: i64,
    /// Net signed sum (credits minus debits).
    pub total_amount: f64,
    pub total_debits: f64,
    pub total_credits: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_transactions: i64,
    pub source_files: i64,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub banks: Vec<BankStat>,
}

pub fn global_stats(conn: &Connection) -> Result<GlobalStats> {
    let (total_transactions, source_files, earliest, latest) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT source_file), MIN(date), MAX(date) FROM transactions",
        [],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        },
    )?;

    let mut stmt = conn.prepare(
        "SELECT source_bank, COUNT(*),
                COALESCE(SUM(amount), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN ABS(amount) ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                MIN(date), MAX(date)
         FROM transactions
         GROUP BY source_bank
         ORDER BY source_bank",
    )?;
    let banks = stmt
        .query_map([], |row| {
            let bank_str: String = row.get(0)?;
            let first: String = row.get(5)?;
            let last: String = row.get(6)?;
            Ok(BankStat {
                bank: parse_stored_bank(&bank_str)?,
                count: row.get(1)?,
                total_amount: row.get(2)?,
                total_debits: row.get(3)?,
                total_credits: row.get(4)?,
                first_date: parse_stored_date(&first)?,
                last_date: parse_stored_date(&last)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(GlobalStats {
        total_transactions,
        source_files,
        earliest: earliest.as_deref().map(parse_stored_date).transpose()?,
        latest: latest.as_deref().map(parse_stored_date).transpose()?,
        banks,
    })
}
