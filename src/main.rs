use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use bankledger::{
    analytics, db, export, resolve_password, route, BankHint, BankId, BankRegistry,
    CategoryClassifier, DirectoryProvider, FileProvider, KeywordClassifier, PasswordTable,
    Transaction, TransactionQuery,
};

#[derive(Parser)]
#[command(name = "bankledger", version, about = "Personal bank statement ledger")]
struct Cli {
    /// Path to the SQLite ledger database
    #[arg(long, global = true, default_value = "ledger.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest one statement file into the ledger
    Ingest {
        file: PathBuf,
        /// Bank code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        bank: String,
        /// Decryption password for this file
        #[arg(long)]
        password: Option<String>,
        /// JSON password table {"identifier": "password"}
        #[arg(long)]
        passwords: Option<PathBuf>,
        /// JSON category rules overriding the builtin set
        #[arg(long)]
        categories: Option<PathBuf>,
    },
    /// Query stored transactions
    Query {
        #[arg(long)]
        bank: Option<String>,
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Spending summary over a trailing window
    Summary {
        #[arg(long)]
        bank: Option<String>,
        #[arg(long, default_value_t = 3)]
        months: u32,
    },
    /// Ledger statistics per bank
    Stats,
    /// Export the ledger (or a filtered slice) to CSV
    Export {
        out: PathBuf,
        #[arg(long)]
        bank: Option<String>,
    },
    /// Re-import a previously exported CSV
    Import { file: PathBuf },
    /// Ingest recent statement files from a directory
    Sync {
        /// Directory of downloaded statements
        #[arg(long, default_value = "statements")]
        dir: PathBuf,
        #[arg(long, default_value_t = 7)]
        since_days: u32,
        /// Mailbox account the statements were fetched for
        #[arg(long, default_value = "primary")]
        account: String,
        #[arg(long)]
        passwords: Option<PathBuf>,
        #[arg(long)]
        categories: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = BankRegistry::builtin();
    let conn = db::open_ledger(&cli.db)?;

    match cli.command {
        Command::Ingest {
            file,
            bank,
            password,
            passwords,
            categories,
        } => {
            let hint =
                BankHint::parse(&bank).ok_or_else(|| anyhow!("unknown bank code: {bank}"))?;
            let table = load_passwords(passwords.as_deref())?;
            let classifier = load_classifier(categories.as_deref())?;
            ingest_file(
                &conn,
                &registry,
                &file,
                hint,
                password.as_deref(),
                &table,
                &classifier,
            )?;
        }
        Command::Query {
            bank,
            from,
            to,
            category,
            limit,
        } => {
            let query = TransactionQuery {
                bank: bank.as_deref().map(parse_bank).transpose()?,
                date_from: from.as_deref().map(parse_date).transpose()?,
                date_to: to.as_deref().map(parse_date).transpose()?,
                category,
                limit,
            };
            let entries = db::query_transactions(&conn, &query)?;
            for entry in &entries {
                let tx = &entry.transaction;
                println!(
                    "{}  {:>12.2}  {:<12}  {:<20}  {}",
                    tx.date,
                    tx.amount,
                    tx.source_bank.code(),
                    tx.category.as_deref().unwrap_or("-"),
                    tx.description,
                );
            }
            println!("({} transactions)", entries.len());
        }
        Command::Summary { bank, months } => {
            let bank = bank.as_deref().map(parse_bank).transpose()?;
            let summary = db::spending_summary(&conn, bank, months)?;
            match (summary.from, summary.to) {
                (Some(from), Some(to)) => {
                    println!("Summary {from} .. {to} ({months} months)")
                }
                _ => println!("Summary: ledger is empty"),
            }
            println!("  transactions: {}", summary.total_transactions);
            println!("  total amount: {:.2}", summary.total_amount);
            println!("  average:      {:.2}", summary.average_amount);
            if !summary.top_categories.is_empty() {
                println!("  top spending categories:");
                for cat in &summary.top_categories {
                    println!("    {:<20} {:>12.2}  ({} txns)", cat.category, cat.total, cat.count);
                }
            }
        }
        Command::Stats => {
            let stats = db::global_stats(&conn)?;
            println!("Transactions: {}", stats.total_transactions);
            println!("Source files: {}", stats.source_files);
            if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
                println!("Date range:   {earliest} .. {latest}");
            }
            for bank in &stats.banks {
                println!(
                    "  {:<12} {:>6} txns  debits {:>12.2}  credits {:>12.2}  ({} .. {})",
                    bank.bank.code(),
                    bank.count,
                    bank.total_debits,
                    bank.total_credits,
                    bank.first_date,
                    bank.last_date,
                );
            }
        }
        Command::Export { out, bank } => {
            let query = TransactionQuery {
                bank: bank.as_deref().map(parse_bank).transpose()?,
                ..Default::default()
            };
            let entries = db::query_transactions(&conn, &query)?;
            let transactions: Vec<Transaction> =
                entries.into_iter().map(|e| e.transaction).collect();
            export::write_csv(&out, &transactions)?;
            println!("✓ Exported {} transactions to {}", transactions.len(), out.display());
        }
        Command::Import { file } => {
            let loaded = export::read_csv(&file)?;
            print_warnings(&loaded.warnings);
            let report = db::store_transactions(&conn, &loaded.transactions, loaded.warnings.len())?;
            println!("✓ Inserted: {}", report.inserted);
            println!("✓ Skipped duplicates: {}", report.duplicates);
        }
        Command::Sync {
            dir,
            since_days,
            account,
            passwords,
            categories,
        } => {
            let table = load_passwords(passwords.as_deref())?;
            let classifier = load_classifier(categories.as_deref())?;
            let provider = DirectoryProvider::new(dir, registry.clone());

            let mut failures = 0;
            for bank in BankId::ALL {
                let files = provider.fetch(&account, &[bank], since_days)?;
                for file in files {
                    // Several banks share an attachment glob (all PDF banks
                    // match *.pdf); the imports ledger keeps a document from
                    // being ingested a second time under another bank.
                    let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                    if db::already_imported(&conn, name)? {
                        println!("→ {} already ingested, skipping", file.display());
                        continue;
                    }
                    println!("→ {} [{}]", file.display(), bank.code());
                    // One bad document never aborts the batch.
                    if let Err(e) = ingest_file(
                        &conn,
                        &registry,
                        &file,
                        BankHint::Bank(bank),
                        None,
                        &table,
                        &classifier,
                    ) {
                        eprintln!("  ✗ {e}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                eprintln!("{failures} file(s) failed to ingest");
            }
        }
    }

    Ok(())
}

fn parse_bank(code: &str) -> Result<BankId> {
    BankId::from_code(code).ok_or_else(|| anyhow!("unknown bank code: {code}"))
}

fn parse_date(raw: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}

fn load_passwords(path: Option<&Path>) -> Result<PasswordTable> {
    match path {
        Some(path) => PasswordTable::from_file(path),
        None => Ok(PasswordTable::new()),
    }
}

fn load_classifier(path: Option<&Path>) -> Result<KeywordClassifier> {
    match path {
        Some(path) => KeywordClassifier::from_file(path),
        None => Ok(KeywordClassifier::builtin()),
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("  ⚠ {warning}");
    }
}

/// Extract, classify, and store one statement file.
fn ingest_file(
    conn: &Connection,
    registry: &BankRegistry,
    file: &Path,
    hint: BankHint,
    password: Option<&str>,
    table: &PasswordTable,
    classifier: &KeywordClassifier,
) -> Result<()> {
    let extractor = route(file, hint, registry)?;
    let profile = registry.get(extractor.bank());
    let password = resolve_password(file, password, Some(profile), table);

    let mut extraction = extractor.extract(file, password.as_deref())?;
    print_warnings(&extraction.warnings);

    // Fill categories before storage; already-labeled rows are left alone.
    for tx in &mut extraction.transactions {
        if tx.category.is_none() {
            tx.category = classifier.classify(&tx.description);
        }
    }

    let report = db::store_transactions(conn, &extraction.transactions, extraction.warnings.len())?;
    println!("✓ Inserted: {} transactions", report.inserted);
    println!("✓ Skipped duplicates: {}", report.duplicates);

    // A quick spend readout for what was just ingested.
    let ingest_report = analytics::spend_report(&extraction.transactions, classifier, 3);
    if ingest_report.debit_count > 0 {
        println!(
            "  spend in file: {:.2} across {} debits",
            ingest_report.total_spend, ingest_report.debit_count
        );
    }

    Ok(())
}
