// Bank statement ledger - core library.
// Exposes all modules for use in the CLI and tests.

pub mod analytics;
pub mod banks;
pub mod classify;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod password;
pub mod provider;
pub mod router;

// Re-export commonly used types
pub use banks::{BankId, BankProfile, BankRegistry, FileFormat};
pub use classify::{CategoryClassifier, CategoryRule, KeywordClassifier};
pub use db::{
    already_imported, global_stats, open_ledger, query_transactions, setup_database,
    spending_summary,
    store_transactions, GlobalStats, ImportReport, LedgerEntry, SpendingSummary,
    TransactionQuery,
};
pub use error::{Error, Result};
pub use extract::{Extraction, StatementExtractor};
pub use model::Transaction;
pub use password::{resolve_password, PasswordTable};
pub use provider::{DirectoryProvider, FileProvider};
pub use router::{route, BankHint};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
