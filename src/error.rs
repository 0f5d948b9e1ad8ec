use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the ingestion pipeline.
///
/// Row-level problems are deliberately NOT represented here: a malformed row
/// is recorded as a warning on the extraction result and processing
/// continues. Everything below is terminal for a document (or, for
/// `Storage`, the whole invocation), and every condition stays branchable —
/// no generic catch-all variant.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested bank does not publish statements in this file format.
    #[error("{bank} does not support .{extension} statements")]
    UnsupportedFormat { bank: String, extension: String },

    /// PDF with bank hint "auto": several banks publish PDF statements and
    /// the router refuses to guess between them.
    #[error("cannot auto-detect the bank for {}: PDF statements require an explicit bank", path.display())]
    AmbiguousBank { path: PathBuf },

    /// Document is encrypted and the resolved password is wrong or missing.
    #[error("failed to decrypt {}: wrong or missing password", path.display())]
    Decryption { path: PathBuf },

    /// Document opened fine but no transaction rows were recognized.
    #[error("no transactions found in {}", path.display())]
    NoTransactionsFound { path: PathBuf },

    /// Delimited file is missing required columns for the selected bank.
    #[error("{}: missing required columns {missing:?}", path.display())]
    SchemaMismatch { path: PathBuf, missing: Vec<String> },

    /// Document exists but is not readable as a PDF at all.
    #[error("could not read PDF {}: {source}", path.display())]
    Pdf { path: PathBuf, source: lopdf::Error },

    /// Backing ledger store is corrupt or unavailable. Fatal, never retried.
    #[error("ledger store unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
