// Password resolution for encrypted statement documents.
//
// Pure function of its inputs (the table is loaded once, read-only), so
// resolution is reproducible in tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::banks::BankProfile;

/// Mapping from an identifier (exact filename stem, bank keyword, or
/// substring pattern) to a plaintext password.
///
/// Kept as an ordered list of pairs so substring fallback iterates in a
/// deterministic order; loading from JSON sorts entries by key.
#[derive(Debug, Clone, Default)]
pub struct PasswordTable {
    entries: Vec<(String, String)>,
}

impl PasswordTable {
    pub fn new() -> Self {
        PasswordTable::default()
    }

    pub fn from_entries(entries: Vec<(String, String)>) -> Self {
        PasswordTable { entries }
    }

    /// Load from a JSON object of `{"identifier": "password"}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read password table: {:?}", path.as_ref()))?;

        let map: std::collections::HashMap<String, String> =
            serde_json::from_str(&content).context("failed to parse password table JSON")?;

        let mut entries: Vec<(String, String)> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(PasswordTable { entries })
    }

    /// Exact key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the decryption password for a document. First match wins:
///
/// 1. explicit password supplied by the caller
/// 2. exact match of the file's name-stem against a table key
/// 3. the bank profile's `password_keys`, in declared order
/// 4. any table key that is a case-insensitive substring of the name-stem,
///    in table iteration order
/// 5. none (unencrypted assumed)
pub fn resolve_password(
    path: &Path,
    explicit: Option<&str>,
    bank: Option<&BankProfile>,
    table: &PasswordTable,
) -> Option<String> {
    if let Some(pw) = explicit {
        return Some(pw.to_string());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if let Some(pw) = table.get(stem) {
        return Some(pw.to_string());
    }

    if let Some(profile) = bank {
        for key in profile.password_keys {
            if let Some(pw) = table.get(key) {
                return Some(pw.to_string());
            }
        }
    }

    let stem_lower = stem.to_lowercase();
    for (key, pw) in table.iter() {
        if stem_lower.contains(&key.to_lowercase()) {
            return Some(pw.to_string());
        }
    }

    None
}
