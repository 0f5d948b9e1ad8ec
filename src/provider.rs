// Statement file acquisition boundary.
//
// The pipeline asks a `FileProvider` for candidate statement files and never
// knows where they came from. The shipped implementation scans a local
// directory; a mailbox-backed provider would implement the same trait using
// the subject patterns and attachment globs on the bank profiles.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::banks::{BankId, BankRegistry};
use crate::error::Result;

/// Source of candidate statement files for ingestion.
pub trait FileProvider {
    /// Return statement files for the given banks, newest-first acquisition
    /// windows expressed as "modified within the last `since_days` days".
    fn fetch(&self, account: &str, banks: &[BankId], since_days: u32) -> Result<Vec<PathBuf>>;
}

/// Case-insensitive filename match against a `*` wildcard pattern.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();

    if !pattern.contains('*') {
        return pattern == name;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    if !parts[0].is_empty() && !name.starts_with(parts[0]) {
        return false;
    }
    if !parts[parts.len() - 1].is_empty() && !name.ends_with(parts[parts.len() - 1]) {
        return false;
    }

    // Middle parts must appear in order.
    let mut position = parts[0].len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match name[position..].find(part) {
            Some(found) => position += found + part.len(),
            None => return false,
        }
    }
    true
}

/// Provider that scans a directory of already-downloaded statements.
pub struct DirectoryProvider {
    root: PathBuf,
    registry: BankRegistry,
}

impl DirectoryProvider {
    pub fn new<P: Into<PathBuf>>(root: P, registry: BankRegistry) -> Self {
        DirectoryProvider {
            root: root.into(),
            registry,
        }
    }

    fn modified_within(path: &Path, since_days: u32) -> bool {
        let Ok(metadata) = path.metadata() else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        let window = Duration::from_secs(u64::from(since_days) * 24 * 60 * 60);
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= window,
            // Future mtimes count as fresh.
            Err(_) => true,
        }
    }
}

impl FileProvider for DirectoryProvider {
    fn fetch(&self, account: &str, banks: &[BankId], since_days: u32) -> Result<Vec<PathBuf>> {
        let globs: Vec<&str> = banks
            .iter()
            .map(|&bank| self.registry.get(bank))
            .filter(|profile| account.is_empty() || profile.mail_account == account)
            .map(|profile| profile.mail_attachment_glob)
            .collect();

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !globs.iter().any(|glob| glob_match(glob, name)) {
                continue;
            }
            if !Self::modified_within(&path, since_days) {
                continue;
            }
            files.push(path);
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(b"x").unwrap();
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*.pdf", "statement_jan.PDF"));
        assert!(glob_match("*.csv", "sbi.csv"));
        assert!(!glob_match("*.pdf", "sbi.csv"));
        assert!(glob_match("hdfc*2024*.pdf", "hdfc_stmt_2024_01.pdf"));
        assert!(!glob_match("hdfc*2024*.pdf", "sbi_stmt_2024_01.pdf"));
        assert!(glob_match("exact.csv", "EXACT.csv"));
    }

    #[test]
    fn test_fetch_filters_by_bank_globs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "sbi_jan.csv");
        touch(dir.path(), "card_bill.pdf");
        touch(dir.path(), "notes.txt");

        let provider = DirectoryProvider::new(dir.path(), BankRegistry::builtin());

        // CSV-only bank selection skips the PDF and the txt file.
        let files = provider.fetch("primary", &[BankId::Sbi], 7).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("sbi_jan.csv"));

        // PDF banks see the bill.
        let files = provider
            .fetch("primary", &[BankId::HdfcCredit, BankId::Sbi], 7)
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_fetch_respects_account_binding() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "sbi_jan.csv");

        let provider = DirectoryProvider::new(dir.path(), BankRegistry::builtin());
        let files = provider.fetch("work-mailbox", &[BankId::Sbi], 7).unwrap();
        assert!(files.is_empty());

        // Empty account means "any account".
        let files = provider.fetch("", &[BankId::Sbi], 7).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_fetch_results_are_sorted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.csv");
        touch(dir.path(), "a.csv");

        let provider = DirectoryProvider::new(dir.path(), BankRegistry::builtin());
        let files = provider.fetch("primary", &[BankId::Sbi], 7).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.csv"));
    }
}
