// Bank profile registry - the static table every other component consumes.
//
// Banks form a closed set: adding support for a new bank means adding a
// BankId variant and a profile row here, plus an extractor. No identifier
// strings are dispatched on anywhere else.

use serde::{Deserialize, Serialize};

// ============================================================================
// BANK IDENTIFIERS
// ============================================================================

/// Identifies one supported bank / statement source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BankId {
    HdfcCredit,
    HdfcBank,
    Sbi,
    AmazonPay,
}

impl BankId {
    pub const ALL: [BankId; 4] = [
        BankId::HdfcCredit,
        BankId::HdfcBank,
        BankId::Sbi,
        BankId::AmazonPay,
    ];

    /// Human-readable name for display.
    pub fn name(&self) -> &'static str {
        match self {
            BankId::HdfcCredit => "HDFC Credit Card",
            BankId::HdfcBank => "HDFC Bank",
            BankId::Sbi => "State Bank of India",
            BankId::AmazonPay => "Amazon Pay",
        }
    }

    /// Short stable code, used as CLI value and storage key.
    pub fn code(&self) -> &'static str {
        match self {
            BankId::HdfcCredit => "hdfc-credit",
            BankId::HdfcBank => "hdfc-bank",
            BankId::Sbi => "sbi",
            BankId::AmazonPay => "amazon-pay",
        }
    }

    /// Parse a code, accepting the spellings the original CLI accepted.
    pub fn from_code(code: &str) -> Option<BankId> {
        match code.trim().to_lowercase().as_str() {
            "hdfc-credit" | "hdfc-cred" | "hdfccredit" => Some(BankId::HdfcCredit),
            "hdfc-bank" | "hdfcbank" | "hdfc" => Some(BankId::HdfcBank),
            "sbi" => Some(BankId::Sbi),
            "amazon-pay" | "amazonpay" | "amazon" => Some(BankId::AmazonPay),
            _ => None,
        }
    }
}

impl std::fmt::Display for BankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// FILE FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Pdf,
    Csv,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<FileFormat> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(FileFormat::Pdf),
            "csv" | "txt" => Some(FileFormat::Csv),
            _ => None,
        }
    }
}

// ============================================================================
// BANK PROFILES
// ============================================================================

/// Static descriptor of one supported bank: accepted formats, password
/// lookup keys, and the mail-query metadata the file provider uses.
/// Immutable once the registry is built.
#[derive(Debug, Clone)]
pub struct BankProfile {
    pub id: BankId,
    pub display_name: &'static str,
    pub formats: &'static [FileFormat],
    /// Ordered keys tried against the password table for this bank.
    pub password_keys: &'static [&'static str],
    pub mail_subject_patterns: &'static [&'static str],
    pub mail_attachment_glob: &'static str,
    pub mail_account: &'static str,
}

impl BankProfile {
    pub fn supports(&self, format: FileFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Immutable registry of all known bank profiles. Built once at process
/// start and passed explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct BankRegistry {
    profiles: Vec<BankProfile>,
}

impl BankRegistry {
    pub fn builtin() -> Self {
        BankRegistry {
            profiles: vec![
                BankProfile {
                    id: BankId::HdfcCredit,
                    display_name: "HDFC Credit Card",
                    formats: &[FileFormat::Pdf],
                    password_keys: &["hdfc-credit", "hdfc"],
                    mail_subject_patterns: &["subject:(HDFC Bank Credit Card Statement)"],
                    mail_attachment_glob: "*.pdf",
                    mail_account: "primary",
                },
                BankProfile {
                    id: BankId::HdfcBank,
                    display_name: "HDFC Bank",
                    formats: &[FileFormat::Csv],
                    password_keys: &["hdfc-bank", "hdfc"],
                    mail_subject_patterns: &["subject:(HDFC Bank Account Statement)"],
                    mail_attachment_glob: "*.csv",
                    mail_account: "primary",
                },
                BankProfile {
                    id: BankId::Sbi,
                    display_name: "State Bank of India",
                    formats: &[FileFormat::Csv],
                    password_keys: &["sbi"],
                    mail_subject_patterns: &["subject:(SBI Account Statement)"],
                    mail_attachment_glob: "*.csv",
                    mail_account: "primary",
                },
                BankProfile {
                    id: BankId::AmazonPay,
                    display_name: "Amazon Pay",
                    formats: &[FileFormat::Pdf],
                    password_keys: &["amazon-pay", "amazon"],
                    mail_subject_patterns: &["subject:(Amazon Pay ICICI Bank Credit Card Statement)"],
                    mail_attachment_glob: "*.pdf",
                    mail_account: "primary",
                },
            ],
        }
    }

    pub fn get(&self, id: BankId) -> &BankProfile {
        // Registry always carries every BankId variant.
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .expect("registry covers all BankId variants")
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankProfile> {
        self.profiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for bank in BankId::ALL {
            assert_eq!(BankId::from_code(bank.code()), Some(bank));
        }
    }

    #[test]
    fn test_legacy_code_spellings() {
        assert_eq!(BankId::from_code("hdfc-cred"), Some(BankId::HdfcCredit));
        assert_eq!(BankId::from_code("hdfcbank"), Some(BankId::HdfcBank));
        assert_eq!(BankId::from_code("SBI"), Some(BankId::Sbi));
        assert_eq!(BankId::from_code("mystery-bank"), None);
    }

    #[test]
    fn test_registry_covers_all_banks() {
        let registry = BankRegistry::builtin();
        for bank in BankId::ALL {
            let profile = registry.get(bank);
            assert_eq!(profile.id, bank);
            assert!(!profile.formats.is_empty());
            assert!(!profile.password_keys.is_empty());
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("PDF"), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::from_extension("csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("xlsx"), None);
    }
}
