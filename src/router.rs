// Format routing - maps (file, bank hint) to the extractor that handles it.
//
// Detection is structural only: the extension picks the format, the hint
// picks the bank. With no hint, PDF documents are refused outright (several
// banks publish PDFs and guessing risks silently mis-ingesting), while
// delimited files fall back to the HDFC Bank schema. Header-based sniffing
// for delimited files is a known gap, not an accident.

use std::path::Path;

use crate::banks::{BankId, BankRegistry, FileFormat};
use crate::error::{Error, Result};
use crate::extract::csv::DelimitedExtractor;
use crate::extract::pdf::{AmazonPayPdfExtractor, HdfcCardPdfExtractor};
use crate::extract::StatementExtractor;

/// Caller's statement of which bank a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankHint {
    /// No bank named; the router decides or refuses.
    Auto,
    Bank(BankId),
}

impl BankHint {
    /// Parse the CLI spelling: "auto" or any accepted bank code.
    pub fn parse(raw: &str) -> Option<BankHint> {
        if raw.trim().eq_ignore_ascii_case("auto") {
            return Some(BankHint::Auto);
        }
        BankId::from_code(raw).map(BankHint::Bank)
    }
}

fn file_format(path: &Path) -> Option<FileFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(FileFormat::from_extension)
}

fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("<none>")
        .to_string()
}

/// The extractor implementing one (bank, format) pair. The registry has
/// already confirmed the bank supports the format before this is called.
fn extractor_for(bank: BankId, format: FileFormat) -> Box<dyn StatementExtractor> {
    match (bank, format) {
        (BankId::HdfcCredit, FileFormat::Pdf) => Box::new(HdfcCardPdfExtractor),
        (BankId::AmazonPay, FileFormat::Pdf) => Box::new(AmazonPayPdfExtractor),
        (BankId::Sbi, FileFormat::Csv) => Box::new(DelimitedExtractor::sbi()),
        (BankId::HdfcBank, FileFormat::Csv) => Box::new(DelimitedExtractor::hdfc_bank()),
        // supports() gates every other combination upstream.
        _ => unreachable!("unsupported bank/format pairs are rejected before dispatch"),
    }
}

/// Pick the extractor for a document.
pub fn route(
    path: &Path,
    hint: BankHint,
    registry: &BankRegistry,
) -> Result<Box<dyn StatementExtractor>> {
    let format = file_format(path).ok_or_else(|| Error::UnsupportedFormat {
        bank: match hint {
            BankHint::Bank(bank) => bank.name().to_string(),
            BankHint::Auto => "auto".to_string(),
        },
        extension: extension_label(path),
    })?;

    match hint {
        BankHint::Bank(bank) => {
            let profile = registry.get(bank);
            if !profile.supports(format) {
                return Err(Error::UnsupportedFormat {
                    bank: bank.name().to_string(),
                    extension: extension_label(path),
                });
            }
            Ok(extractor_for(bank, format))
        }
        BankHint::Auto => match format {
            FileFormat::Pdf => Err(Error::AmbiguousBank {
                path: path.to_path_buf(),
            }),
            FileFormat::Csv => Ok(extractor_for(BankId::HdfcBank, format)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_parsing() {
        assert_eq!(BankHint::parse("auto"), Some(BankHint::Auto));
        assert_eq!(BankHint::parse("AUTO"), Some(BankHint::Auto));
        assert_eq!(BankHint::parse("sbi"), Some(BankHint::Bank(BankId::Sbi)));
        assert_eq!(
            BankHint::parse("hdfc-cred"),
            Some(BankHint::Bank(BankId::HdfcCredit))
        );
        assert_eq!(BankHint::parse("mystery"), None);
    }

    #[test]
    fn test_named_bank_routes_to_its_extractor() {
        let registry = BankRegistry::builtin();
        let extractor = route(
            Path::new("stmt.csv"),
            BankHint::Bank(BankId::Sbi),
            &registry,
        )
        .unwrap();
        assert_eq!(extractor.bank(), BankId::Sbi);

        let extractor = route(
            Path::new("bill.pdf"),
            BankHint::Bank(BankId::HdfcCredit),
            &registry,
        )
        .unwrap();
        assert_eq!(extractor.bank(), BankId::HdfcCredit);
    }

    #[test]
    fn test_named_bank_wrong_format_rejected() {
        // SBI publishes CSV only; a PDF under that hint is a caller error.
        let registry = BankRegistry::builtin();
        let err = route(
            Path::new("stmt.pdf"),
            BankHint::Bank(BankId::Sbi),
            &registry,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_auto_refuses_pdf() {
        let registry = BankRegistry::builtin();
        let err = route(Path::new("bill.pdf"), BankHint::Auto, &registry)
            .err()
            .unwrap();
        assert!(matches!(err, Error::AmbiguousBank { .. }));
    }

    #[test]
    fn test_auto_csv_falls_back_to_hdfc_bank() {
        let registry = BankRegistry::builtin();
        let extractor = route(Path::new("stmt.csv"), BankHint::Auto, &registry).unwrap();
        assert_eq!(extractor.bank(), BankId::HdfcBank);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let registry = BankRegistry::builtin();
        let err = route(
            Path::new("stmt.xlsx"),
            BankHint::Bank(BankId::Sbi),
            &registry,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
