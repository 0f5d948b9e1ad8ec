// Keyword-driven transaction categorization.
//
// Classification is a capability the pipeline consumes through a trait, so
// the rule tables can be swapped (or stubbed in tests) without touching the
// ingestion path. The builtin rules mirror the merchant vocabulary of Indian
// bank narrations (UPI handles, card POS strings).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Assigns a spending category to a transaction description.
/// `None` means "no rule matched"; callers decide the fallback label.
pub trait CategoryClassifier {
    fn classify(&self, description: &str) -> Option<String>;
}

/// One classification rule: the first keyword found in the description
/// (case-insensitive substring) assigns the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// First-match-wins keyword classifier. Rule order is significant: earlier
/// rules shadow later ones, so specific categories must precede broad ones.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<CategoryRule>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        KeywordClassifier { rules }
    }

    /// Load rules from a JSON array of `{"category", "keywords"}` objects.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read category rules: {:?}", path.as_ref()))?;
        let rules: Vec<CategoryRule> =
            serde_json::from_str(&content).context("failed to parse category rules JSON")?;
        Ok(KeywordClassifier::new(rules))
    }

    pub fn builtin() -> Self {
        fn rule(category: &str, keywords: &[&str]) -> CategoryRule {
            CategoryRule {
                category: category.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            }
        }

        KeywordClassifier::new(vec![
            rule(
                "Groceries",
                &["instamart", "bigbasket", "blinkit", "zepto", "dmart", "grofers"],
            ),
            rule(
                "Food & Dining",
                &["swiggy", "zomato", "restaurant", "cafe", "dominos", "mcdonald", "eatfit"],
            ),
            rule(
                "Transport",
                &["uber", "ola", "rapido", "irctc", "petrol", "fuel", "fastag", "metro"],
            ),
            rule(
                "Shopping",
                &["amazon", "flipkart", "myntra", "ajio", "nykaa", "decathlon"],
            ),
            rule(
                "Entertainment",
                &["netflix", "spotify", "bookmyshow", "hotstar", "prime video", "pvr"],
            ),
            rule(
                "Utilities",
                &["electricity", "airtel", "jio", "vodafone", "broadband", "recharge", "dth"],
            ),
            rule(
                "Health",
                &["pharmacy", "apollo", "1mg", "pharmeasy", "hospital", "clinic", "practo"],
            ),
            rule(
                "Travel",
                &["makemytrip", "goibibo", "indigo", "vistara", "airbnb", "oyo", "cleartrip"],
            ),
            rule("Rent", &["rent", "nobroker"]),
            rule("Cash", &["atm wdl", "atm withdrawal", "cash wdl"]),
            rule("Income", &["salary", "dividend", "interest credited"]),
            rule("Fees & Charges", &["late fee", "annual fee", "gst", "svc chg", "charges"]),
        ])
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, description: &str) -> Option<String> {
        let haystack = description.to_lowercase();
        for rule in &self.rules {
            for keyword in &rule.keywords {
                if haystack.contains(&keyword.to_lowercase()) {
                    return Some(rule.category.clone());
                }
            }
        }
        None
    }
}

/// Canonical merchant names for the noisy spellings banks use in
/// narrations. Returns `None` for unrecognized merchants.
pub fn merchant_for(description: &str) -> Option<&'static str> {
    const MERCHANTS: &[(&str, &str)] = &[
        ("swiggy instamart", "Swiggy Instamart"),
        ("swiggy", "Swiggy"),
        ("zomato", "Zomato"),
        ("amazon pay", "Amazon Pay"),
        ("amazon", "Amazon"),
        ("flipkart", "Flipkart"),
        ("myntra", "Myntra"),
        ("bigbasket", "BigBasket"),
        ("blinkit", "Blinkit"),
        ("zepto", "Zepto"),
        ("uber", "Uber"),
        ("ola", "Ola"),
        ("irctc", "IRCTC"),
        ("netflix", "Netflix"),
        ("spotify", "Spotify"),
        ("bookmyshow", "BookMyShow"),
        ("airtel", "Airtel"),
        ("jio", "Jio"),
        ("makemytrip", "MakeMyTrip"),
        ("indigo", "IndiGo"),
    ];

    let haystack = description.to_lowercase();
    MERCHANTS
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, name)| *name)
}
