/// Label the classifier is told to use when no account type fits.
pub const NOT_AN_ACCOUNT_TYPE: &str = "Not an Account type";

/// Label written for every account of a batch that could not be classified.
pub const CLASSIFICATION_ERROR: &str = "Error in classification";

pub const DEFAULT_CATEGORIES: [&str; 14] = [
    "Asset - Bank Accounts",
    "Asset - Cash",
    "Asset - Current Asset",
    "Asset - Fixed Asset",
    "Asset - Inventory",
    "Asset - Non-current Asset",
    "Equity - Shareholders Equity",
    "Expense - Direct Costs",
    "Expense - Operating Expense",
    "Expense - Other Expense",
    "Liability - Current Liability",
    "Liability - Non-current Liability",
    "Revenue - Operating Revenue",
    "Revenue - Other Revenue",
];

/// Chart-of-accounts categories offered to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<String>,
}

impl Taxonomy {
    pub fn new(categories: impl IntoIterator<Item = String>) -> Self {
        Self {
            categories: categories.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|c| c.to_string()))
    }
}
