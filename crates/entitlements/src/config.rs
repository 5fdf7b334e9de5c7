//! Ledger tuning knobs and their validation.

use crate::errors::{LedgerError, Result};
use certledger_types::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Recipients accepted by a single batch issuance
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Distance between two category base offsets
pub const DEFAULT_CATEGORY_SPAN: u64 = 1_000_000;

/// Ledger tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Upper bound on recipients per batch issuance
    pub max_batch_size: usize,
    /// Identifiers reserved per category
    pub category_span: u64,
    /// Categories the allocator hands out identifiers for
    pub categories: Vec<Category>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            category_span: DEFAULT_CATEGORY_SPAN,
            categories: Category::ALL.to_vec(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_batch_size must be at least 1".into(),
            ));
        }
        if self.category_span == 0 {
            return Err(LedgerError::InvalidConfig(
                "category_span must be at least 1".into(),
            ));
        }
        // Highest base plus its span must stay addressable.
        let slots = Category::ALL.len() as u64 + 1;
        if self.category_span.checked_mul(slots).is_none() {
            return Err(LedgerError::InvalidConfig(format!(
                "category_span {} overflows the identifier space",
                self.category_span
            )));
        }
        if self.categories.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "at least one category must be enabled".into(),
            ));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category) {
                return Err(LedgerError::InvalidConfig(format!(
                    "category {category} listed twice"
                )));
            }
        }
        Ok(())
    }
}
