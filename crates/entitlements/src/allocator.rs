//! Identifier allocation.
//!
//! The identifier space is split into one window per category:
//! `[(index + 1) * span, (index + 2) * span)`. Each window owns an
//! independent counter. Identifiers are never reused, even after burn.

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};
use certledger_types::{Category, EntitlementId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    span: u64,
    /// Next unused offset within each enabled category
    next: BTreeMap<Category, u64>,
}

impl IdAllocator {
    pub fn new(span: u64, categories: &[Category]) -> Self {
        Self {
            span,
            next: categories.iter().map(|c| (*c, 0)).collect(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.category_span, &config.categories)
    }

    /// First identifier of `category`
    pub fn base(&self, category: Category) -> Result<EntitlementId> {
        if !self.next.contains_key(&category) {
            return Err(LedgerError::InvalidCategory {
                category: category.to_string(),
            });
        }
        Ok(self.span.saturating_mul(category.index() + 1))
    }

    /// Hand out the next unused identifier in `category`
    pub fn allocate(&mut self, category: Category) -> Result<EntitlementId> {
        let base = self.base(category)?;
        let span = self.span;
        let offset = self
            .next
            .get_mut(&category)
            .ok_or_else(|| LedgerError::InvalidCategory {
                category: category.to_string(),
            })?;
        if *offset >= span {
            return Err(LedgerError::CategoryExhausted { category });
        }
        let id = base + *offset;
        *offset += 1;
        Ok(id)
    }

    /// Identifier the next `allocate(category)` would return
    pub fn peek(&self, category: Category) -> Result<EntitlementId> {
        let base = self.base(category)?;
        Ok(base + self.next.get(&category).copied().unwrap_or_default())
    }

    /// Number of identifiers handed out in `category`
    pub fn issued(&self, category: Category) -> u64 {
        self.next.get(&category).copied().unwrap_or_default()
    }
}
