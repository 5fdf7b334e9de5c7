//! Entitlement type registry.
//!
//! Definitions are immutable once created. Corrections are made by creating
//! a superseding type; the only state transition is retirement, which stops
//! further mints without touching issued entries.

use crate::allocator::IdAllocator;
use crate::errors::{LedgerError, Result};
use certledger_types::{EntitlementId, EntitlementType, Principal, Timestamp, TypeDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: BTreeMap<EntitlementId, EntitlementType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject definitions that could never be issued meaningfully
    pub fn validate(definition: &TypeDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(LedgerError::InvalidArgument(
                "entitlement name must not be empty".into(),
            ));
        }
        if definition.max_supply == Some(0) {
            return Err(LedgerError::InvalidArgument(
                "max_supply must be at least 1 when set; omit it for unbounded supply".into(),
            ));
        }
        Ok(())
    }

    /// Allocate an identifier and store the definition
    pub fn create(
        &mut self,
        allocator: &mut IdAllocator,
        definition: &TypeDefinition,
        issuer: &Principal,
        now: Timestamp,
    ) -> Result<&EntitlementType> {
        Self::validate(definition)?;
        let id = allocator.allocate(definition.category)?;
        let entitlement = EntitlementType {
            id,
            name: definition.name.trim().to_string(),
            category: definition.category,
            max_supply: definition.max_supply,
            transferable: definition.transferable,
            valid_until: definition.valid_until,
            issuer: issuer.clone(),
            created_at: now,
            retired_at: None,
        };
        Ok(self.types.entry(id).or_insert(entitlement))
    }

    pub fn get(&self, id: EntitlementId) -> Result<&EntitlementType> {
        self.types
            .get(&id)
            .ok_or(LedgerError::UnknownType { id })
    }

    pub fn contains(&self, id: EntitlementId) -> bool {
        self.types.contains_key(&id)
    }

    /// Stop further mints of `id`
    pub fn retire(&mut self, id: EntitlementId, now: Timestamp) -> Result<&EntitlementType> {
        let entitlement = self
            .types
            .get_mut(&id)
            .ok_or(LedgerError::UnknownType { id })?;
        if entitlement.is_retired() {
            return Err(LedgerError::TypeRetired { id });
        }
        entitlement.retired_at = Some(now);
        Ok(entitlement)
    }

    /// All definitions in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &EntitlementType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
