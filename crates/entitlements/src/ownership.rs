//! Holder enumeration and duplicate-issuance indexes.

use crate::errors::{LedgerError, Result};
use certledger_types::{EntitlementId, Fingerprint, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-holder list of acquired identifiers.
///
/// Append-only apart from burn cleanup. A holder that acquires the same
/// identifier twice is listed twice; balances, not this index, are the
/// source of truth for what a holder owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipIndex {
    held: HashMap<Principal, Vec<EntitlementId>>,
}

impl OwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_acquisition(&mut self, holder: &Principal, id: EntitlementId) {
        self.held.entry(holder.clone()).or_default().push(id);
    }

    /// Point-in-time copy of the holder's identifiers
    pub fn list_held(&self, holder: &Principal) -> Vec<EntitlementId> {
        self.held.get(holder).cloned().unwrap_or_default()
    }

    /// Remove the first entry for `id`; no-op when absent.
    ///
    /// Order is not preserved (swap-remove).
    pub fn remove_acquisition(&mut self, holder: &Principal, id: EntitlementId) -> bool {
        let Some(list) = self.held.get_mut(holder) else {
            return false;
        };
        let Some(pos) = list.iter().position(|held| *held == id) else {
            return false;
        };
        list.swap_remove(pos);
        if list.is_empty() {
            self.held.remove(holder);
        }
        true
    }
}

/// Fingerprint → live record identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintIndex {
    entries: HashMap<Fingerprint, EntitlementId>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `DuplicateEntry` if the fingerprint is already live
    pub fn ensure_vacant(&self, fingerprint: &Fingerprint) -> Result<()> {
        match self.entries.get(fingerprint) {
            Some(existing) => Err(LedgerError::DuplicateEntry {
                fingerprint: fingerprint.to_hex(),
                existing: *existing,
            }),
            None => Ok(()),
        }
    }

    pub fn claim(&mut self, fingerprint: Fingerprint, id: EntitlementId) -> Result<()> {
        self.ensure_vacant(&fingerprint)?;
        self.entries.insert(fingerprint, id);
        Ok(())
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<EntitlementId> {
        self.entries.get(fingerprint).copied()
    }

    /// Release the fingerprint only if it still points at `id`
    pub fn release(&mut self, fingerprint: &Fingerprint, id: EntitlementId) -> bool {
        if self.entries.get(fingerprint) == Some(&id) {
            self.entries.remove(fingerprint);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
