//! Entitlement type definitions and per-holder balances.

use crate::{Category, EntitlementId, Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// Supply cap applied to special achievements, by rarity tier.
///
/// Tier 1 is the most common; anything outside 1..=3 is treated as the
/// rarest tier.
pub const fn special_supply_cap(rarity_tier: u8) -> u64 {
    match rarity_tier {
        1 => 100,
        2 => 50,
        3 => 25,
        _ => 10,
    }
}

/// Immutable definition of an issuable entitlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementType {
    /// Category-tagged identifier
    pub id: EntitlementId,
    pub name: String,
    pub category: Category,
    /// Supply cap (`None` = unbounded)
    pub max_supply: Option<u64>,
    /// Whether principal-to-principal movement is allowed
    pub transferable: bool,
    /// Absolute expiry (`None` = never expires)
    pub valid_until: Option<Timestamp>,
    /// Principal that created the type
    pub issuer: Principal,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Set once the type stops accepting new mints
    pub retired_at: Option<Timestamp>,
}

impl EntitlementType {
    /// An entry of this type is expired strictly after `valid_until`
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.valid_until, Some(until) if now > until)
    }

    pub fn is_retired(&self) -> bool {
        self.retired_at.is_some()
    }

    /// Units still mintable given the current supply (`None` = unbounded)
    pub fn remaining_supply(&self, current_supply: u64) -> Option<u64> {
        self.max_supply.map(|cap| cap.saturating_sub(current_supply))
    }

    /// Whether minting `amount` more units stays within the cap
    pub fn admits(&self, current_supply: u64, amount: u64) -> bool {
        match (self.max_supply, current_supply.checked_add(amount)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(cap), Some(total)) => total <= cap,
        }
    }
}

/// Caller-supplied parameters for creating an entitlement type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub max_supply: Option<u64>,
    #[serde(default)]
    pub transferable: bool,
    #[serde(default)]
    pub valid_until: Option<Timestamp>,
    /// Opaque metadata URI stored alongside the type
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

impl TypeDefinition {
    /// Unbounded, non-transferable, non-expiring definition
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            max_supply: None,
            transferable: false,
            valid_until: None,
            metadata_uri: None,
        }
    }

    pub fn with_max_supply(mut self, cap: u64) -> Self {
        self.max_supply = Some(cap);
        self
    }

    pub fn transferable(mut self, transferable: bool) -> Self {
        self.transferable = transferable;
        self
    }

    pub fn valid_until(mut self, until: Timestamp) -> Self {
        self.valid_until = Some(until);
        self
    }

    pub fn with_metadata_uri(mut self, uri: impl Into<String>) -> Self {
        self.metadata_uri = Some(uri.into());
        self
    }
}

/// Quantity of one entitlement held by one principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingBalance {
    pub quantity: u64,
    /// First-acquisition time; kept across repeat issuance
    pub earned_at: Timestamp,
}
