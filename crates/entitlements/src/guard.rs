//! Transfer restriction gate.
//!
//! Every balance-changing operation is expressed as a [`Movement`] and passes
//! through [`TransferRule::check`] before any state changes. Mints (no
//! origin) and burns (no destination) always pass.

use crate::errors::{LedgerError, Result};
use certledger_types::{EntitlementId, Principal};
use tracing::warn;

/// A balance change from `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement<'a> {
    pub from: Option<&'a Principal>,
    pub to: Option<&'a Principal>,
    pub id: EntitlementId,
    pub amount: u64,
}

impl<'a> Movement<'a> {
    pub fn mint(to: &'a Principal, id: EntitlementId, amount: u64) -> Self {
        Self {
            from: None,
            to: Some(to),
            id,
            amount,
        }
    }

    pub fn burn(from: &'a Principal, id: EntitlementId, amount: u64) -> Self {
        Self {
            from: Some(from),
            to: None,
            id,
            amount,
        }
    }

    pub fn transfer(
        from: &'a Principal,
        to: &'a Principal,
        id: EntitlementId,
        amount: u64,
    ) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            id,
            amount,
        }
    }

    /// Principal-to-principal movement (neither mint nor burn)
    pub fn is_transfer(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }
}

/// How a ledger treats principal-to-principal movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRule {
    /// Honour the type's `transferable` flag
    PerType,
    /// Only mint and burn are ever permitted
    Soulbound,
}

impl TransferRule {
    pub fn check(self, movement: &Movement<'_>, transferable: bool) -> Result<()> {
        if movement.from.is_none() && movement.to.is_none() {
            return Err(LedgerError::InvalidArgument(
                "movement needs an origin or a destination".into(),
            ));
        }
        if !movement.is_transfer() {
            return Ok(());
        }
        let allowed = match self {
            TransferRule::PerType => transferable,
            TransferRule::Soulbound => false,
        };
        if allowed {
            Ok(())
        } else {
            warn!(id = movement.id, rule = ?self, "Rejected transfer of restricted entitlement");
            Err(LedgerError::NonTransferable { id: movement.id })
        }
    }
}
