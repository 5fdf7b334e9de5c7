//! Capability and pause collaborators consulted before every mutation.
//!
//! Role administration lives outside the ledger; the core only asks
//! "does this principal hold role R?" and "is the system paused?".

use certledger_types::Principal;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Privileged capability checked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates, retires and annotates entitlement types
    Admin,
    /// Issues balances, batches and special achievements
    Minter,
    /// Issues and revokes certificates
    Issuer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Minter => "minter",
            Role::Issuer => "issuer",
        };
        f.write_str(name)
    }
}

/// External access-control collaborator
pub trait AccessControl: Send + Sync {
    fn has_role(&self, principal: &Principal, role: Role) -> bool;
}

/// External pause flag
pub trait PauseState: Send + Sync {
    fn is_paused(&self) -> bool;
}

/// In-memory role assignments
#[derive(Debug, Default)]
pub struct RoleTable {
    grants: RwLock<HashMap<Role, HashSet<Principal>>>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a role; returns false if the principal already held it
    pub fn grant(&self, principal: Principal, role: Role) -> bool {
        self.grants.write().entry(role).or_default().insert(principal)
    }

    /// Revoke a role; returns false if the principal did not hold it
    pub fn revoke(&self, principal: &Principal, role: Role) -> bool {
        self.grants
            .write()
            .get_mut(&role)
            .map(|members| members.remove(principal))
            .unwrap_or(false)
    }
}

impl AccessControl for RoleTable {
    fn has_role(&self, principal: &Principal, role: Role) -> bool {
        self.grants
            .read()
            .get(&role)
            .is_some_and(|members| members.contains(principal))
    }
}

/// Atomic pause flag
#[derive(Debug, Default)]
pub struct PauseSwitch {
    paused: AtomicBool,
}

impl PauseSwitch {
    pub fn new(paused: bool) -> Self {
        Self {
            paused: AtomicBool::new(paused),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl PauseState for PauseSwitch {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
