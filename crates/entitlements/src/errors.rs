//! Error types for the entitlement ledger

use crate::access::Role;
use certledger_types::{Category, EntitlementId, Principal};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid category: {category}")]
    InvalidCategory { category: String },

    #[error("Category {category} has no identifiers left")]
    CategoryExhausted { category: Category },

    #[error("Unknown entitlement type: {id}")]
    UnknownType { id: EntitlementId },

    #[error("Duplicate entry: fingerprint {fingerprint} already issued as {existing}")]
    DuplicateEntry {
        fingerprint: String,
        existing: EntitlementId,
    },

    #[error("Supply exceeded for {id}: {current} issued, {requested} requested, cap {cap}")]
    SupplyExceeded {
        id: EntitlementId,
        current: u64,
        requested: u64,
        cap: u64,
    },

    #[error("Batch too large: {size} recipients exceeds limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Entitlement {id} is non-transferable")]
    NonTransferable { id: EntitlementId },

    #[error("Unauthorized: {principal} requires {required}")]
    NotAuthorized {
        principal: Principal,
        required: Requirement,
    },

    #[error("System paused: mutations are disabled")]
    SystemPaused,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient balance of {id} for {holder}: holds {available}, needs {requested}")]
    InsufficientBalance {
        id: EntitlementId,
        holder: Principal,
        available: u64,
        requested: u64,
    },

    #[error("Entitlement type {id} is retired")]
    TypeRetired { id: EntitlementId },

    #[error("Certificate {id} is already revoked")]
    AlreadyRevoked { id: EntitlementId },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What a caller would have needed for a rejected mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Role(Role),
    /// Caller must be the affected holder
    Holder,
    /// Caller must be the affected holder or hold the role
    HolderOrRole(Role),
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Requirement::Role(role) => write!(f, "role {role}"),
            Requirement::Holder => f.write_str("holder"),
            Requirement::HolderOrRole(role) => write!(f, "holder or role {role}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
