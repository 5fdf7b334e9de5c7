//! Shared data model for the CertLedger workspace.
//!
//! Plain, serializable records used by the entitlement ledger core: holder
//! identities, identifier categories, type definitions, balances and
//! single-issuance certificate records.

pub mod category;
pub mod certificate;
pub mod entitlement;
pub mod fingerprint;
pub mod principal;

pub use category::*;
pub use certificate::*;
pub use entitlement::*;
pub use fingerprint::*;
pub use principal::*;

/// Identifier of an entitlement type (balance ledger) or certificate record.
pub type EntitlementId = u64;

/// Seconds since UNIX_EPOCH.
pub type Timestamp = u64;
