//! CertLedger entitlement ledger core
//!
//! Authority-controlled registry that mints, tracks, restricts and retires
//! entitlement records bound to holder identities:
//!
//! - [`EntitlementLedger`]: supply-capped badges, achievements and workshop
//!   sessions held as per-holder balances.
//! - [`CertificateLedger`]: single-issuance, soulbound certificates keyed by a
//!   content fingerprint.
//!
//! Access control, the pause flag, the clock and event delivery are
//! collaborators supplied through [`LedgerEnv`].

pub mod access;
pub mod allocator;
pub mod certificates;
pub mod clock;
pub mod config;
pub mod env;
pub mod errors;
pub mod events;
pub mod guard;
pub mod issuance;
pub mod ownership;
pub mod registry;
pub mod snapshot;
pub mod validity;

pub use access::{AccessControl, PauseState, PauseSwitch, Role, RoleTable};
pub use allocator::IdAllocator;
pub use certificates::{CertificateLedger, CertificateState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use env::LedgerEnv;
pub use errors::*;
pub use events::{EventSink, LedgerEvent, MemoryEventSink, NullEventSink, TracingEventSink};
pub use guard::{Movement, TransferRule};
pub use issuance::{EntitlementLedger, EntitlementState};
pub use ownership::{FingerprintIndex, OwnershipIndex};
pub use registry::TypeRegistry;
pub use snapshot::{CredentialLedger, LedgerSnapshot};
pub use validity::Validity;
