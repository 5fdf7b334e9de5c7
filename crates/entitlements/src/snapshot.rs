//! Whole-ledger export and import.
//!
//! The persisted shape is the logical key-value layout of both ledgers:
//! types by id, balances by id and holder, supply, fingerprint index,
//! ownership index, category counters and metadata URIs.

use crate::certificates::{CertificateLedger, CertificateState};
use crate::config::LedgerConfig;
use crate::env::LedgerEnv;
use crate::errors::{LedgerError, Result};
use crate::issuance::{EntitlementLedger, EntitlementState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Format marker written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub entitlements: EntitlementState,
    pub certificates: CertificateState,
}

impl LedgerSnapshot {
    /// Empty state for a fresh deployment
    pub fn empty(config: &LedgerConfig) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            entitlements: EntitlementState::new(config),
            certificates: CertificateState::default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LedgerError::InvalidConfig(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        debug!(version = snapshot.version, "Decoded ledger snapshot");
        Ok(snapshot)
    }
}

/// Both ledgers sharing one environment
pub struct CredentialLedger {
    pub entitlements: EntitlementLedger,
    pub certificates: CertificateLedger,
}

impl CredentialLedger {
    pub fn new(config: LedgerConfig, env: LedgerEnv) -> Result<Self> {
        let snapshot = LedgerSnapshot::empty(&config);
        Self::from_snapshot(config, env, snapshot)
    }

    pub fn from_snapshot(
        config: LedgerConfig,
        env: LedgerEnv,
        snapshot: LedgerSnapshot,
    ) -> Result<Self> {
        Ok(Self {
            entitlements: EntitlementLedger::from_snapshot(
                config,
                env.clone(),
                snapshot.entitlements,
            )?,
            certificates: CertificateLedger::from_snapshot(env, snapshot.certificates),
        })
    }

    /// Export both ledgers. Each half is internally consistent; callers
    /// wanting a cross-ledger point in time must quiesce writers first.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            entitlements: self.entitlements.snapshot(),
            certificates: self.certificates.snapshot(),
        }
    }
}
