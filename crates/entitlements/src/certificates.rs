//! Single-issuance certificate ledger.
//!
//! Certificates are soulbound: they only ever move by mint or burn. At most
//! one live certificate exists per `(recipient_name, course, issuer)`
//! fingerprint; burning a certificate frees its fingerprint while its
//! identifier stays retired forever.

use crate::access::Role;
use crate::env::LedgerEnv;
use crate::errors::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::guard::{Movement, TransferRule};
use crate::ownership::{FingerprintIndex, OwnershipIndex};
use crate::validity::{evaluate_certificate, Validity};
use certledger_types::{
    Category, CertificateFields, CertificateRecord, CertificateRequest, EntitlementId, Principal,
    DEFAULT_CERTIFICATE_CATEGORY,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Complete logical state of the certificate ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateState {
    /// Next identifier to hand out; never decreases
    next_id: EntitlementId,
    records: BTreeMap<EntitlementId, CertificateRecord>,
    fingerprints: FingerprintIndex,
    ownership: OwnershipIndex,
}

impl CertificateState {
    /// Identifiers handed out so far, including burned ones
    pub fn issued(&self) -> u64 {
        self.next_id
    }

    /// Certificates not yet burned
    pub fn live(&self) -> usize {
        self.records.len()
    }

    fn record(&self, id: EntitlementId) -> Result<&CertificateRecord> {
        self.records
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("certificate {id}")))
    }
}

pub struct CertificateLedger {
    state: RwLock<CertificateState>,
    env: LedgerEnv,
}

impl CertificateLedger {
    pub fn new(env: LedgerEnv) -> Self {
        Self::from_snapshot(env, CertificateState::default())
    }

    pub fn from_snapshot(env: LedgerEnv, state: CertificateState) -> Self {
        Self {
            state: RwLock::new(state),
            env,
        }
    }

    pub fn snapshot(&self) -> CertificateState {
        self.state.read().clone()
    }

    /// Mint a certificate to `holder`; fails on a live duplicate fingerprint
    pub fn issue(
        &self,
        caller: &Principal,
        holder: &Principal,
        request: CertificateRequest,
    ) -> Result<EntitlementId> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Issuer)?;
        if holder.is_blank() {
            return Err(LedgerError::InvalidArgument(
                "principal must not be blank".into(),
            ));
        }
        if let Some(field) = request.fields.first_blank_field() {
            return Err(LedgerError::InvalidArgument(format!(
                "certificate field {field} must not be empty"
            )));
        }
        let category = if request.category.trim().is_empty() {
            DEFAULT_CERTIFICATE_CATEGORY.to_string()
        } else {
            request.category
        };

        let fingerprint = request.fields.fingerprint();
        let now = self.env.now();
        let id = {
            let mut state = self.state.write();
            state.fingerprints.ensure_vacant(&fingerprint)?;
            let id = state.next_id;
            let next = id.checked_add(1).ok_or(LedgerError::CategoryExhausted {
                category: Category::Certificate,
            })?;
            TransferRule::Soulbound.check(&Movement::mint(holder, id, 1), false)?;

            state.fingerprints.claim(fingerprint, id)?;
            state.ownership.record_acquisition(holder, id);
            state.records.insert(
                id,
                CertificateRecord {
                    id,
                    holder: holder.clone(),
                    fields: request.fields,
                    category,
                    issued_at: now,
                    valid: true,
                    revoked_at: None,
                    metadata_uri: request.metadata_uri,
                    fingerprint,
                },
            );
            state.next_id = next;
            id
        };

        info!(id, holder = %holder, fingerprint = %fingerprint, "Issued certificate");
        self.env.emit(LedgerEvent::Issued {
            id,
            holder: holder.clone(),
            amount: 1,
            operator: caller.clone(),
        });
        Ok(id)
    }

    /// Soft-invalidate a certificate; the record and its fingerprint stay
    pub fn revoke(&self, caller: &Principal, id: EntitlementId) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Issuer)?;

        let now = self.env.now();
        let holder = {
            let mut state = self.state.write();
            let record = state
                .records
                .get_mut(&id)
                .ok_or_else(|| LedgerError::NotFound(format!("certificate {id}")))?;
            if !record.valid {
                return Err(LedgerError::AlreadyRevoked { id });
            }
            record.valid = false;
            record.revoked_at = Some(now);
            record.holder.clone()
        };

        info!(id, holder = %holder, "Revoked certificate");
        self.env.emit(LedgerEvent::Revoked {
            id,
            holder,
            operator: caller.clone(),
        });
        Ok(())
    }

    /// Hard-delete a certificate, freeing its fingerprint
    pub fn burn(&self, caller: &Principal, id: EntitlementId) -> Result<()> {
        self.env.ensure_active()?;

        let holder = {
            let mut state = self.state.write();
            let record = state.record(id)?;
            let holder = record.holder.clone();
            let fingerprint = record.fingerprint;
            self.env
                .require_holder_or_role(caller, &holder, Role::Issuer)?;
            TransferRule::Soulbound.check(&Movement::burn(&holder, id, 1), false)?;

            state.records.remove(&id);
            state.fingerprints.release(&fingerprint, id);
            state.ownership.remove_acquisition(&holder, id);
            holder
        };

        info!(id, holder = %holder, "Burned certificate");
        self.env.emit(LedgerEvent::Burned {
            id,
            holder,
            amount: 1,
            operator: caller.clone(),
        });
        Ok(())
    }

    /// Always fails: certificates never move between holders
    pub fn transfer(
        &self,
        caller: &Principal,
        from: &Principal,
        to: &Principal,
        id: EntitlementId,
    ) -> Result<()> {
        self.env.ensure_active()?;
        debug!(caller = %caller, id, "Certificate transfer attempted");
        TransferRule::Soulbound.check(&Movement::transfer(from, to, id, 1), false)?;
        Err(LedgerError::NonTransferable { id })
    }

    /// Whether `holder` holds certificate `id` and it has not been revoked
    pub fn is_valid(&self, holder: &Principal, id: EntitlementId) -> Result<Validity> {
        let state = self.state.read();
        let record = state
            .records
            .get(&id)
            .ok_or(LedgerError::UnknownType { id })?;
        Ok(evaluate_certificate(record, holder))
    }

    pub fn certificate(&self, id: EntitlementId) -> Result<CertificateRecord> {
        self.state.read().record(id).cloned()
    }

    /// Identifiers of live certificates held by `holder`
    pub fn certificates_of(&self, holder: &Principal) -> Vec<EntitlementId> {
        self.state.read().ownership.list_held(holder)
    }

    /// Live certificate issued for exactly these fields, if any
    pub fn lookup(&self, fields: &CertificateFields) -> Option<EntitlementId> {
        self.state.read().fingerprints.lookup(&fields.fingerprint())
    }

    pub fn uri(&self, id: EntitlementId) -> Result<String> {
        let state = self.state.read();
        state
            .record(id)?
            .metadata_uri
            .clone()
            .ok_or_else(|| LedgerError::NotFound(format!("metadata URI for certificate {id}")))
    }
}
