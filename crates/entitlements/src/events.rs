//! Notification events for external indexing.
//!
//! Emission is fire-and-forget: sinks cannot fail a mutation and are
//! invoked only after the mutation has been committed.

use certledger_types::{Category, EntitlementId, Principal};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// `tracing` target used by [`TracingEventSink`]
pub const EVENT_TARGET: &str = "certledger::events";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    TypeCreated {
        id: EntitlementId,
        name: String,
        category: Category,
        max_supply: Option<u64>,
        issuer: Principal,
    },
    TypeRetired {
        id: EntitlementId,
        operator: Principal,
    },
    Issued {
        id: EntitlementId,
        holder: Principal,
        amount: u64,
        operator: Principal,
    },
    BatchIssued {
        id: EntitlementId,
        holders: Vec<Principal>,
        amount_each: u64,
        operator: Principal,
    },
    SpecialGranted {
        id: EntitlementId,
        holder: Principal,
        name: String,
        rarity_tier: u8,
        operator: Principal,
    },
    Revoked {
        id: EntitlementId,
        holder: Principal,
        operator: Principal,
    },
    Burned {
        id: EntitlementId,
        holder: Principal,
        amount: u64,
        operator: Principal,
    },
    Transferred {
        id: EntitlementId,
        from: Principal,
        to: Principal,
        amount: u64,
    },
    UriUpdated {
        id: EntitlementId,
        uri: String,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::TypeCreated { .. } => "type_created",
            LedgerEvent::TypeRetired { .. } => "type_retired",
            LedgerEvent::Issued { .. } => "issued",
            LedgerEvent::BatchIssued { .. } => "batch_issued",
            LedgerEvent::SpecialGranted { .. } => "special_granted",
            LedgerEvent::Revoked { .. } => "revoked",
            LedgerEvent::Burned { .. } => "burned",
            LedgerEvent::Transferred { .. } => "transferred",
            LedgerEvent::UriUpdated { .. } => "uri_updated",
        }
    }

    /// Identifier the event concerns
    pub fn entitlement_id(&self) -> EntitlementId {
        match self {
            LedgerEvent::TypeCreated { id, .. }
            | LedgerEvent::TypeRetired { id, .. }
            | LedgerEvent::Issued { id, .. }
            | LedgerEvent::BatchIssued { id, .. }
            | LedgerEvent::SpecialGranted { id, .. }
            | LedgerEvent::Revoked { id, .. }
            | LedgerEvent::Burned { id, .. }
            | LedgerEvent::Transferred { id, .. }
            | LedgerEvent::UriUpdated { id, .. } => *id,
        }
    }
}

/// Receiver of ledger notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Writes every event to the `certledger::events` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &LedgerEvent) {
        info!(
            target: EVENT_TARGET,
            kind = event.kind(),
            id = event.entitlement_id(),
            event = ?event,
            "ledger event"
        );
    }
}

/// Discards events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &LedgerEvent) {}
}

/// Keeps events in memory for inspection
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &LedgerEvent) {
        self.events.lock().push(event.clone());
    }
}
