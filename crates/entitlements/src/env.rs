//! Collaborators a ledger consults while executing an operation.

use crate::access::{AccessControl, PauseState, Role};
use crate::clock::{Clock, SystemClock};
use crate::errors::{LedgerError, Requirement, Result};
use crate::events::{EventSink, LedgerEvent, TracingEventSink};
use certledger_types::{Principal, Timestamp};
use std::sync::Arc;
use tracing::warn;

/// Access control, pause flag, clock and event sink bundled together.
///
/// Every mutating operation calls [`LedgerEnv::ensure_active`] first and
/// then one of the authorization checks, in that order.
#[derive(Clone)]
pub struct LedgerEnv {
    access: Arc<dyn AccessControl>,
    pause: Arc<dyn PauseState>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl LedgerEnv {
    /// Environment with the system clock and tracing-backed events
    pub fn new(access: Arc<dyn AccessControl>, pause: Arc<dyn PauseState>) -> Self {
        Self {
            access,
            pause,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Fail with `SystemPaused` while the pause flag is set
    pub fn ensure_active(&self) -> Result<()> {
        if self.pause.is_paused() {
            warn!("Rejected mutation: system paused");
            return Err(LedgerError::SystemPaused);
        }
        Ok(())
    }

    pub fn require_role(&self, caller: &Principal, role: Role) -> Result<()> {
        if self.access.has_role(caller, role) {
            return Ok(());
        }
        warn!(caller = %caller, %role, "Rejected mutation: missing role");
        Err(LedgerError::NotAuthorized {
            principal: caller.clone(),
            required: Requirement::Role(role),
        })
    }

    /// Caller must be `holder` itself, or hold `role`
    pub fn require_holder_or_role(
        &self,
        caller: &Principal,
        holder: &Principal,
        role: Role,
    ) -> Result<()> {
        if caller == holder || self.access.has_role(caller, role) {
            return Ok(());
        }
        warn!(caller = %caller, holder = %holder, %role, "Rejected mutation: not holder");
        Err(LedgerError::NotAuthorized {
            principal: caller.clone(),
            required: Requirement::HolderOrRole(role),
        })
    }

    pub fn require_holder(&self, caller: &Principal, holder: &Principal) -> Result<()> {
        if caller == holder {
            return Ok(());
        }
        warn!(caller = %caller, holder = %holder, "Rejected mutation: not holder");
        Err(LedgerError::NotAuthorized {
            principal: caller.clone(),
            required: Requirement::Holder,
        })
    }

    pub fn emit(&self, event: LedgerEvent) {
        self.events.emit(&event);
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = LedgerEvent>) {
        for event in events {
            self.events.emit(&event);
        }
    }
}
