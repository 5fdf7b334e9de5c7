//! Issuance engine for supply-capped, multi-holder entitlements.
//!
//! All state lives behind a single lock: a mutation holds the write guard
//! from its first check to its last sub-mutation, so concurrent callers are
//! strictly serialized and readers only ever see committed state. Each
//! operation validates everything up front and then commits with
//! infallible steps, so a failed call leaves the ledger untouched.

use crate::access::Role;
use crate::allocator::IdAllocator;
use crate::config::LedgerConfig;
use crate::env::LedgerEnv;
use crate::errors::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::guard::{Movement, TransferRule};
use crate::ownership::OwnershipIndex;
use crate::registry::TypeRegistry;
use crate::validity::{evaluate_holding, Validity};
use certledger_types::{
    special_supply_cap, Category, EntitlementId, EntitlementType, HoldingBalance, Principal,
    Timestamp, TypeDefinition,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Category used for types minted through [`EntitlementLedger::grant_special`]
pub const SPECIAL_CATEGORY: Category = Category::Achievement;

/// Complete logical state of the balance ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementState {
    allocator: IdAllocator,
    types: TypeRegistry,
    balances: BTreeMap<EntitlementId, HashMap<Principal, HoldingBalance>>,
    supply: BTreeMap<EntitlementId, u64>,
    ownership: OwnershipIndex,
    uris: BTreeMap<EntitlementId, String>,
}

impl EntitlementState {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            allocator: IdAllocator::from_config(config),
            types: TypeRegistry::new(),
            balances: BTreeMap::new(),
            supply: BTreeMap::new(),
            ownership: OwnershipIndex::new(),
            uris: BTreeMap::new(),
        }
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn current_supply(&self, id: EntitlementId) -> u64 {
        self.supply.get(&id).copied().unwrap_or_default()
    }

    fn holding(&self, holder: &Principal, id: EntitlementId) -> Option<&HoldingBalance> {
        self.balances.get(&id).and_then(|holders| holders.get(holder))
    }

    /// Type exists, is not retired and has room for `amount` more units
    fn ensure_mintable(&self, id: EntitlementId, amount: u64) -> Result<&EntitlementType> {
        let entitlement = self.types.get(id)?;
        if entitlement.is_retired() {
            return Err(LedgerError::TypeRetired { id });
        }
        let current = self.current_supply(id);
        if !entitlement.admits(current, amount) {
            return Err(LedgerError::SupplyExceeded {
                id,
                current,
                requested: amount,
                cap: entitlement.max_supply.unwrap_or(u64::MAX),
            });
        }
        Ok(entitlement)
    }

    /// Every precondition of `movement`, without mutating anything
    fn check_movement(&self, rule: TransferRule, movement: &Movement<'_>) -> Result<()> {
        let entitlement = self.types.get(movement.id)?;
        rule.check(movement, entitlement.transferable)?;
        if movement.amount == 0 {
            return Err(LedgerError::InvalidArgument("amount must be positive".into()));
        }
        match (movement.from, movement.to) {
            (None, _) => {
                self.ensure_mintable(movement.id, movement.amount)?;
            }
            (Some(from), to) => {
                if to == Some(from) {
                    return Err(LedgerError::InvalidArgument(
                        "sender and receiver are the same principal".into(),
                    ));
                }
                let available = self
                    .holding(from, movement.id)
                    .map(|h| h.quantity)
                    .ok_or_else(|| {
                        LedgerError::NotFound(format!(
                            "{} holds no entitlement {}",
                            from, movement.id
                        ))
                    })?;
                if available < movement.amount {
                    return Err(LedgerError::InsufficientBalance {
                        id: movement.id,
                        holder: from.clone(),
                        available,
                        requested: movement.amount,
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply a movement already accepted by `check_movement`
    fn commit_movement(&mut self, movement: &Movement<'_>, now: Timestamp) {
        if let Some(from) = movement.from {
            self.debit(from, movement.id, movement.amount);
        }
        if let Some(to) = movement.to {
            self.credit(to, movement.id, movement.amount, now);
        }
        let supply = self.supply.entry(movement.id).or_default();
        match (movement.from, movement.to) {
            (None, Some(_)) => *supply = supply.saturating_add(movement.amount),
            (Some(_), None) => *supply = supply.saturating_sub(movement.amount),
            _ => {}
        }
    }

    fn credit(&mut self, holder: &Principal, id: EntitlementId, amount: u64, now: Timestamp) {
        let balance = self
            .balances
            .entry(id)
            .or_default()
            .entry(holder.clone())
            .or_insert(HoldingBalance {
                quantity: 0,
                earned_at: now,
            });
        balance.quantity = balance.quantity.saturating_add(amount);
        self.ownership.record_acquisition(holder, id);
    }

    fn debit(&mut self, holder: &Principal, id: EntitlementId, amount: u64) {
        let Some(holders) = self.balances.get_mut(&id) else {
            return;
        };
        if let Some(balance) = holders.get_mut(holder) {
            balance.quantity = balance.quantity.saturating_sub(amount);
            if balance.quantity == 0 {
                holders.remove(holder);
                self.ownership.remove_acquisition(holder, id);
            }
        }
        if holders.is_empty() {
            self.balances.remove(&id);
        }
    }
}

/// Supply-capped badge/achievement/workshop ledger
pub struct EntitlementLedger {
    state: RwLock<EntitlementState>,
    env: LedgerEnv,
    config: LedgerConfig,
}

impl EntitlementLedger {
    /// Create an empty ledger
    pub fn new(config: LedgerConfig, env: LedgerEnv) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(EntitlementState::new(&config)),
            env,
            config,
        })
    }

    /// Resume from previously exported state
    pub fn from_snapshot(
        config: LedgerConfig,
        env: LedgerEnv,
        state: EntitlementState,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(state),
            env,
            config,
        })
    }

    /// Consistent copy of the full state
    pub fn snapshot(&self) -> EntitlementState {
        self.state.read().clone()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Register a new entitlement type and return its identifier
    pub fn create_type(
        &self,
        caller: &Principal,
        definition: TypeDefinition,
    ) -> Result<EntitlementId> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Admin)?;
        TypeRegistry::validate(&definition)?;

        let now = self.env.now();
        let event = {
            let mut state = self.state.write();
            let state = &mut *state;
            let created = state
                .types
                .create(&mut state.allocator, &definition, caller, now)?;
            let event = LedgerEvent::TypeCreated {
                id: created.id,
                name: created.name.clone(),
                category: created.category,
                max_supply: created.max_supply,
                issuer: caller.clone(),
            };
            if let Some(uri) = definition.metadata_uri {
                state.uris.insert(created.id, uri);
            }
            event
        };

        let id = event.entitlement_id();
        info!(
            id,
            name = %definition.name,
            category = %definition.category,
            "Created entitlement type"
        );
        self.env.emit(event);
        Ok(id)
    }

    /// Stop further mints of `id`; existing entries are untouched
    pub fn retire_type(&self, caller: &Principal, id: EntitlementId) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Admin)?;
        let now = self.env.now();
        self.state.write().types.retire(id, now)?;

        info!(id, "Retired entitlement type");
        self.env.emit(LedgerEvent::TypeRetired {
            id,
            operator: caller.clone(),
        });
        Ok(())
    }

    pub fn get_type(&self, id: EntitlementId) -> Result<EntitlementType> {
        self.state.read().types.get(id).cloned()
    }

    /// All registered types in identifier order
    pub fn list_types(&self) -> Vec<EntitlementType> {
        self.state.read().types.iter().cloned().collect()
    }

    pub fn exists(&self, id: EntitlementId) -> bool {
        self.state.read().types.contains(id)
    }

    /// Mint `amount` units of `id` to `holder`
    pub fn issue_balance(
        &self,
        caller: &Principal,
        holder: &Principal,
        id: EntitlementId,
        amount: u64,
    ) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Minter)?;
        ensure_named(holder)?;

        let now = self.env.now();
        {
            let mut state = self.state.write();
            let movement = Movement::mint(holder, id, amount);
            state.check_movement(TransferRule::PerType, &movement)?;
            state.commit_movement(&movement, now);
        }

        info!(id, holder = %holder, amount, "Issued entitlement");
        self.env.emit(LedgerEvent::Issued {
            id,
            holder: holder.clone(),
            amount,
            operator: caller.clone(),
        });
        Ok(())
    }

    /// Mint `amount_each` units to every holder, or to none of them.
    ///
    /// The supply check covers the aggregate of the whole batch. Repeated
    /// holders are credited once per occurrence.
    pub fn batch_issue(
        &self,
        caller: &Principal,
        holders: &[Principal],
        id: EntitlementId,
        amount_each: u64,
    ) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Minter)?;
        if holders.len() > self.config.max_batch_size {
            return Err(LedgerError::BatchTooLarge {
                size: holders.len(),
                limit: self.config.max_batch_size,
            });
        }
        if holders.is_empty() {
            return Err(LedgerError::InvalidArgument("batch has no recipients".into()));
        }
        for holder in holders {
            ensure_named(holder)?;
        }
        if amount_each == 0 {
            return Err(LedgerError::InvalidArgument("amount must be positive".into()));
        }
        let total = amount_each
            .checked_mul(holders.len() as u64)
            .ok_or_else(|| LedgerError::InvalidArgument("batch total overflows".into()))?;

        let now = self.env.now();
        {
            let mut state = self.state.write();
            state.ensure_mintable(id, total)?;
            let movements: Vec<Movement<'_>> = holders
                .iter()
                .map(|holder| Movement::mint(holder, id, amount_each))
                .collect();
            for movement in &movements {
                state.check_movement(TransferRule::PerType, movement)?;
            }
            for movement in &movements {
                state.commit_movement(movement, now);
            }
        }

        info!(id, recipients = holders.len(), amount_each, "Batch issued entitlement");
        self.env.emit(LedgerEvent::BatchIssued {
            id,
            holders: holders.to_vec(),
            amount_each,
            operator: caller.clone(),
        });
        Ok(())
    }

    /// Create a one-off achievement type and mint a single unit of it.
    ///
    /// The supply cap follows the rarity tier; the type is soulbound.
    pub fn grant_special(
        &self,
        caller: &Principal,
        holder: &Principal,
        name: &str,
        rarity_tier: u8,
        valid_until: Option<Timestamp>,
    ) -> Result<EntitlementId> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Minter)?;
        ensure_named(holder)?;

        let mut definition = TypeDefinition::new(name, SPECIAL_CATEGORY)
            .with_max_supply(special_supply_cap(rarity_tier));
        definition.valid_until = valid_until;
        TypeRegistry::validate(&definition)?;

        let now = self.env.now();
        let created = {
            let mut state = self.state.write();
            let state = &mut *state;
            let created = state
                .types
                .create(&mut state.allocator, &definition, caller, now)?
                .clone();
            let movement = Movement::mint(holder, created.id, 1);
            state.check_movement(TransferRule::PerType, &movement)?;
            state.commit_movement(&movement, now);
            created
        };

        info!(id = created.id, holder = %holder, rarity_tier, "Granted special achievement");
        self.env.emit_all([
            LedgerEvent::TypeCreated {
                id: created.id,
                name: created.name.clone(),
                category: created.category,
                max_supply: created.max_supply,
                issuer: caller.clone(),
            },
            LedgerEvent::SpecialGranted {
                id: created.id,
                holder: holder.clone(),
                name: created.name,
                rarity_tier,
                operator: caller.clone(),
            },
        ]);
        Ok(created.id)
    }

    /// Destroy `amount` units held by `holder`
    pub fn burn(
        &self,
        caller: &Principal,
        holder: &Principal,
        id: EntitlementId,
        amount: u64,
    ) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_holder_or_role(caller, holder, Role::Minter)?;

        let now = self.env.now();
        {
            let mut state = self.state.write();
            let movement = Movement::burn(holder, id, amount);
            state.check_movement(TransferRule::PerType, &movement)?;
            state.commit_movement(&movement, now);
        }

        info!(id, holder = %holder, amount, "Burned entitlement");
        self.env.emit(LedgerEvent::Burned {
            id,
            holder: holder.clone(),
            amount,
            operator: caller.clone(),
        });
        Ok(())
    }

    /// Move units between holders; only types marked transferable may move
    pub fn transfer(
        &self,
        caller: &Principal,
        from: &Principal,
        to: &Principal,
        id: EntitlementId,
        amount: u64,
    ) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_holder(caller, from)?;
        ensure_named(to)?;

        let now = self.env.now();
        {
            let mut state = self.state.write();
            let movement = Movement::transfer(from, to, id, amount);
            state.check_movement(TransferRule::PerType, &movement)?;
            state.commit_movement(&movement, now);
        }

        info!(id, from = %from, to = %to, amount, "Transferred entitlement");
        self.env.emit(LedgerEvent::Transferred {
            id,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Whether `holder` currently holds a valid entry of `id`
    pub fn is_valid(&self, holder: &Principal, id: EntitlementId) -> Result<Validity> {
        let now = self.env.now();
        let state = self.state.read();
        let entitlement = state.types.get(id)?;
        let validity = evaluate_holding(entitlement, state.holding(holder, id), now);
        debug!(id, holder = %holder, valid = validity.valid, "Evaluated validity");
        Ok(validity)
    }

    /// Identifiers acquired by `holder`, one entry per acquisition
    pub fn list_held(&self, holder: &Principal) -> Vec<EntitlementId> {
        self.state.read().ownership.list_held(holder)
    }

    pub fn balance_of(&self, holder: &Principal, id: EntitlementId) -> u64 {
        self.holding(holder, id).map(|h| h.quantity).unwrap_or(0)
    }

    pub fn holding(&self, holder: &Principal, id: EntitlementId) -> Option<HoldingBalance> {
        self.state.read().holding(holder, id).copied()
    }

    /// Units of `id` currently in circulation
    pub fn total_supply(&self, id: EntitlementId) -> u64 {
        self.state.read().current_supply(id)
    }

    /// Store an opaque metadata URI for `id`
    pub fn set_uri(&self, caller: &Principal, id: EntitlementId, uri: &str) -> Result<()> {
        self.env.ensure_active()?;
        self.env.require_role(caller, Role::Admin)?;
        {
            let mut state = self.state.write();
            state.types.get(id)?;
            state.uris.insert(id, uri.to_string());
        }

        info!(id, "Updated metadata URI");
        self.env.emit(LedgerEvent::UriUpdated {
            id,
            uri: uri.to_string(),
        });
        Ok(())
    }

    pub fn uri(&self, id: EntitlementId) -> Result<String> {
        let state = self.state.read();
        state.types.get(id)?;
        state
            .uris
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("metadata URI for {id}")))
    }
}

fn ensure_named(principal: &Principal) -> Result<()> {
    if principal.is_blank() {
        return Err(LedgerError::InvalidArgument(
            "principal must not be blank".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{PauseSwitch, RoleTable};
    use crate::clock::ManualClock;
    use crate::events::MemoryEventSink;
    use std::sync::Arc;

    struct Harness {
        ledger: EntitlementLedger,
        clock: Arc<ManualClock>,
        pause: Arc<PauseSwitch>,
        events: Arc<MemoryEventSink>,
        admin: Principal,
        minter: Principal,
    }

    fn harness() -> Harness {
        let roles = Arc::new(RoleTable::new());
        let admin = Principal::new("@admin.univ");
        let minter = Principal::new("@minter.univ");
        roles.grant(admin.clone(), Role::Admin);
        roles.grant(minter.clone(), Role::Minter);
        let pause = Arc::new(PauseSwitch::default());
        let clock = Arc::new(ManualClock::new(1_000));
        let events = Arc::new(MemoryEventSink::new());
        let env = LedgerEnv::new(roles, pause.clone())
            .with_clock(clock.clone())
            .with_events(events.clone());
        let ledger = EntitlementLedger::new(LedgerConfig::default(), env).unwrap();
        Harness {
            ledger,
            clock,
            pause,
            events,
            admin,
            minter,
        }
    }

    fn badge(h: &Harness, cap: Option<u64>, transferable: bool) -> EntitlementId {
        let mut def = TypeDefinition::new("RustConf Speaker", Category::EventBadge)
            .transferable(transferable);
        def.max_supply = cap;
        h.ledger.create_type(&h.admin, def).unwrap()
    }

    #[test]
    fn test_create_type_uses_category_base() {
        let h = harness();
        let first = badge(&h, None, false);
        let second = badge(&h, None, false);
        assert_eq!(first, 2_000_000);
        assert_eq!(second, 2_000_001);

        let workshop = h
            .ledger
            .create_type(
                &h.admin,
                TypeDefinition::new("Async Rust", Category::Workshop)
                    .with_metadata_uri("ipfs://async"),
            )
            .unwrap();
        assert_eq!(workshop, 4_000_000);
        assert_eq!(h.ledger.uri(workshop).unwrap(), "ipfs://async");
        assert_eq!(h.ledger.list_types().len(), 3);
    }

    #[test]
    fn test_create_type_requires_admin() {
        let h = harness();
        let err = h
            .ledger
            .create_type(&h.minter, TypeDefinition::new("X", Category::Workshop))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized { .. }));
        assert!(h.ledger.list_types().is_empty());
    }

    #[test]
    fn test_supply_cap_scenario() {
        let h = harness();
        let id = badge(&h, Some(2), false);
        let (h1, h2, h3) = (Principal::new("h1"), Principal::new("h2"), Principal::new("h3"));

        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();
        h.ledger.issue_balance(&h.minter, &h2, id, 1).unwrap();
        let err = h.ledger.issue_balance(&h.minter, &h3, id, 1).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SupplyExceeded {
                current: 2,
                requested: 1,
                cap: 2,
                ..
            }
        ));
        assert_eq!(h.ledger.total_supply(id), 2);
        assert_eq!(h.ledger.balance_of(&h3, id), 0);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let h = harness();
        let err = h
            .ledger
            .issue_balance(&h.minter, &Principal::new("h1"), 2_999_999, 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownType { id: 2_999_999 }));
    }

    #[test]
    fn test_repeat_issuance_keeps_earned_at_and_lists_twice() {
        let h = harness();
        let id = badge(&h, None, false);
        let h1 = Principal::new("h1");

        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();
        h.clock.advance(500);
        h.ledger.issue_balance(&h.minter, &h1, id, 2).unwrap();

        let holding = h.ledger.holding(&h1, id).unwrap();
        assert_eq!(holding.quantity, 3);
        assert_eq!(holding.earned_at, 1_000);
        assert_eq!(h.ledger.list_held(&h1), vec![id, id]);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let h = harness();
        let id = badge(&h, Some(2), false);
        let holders: Vec<Principal> = ["h1", "h2", "h3"].into_iter().map(Principal::new).collect();

        let err = h.ledger.batch_issue(&h.minter, &holders, id, 1).unwrap_err();
        assert!(matches!(err, LedgerError::SupplyExceeded { requested: 3, .. }));
        for holder in &holders {
            assert_eq!(h.ledger.balance_of(holder, id), 0);
            assert!(h.ledger.list_held(holder).is_empty());
        }
        assert_eq!(h.ledger.total_supply(id), 0);

        h.ledger.batch_issue(&h.minter, &holders[..2], id, 1).unwrap();
        assert_eq!(h.ledger.total_supply(id), 2);
    }

    #[test]
    fn test_batch_size_limit() {
        let h = harness();
        let id = badge(&h, None, false);
        let holders: Vec<Principal> = (0..101).map(|i| Principal::new(format!("h{i}"))).collect();
        let err = h.ledger.batch_issue(&h.minter, &holders, id, 1).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BatchTooLarge {
                size: 101,
                limit: 100
            }
        ));
        h.ledger.batch_issue(&h.minter, &holders[..100], id, 1).unwrap();
        assert_eq!(h.ledger.total_supply(id), 100);
    }

    #[test]
    fn test_grant_special_tier_caps() {
        let h = harness();
        let h1 = Principal::new("h1");
        let id = h
            .ledger
            .grant_special(&h.minter, &h1, "First Commit", 2, Some(5_000))
            .unwrap();

        let ty = h.ledger.get_type(id).unwrap();
        assert_eq!(ty.category, Category::Achievement);
        assert_eq!(ty.max_supply, Some(50));
        assert!(!ty.transferable);
        assert_eq!(ty.issuer, h.minter);
        assert_eq!(h.ledger.balance_of(&h1, id), 1);

        let kinds: Vec<&str> = h.events.events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["type_created", "special_granted"]);
    }

    #[test]
    fn test_non_transferable_type_blocks_transfer_but_not_burn() {
        let h = harness();
        let id = badge(&h, None, false);
        let (h1, h2) = (Principal::new("h1"), Principal::new("h2"));
        h.ledger.issue_balance(&h.minter, &h1, id, 2).unwrap();

        let err = h.ledger.transfer(&h1, &h1, &h2, id, 1).unwrap_err();
        assert!(matches!(err, LedgerError::NonTransferable { .. }));
        assert_eq!(h.ledger.balance_of(&h1, id), 2);

        h.ledger.burn(&h1, &h1, id, 2).unwrap();
        assert_eq!(h.ledger.balance_of(&h1, id), 0);
        assert!(h.ledger.list_held(&h1).is_empty());
        assert_eq!(h.ledger.total_supply(id), 0);
    }

    #[test]
    fn test_transferable_type_moves_balance() {
        let h = harness();
        let id = badge(&h, Some(5), true);
        let (h1, h2) = (Principal::new("h1"), Principal::new("h2"));
        h.ledger.issue_balance(&h.minter, &h1, id, 3).unwrap();
        h.clock.advance(10);

        h.ledger.transfer(&h1, &h1, &h2, id, 3).unwrap();
        assert_eq!(h.ledger.balance_of(&h1, id), 0);
        assert_eq!(h.ledger.balance_of(&h2, id), 3);
        assert_eq!(h.ledger.holding(&h2, id).unwrap().earned_at, 1_010);
        assert_eq!(h.ledger.total_supply(id), 3);
        assert!(h.ledger.list_held(&h1).is_empty());
        assert_eq!(h.ledger.list_held(&h2), vec![id]);

        let err = h.ledger.transfer(&h1, &h2, &h1, id, 1).unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized { .. }));
    }

    #[test]
    fn test_burn_errors() {
        let h = harness();
        let id = badge(&h, None, false);
        let h1 = Principal::new("h1");

        assert!(matches!(
            h.ledger.burn(&h1, &h1, id, 1),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            h.ledger.burn(&h1, &h1, 77, 1),
            Err(LedgerError::UnknownType { id: 77 })
        ));

        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();
        assert!(matches!(
            h.ledger.burn(&h1, &h1, id, 2),
            Err(LedgerError::InsufficientBalance { available: 1, .. })
        ));
        assert!(matches!(
            h.ledger.burn(&Principal::new("mallory"), &h1, id, 1),
            Err(LedgerError::NotAuthorized { .. })
        ));
        h.ledger.burn(&h.minter, &h1, id, 1).unwrap();
        assert!(h.ledger.burn(&h1, &h1, id, 1).is_err());
    }

    #[test]
    fn test_validity_tracks_expiry() {
        let h = harness();
        let id = h
            .ledger
            .create_type(
                &h.admin,
                TypeDefinition::new("Summer School", Category::Workshop).valid_until(1_100),
            )
            .unwrap();
        let h1 = Principal::new("h1");

        assert_eq!(h.ledger.is_valid(&h1, id).unwrap(), Validity::absent());
        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();
        assert_eq!(
            h.ledger.is_valid(&h1, id).unwrap(),
            Validity {
                valid: true,
                earned_at: Some(1_000)
            }
        );

        h.clock.set(1_101);
        let expired = h.ledger.is_valid(&h1, id).unwrap();
        assert!(!expired.valid);
        assert_eq!(expired.earned_at, Some(1_000));
        assert!(matches!(
            h.ledger.is_valid(&h1, 5),
            Err(LedgerError::UnknownType { id: 5 })
        ));
    }

    #[test]
    fn test_retired_type_rejects_mints() {
        let h = harness();
        let id = badge(&h, None, false);
        let h1 = Principal::new("h1");
        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();
        h.ledger.retire_type(&h.admin, id).unwrap();

        assert!(matches!(
            h.ledger.issue_balance(&h.minter, &h1, id, 1),
            Err(LedgerError::TypeRetired { .. })
        ));
        assert!(h.ledger.is_valid(&h1, id).unwrap().valid);
        h.ledger.burn(&h1, &h1, id, 1).unwrap();
    }

    #[test]
    fn test_pause_blocks_mutations_not_reads() {
        let h = harness();
        let id = badge(&h, None, false);
        let h1 = Principal::new("h1");
        h.ledger.issue_balance(&h.minter, &h1, id, 1).unwrap();

        h.pause.pause();
        assert!(matches!(
            h.ledger.issue_balance(&h.minter, &h1, id, 1),
            Err(LedgerError::SystemPaused)
        ));
        assert!(matches!(
            h.ledger.create_type(&h.admin, TypeDefinition::new("Y", Category::Workshop)),
            Err(LedgerError::SystemPaused)
        ));
        assert!(matches!(
            h.ledger.burn(&h1, &h1, id, 1),
            Err(LedgerError::SystemPaused)
        ));
        assert!(h.ledger.is_valid(&h1, id).unwrap().valid);
        assert_eq!(h.ledger.list_held(&h1), vec![id]);
        assert!(h.ledger.get_type(id).is_ok());
    }

    #[test]
    fn test_uri_lookup() {
        let h = harness();
        let id = badge(&h, None, false);
        assert!(matches!(h.ledger.uri(id), Err(LedgerError::NotFound(_))));
        assert!(matches!(h.ledger.uri(1), Err(LedgerError::UnknownType { .. })));
        h.ledger.set_uri(&h.admin, id, "not even a url").unwrap();
        assert_eq!(h.ledger.uri(id).unwrap(), "not even a url");
        assert!(h.ledger.set_uri(&h.minter, id, "x").is_err());
    }

    #[test]
    fn test_snapshot_restores_counters() {
        let h = harness();
        let id = badge(&h, Some(3), false);
        h.ledger
            .issue_balance(&h.minter, &Principal::new("h1"), id, 2)
            .unwrap();

        let snapshot = h.ledger.snapshot();
        let env = LedgerEnv::new(Arc::new(RoleTable::new()), Arc::new(PauseSwitch::default()));
        let restored =
            EntitlementLedger::from_snapshot(LedgerConfig::default(), env, snapshot).unwrap();
        assert_eq!(restored.total_supply(id), 2);
        assert_eq!(
            restored.snapshot().allocator().peek(Category::EventBadge).unwrap(),
            id + 1
        );
    }
}
