//! Ledger scenario tests
//!
//! End-to-end flows across both ledgers:
//! - Certificate uniqueness, revocation and reissue after burn
//! - Supply caps on single and batch issuance
//! - Transfer restriction for soulbound entries
//! - Strict serialization under concurrent issuance
//!
//! Run with: cargo test -p certledger-entitlements --test ledger_scenarios

use certledger_entitlements::{
    Clock, CredentialLedger, LedgerConfig, LedgerEnv, LedgerError, LedgerEvent, ManualClock,
    MemoryEventSink, PauseSwitch, Role, RoleTable, Validity,
};
use certledger_types::{
    Category, CertificateFields, CertificateRequest, EntitlementId, Principal, TypeDefinition,
};
use std::sync::Arc;
use std::thread;

// =============================================================================
// TEST HELPERS
// =============================================================================

struct World {
    ledger: Arc<CredentialLedger>,
    clock: Arc<ManualClock>,
    events: Arc<MemoryEventSink>,
    admin: Principal,
    minter: Principal,
    registrar: Principal,
}

fn world() -> World {
    let roles = Arc::new(RoleTable::new());
    let admin = Principal::new("@admin.univ");
    let minter = Principal::new("@minter.univ");
    let registrar = Principal::new("@registrar.univ");
    roles.grant(admin.clone(), Role::Admin);
    roles.grant(minter.clone(), Role::Minter);
    roles.grant(registrar.clone(), Role::Issuer);

    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let events = Arc::new(MemoryEventSink::new());
    let env = LedgerEnv::new(roles, Arc::new(PauseSwitch::default()))
        .with_clock(clock.clone())
        .with_events(events.clone());
    let ledger = CredentialLedger::new(LedgerConfig::default(), env).unwrap();

    World {
        ledger: Arc::new(ledger),
        clock,
        events,
        admin,
        minter,
        registrar,
    }
}

fn capped_badge(w: &World, cap: u64) -> EntitlementId {
    w.ledger
        .entitlements
        .create_type(
            &w.admin,
            TypeDefinition::new("Open Source Day", Category::EventBadge).with_max_supply(cap),
        )
        .unwrap()
}

fn holders(names: &[&str]) -> Vec<Principal> {
    names.iter().map(|n| Principal::new(*n)).collect()
}

// =============================================================================
// CERTIFICATES
// =============================================================================

#[test]
fn test_certificate_lifecycle_scenario() {
    let w = world();
    let certs = &w.ledger.certificates;
    let h1 = Principal::new("H1");
    let request = || CertificateRequest::new(CertificateFields::new("Ana", "CS101", "Univ"));
    let t0 = w.clock.now();

    let id = certs.issue(&w.registrar, &h1, request()).unwrap();
    assert_eq!(id, 0);

    let dup = certs.issue(&w.registrar, &h1, request()).unwrap_err();
    assert!(matches!(dup, LedgerError::DuplicateEntry { .. }));

    w.clock.advance(3_600);
    certs.revoke(&w.registrar, 0).unwrap();
    assert_eq!(
        certs.is_valid(&h1, 0).unwrap(),
        Validity {
            valid: false,
            earned_at: Some(t0)
        }
    );

    certs.burn(&w.registrar, 0).unwrap();
    let reissued = certs.issue(&w.registrar, &h1, request()).unwrap();
    assert_ne!(reissued, 0);
    assert!(certs.is_valid(&h1, reissued).unwrap().valid);
}

#[test]
fn test_certificates_reject_every_holder_to_holder_move() {
    let w = world();
    let certs = &w.ledger.certificates;
    let people = holders(&["H1", "H2", "H3"]);
    for (i, holder) in people.iter().enumerate() {
        let fields = CertificateFields::new(format!("Student {i}"), "RUST201", "Univ");
        certs
            .issue(&w.registrar, holder, CertificateRequest::new(fields))
            .unwrap();
    }

    let mut attempts = 0;
    for id in 0..3u64 {
        for from in &people {
            for to in &people {
                attempts += 1;
                assert!(matches!(
                    certs.transfer(from, from, to, id),
                    Err(LedgerError::NonTransferable { .. })
                ));
            }
        }
    }
    assert_eq!(attempts, 27);
    for (i, holder) in people.iter().enumerate() {
        assert_eq!(certs.certificates_of(holder), vec![i as u64]);
    }
}

// =============================================================================
// SUPPLY
// =============================================================================

#[test]
fn test_supply_cap_scenario() {
    let w = world();
    let badges = &w.ledger.entitlements;
    let cap = capped_badge(&w, 2);
    let [h1, h2, h3]: [Principal; 3] = holders(&["H1", "H2", "H3"]).try_into().unwrap();

    badges.issue_balance(&w.minter, &h1, cap, 1).unwrap();
    badges.issue_balance(&w.minter, &h2, cap, 1).unwrap();
    assert!(matches!(
        badges.issue_balance(&w.minter, &h3, cap, 1),
        Err(LedgerError::SupplyExceeded { .. })
    ));
}

#[test]
fn test_batch_over_cap_credits_nobody() {
    let w = world();
    let badges = &w.ledger.entitlements;
    let id = capped_badge(&w, 2);
    let batch = holders(&["H1", "H2", "H3"]);

    assert!(matches!(
        badges.batch_issue(&w.minter, &batch, id, 1),
        Err(LedgerError::SupplyExceeded { .. })
    ));
    for holder in &batch {
        assert_eq!(badges.balance_of(holder, id), 0);
        assert_eq!(badges.is_valid(holder, id).unwrap(), Validity::absent());
    }
    assert_eq!(badges.total_supply(id), 0);
    assert!(!w
        .events
        .events()
        .iter()
        .any(|e| matches!(e, LedgerEvent::BatchIssued { .. })));
}

#[test]
fn test_burn_frees_supply_for_new_mints() {
    let w = world();
    let badges = &w.ledger.entitlements;
    let id = capped_badge(&w, 1);
    let (h1, h2) = (Principal::new("H1"), Principal::new("H2"));

    badges.issue_balance(&w.minter, &h1, id, 1).unwrap();
    assert!(badges.issue_balance(&w.minter, &h2, id, 1).is_err());
    badges.burn(&h1, &h1, id, 1).unwrap();
    badges.issue_balance(&w.minter, &h2, id, 1).unwrap();
    assert_eq!(badges.total_supply(id), 1);
}

// =============================================================================
// TRANSFER RESTRICTION
// =============================================================================

#[test]
fn test_special_achievements_are_soulbound() {
    let w = world();
    let badges = &w.ledger.entitlements;
    let (h1, h2) = (Principal::new("H1"), Principal::new("H2"));
    let id = badges
        .grant_special(&w.minter, &h1, "Bug Hunter", 3, None)
        .unwrap();

    assert!(matches!(
        badges.transfer(&h1, &h1, &h2, id, 1),
        Err(LedgerError::NonTransferable { .. })
    ));
    assert_eq!(badges.get_type(id).unwrap().max_supply, Some(25));
    assert_eq!(badges.balance_of(&h1, id), 1);
    assert_eq!(badges.balance_of(&h2, id), 0);
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn test_concurrent_issuance_never_exceeds_cap() {
    let w = world();
    let id = capped_badge(&w, 50);

    let successes: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let ledger = Arc::clone(&w.ledger);
                let minter = w.minter.clone();
                scope.spawn(move || {
                    let mut ok = 0;
                    for n in 0..20 {
                        let holder = Principal::new(format!("w{worker}-h{n}"));
                        if ledger
                            .entitlements
                            .issue_balance(&minter, &holder, id, 1)
                            .is_ok()
                        {
                            ok += 1;
                        }
                    }
                    ok
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(successes, 50);
    assert_eq!(w.ledger.entitlements.total_supply(id), 50);
}

#[test]
fn test_concurrent_duplicate_certificates_yield_one_winner() {
    let w = world();
    let winners: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|worker| {
                let ledger = Arc::clone(&w.ledger);
                let registrar = w.registrar.clone();
                scope.spawn(move || {
                    let fields = CertificateFields::new("Ana", "CS101", "Univ");
                    ledger
                        .certificates
                        .issue(
                            &registrar,
                            &Principal::new(format!("wallet-{worker}")),
                            CertificateRequest::new(fields),
                        )
                        .is_ok() as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(winners, 1);
    assert_eq!(w.ledger.certificates.snapshot().live(), 1);
}
