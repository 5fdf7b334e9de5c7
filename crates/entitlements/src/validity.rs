//! Validity evaluation for held entries.

use certledger_types::{CertificateRecord, EntitlementType, HoldingBalance, Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// Answer to "is this holder's entry currently valid?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub valid: bool,
    /// First-acquisition time; `None` when nothing is held
    pub earned_at: Option<Timestamp>,
}

impl Validity {
    /// Nothing held
    pub const fn absent() -> Self {
        Self {
            valid: false,
            earned_at: None,
        }
    }
}

/// Balance entries are valid while held and not past the type's expiry
pub fn evaluate_holding(
    entitlement: &EntitlementType,
    holding: Option<&HoldingBalance>,
    now: Timestamp,
) -> Validity {
    match holding {
        Some(balance) if balance.quantity > 0 => Validity {
            valid: !entitlement.is_expired_at(now),
            earned_at: Some(balance.earned_at),
        },
        _ => Validity::absent(),
    }
}

/// Certificates never expire; revocation is the sole invalidator
pub fn evaluate_certificate(record: &CertificateRecord, holder: &Principal) -> Validity {
    if &record.holder != holder {
        return Validity::absent();
    }
    Validity {
        valid: record.valid,
        earned_at: Some(record.issued_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_types::{Category, CertificateFields};

    fn badge(valid_until: Option<Timestamp>) -> EntitlementType {
        EntitlementType {
            id: 2_000,
            name: "Speaker".into(),
            category: Category::EventBadge,
            max_supply: None,
            transferable: false,
            valid_until,
            issuer: Principal::new("org"),
            created_at: 0,
            retired_at: None,
        }
    }

    #[test]
    fn test_zero_balance_is_never_valid() {
        let ty = badge(None);
        assert_eq!(evaluate_holding(&ty, None, 5), Validity::absent());
        let empty = HoldingBalance {
            quantity: 0,
            earned_at: 3,
        };
        assert_eq!(evaluate_holding(&ty, Some(&empty), 5), Validity::absent());
    }

    #[test]
    fn test_expiry_boundary() {
        let ty = badge(Some(100));
        let held = HoldingBalance {
            quantity: 1,
            earned_at: 10,
        };
        assert!(evaluate_holding(&ty, Some(&held), 100).valid);
        let after = evaluate_holding(&ty, Some(&held), 101);
        assert!(!after.valid);
        assert_eq!(after.earned_at, Some(10));
    }

    #[test]
    fn test_certificate_validity() {
        let holder = Principal::new("h1");
        let fields = CertificateFields::new("Ana", "CS101", "Univ");
        let mut record = CertificateRecord {
            id: 0,
            holder: holder.clone(),
            fingerprint: fields.fingerprint(),
            fields,
            category: "certificate".into(),
            issued_at: 42,
            valid: true,
            revoked_at: None,
            metadata_uri: None,
        };

        assert_eq!(
            evaluate_certificate(&record, &holder),
            Validity {
                valid: true,
                earned_at: Some(42)
            }
        );
        assert_eq!(
            evaluate_certificate(&record, &Principal::new("h2")),
            Validity::absent()
        );

        record.valid = false;
        assert_eq!(
            evaluate_certificate(&record, &holder),
            Validity {
                valid: false,
                earned_at: Some(42)
            }
        );
    }
}
