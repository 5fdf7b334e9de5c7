//! Subcommands and their execution against a loaded ledger.

use anyhow::{anyhow, Result};
use certledger_entitlements::CredentialLedger;
use certledger_types::{
    Category, CertificateFields, CertificateRequest, EntitlementId, Principal, Timestamp,
    TypeDefinition, DEFAULT_CERTIFICATE_CATEGORY,
};
use clap::Subcommand;
use serde_json::{json, Value};
use std::collections::BTreeSet;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Entitlement type management
    Type {
        #[command(subcommand)]
        action: TypeCommands,
    },
    /// Mint units of a type to one holder
    Issue {
        holder: String,
        id: EntitlementId,
        #[arg(long, default_value_t = 1)]
        amount: u64,
    },
    /// Mint the same amount to every listed holder, all or nothing
    Batch {
        id: EntitlementId,
        #[arg(required = true, num_args = 1..)]
        holders: Vec<String>,
        #[arg(long, default_value_t = 1)]
        amount: u64,
    },
    /// Create a soulbound achievement and grant one unit of it
    Special {
        holder: String,
        name: String,
        /// Rarity tier: 1 caps supply at 100, 2 at 50, 3 at 25, others at 10
        #[arg(long)]
        tier: u8,
        #[arg(long)]
        valid_until: Option<Timestamp>,
    },
    /// Destroy units; defaults to the caller's own holding
    Burn {
        id: EntitlementId,
        #[arg(long)]
        holder: Option<String>,
        #[arg(long, default_value_t = 1)]
        amount: u64,
    },
    /// Move units from the caller to another holder
    Transfer {
        to: String,
        id: EntitlementId,
        #[arg(long, default_value_t = 1)]
        amount: u64,
    },
    /// List balances held by a holder
    Held { holder: String },
    /// Check whether a holder validly holds a type
    Valid { holder: String, id: EntitlementId },
    /// Show a type's metadata URI, or replace it with --set
    Uri {
        id: EntitlementId,
        #[arg(long)]
        set: Option<String>,
    },
    /// Summarize identifier usage and record counts
    Status,
    /// Certificate operations
    Cert {
        #[command(subcommand)]
        action: CertCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TypeCommands {
    /// Register a new entitlement type
    Create {
        name: String,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        max_supply: Option<u64>,
        #[arg(long)]
        transferable: bool,
        #[arg(long)]
        valid_until: Option<Timestamp>,
        #[arg(long)]
        uri: Option<String>,
    },
    /// Show one type
    Show { id: EntitlementId },
    /// List every registered type
    List,
    /// Stop further issuance of a type
    Retire { id: EntitlementId },
}

#[derive(Subcommand, Debug)]
pub enum CertCommands {
    /// Issue a certificate
    Issue {
        holder: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        issuer: String,
        #[arg(long, default_value = DEFAULT_CERTIFICATE_CATEGORY)]
        category: String,
        #[arg(long)]
        uri: Option<String>,
    },
    /// Mark a certificate invalid
    Revoke { id: EntitlementId },
    /// Destroy a certificate, freeing its fingerprint
    Burn { id: EntitlementId },
    /// Show one certificate
    Show { id: EntitlementId },
    /// List certificates held by a holder
    Held { holder: String },
    /// Check whether a holder validly holds a certificate
    Valid { holder: String, id: EntitlementId },
}

/// Result of one command: JSON to print, and whether state changed
#[derive(Debug)]
pub struct Outcome {
    pub output: Value,
    pub mutated: bool,
}

impl Outcome {
    fn read(output: Value) -> Self {
        Self {
            output,
            mutated: false,
        }
    }

    fn write(output: Value) -> Self {
        Self {
            output,
            mutated: true,
        }
    }
}

fn require_caller(caller: Option<&Principal>) -> Result<&Principal> {
    caller.ok_or_else(|| anyhow!("this command mutates the ledger; pass --as <principal>"))
}

pub fn execute(
    ledger: &CredentialLedger,
    caller: Option<&Principal>,
    command: Commands,
) -> Result<Outcome> {
    let badges = &ledger.entitlements;
    match command {
        Commands::Type { action } => execute_type(ledger, caller, action),
        Commands::Issue { holder, id, amount } => {
            let holder = Principal::new(holder);
            badges.issue_balance(require_caller(caller)?, &holder, id, amount)?;
            Ok(Outcome::write(json!({
                "id": id,
                "holder": holder,
                "balance": badges.balance_of(&holder, id),
                "total_supply": badges.total_supply(id),
            })))
        }
        Commands::Batch {
            id,
            holders,
            amount,
        } => {
            let holders: Vec<Principal> = holders.into_iter().map(Principal::new).collect();
            badges.batch_issue(require_caller(caller)?, &holders, id, amount)?;
            Ok(Outcome::write(json!({
                "id": id,
                "credited": holders.len(),
                "total_supply": badges.total_supply(id),
            })))
        }
        Commands::Special {
            holder,
            name,
            tier,
            valid_until,
        } => {
            let holder = Principal::new(holder);
            let id =
                badges.grant_special(require_caller(caller)?, &holder, &name, tier, valid_until)?;
            Ok(Outcome::write(json!({
                "id": id,
                "holder": holder,
                "type": badges.get_type(id)?,
            })))
        }
        Commands::Burn { id, holder, amount } => {
            let caller = require_caller(caller)?;
            let holder = holder.map(Principal::new).unwrap_or_else(|| caller.clone());
            badges.burn(caller, &holder, id, amount)?;
            Ok(Outcome::write(json!({
                "id": id,
                "holder": holder,
                "balance": badges.balance_of(&holder, id),
                "total_supply": badges.total_supply(id),
            })))
        }
        Commands::Transfer { to, id, amount } => {
            let from = require_caller(caller)?;
            let to = Principal::new(to);
            badges.transfer(from, from, &to, id, amount)?;
            Ok(Outcome::write(json!({
                "id": id,
                "from": from,
                "to": to,
                "amount": amount,
            })))
        }
        Commands::Held { holder } => {
            let holder = Principal::new(holder);
            let ids: BTreeSet<EntitlementId> = badges.list_held(&holder).into_iter().collect();
            let holdings: Vec<Value> = ids
                .into_iter()
                .filter_map(|id| {
                    badges.holding(&holder, id).map(|h| {
                        json!({ "id": id, "quantity": h.quantity, "earned_at": h.earned_at })
                    })
                })
                .collect();
            Ok(Outcome::read(json!({
                "holder": holder,
                "holdings": holdings,
            })))
        }
        Commands::Valid { holder, id } => {
            let holder = Principal::new(holder);
            let validity = badges.is_valid(&holder, id)?;
            Ok(Outcome::read(serde_json::to_value(validity)?))
        }
        Commands::Uri { id, set: None } => Ok(Outcome::read(json!({
            "id": id,
            "uri": badges.uri(id)?,
        }))),
        Commands::Uri { id, set: Some(uri) } => {
            badges.set_uri(require_caller(caller)?, id, &uri)?;
            Ok(Outcome::write(json!({ "id": id, "uri": uri })))
        }
        Commands::Status => status(ledger),
        Commands::Cert { action } => execute_cert(ledger, caller, action),
    }
}

fn status(ledger: &CredentialLedger) -> Result<Outcome> {
    let entitlements = ledger.entitlements.snapshot();
    let certificates = ledger.certificates.snapshot();
    let allocator = entitlements.allocator();

    let mut categories = serde_json::Map::new();
    for category in &ledger.entitlements.config().categories {
        categories.insert(
            category.to_string(),
            json!({
                "issued": allocator.issued(*category),
                "next_id": allocator.peek(*category)?,
            }),
        );
    }
    Ok(Outcome::read(json!({
        "types": entitlements.types().len(),
        "categories": categories,
        "certificates": {
            "issued": certificates.issued(),
            "live": certificates.live(),
        },
    })))
}

fn execute_type(
    ledger: &CredentialLedger,
    caller: Option<&Principal>,
    action: TypeCommands,
) -> Result<Outcome> {
    let badges = &ledger.entitlements;
    match action {
        TypeCommands::Create {
            name,
            category,
            max_supply,
            transferable,
            valid_until,
            uri,
        } => {
            let mut definition = TypeDefinition::new(name, category).transferable(transferable);
            if let Some(cap) = max_supply {
                definition = definition.with_max_supply(cap);
            }
            if let Some(until) = valid_until {
                definition = definition.valid_until(until);
            }
            if let Some(uri) = uri {
                definition = definition.with_metadata_uri(uri);
            }
            let id = badges.create_type(require_caller(caller)?, definition)?;
            Ok(Outcome::write(serde_json::to_value(badges.get_type(id)?)?))
        }
        TypeCommands::Show { id } => {
            let entitlement = badges.get_type(id)?;
            let supply = badges.total_supply(id);
            Ok(Outcome::read(json!({
                "remaining_supply": entitlement.remaining_supply(supply),
                "type": entitlement,
                "total_supply": supply,
            })))
        }
        TypeCommands::List => Ok(Outcome::read(serde_json::to_value(badges.list_types())?)),
        TypeCommands::Retire { id } => {
            badges.retire_type(require_caller(caller)?, id)?;
            Ok(Outcome::write(serde_json::to_value(badges.get_type(id)?)?))
        }
    }
}

fn execute_cert(
    ledger: &CredentialLedger,
    caller: Option<&Principal>,
    action: CertCommands,
) -> Result<Outcome> {
    let certs = &ledger.certificates;
    match action {
        CertCommands::Issue {
            holder,
            name,
            course,
            issuer,
            category,
            uri,
        } => {
            let holder = Principal::new(holder);
            let mut request = CertificateRequest::new(CertificateFields::new(name, course, issuer))
                .with_category(category);
            if let Some(uri) = uri {
                request = request.with_metadata_uri(uri);
            }
            let id = certs.issue(require_caller(caller)?, &holder, request)?;
            Ok(Outcome::write(serde_json::to_value(certs.certificate(id)?)?))
        }
        CertCommands::Revoke { id } => {
            certs.revoke(require_caller(caller)?, id)?;
            Ok(Outcome::write(serde_json::to_value(certs.certificate(id)?)?))
        }
        CertCommands::Burn { id } => {
            certs.burn(require_caller(caller)?, id)?;
            Ok(Outcome::write(json!({ "id": id, "burned": true })))
        }
        CertCommands::Show { id } => Ok(Outcome::read(serde_json::to_value(
            certs.certificate(id)?,
        )?)),
        CertCommands::Held { holder } => {
            let holder = Principal::new(holder);
            Ok(Outcome::read(json!({
                "holder": holder,
                "certificates": certs.certificates_of(&holder),
            })))
        }
        CertCommands::Valid { holder, id } => {
            let validity = certs.is_valid(&Principal::new(holder), id)?;
            Ok(Outcome::read(serde_json::to_value(validity)?))
        }
    }
}
