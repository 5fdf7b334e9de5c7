//! Operator configuration: optional TOML file layered under `CERTLEDGER_*`
//! environment variables.

use anyhow::{bail, Context, Result};
use certledger_entitlements::{LedgerConfig, Role, RoleTable};
use certledger_types::Principal;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File consulted when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "certledger.toml";

const ENV_PREFIX: &str = "CERTLEDGER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub admins: Vec<String>,
    pub minters: Vec<String>,
    pub issuers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    pub state_path: PathBuf,
    pub paused: bool,
    pub roles: RoleConfig,
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
            state_path: PathBuf::from("certledger-state.json"),
            paused: false,
            roles: RoleConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the config file, then overlay environment variables such as
    /// `CERTLEDGER_STATE_PATH` or `CERTLEDGER_ROLES__ADMINS=a,b`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let resolved_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("roles.admins")
                .with_list_parse_key("roles.minters")
                .with_list_parse_key("roles.issuers")
                .with_list_parse_key("ledger.categories"),
        );

        let config: AppConfig = builder
            .build()
            .context("failed to assemble configuration sources")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            bail!("log_format must be `pretty` or `json`, got `{}`", self.log_format);
        }
        self.ledger.validate()?;
        Ok(())
    }

    /// Role assignments as an access-control table
    pub fn role_table(&self) -> RoleTable {
        let table = RoleTable::new();
        let assignments = [
            (Role::Admin, &self.roles.admins),
            (Role::Minter, &self.roles.minters),
            (Role::Issuer, &self.roles.issuers),
        ];
        for (role, members) in assignments {
            for member in members {
                table.grant(Principal::new(member.as_str()), role);
            }
        }
        table
    }
}
