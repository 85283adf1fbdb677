//! Server configuration from environment variables
//!
//! # Environment Variables
//!
//! - `ORGCHART_PORT`: Server port (default: 3001)
//! - `ORGCHART_DB_PATH`: Database file (default: `~/.orgchart/orgchart.db`)
//! - `ORGCHART_STORE`: `sqlite` or `memory` (default: `sqlite`)
//! - `ORGCHART_ROOT_DELETION`: `never` or `when-childless` (default: `when-childless`)
//! - `ORGCHART_ROLE_MUTABLE`: whether updates may change roles (default: `true`)
//! - `ORGCHART_REJECT_ROOT_REPORT_TO`: reject `reportTo` on the first node (default: `false`)
//! - `RUST_LOG`: Logging level, read by the binary (e.g. "info", "debug")

use orgchart_core::services::{HierarchyPolicy, RootDeletion};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Failed to get home directory")]
    NoHomeDir,
}

/// Which node store backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "libsql" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub store: StoreKind,
    pub policy: HierarchyPolicy,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get("ORGCHART_PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: "ORGCHART_PORT",
                value,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let store = match get("ORGCHART_STORE") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "ORGCHART_STORE",
                value,
                expected: "'sqlite' or 'memory'",
            })?,
            None => StoreKind::default(),
        };

        let db_path = match get("ORGCHART_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let defaults = HierarchyPolicy::default();
        let root_deletion = match get("ORGCHART_ROOT_DELETION") {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "never" => RootDeletion::Never,
                "when-childless" => RootDeletion::WhenChildless,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "ORGCHART_ROOT_DELETION",
                        value,
                        expected: "'never' or 'when-childless'",
                    })
                }
            },
            None => defaults.root_deletion,
        };

        let policy = HierarchyPolicy {
            root_deletion,
            role_mutable: parse_flag("ORGCHART_ROLE_MUTABLE", get("ORGCHART_ROLE_MUTABLE"))?
                .unwrap_or(defaults.role_mutable),
            reject_report_to_for_root: parse_flag(
                "ORGCHART_REJECT_ROOT_REPORT_TO",
                get("ORGCHART_REJECT_ROOT_REPORT_TO"),
            )?
            .unwrap_or(defaults.reject_report_to_for_root),
        };

        Ok(Self {
            port,
            db_path,
            store,
            policy,
        })
    }
}

/// Default: ~/.orgchart/orgchart.db
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_dir.join(".orgchart").join("orgchart.db"))
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            expected: "a boolean",
        }),
    }
}
