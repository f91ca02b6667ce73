//! Server configuration, read once at startup from a YAML document.

mod duration;
mod keys;


use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub use duration::{DurationError, DurationString};
pub use keys::{KeyError, KeyPair, PrivateKey, PublicKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing fields {} in config file", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Which blob store holds charm bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobStoreType {
    #[default]
    File,
    Swift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwiftAuthMode {
    Legacy,
    UserPass,
    KeyPair,
    V3UserPass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub audit_log_file: String,
    pub audit_log_max_size: u64,
    pub audit_log_max_age: u64,
    pub mongo_url: String,
    pub api_addr: String,
    pub auth_username: String,
    pub auth_password: String,
    pub identity_location: String,
    pub identity_public_key: Option<PublicKey>,
    pub identity_api_url: String,
    pub terms_location: String,
    pub terms_public_key: Option<PublicKey>,
    pub agent_username: String,
    pub agent_key: Option<KeyPair>,
    pub stats_cache_max_age: DurationString,
    pub search_cache_max_age: DurationString,
    pub request_timeout: DurationString,
    pub max_mgo_sessions: u32,
    pub blobstore: BlobStoreType,
    pub swift_auth_url: String,
    pub swift_username: String,
    pub swift_secret: String,
    pub swift_bucket: String,
    pub swift_region: String,
    pub swift_tenant: String,
    #[serde(rename = "swift-authmode", alias = "swift-auth-mode")]
    pub swift_auth_mode: Option<SwiftAuthMode>,
    pub logging_config: String,
}

struct FieldRule {
    name: &'static str,
    present: fn(&Config) -> bool,
    applies: fn(&Config) -> bool,
}

fn always(_: &Config) -> bool {
    true
}

fn uses_swift(config: &Config) -> bool {
    config.blobstore == BlobStoreType::Swift
}

// Missing fields are reported in table order.
const REQUIRED_FIELDS: &[FieldRule] = &[
    FieldRule {
        name: "mongo-url",
        present: |c| !c.mongo_url.is_empty(),
        applies: always,
    },
    FieldRule {
        name: "api-addr",
        present: |c| !c.api_addr.is_empty(),
        applies: always,
    },
    FieldRule {
        name: "auth-username",
        present: |c| !c.auth_username.is_empty(),
        applies: always,
    },
    FieldRule {
        name: "auth-password",
        present: |c| !c.auth_password.is_empty(),
        applies: always,
    },
    FieldRule {
        name: "swift-auth-url",
        present: |c| !c.swift_auth_url.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-username",
        present: |c| !c.swift_username.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-secret",
        present: |c| !c.swift_secret.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-bucket",
        present: |c| !c.swift_bucket.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-region",
        present: |c| !c.swift_region.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-tenant",
        present: |c| !c.swift_tenant.is_empty(),
        applies: uses_swift,
    },
    FieldRule {
        name: "swift-auth-mode",
        present: |c| c.swift_auth_mode.is_some(),
        applies: uses_swift,
    },
];

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self, ConfigError> {
        let config = if data.iter().all(u8::is_ascii_whitespace) {
            Self::default()
        } else {
            match serde_yaml::from_slice::<serde_yaml::Value>(data)? {
                serde_yaml::Value::Null => Self::default(),
                value => serde_yaml::from_value(value)?,
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every required field and reports all of the missing ones at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .filter(|rule| (rule.applies)(self) && !(rule.present)(self))
            .map(|rule| rule.name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields(missing))
        }
    }

    /// Translates `logging-config` (`<root>=INFO;charmd=DEBUG`) into
    /// `tracing_subscriber` filter directives.
    pub fn log_directives(&self) -> Option<String> {
        let directives: Vec<String> = self
            .logging_config
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some(("<root>", level)) => log_level(level).to_string(),
                Some((module, level)) => format!("{}={}", module.trim(), log_level(level)),
                None => log_level(entry).to_string(),
            })
            .collect();

        if directives.is_empty() {
            None
        } else {
            Some(directives.join(","))
        }
    }
}

fn log_level(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}
