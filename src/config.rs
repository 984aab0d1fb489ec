//! # Security Configuration
//!
//! @title Operator-Supplied Security Config
//! @author Ramprasad
//!
//! Loads the optional `security-config.json` that extends the built-in
//! vocabulary with custom role names, custom sink definitions, and session
//! tokens used by the privilege-escalation fuzzer.
//!
//! ```json
//! {
//!   "customRoles": ["superuser", "moderator"],
//!   "sessionTokens": { "user": "abc", "admin": "def" },
//!   "customSinks": [
//!     { "name": "payment_charge", "patterns": ["stripe.charges"], "severity": "critical",
//!       "description": "Charges a card" }
//!   ]
//! }
//! ```

use crate::error::{Result, SentinelError};
use crate::report::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the scanned directory when no explicit config is given.
pub const DEFAULT_CONFIG_FILE: &str = "security-config.json";

/// Operator configuration, loaded once per run and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    /// Additional role names treated like `role`/`admin`.
    pub custom_roles: Vec<String>,

    /// Session tokens for authenticated probing.
    pub session_tokens: SessionTokens,

    /// Operator-defined sink categories.
    pub custom_sinks: Vec<CustomSinkDef>,
}

/// Session cookie values for a regular and an administrative user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTokens {
    pub user: Option<String>,
    pub admin: Option<String>,
}

/// A custom sink category matched by callee-name substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSinkDef {
    pub name: String,
    pub patterns: Vec<String>,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

impl SecurityConfig {
    /// Parses a config from JSON text.
    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| SentinelError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SentinelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &content)
    }

    /// Resolves the config for a scan.
    ///
    /// An explicit path must exist. Without one, `security-config.json` in
    /// the target directory is used when present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>, target_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = target_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            log::info!("Loading security config from {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured non-admin session token, if any.
    pub fn user_token(&self) -> Option<&str> {
        self.session_tokens
            .user
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
