// src/credentials.rs
//! API keys for the scholarly providers, read from a local secrets file.
//!
//! JSON shape:
//! ```json
//! { "semantic_scholar": "...", "scopus": "ENV" }
//! ```
//! A value of `"ENV"` (case-insensitive) reads the provider's env var instead.

use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

use crate::error::ConfigError;

pub const ENV_SECRETS_PATH: &str = "SIGNAL_SCOUT_SECRETS";
pub const DEFAULT_SECRETS_PATH: &str = "config/secrets.json";

pub const SEMANTIC_SCHOLAR: &str = "semantic_scholar";
pub const SCOPUS: &str = "scopus";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    semantic_scholar: Option<String>,
    #[serde(default)]
    scopus: Option<String>,
    #[serde(skip)]
    origin: String,
}

impl Credentials {
    pub fn new(semantic_scholar: Option<String>, scopus: Option<String>) -> Self {
        Self {
            semantic_scholar,
            scopus,
            origin: "<inline>".into(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut c: Credentials = serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        c.origin = path.display().to_string();
        Ok(c)
    }

    /// $SIGNAL_SCOUT_SECRETS, else config/secrets.json. A missing file is an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = env::var(ENV_SECRETS_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH));
        if !path.exists() {
            return Err(ConfigError::MissingFile { path });
        }
        Self::load_from(&path)
    }

    /// Resolve the key for `provider`, following `ENV` indirection.
    pub fn require(&self, provider: &'static str) -> Result<String, ConfigError> {
        let (raw, env_name) = match provider {
            SEMANTIC_SCHOLAR => (self.semantic_scholar.as_deref(), "SEMANTIC_SCHOLAR_API_KEY"),
            SCOPUS => (self.scopus.as_deref(), "SCOPUS_API_KEY"),
            _ => (None, ""),
        };
        let missing = |location: String| ConfigError::MissingCredential { provider, location };

        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("env") => env::var(env_name)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .ok_or_else(|| missing(format!("env var {env_name}"))),
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(missing(self.origin.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_missing() {
        let c = Credentials::new(Some("  ".into()), None);
        assert!(matches!(
            c.require(SEMANTIC_SCHOLAR),
            Err(ConfigError::MissingCredential { provider: "semantic_scholar", .. })
        ));
        assert!(c.require(SCOPUS).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_indirection_reads_env_var() {
        let c = Credentials::new(None, Some("ENV".into()));
        env::remove_var("SCOPUS_API_KEY");
        assert!(c.require(SCOPUS).is_err());
        env::set_var("SCOPUS_API_KEY", "k-123");
        assert_eq!(c.require(SCOPUS).unwrap(), "k-123");
        env::remove_var("SCOPUS_API_KEY");
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("secrets.json");
        fs::write(&p, r#"{"semantic_scholar":"ss-key","scopus":"sc-key"}"#).unwrap();
        let c = Credentials::load_from(&p).unwrap();
        assert_eq!(c.require(SEMANTIC_SCHOLAR).unwrap(), "ss-key");
        assert_eq!(c.require(SCOPUS).unwrap(), "sc-key");
    }
}
