//! # Licensing Configuration
//!
//! Verifier and issuer settings, loaded from YAML. Every key is optional
//! and unknown keys are rejected, so a typo fails loudly instead of
//! silently falling back to a default.
//!
//! ```yaml
//! installation_id: 78900000-0000-0000-0000-000000000123
//! self_host_grace_period_days: 60
//! max_expiration_years: 10
//! claims_expiration_tolerance_secs: 60
//! signing_key: keys/entl.key
//! public_key: keys/entl.pub
//! ```

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use entl_core::InstallationId;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::expiration::DEFAULT_GRACE_PERIOD_DAYS;

/// Default horizon beyond which an expiration is implausible.
pub const DEFAULT_MAX_EXPIRATION_YEARS: u32 = 10;
/// Default slack between a claims `Expires` and the license's.
pub const DEFAULT_CLAIMS_TOLERANCE_SECS: i64 = 60;

/// Settings shared by the validation commands and issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LicensingConfig {
    /// The installation this verifier runs as. Organization licenses must
    /// be bound to it; when unset the binding is not checked.
    pub installation_id: Option<InstallationId>,
    pub self_host_grace_period_days: i64,
    pub max_expiration_years: u32,
    pub claims_expiration_tolerance_secs: i64,
    /// File holding the hex Ed25519 signing seed.
    pub signing_key: Option<PathBuf>,
    /// File holding the hex Ed25519 public key.
    pub public_key: Option<PathBuf>,
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            installation_id: None,
            self_host_grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            max_expiration_years: DEFAULT_MAX_EXPIRATION_YEARS,
            claims_expiration_tolerance_secs: DEFAULT_CLAIMS_TOLERANCE_SECS,
            signing_key: None,
            public_key: None,
        }
    }
}

impl LicensingConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded licensing config");
        Ok(config)
    }

    /// Parse and validate config from a YAML string. An empty document
    /// yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the validation commands cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_expiration_years == 0 {
            return Err(ConfigError::Invalid {
                field: "max_expiration_years",
                reason: "must be at least 1".into(),
            });
        }
        if self.self_host_grace_period_days < 0 {
            return Err(ConfigError::Invalid {
                field: "self_host_grace_period_days",
                reason: format!("{} is negative", self.self_host_grace_period_days),
            });
        }
        if self.claims_expiration_tolerance_secs < 0 {
            return Err(ConfigError::Invalid {
                field: "claims_expiration_tolerance_secs",
                reason: format!("{} is negative", self.claims_expiration_tolerance_secs),
            });
        }
        Ok(())
    }

    /// The claims `Expires` tolerance as a duration.
    pub fn claims_tolerance(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.claims_expiration_tolerance_secs.clamp(0, i64::MAX / 1_000))
            .unwrap_or_else(TimeDelta::zero)
    }

    /// Resolve the key paths against `root`, for configs whose keys are
    /// given relative to the config file.
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        self.signing_key = self.signing_key.map(resolve);
        self.public_key = self.public_key.map(resolve);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uuid::Uuid;

    #[test]
    fn test_defaults() {
        let config = LicensingConfig::from_yaml_str("").unwrap();
        assert_eq!(config, LicensingConfig::default());
        assert_eq!(config.self_host_grace_period_days, 60);
        assert_eq!(config.max_expiration_years, 10);
        assert_eq!(config.claims_tolerance(), TimeDelta::try_seconds(60).unwrap());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = LicensingConfig::from_yaml_str(
            "installation_id: 78900000-0000-0000-0000-000000000123\nmax_expiration_years: 3\n",
        )
        .unwrap();
        assert_eq!(
            config.installation_id,
            Some(InstallationId(
                Uuid::parse_str("78900000-0000-0000-0000-000000000123").unwrap()
            ))
        );
        assert_eq!(config.max_expiration_years, 3);
        assert_eq!(config.self_host_grace_period_days, 60);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = LicensingConfig::from_yaml_str("grace_days: 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let err = LicensingConfig::from_yaml_str("max_expiration_years: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_expiration_years",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_grace_rejected() {
        let err = LicensingConfig::from_yaml_str("self_host_grace_period_days: -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licensing.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "self_host_grace_period_days: 30").unwrap();
        writeln!(f, "public_key: keys/entl.pub").unwrap();
        drop(f);

        let config = LicensingConfig::load(&path).unwrap().resolve_paths(dir.path());
        assert_eq!(config.self_host_grace_period_days, 30);
        assert_eq!(config.public_key, Some(dir.path().join("keys/entl.pub")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LicensingConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
