//! # entl-cli — Entitlement Licensing Command-Line Interface
//!
//! Provides the `entl` binary over the `entl-license` pipeline.
//!
//! ## Subcommands
//!
//! - `entl keygen`: Ed25519 issuer key pair generation.
//! - `entl issue`: Issue and sign a license from an entity snapshot.
//! - `entl verify`: Verify a token and check its validity window.
//! - `entl check`: Verify a token and cross-check it against a live entity.
//! - `entl claims`: Print the claims a verified license carries.
//! - `entl expiration`: Preview the dates a fresh license would get.
//!
//! Every handler returns a process exit code: 0 when the license is
//! accepted, 1 when it is rejected. Errors (unreadable files, bad keys)
//! also exit 1 after being logged.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the licensing logic.
//! - Handlers delegate to `entl-license`; no licensing rules live here.

pub mod check;
pub mod claims;
pub mod expiration;
pub mod issue;
pub mod keygen;
pub mod verify;

#[cfg(test)]
mod fixtures;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use entl_core::Timestamp;
use entl_crypto::{Ed25519KeyPair, Ed25519PublicKey};
use entl_license::{LicenseFailure, LicensingConfig, ValidationError};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global tracing subscriber.
///
/// Verbosity maps to a level: none is `warn`, then `info`, `debug`, and
/// `trace` for three or more.
pub fn init_logging(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolve a path that may be relative to `root`.
///
/// Absolute paths are returned as-is. A relative path is taken from
/// `root` when it exists there, otherwise from the current directory.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let rooted = root.join(path);
    if rooted.exists() {
        rooted
    } else {
        path.to_path_buf()
    }
}

/// State shared by every handler: the working root and loaded config.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub root: PathBuf,
    pub config: LicensingConfig,
}

impl CliContext {
    /// Load the config file, if one is given. Key paths inside it are
    /// resolved against the config file's directory.
    pub fn load(config: Option<&Path>, root: PathBuf) -> Result<Self> {
        let config = match config {
            Some(path) => {
                let path = resolve_path(path, &root);
                let dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                LicensingConfig::load(&path)
                    .with_context(|| format!("failed to load config: {}", path.display()))?
                    .resolve_paths(&dir)
            }
            None => LicensingConfig::default(),
        };
        Ok(Self { root, config })
    }

    /// Resolve a command-line path against the root.
    pub fn path(&self, path: &Path) -> PathBuf {
        resolve_path(path, &self.root)
    }

    /// The verifier key: the flag when given, otherwise `public_key` from
    /// the config.
    pub fn public_key(&self, flag: Option<&Path>) -> Result<Ed25519PublicKey> {
        let path = match (flag, &self.config.public_key) {
            (Some(p), _) => self.path(p),
            (None, Some(p)) => p.clone(),
            (None, None) => bail!("no public key: pass --pubkey or set public_key in the config"),
        };
        let hex = read_trimmed(&path, "public key")?;
        Ed25519PublicKey::from_hex(&hex).map_err(|e| anyhow::anyhow!("invalid public key: {e}"))
    }

    /// The issuer key: the flag when given, otherwise `signing_key` from
    /// the config.
    pub fn signing_key(&self, flag: Option<&Path>) -> Result<Ed25519KeyPair> {
        let path = match (flag, &self.config.signing_key) {
            (Some(p), _) => self.path(p),
            (None, Some(p)) => p.clone(),
            (None, None) => bail!("no signing key: pass --key or set signing_key in the config"),
        };
        let hex = read_trimmed(&path, "signing key")?;
        Ed25519KeyPair::from_seed_hex(&hex).map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))
    }
}

/// Read a small text file and trim surrounding whitespace.
pub fn read_trimmed(path: &Path, what: &str) -> Result<String> {
    if !path.exists() {
        bail!("{what} file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))?;
    Ok(content.trim().to_string())
}

/// Read and deserialize a YAML (or JSON) document.
pub fn read_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {what}: {}", path.display()))
}

/// The instant to validate at: `--now` when given, else the clock.
pub fn parse_now(now: Option<&str>) -> Result<Timestamp> {
    match now {
        Some(s) => Timestamp::parse_lenient(s).with_context(|| format!("invalid --now value: {s}")),
        None => Ok(Timestamp::now()),
    }
}

/// Turn a validation result into an exit code, printing the rejection.
///
/// Faults are errors, not rejections, and propagate.
pub fn report<T>(result: Result<T, ValidationError>) -> Result<std::result::Result<T, u8>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ValidationError::Rejected(failure)) => {
            print_rejection(&failure);
            Ok(Err(1))
        }
        Err(ValidationError::Fault(e)) => Err(e).context("license encoding fault"),
    }
}

fn print_rejection(failure: &LicenseFailure) {
    println!("FAIL: license rejected: {failure}");
    println!("  Reason: {} ({:?})", failure.kind(), failure.class());
}
