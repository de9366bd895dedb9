//! # Keygen Subcommand
//!
//! Generates the issuer's Ed25519 key pair. The seed is written hex-encoded
//! to `{prefix}.key` and the public key to `{prefix}.pub`; verifiers only
//! ever need the latter.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use entl_crypto::Ed25519KeyPair;

use crate::CliContext;

/// Arguments for `entl keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "entl")]
    pub prefix: String,
    /// Overwrite existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Execute `entl keygen`.
pub fn run_keygen(args: &KeygenArgs, ctx: &CliContext) -> Result<u8> {
    let output = ctx.path(&args.output);
    cmd_keygen(&output, &args.prefix, args.force)
}

fn cmd_keygen(output_dir: &Path, prefix: &str, force: bool) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("failed to create output directory: {}", output_dir.display())
    })?;

    let key_path = output_dir.join(format!("{prefix}.key"));
    let pub_path = output_dir.join(format!("{prefix}.pub"));
    if !force && (key_path.exists() || pub_path.exists()) {
        bail!(
            "key files already exist in {} (pass --force to overwrite)",
            output_dir.display()
        );
    }

    let key = Ed25519KeyPair::generate();
    let pub_hex = key.public_key().to_hex();

    std::fs::write(&key_path, key.to_seed_hex())
        .with_context(|| format!("failed to write signing key: {}", key_path.display()))?;
    std::fs::write(&pub_path, &pub_hex)
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;
    tracing::info!(public_key = %pub_hex, "generated issuer key pair");

    println!("OK: generated Ed25519 keypair");
    println!("  Signing key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!("  Public key (hex): {pub_hex}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entl_crypto::Ed25519PublicKey;

    #[test]
    fn keygen_creates_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let code = cmd_keygen(dir.path(), "issuer", false).unwrap();
        assert_eq!(code, 0);

        let seed = std::fs::read_to_string(dir.path().join("issuer.key")).unwrap();
        let public = std::fs::read_to_string(dir.path().join("issuer.pub")).unwrap();
        assert_eq!(seed.len(), 64);
        let key = Ed25519KeyPair::from_seed_hex(&seed).unwrap();
        assert_eq!(key.public_key(), Ed25519PublicKey::from_hex(&public).unwrap());
    }

    #[test]
    fn keygen_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        cmd_keygen(dir.path(), "entl", false).unwrap();
        let first = std::fs::read_to_string(dir.path().join("entl.pub")).unwrap();

        assert!(cmd_keygen(dir.path(), "entl", false).is_err());
        assert_eq!(std::fs::read_to_string(dir.path().join("entl.pub")).unwrap(), first);

        cmd_keygen(dir.path(), "entl", true).unwrap();
        assert_ne!(std::fs::read_to_string(dir.path().join("entl.pub")).unwrap(), first);
    }

    #[test]
    fn keygen_creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        cmd_keygen(&nested, "entl", false).unwrap();
        assert!(nested.join("entl.key").exists());
    }
}
