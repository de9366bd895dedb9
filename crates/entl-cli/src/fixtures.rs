//! Shared setup for the subcommand tests.

use std::path::{Path, PathBuf};

use entl_crypto::Ed25519KeyPair;
use entl_license::LicensingConfig;

use crate::CliContext;

pub const NOW: &str = "2026-06-01T00:00:00Z";

pub const INSTALLATION: &str = "78900000-0000-0000-0000-000000000123";

pub const ORGANIZATION: &str = "\
kind: organization
id: 11111111-2222-3333-4444-555555555555
name: Acme
billing_email: billing@acme.test
license_key: org-key
enabled: true
plan: Enterprise (Annually)
plan_type: EnterpriseAnnually
seats: 25
use_sso: true
use_policies: true
self_host: true
expiration_date: 2026-12-01T00:00:00Z
";

pub const USER: &str = "\
kind: user
id: 99999999-0000-0000-0000-000000000001
name: Ada
email: ada@example.com
license_key: user-key
premium: true
max_storage_gb: 1
premium_expiration_date: 2026-07-01T00:00:00Z
";

/// Write a fixed issuer key pair into `dir` and return a context rooted
/// there whose config points at it.
pub fn context(dir: &Path) -> CliContext {
    let key = Ed25519KeyPair::from_seed(&[5u8; 32]);
    std::fs::write(dir.join("entl.key"), key.to_seed_hex()).unwrap();
    std::fs::write(dir.join("entl.pub"), key.public_key().to_hex()).unwrap();
    let config = LicensingConfig::from_yaml_str(&format!(
        "installation_id: {INSTALLATION}\nsigning_key: entl.key\npublic_key: entl.pub\n"
    ))
    .unwrap()
    .resolve_paths(dir);
    CliContext {
        root: dir.to_path_buf(),
        config,
    }
}

/// Write `content` to `dir/name` and return the path.
pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Issue a license for the snapshot in `entity` and return the token file.
pub fn issue(ctx: &CliContext, entity: &str) -> PathBuf {
    let entity = write(&ctx.root, "entity.yaml", entity);
    let out = ctx.root.join("license.token");
    let args = crate::issue::IssueArgs {
        entity,
        subscription: None,
        key: None,
        version: None,
        out: Some(out.clone()),
        now: Some(NOW.to_string()),
    };
    assert_eq!(crate::issue::run_issue(&args, ctx).unwrap(), 0);
    out
}
