//! Snapshot persistence between invocations.

use anyhow::{Context, Result};
use certledger_entitlements::{LedgerConfig, LedgerSnapshot};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exclusive advisory lock on `<state_path>.lock`, released on drop.
///
/// The lock file itself is never removed: a waiter may already hold a
/// handle to it, and unlinking would let a third process lock a fresh inode.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    file: File,
}

impl StateLock {
    /// Block until no other invocation holds the lock
    pub fn acquire(state_path: &Path) -> Result<Self> {
        let (path, file) = open_lock_file(state_path)?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;
        debug!(path = %path.display(), "Acquired state lock");
        Ok(Self { path, file })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "Released state lock");
    }
}

fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = OsString::from(state_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock_file(state_path: &Path) -> Result<(PathBuf, File)> {
    let path = lock_path(state_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("failed to open lock file {}", path.display()))?;
    Ok((path, file))
}

/// Read the snapshot at `path`, or start an empty ledger if there is none
pub fn load_snapshot(path: &Path, config: &LedgerConfig) -> Result<LedgerSnapshot> {
    if !path.exists() {
        info!(path = %path.display(), "No ledger state found, starting empty");
        return Ok(LedgerSnapshot::empty(config));
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read ledger state {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json(&json)
        .with_context(|| format!("failed to decode ledger state {}", path.display()))?;
    debug!(path = %path.display(), "Loaded ledger state");
    Ok(snapshot)
}

/// Write through a sibling temp file so a crash never leaves a torn file
pub fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = snapshot.to_json()?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace ledger state {}", path.display()))?;
    debug!(path = %path.display(), "Saved ledger state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_entitlements::{
        CredentialLedger, LedgerEnv, NullEventSink, PauseSwitch, Role, RoleTable,
    };
    use certledger_types::{Category, Principal, TypeDefinition};
    use std::sync::Arc;

    #[test]
    fn test_missing_state_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::default();
        let snapshot = load_snapshot(&dir.path().join("state.json"), &config).unwrap();
        assert_eq!(snapshot, LedgerSnapshot::empty(&config));
    }

    #[test]
    fn test_save_then_load_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let config = LedgerConfig::default();
        let snapshot = LedgerSnapshot::empty(&config);

        save_snapshot(&path, &snapshot).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(load_snapshot(&path, &config).unwrap(), snapshot);
    }

    #[test]
    fn test_second_lock_fails_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let held = StateLock::acquire(&path).unwrap();
        assert_eq!(held.path, dir.path().join("state.json.lock"));

        let (_, contender) = open_lock_file(&path).unwrap();
        assert!(contender.try_lock_exclusive().is_err());

        drop(held);
        assert!(contender.try_lock_exclusive().is_ok());
    }

    #[test]
    fn test_locked_read_modify_write_is_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = LedgerConfig::default();
        let ops = Principal::new("ops");

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let (path, config, ops) = (&path, &config, &ops);
                scope.spawn(move || {
                    let _lock = StateLock::acquire(path).unwrap();
                    let roles = RoleTable::new();
                    roles.grant(ops.clone(), Role::Admin);
                    let env = LedgerEnv::new(Arc::new(roles), Arc::new(PauseSwitch::default()))
                        .with_events(Arc::new(NullEventSink));
                    let snapshot = load_snapshot(path, config).unwrap();
                    let ledger =
                        CredentialLedger::from_snapshot(config.clone(), env, snapshot).unwrap();
                    ledger
                        .entitlements
                        .create_type(
                            ops,
                            TypeDefinition::new(format!("Badge {worker}"), Category::EventBadge),
                        )
                        .unwrap();
                    save_snapshot(path, &ledger.snapshot()).unwrap();
                });
            }
        });

        let snapshot = load_snapshot(&path, &config).unwrap();
        assert_eq!(snapshot.entitlements.types().len(), 8);
    }

    #[test]
    fn test_corrupt_state_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        let err = load_snapshot(&path, &LedgerConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("state.json"));
    }
}
