//! JSON snapshot persistence.

use crate::error::StoreError;
use crate::escrow::RoundEscrow;
use crate::ledger::InMemoryLedger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Full durable state: balances, airdrop bookkeeping and the round table
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub ledger: InMemoryLedger,
    pub escrow: RoundEscrow,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    ledger: &'a InMemoryLedger,
    escrow: &'a RoundEscrow,
}

/// Stores a snapshot at a fixed path, replacing it atomically on each save
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if nothing has been saved yet
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn save(&self, ledger: &InMemoryLedger, escrow: &RoundEscrow) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        {
            let file = fs::File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &SnapshotRef { ledger, escrow })?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        // Rename is atomic, so readers see either the old or the new snapshot
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WagerConfig;
    use crate::games::Choice;
    use crate::ledger::CreditLedger;
    use crate::protocol::{Identity, RoundId};

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("rps-wager-store-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_load_missing_snapshot() {
        let store = SnapshotStore::new(temp_path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let store = SnapshotStore::new(&path);
        let config = WagerConfig::default();
        let owner = Identity::new();
        let alice = Identity::new();
        let mut ledger = InMemoryLedger::new(owner, &config).unwrap();
        let mut escrow = RoundEscrow::new(config.min_stake);
        ledger.claim_airdrop(&alice).unwrap();
        escrow
            .initiate_round(&mut ledger, &alice, config.min_stake, Choice::Scissors)
            .unwrap();

        store.save(&ledger, &escrow).unwrap();
        let snapshot = store.load().unwrap().unwrap();

        assert_eq!(snapshot.ledger, ledger);
        assert_eq!(snapshot.escrow, escrow);
        assert!(snapshot.escrow.round(RoundId(0)).unwrap().is_pending());
        assert!(!path.with_extension("tmp").exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_corrupt_snapshot() {
        let path = temp_path();
        fs::write(&path, b"{ not json").unwrap();

        let result = SnapshotStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Json(_))));

        fs::remove_file(&path).unwrap();
    }
}
