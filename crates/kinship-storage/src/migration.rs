//! Schema versioning for persistent backends
//!
//! [`MIGRATIONS`] is the ordered ledger of schema steps. A backend supplies
//! the DDL for each step and the bookkeeping of the applied version; the
//! provided [`Migratable::migrate_to`] walks the ledger.

use crate::error::{StorageError, StorageResult};

/// Schema version written by this build
pub const CURRENT_VERSION: u32 = 2;

/// One step in the schema ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub version: u32,
    pub description: &'static str,
}

/// Every schema step, oldest first
pub const MIGRATIONS: &[SchemaVersion] = &[
    SchemaVersion {
        version: 1,
        description: "Relationship table with entity and subtype tables",
    },
    SchemaVersion {
        version: 2,
        description: "Endpoint indexes on (guid_one, relationship) and (guid_two, relationship)",
    },
];

/// Look up a step by version
pub fn schema_version(version: u32) -> Option<&'static SchemaVersion> {
    MIGRATIONS.iter().find(|step| step.version == version)
}

pub trait Migratable {
    /// Highest version recorded in storage, 0 for a fresh store
    fn get_schema_version(&self) -> StorageResult<u32>;

    fn set_schema_version(&self, version: u32) -> StorageResult<()>;

    /// Apply a single ledger step
    fn apply_migration(&self, step: &SchemaVersion) -> StorageResult<()>;

    /// Apply every pending step up to and including `target`.
    ///
    /// A store written by a newer build is refused rather than opened with a
    /// schema this build does not understand.
    fn migrate_to(&self, target: u32) -> StorageResult<()> {
        if schema_version(target).is_none() {
            return Err(StorageError::Migration(format!("Unknown schema version {}", target)));
        }

        let current = self.get_schema_version()?;
        if current > CURRENT_VERSION {
            return Err(StorageError::Migration(format!(
                "Schema version {} is newer than supported version {}",
                current, CURRENT_VERSION
            )));
        }

        let pending: Vec<&SchemaVersion> = MIGRATIONS
            .iter()
            .filter(|step| step.version > current && step.version <= target)
            .collect();
        if pending.is_empty() {
            tracing::debug!("Schema at version {}, nothing to apply", current);
            return Ok(());
        }

        for step in pending {
            tracing::info!("Applying schema v{}: {}", step.version, step.description);
            self.apply_migration(step)?;
            self.set_schema_version(step.version)?;
        }

        Ok(())
    }

    fn migrate_to_latest(&self) -> StorageResult<()> {
        self.migrate_to(CURRENT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Ledger {
        version: RefCell<u32>,
        applied: RefCell<Vec<u32>>,
    }

    impl Migratable for Ledger {
        fn get_schema_version(&self) -> StorageResult<u32> {
            Ok(*self.version.borrow())
        }

        fn set_schema_version(&self, version: u32) -> StorageResult<()> {
            *self.version.borrow_mut() = version;
            Ok(())
        }

        fn apply_migration(&self, step: &SchemaVersion) -> StorageResult<()> {
            self.applied.borrow_mut().push(step.version);
            Ok(())
        }
    }

    #[test]
    fn test_ledger_is_contiguous() {
        assert_eq!(MIGRATIONS.len() as u32, CURRENT_VERSION);
        for (i, step) in MIGRATIONS.iter().enumerate() {
            assert_eq!(step.version, i as u32 + 1);
        }
        assert!(schema_version(CURRENT_VERSION + 1).is_none());
    }

    #[test]
    fn test_applies_pending_steps_in_order() {
        let ledger = Ledger::default();
        ledger.migrate_to(1).unwrap();
        ledger.migrate_to_latest().unwrap();
        ledger.migrate_to_latest().unwrap();

        assert_eq!(*ledger.applied.borrow(), vec![1, 2]);
        assert_eq!(ledger.get_schema_version().unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_refuses_unknown_target_and_newer_store() {
        let ledger = Ledger::default();
        assert!(matches!(ledger.migrate_to(CURRENT_VERSION + 1), Err(StorageError::Migration(_))));

        ledger.set_schema_version(CURRENT_VERSION + 1).unwrap();
        assert!(matches!(ledger.migrate_to_latest(), Err(StorageError::Migration(_))));
        assert!(ledger.applied.borrow().is_empty());
    }
}
