//! # redb-backed Concept Storage
//!
//! A disk-backed concept store using the redb embedded database, providing:
//! - ACID transactions (one per store call)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Concepts are stored as postcard-encoded aggregates keyed by their UUID.
//! The name index is rebuilt in memory when the database is opened and kept
//! in step with every write, so exact-name lookups never scan the table.

use crate::store::{ConceptStore, fold_name};
use crate::vocabulary::Vocabulary;
use crate::{Concept, ConceptId, LexisError, primitives};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::Path;

/// Table for concepts: uuid (u128) -> serialized Concept bytes
const CONCEPTS: TableDefinition<u128, &[u8]> = TableDefinition::new("concepts");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const FORMAT_KEY: &str = "format_version";

fn storage_err(e: impl Display) -> LexisError {
    LexisError::Storage(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<Concept, LexisError> {
    postcard::from_bytes(bytes).map_err(|e| LexisError::Serialization(e.to_string()))
}

/// A disk-backed concept store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// In-memory name index: folded name -> concepts carrying it.
    name_index: BTreeMap<String, BTreeSet<ConceptId>>,
    vocabulary: Vocabulary,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("indexed_names", &self.name_index.len())
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a concept database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LexisError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables and check the format version
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(CONCEPTS).map_err(storage_err)?;
            {
                let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                let stored = meta
                    .get(FORMAT_KEY)
                    .map_err(storage_err)?
                    .map(|v| v.value());
                match stored {
                    None => {
                        meta.insert(FORMAT_KEY, u64::from(primitives::FORMAT_VERSION))
                            .map_err(storage_err)?;
                    }
                    Some(v) if v == u64::from(primitives::FORMAT_VERSION) => {}
                    Some(v) => {
                        return Err(LexisError::Storage(format!(
                            "unsupported database format {} (expected {})",
                            v,
                            primitives::FORMAT_VERSION
                        )));
                    }
                }
            }
            write_txn.commit().map_err(storage_err)?;
        }

        // Rebuild the name index
        let mut name_index: BTreeMap<String, BTreeSet<ConceptId>> = BTreeMap::new();
        {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(CONCEPTS).map_err(storage_err)?;
            for entry in table.iter().map_err(storage_err)? {
                let (_, value) = entry.map_err(storage_err)?;
                let concept = decode(value.value())?;
                for name in &concept.names {
                    name_index
                        .entry(fold_name(&name.name))
                        .or_default()
                        .insert(concept.id);
                }
            }
        }

        tracing::debug!(names = name_index.len(), "redb concept store opened");

        Ok(Self {
            db,
            name_index,
            vocabulary: Vocabulary::standard(),
        })
    }

    fn scan(&self, include_retired: bool) -> Result<Vec<Concept>, LexisError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(CONCEPTS).map_err(storage_err)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            let concept = decode(value.value())?;
            if include_retired || !concept.retired {
                out.push(concept);
            }
        }
        Ok(out)
    }

    fn index(&mut self, concept: &Concept) {
        for name in &concept.names {
            self.name_index
                .entry(fold_name(&name.name))
                .or_default()
                .insert(concept.id);
        }
    }

    fn unindex(&mut self, concept: &Concept) {
        for name in &concept.names {
            let key = fold_name(&name.name);
            if let Some(ids) = self.name_index.get_mut(&key) {
                ids.remove(&concept.id);
                if ids.is_empty() {
                    self.name_index.remove(&key);
                }
            }
        }
    }
}

impl ConceptStore for RedbStore {
    fn find_by_uuid(&self, id: ConceptId) -> Result<Option<Concept>, LexisError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(CONCEPTS).map_err(storage_err)?;

        match table.get(id.uuid().as_u128()).map_err(storage_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_exact_name(
        &self,
        name: &str,
        include_retired: bool,
    ) -> Result<Vec<Concept>, LexisError> {
        let Some(ids) = self.name_index.get(&fold_name(name)) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find_by_uuid(*id)? {
                Some(concept) if include_retired || !concept.retired => out.push(concept),
                _ => {}
            }
        }
        Ok(out)
    }

    fn list_all(&self, include_retired: bool) -> Result<Vec<Concept>, LexisError> {
        self.scan(include_retired)
    }

    fn count_all(&self, include_retired: bool) -> Result<usize, LexisError> {
        if include_retired {
            let read_txn = self.db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(CONCEPTS).map_err(storage_err)?;
            return Ok(table.len().map_err(storage_err)? as usize);
        }
        Ok(self.scan(false)?.len())
    }

    fn save(&mut self, concept: Concept) -> Result<(), LexisError> {
        let bytes = postcard::to_allocvec(&concept)
            .map_err(|e| LexisError::Serialization(e.to_string()))?;
        let key = concept.id.uuid().as_u128();

        let previous = self.find_by_uuid(concept.id)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(CONCEPTS).map_err(storage_err)?;
            table
                .insert(key, bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        if let Some(previous) = previous {
            self.unindex(&previous);
        }
        self.index(&concept);
        Ok(())
    }

    fn delete(&mut self, id: ConceptId) -> Result<bool, LexisError> {
        let Some(previous) = self.find_by_uuid(id)? else {
            return Ok(false);
        };

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(CONCEPTS).map_err(storage_err)?;
            table.remove(id.uuid().as_u128()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        self.unindex(&previous);
        Ok(true)
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

// =============================================================================
// TESTS
// =============================================================================
