//! Scoped write transaction over one table.
//!
//! Writes are staged and only applied by `commit`. Dropping an uncommitted
//! transaction discards them. Ids handed out by `allocate_id` stay consumed
//! either way.

use super::{Record, Store, Table};
use crate::error::AppError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
enum StagedWrite {
    Insert(u64, Record),
    Replace(u64, Record),
    Remove(u64),
}

pub struct Transaction<'a> {
    entity: usize,
    entity_name: &'a str,
    table: RwLockWriteGuard<'a, Table>,
    related: BTreeMap<usize, RwLockReadGuard<'a, Table>>,
    staged: Vec<StagedWrite>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(super) fn begin(store: &'a Store, entity: usize, related: &[usize]) -> Result<Self, AppError> {
        let entity_name = store.model().entity(entity).name.as_str();
        let poisoned = || AppError::Internal(format!("table lock poisoned while locking {}", entity_name));

        let order: BTreeSet<usize> = related.iter().copied().chain(std::iter::once(entity)).collect();
        let mut table = None;
        let mut related_guards = BTreeMap::new();
        for idx in order {
            let lock = store.table_lock(idx)?;
            if idx == entity {
                table = Some(lock.write().map_err(|_| poisoned())?);
            } else {
                related_guards.insert(idx, lock.read().map_err(|_| poisoned())?);
            }
        }
        let table = table.ok_or_else(|| AppError::Internal(format!("no table for {}", entity_name)))?;

        Ok(Transaction {
            entity,
            entity_name,
            table,
            related: related_guards,
            staged: Vec::new(),
            committed: false,
        })
    }

    /// Committed state of the transaction's own table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Committed state of a table locked by this transaction (own or related).
    pub fn locked_table(&self, entity: usize) -> Option<&Table> {
        if entity == self.entity {
            Some(&self.table)
        } else {
            self.related.get(&entity).map(|g| &**g)
        }
    }

    /// Reserve the next id. Never handed out again, even on rollback.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.table.next_id;
        self.table.next_id += 1;
        id
    }

    pub fn stage_insert(&mut self, id: u64, record: Record) {
        self.staged.push(StagedWrite::Insert(id, record));
    }

    pub fn stage_replace(&mut self, id: u64, record: Record) {
        self.staged.push(StagedWrite::Replace(id, record));
    }

    pub fn stage_remove(&mut self, id: u64) {
        self.staged.push(StagedWrite::Remove(id));
    }

    /// Apply all staged writes and release the locks.
    pub fn commit(mut self) {
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        for write in staged {
            match write {
                StagedWrite::Insert(id, record) | StagedWrite::Replace(id, record) => {
                    self.table.rows.insert(id, record);
                }
                StagedWrite::Remove(id) => {
                    self.table.rows.remove(&id);
                }
            }
        }
        self.committed = true;
        tracing::debug!(entity = %self.entity_name, writes = count, "transaction committed");
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            tracing::warn!(
                entity = %self.entity_name,
                writes = self.staged.len(),
                "transaction rolled back"
            );
        }
    }
}
