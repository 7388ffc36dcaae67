//! Volatile in-memory store: one table per entity, each behind its own lock.
//! Created empty by `provision` and dropped with the process.

mod transaction;

pub use transaction::Transaction;

use crate::config::{resolve, EntityConfig, ResolvedModel};
use crate::error::{AppError, SchemaError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard};

/// Field values of one stored record, identity excluded.
pub type Record = Map<String, Value>;

/// A stored record together with its store-assigned identity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityInstance {
    pub id: u64,
    pub fields: Record,
}

/// Rows of a single entity type. Ids are handed out in increasing order,
/// so key order is insertion order.
#[derive(Debug)]
pub struct Table {
    rows: BTreeMap<u64, Record>,
    next_id: u64,
}

impl Table {
    fn new() -> Self {
        Table {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.rows.iter().map(|(id, r)| (*id, r))
    }

    pub fn instance(&self, id: u64) -> Option<EntityInstance> {
        self.get(id).map(|fields| EntityInstance {
            id,
            fields: fields.clone(),
        })
    }

    /// Id of some row other than `except` whose `field` equals `value`.
    pub fn find_by_field(&self, field: &str, value: &Value, except: Option<u64>) -> Option<u64> {
        self.iter()
            .find(|(id, r)| Some(*id) != except && r.get(field).is_some_and(|v| same_value(v, value)))
            .map(|(id, _)| id)
    }
}

/// Value equality where numbers compare by magnitude once either side is a float (`1 == 1.0`).
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Shared store state. The resolved model is fixed for the store's lifetime;
/// `tables[i]` backs `model.entities[i]`.
#[derive(Debug)]
pub struct Store {
    model: ResolvedModel,
    tables: Vec<RwLock<Table>>,
}

/// Validate declarations and allocate an empty table for each entity.
pub fn provision(config: &[EntityConfig]) -> Result<Store, SchemaError> {
    let model = resolve(config)?;
    Ok(Store::new(model))
}

impl Store {
    pub fn new(model: ResolvedModel) -> Self {
        let tables = model.entities.iter().map(|_| RwLock::new(Table::new())).collect();
        for e in &model.entities {
            let fields: Vec<String> = e
                .fields
                .iter()
                .map(|f| format!("{}:{}", f.name, f.field_type))
                .collect();
            tracing::info!(entity = %e.name, path = %e.path_segment, identity = %e.identity, fields = ?fields, "provisioned table");
        }
        Store { model, tables }
    }

    pub fn model(&self) -> &ResolvedModel {
        &self.model
    }

    /// Shared read access to one table.
    pub fn read(&self, entity: usize) -> Result<RwLockReadGuard<'_, Table>, AppError> {
        self.tables
            .get(entity)
            .ok_or_else(|| AppError::Internal(format!("no table for entity index {}", entity)))?
            .read()
            .map_err(|_| AppError::Internal(format!("table lock poisoned: {}", self.model.entity(entity).name)))
    }

    /// Open a write transaction on `entity`, read-locking `related` tables for
    /// the duration. Locks are taken in table-index order.
    pub fn begin(&self, entity: usize, related: &[usize]) -> Result<Transaction<'_>, AppError> {
        Transaction::begin(self, entity, related)
    }

    pub(crate) fn table_lock(&self, entity: usize) -> Result<&RwLock<Table>, AppError> {
        self.tables
            .get(entity)
            .ok_or_else(|| AppError::Internal(format!("no table for entity index {}", entity)))
    }

    /// True when every table lock can be taken (none poisoned).
    pub fn is_healthy(&self) -> bool {
        self.tables.iter().all(|t| t.read().is_ok())
    }
}
