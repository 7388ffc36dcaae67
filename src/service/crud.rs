//! Generic CRUD execution against the in-memory store.

use crate::config::{EntityDescriptor, Settings};
use crate::error::AppError;
use crate::service::RequestValidator;
use crate::store::{EntityInstance, Record, Store, Transaction};
use serde_json::Value;

pub struct CrudService;

/// One page of a list, in insertion order.
#[derive(Debug)]
pub struct ListPage {
    pub items: Vec<EntityInstance>,
    pub page: u64,
    pub page_size: u32,
    pub total_count: u64,
}

impl CrudService {
    /// Insert one record with a fresh id. Returns the created instance.
    pub fn create(store: &Store, entity: usize, body: &Record) -> Result<EntityInstance, AppError> {
        let descriptor = store.model().entity(entity);
        let record = RequestValidator::validate_create(descriptor, body)?;

        let mut tx = store.begin(entity, &reference_targets(descriptor))?;
        check_references(&tx, descriptor, record.iter())?;
        check_unique(&tx, descriptor, &record, None)?;
        let id = tx.allocate_id();
        tx.stage_insert(id, record.clone());
        tx.commit();

        tracing::debug!(entity = %descriptor.name, id, "created");
        Ok(EntityInstance { id, fields: record })
    }

    /// Fetch one instance by id.
    pub fn read(store: &Store, entity: usize, id: u64) -> Result<EntityInstance, AppError> {
        let descriptor = store.model().entity(entity);
        let table = store.read(entity)?;
        table
            .instance(id)
            .ok_or_else(|| not_found(descriptor, id))
    }

    /// Page through instances in insertion order. `page` is zero-based; the
    /// page size falls back to the configured default and is clamped to the maximum.
    pub fn list(
        store: &Store,
        entity: usize,
        page: Option<u64>,
        page_size: Option<u32>,
        settings: &Settings,
    ) -> Result<ListPage, AppError> {
        let page_size = page_size.unwrap_or(settings.page_size_default);
        if page_size == 0 {
            return Err(AppError::Validation("pageSize must be at least 1".into()));
        }
        let page_size = page_size.min(settings.page_size_max);
        let page = page.unwrap_or(0);
        let offset = usize::try_from(page.saturating_mul(u64::from(page_size))).unwrap_or(usize::MAX);

        let table = store.read(entity)?;
        let items = table
            .iter()
            .skip(offset)
            .take(page_size as usize)
            .map(|(id, fields)| EntityInstance {
                id,
                fields: fields.clone(),
            })
            .collect();
        Ok(ListPage {
            items,
            page,
            page_size,
            total_count: table.len() as u64,
        })
    }

    /// Partial update: fields absent from `body` keep their stored value.
    pub fn update(store: &Store, entity: usize, id: u64, body: &Record) -> Result<EntityInstance, AppError> {
        let descriptor = store.model().entity(entity);

        let mut tx = store.begin(entity, &reference_targets(descriptor))?;
        let existing = tx.table().get(id).ok_or_else(|| not_found(descriptor, id))?;
        let record = RequestValidator::validate_update(descriptor, existing, body)?;
        check_references(&tx, descriptor, body.iter())?;
        check_unique(&tx, descriptor, &record, Some(id))?;
        tx.stage_replace(id, record.clone());
        tx.commit();

        tracing::debug!(entity = %descriptor.name, id, fields = body.len(), "updated");
        Ok(EntityInstance { id, fields: record })
    }

    /// Remove one instance. Refused while another instance references it.
    pub fn delete(store: &Store, entity: usize, id: u64) -> Result<(), AppError> {
        let model = store.model();
        let descriptor = model.entity(entity);
        let referrers = &model.referrers[entity];
        let related: Vec<usize> = referrers.iter().map(|r| r.entity).collect();

        let mut tx = store.begin(entity, &related)?;
        if !tx.table().contains(id) {
            return Err(not_found(descriptor, id));
        }
        let key = Value::from(id);
        for r in referrers {
            let table = tx
                .locked_table(r.entity)
                .ok_or_else(|| AppError::Internal(format!("referrer table {} not locked", r.entity)))?;
            let except = (r.entity == entity).then_some(id);
            if let Some(holder) = table.find_by_field(&r.field, &key, except) {
                return Err(AppError::Conflict(format!(
                    "{} {} is still referenced by {} {} ({})",
                    descriptor.name,
                    id,
                    model.entity(r.entity).name,
                    holder,
                    r.field
                )));
            }
        }
        tx.stage_remove(id);
        tx.commit();

        tracing::debug!(entity = %descriptor.name, id, "deleted");
        Ok(())
    }

    pub fn count(store: &Store, entity: usize) -> Result<u64, AppError> {
        Ok(store.read(entity)?.len() as u64)
    }
}

fn not_found(entity: &EntityDescriptor, id: u64) -> AppError {
    AppError::NotFound(format!("{} {}", entity.name, id))
}

fn reference_targets(entity: &EntityDescriptor) -> Vec<usize> {
    entity.fields.iter().filter_map(|f| f.target).collect()
}

/// Every non-null reference among `values` must point at an existing instance.
fn check_references<'v>(
    tx: &Transaction<'_>,
    entity: &EntityDescriptor,
    values: impl Iterator<Item = (&'v String, &'v Value)>,
) -> Result<(), AppError> {
    for (name, value) in values {
        let Some(target) = entity.field(name).and_then(|f| f.target) else {
            continue;
        };
        let Some(ref_id) = value.as_u64() else {
            continue;
        };
        let table = tx
            .locked_table(target)
            .ok_or_else(|| AppError::Internal(format!("reference table {} not locked", target)))?;
        if !table.contains(ref_id) {
            return Err(AppError::Validation(format!(
                "{} references missing instance {}",
                name, ref_id
            )));
        }
    }
    Ok(())
}

fn check_unique(
    tx: &Transaction<'_>,
    entity: &EntityDescriptor,
    record: &Record,
    except: Option<u64>,
) -> Result<(), AppError> {
    for field in entity.fields.iter().filter(|f| f.unique) {
        let Some(value) = record.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        if let Some(holder) = tx.table().find_by_field(&field.name, value, except) {
            return Err(AppError::Conflict(format!(
                "{} {} already has {} = {}",
                entity.name, holder, field.name, value
            )));
        }
    }
    Ok(())
}
