//! JSON representations with hypermedia links, and request body decoding.

use crate::config::{EntityDescriptor, ResolvedModel, Settings};
use crate::error::AppError;
use crate::store::{EntityInstance, Record};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key carrying an instance's own link. Ignored when decoding.
pub const SELF_LINK: &str = "self";

/// One page of a collection as returned by list.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    pub items: Vec<Value>,
    pub page: u64,
    pub page_size: u32,
    pub total_count: u64,
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Entry point listing every exposed collection.
#[derive(Serialize, Debug)]
pub struct IndexBody {
    pub links: BTreeMap<String, String>,
}

pub fn instance_link(settings: &Settings, entity: &EntityDescriptor, id: u64) -> String {
    format!("{}/{}", settings.collection_path(&entity.path_segment), id)
}

fn page_link(settings: &Settings, entity: &EntityDescriptor, page: u64, page_size: u32) -> String {
    format!(
        "{}?page={}&pageSize={}",
        settings.collection_path(&entity.path_segment),
        page,
        page_size
    )
}

/// Identity, declared fields in declaration order, then the self link.
pub fn encode_instance(settings: &Settings, entity: &EntityDescriptor, instance: &EntityInstance) -> Value {
    let mut out = Map::new();
    out.insert(entity.identity.clone(), Value::from(instance.id));
    for f in &entity.fields {
        let v = instance.fields.get(&f.name).cloned().unwrap_or(Value::Null);
        out.insert(f.name.clone(), v);
    }
    out.insert(SELF_LINK.into(), Value::String(instance_link(settings, entity, instance.id)));
    Value::Object(out)
}

pub fn encode_page(
    settings: &Settings,
    entity: &EntityDescriptor,
    items: &[EntityInstance],
    page: u64,
    page_size: u32,
    total_count: u64,
) -> PageBody {
    let shown_through = page.saturating_add(1).saturating_mul(u64::from(page_size));
    let next = (shown_through < total_count).then(|| page_link(settings, entity, page + 1, page_size));
    let prev = (page > 0).then(|| {
        let last_page = total_count.saturating_sub(1) / u64::from(page_size.max(1));
        page_link(settings, entity, (page - 1).min(last_page), page_size)
    });
    PageBody {
        items: items.iter().map(|i| encode_instance(settings, entity, i)).collect(),
        page,
        page_size,
        total_count,
        self_link: page_link(settings, entity, page, page_size),
        next,
        prev,
    }
}

pub fn encode_index(settings: &Settings, model: &ResolvedModel) -> IndexBody {
    IndexBody {
        links: model
            .entities
            .iter()
            .map(|e| (e.path_segment.clone(), settings.collection_path(&e.path_segment)))
            .collect(),
    }
}

/// Turn a request body into the field map for create (`path_id = None`) or
/// update (`path_id = Some(id)`). Keys match field names case-sensitively.
pub fn decode_body(
    settings: &Settings,
    entity: &EntityDescriptor,
    body: Value,
    path_id: Option<u64>,
) -> Result<Record, AppError> {
    let obj = match body {
        Value::Object(m) => m,
        _ => return Err(AppError::BadRequest("body must be a JSON object".into())),
    };

    let mut out = Map::new();
    for (key, value) in obj {
        if key == SELF_LINK {
            continue;
        }
        if key == entity.identity {
            match path_id {
                Some(id) if value.as_u64() == Some(id) => continue,
                Some(_) => {
                    return Err(AppError::Validation(format!(
                        "{} does not match the id in the path",
                        entity.identity
                    )))
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "{} is assigned by the store and cannot be set",
                        entity.identity
                    )))
                }
            }
        }
        if entity.field(&key).is_none() {
            if settings.reject_unknown_fields {
                return Err(AppError::Validation(format!("unknown field '{}' for {}", key, entity.name)));
            }
            tracing::debug!(entity = %entity.name, field = %key, "dropping unknown field");
            continue;
        }
        out.insert(key, value);
    }
    Ok(out)
}
