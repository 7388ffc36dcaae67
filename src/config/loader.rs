//! Load declarations from JSON and resolve them into the runtime model.

use crate::config::resolved::{EntityDescriptor, FieldInfo, FieldType, Referrer, ResolvedModel};
use crate::config::types::EntityConfig;
use crate::config::{path_segment_of, validate};
use crate::error::{ConfigError, SchemaError};
use std::collections::HashMap;
use std::path::Path;

/// Build resolved model from declarations (validates first).
pub fn resolve(config: &[EntityConfig]) -> Result<ResolvedModel, SchemaError> {
    validate(config)?;

    let index_by_name: HashMap<&str, usize> = config
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.as_str(), i))
        .collect();

    let mut entities = Vec::with_capacity(config.len());
    let mut entity_by_path = HashMap::new();
    let mut referrers: Vec<Vec<Referrer>> = vec![Vec::new(); config.len()];

    for (idx, e) in config.iter().enumerate() {
        let mut fields = Vec::with_capacity(e.fields.len());
        for f in e.fields.iter().filter(|f| f.name != e.identity) {
            let field_type: FieldType = f.type_.parse().map_err(|_| SchemaError::UnknownFieldType {
                entity: e.name.clone(),
                field: f.name.clone(),
                type_name: f.type_.clone(),
            })?;
            let target = match field_type {
                FieldType::Reference => f.target.as_deref().and_then(|t| index_by_name.get(t).copied()),
                _ => None,
            };
            if let Some(t) = target {
                referrers[t].push(Referrer {
                    entity: idx,
                    field: f.name.clone(),
                });
            }
            fields.push(FieldInfo {
                name: f.name.clone(),
                field_type,
                required: f.required,
                unique: f.unique,
                target,
            });
        }

        let path_segment = path_segment_of(e);
        entity_by_path.insert(path_segment.clone(), idx);
        entities.push(EntityDescriptor {
            name: e.name.clone(),
            path_segment,
            identity: e.identity.clone(),
            fields,
        });
    }

    Ok(ResolvedModel {
        entities,
        entity_by_path,
        referrers,
    })
}

/// Parse a JSON array of entity declarations.
pub fn parse_declarations(json: &str) -> Result<Vec<EntityConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(format!("entity declarations: {}", e)))
}

/// Read and parse the declarations file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<EntityConfig>, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_declarations(&raw)
}
