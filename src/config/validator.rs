//! Declaration validation: naming, field types and reference integrity.

use crate::case::default_path_segment;
use crate::codec::SELF_LINK;
use crate::config::{EntityConfig, FieldType};
use crate::error::SchemaError;
use std::collections::HashSet;

/// Path segment an entity is mounted under (explicit `path` or derived from the name).
pub fn path_segment_of(entity: &EntityConfig) -> String {
    entity
        .path
        .clone()
        .unwrap_or_else(|| default_path_segment(&entity.name))
}

fn valid_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| matches!(c, '/' | ':' | '*' | '?' | '#' | '{' | '}') || c.is_whitespace())
}

pub fn validate(config: &[EntityConfig]) -> Result<(), SchemaError> {
    let entity_names: HashSet<&str> = config.iter().map(|e| e.name.as_str()).collect();
    let mut seen_names = HashSet::new();
    let mut seen_paths = HashSet::new();

    for e in config {
        if e.name.trim().is_empty() {
            return Err(SchemaError::EmptyEntityName);
        }
        if !seen_names.insert(e.name.as_str()) {
            return Err(SchemaError::DuplicateEntity(e.name.clone()));
        }
        let path = path_segment_of(e);
        if !valid_path_segment(&path) {
            return Err(SchemaError::InvalidPathSegment {
                entity: e.name.clone(),
                path,
            });
        }
        if !seen_paths.insert(path.clone()) {
            return Err(SchemaError::DuplicatePathSegment(path));
        }
        if e.identity.trim().is_empty() {
            return Err(SchemaError::InvalidIdentity {
                entity: e.name.clone(),
                field: e.identity.clone(),
                reason: "identity name is empty",
            });
        }
        if e.identity == SELF_LINK {
            return Err(SchemaError::ReservedName {
                entity: e.name.clone(),
                name: e.identity.clone(),
            });
        }

        let mut field_names = HashSet::new();
        for f in &e.fields {
            if f.name == SELF_LINK {
                return Err(SchemaError::ReservedName {
                    entity: e.name.clone(),
                    name: f.name.clone(),
                });
            }
            if !field_names.insert(f.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                });
            }
            let field_type: FieldType = f.type_.parse().map_err(|_| SchemaError::UnknownFieldType {
                entity: e.name.clone(),
                field: f.name.clone(),
                type_name: f.type_.clone(),
            })?;

            if f.name == e.identity {
                if field_type != FieldType::Integer {
                    return Err(SchemaError::InvalidIdentity {
                        entity: e.name.clone(),
                        field: f.name.clone(),
                        reason: "identity must be an integer",
                    });
                }
                if f.required || f.unique {
                    return Err(SchemaError::InvalidIdentity {
                        entity: e.name.clone(),
                        field: f.name.clone(),
                        reason: "identity is store-assigned and cannot be required or unique",
                    });
                }
                continue;
            }

            if field_type == FieldType::Reference {
                let target = f.target.as_deref().ok_or_else(|| SchemaError::MissingReferenceTarget {
                    entity: e.name.clone(),
                    field: f.name.clone(),
                })?;
                if !entity_names.contains(target) {
                    return Err(SchemaError::UnknownReferenceTarget {
                        entity: e.name.clone(),
                        field: f.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declarations(value: serde_json::Value) -> Vec<EntityConfig> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_widget_with_reference() {
        let config = declarations(json!([
            { "name": "Category", "fields": [{ "name": "title", "type": "string" }] },
            { "name": "Widget", "fields": [
                { "name": "name", "type": "string", "required": true },
                { "name": "price", "type": "decimal" },
                { "name": "category", "type": "reference", "target": "Category" }
            ] }
        ]));
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn rejects_duplicate_entity_names() {
        let config = declarations(json!([
            { "name": "Widget", "fields": [] },
            { "name": "Widget", "path": "gadgets", "fields": [] }
        ]));
        assert_eq!(validate(&config), Err(SchemaError::DuplicateEntity("Widget".into())));
    }

    #[test]
    fn rejects_colliding_paths() {
        let config = declarations(json!([
            { "name": "Widget", "fields": [] },
            { "name": "Gadget", "path": "widgets", "fields": [] }
        ]));
        assert_eq!(validate(&config), Err(SchemaError::DuplicatePathSegment("widgets".into())));
    }

    #[test]
    fn rejects_unknown_field_type() {
        let config = declarations(json!([
            { "name": "Widget", "fields": [{ "name": "born", "type": "timestamp" }] }
        ]));
        assert!(matches!(
            validate(&config),
            Err(SchemaError::UnknownFieldType { type_name, .. }) if type_name == "timestamp"
        ));
    }

    #[test]
    fn rejects_non_integer_identity() {
        let config = declarations(json!([
            { "name": "Widget", "identity": "code", "fields": [{ "name": "code", "type": "string" }] }
        ]));
        assert!(matches!(validate(&config), Err(SchemaError::InvalidIdentity { .. })));
    }

    #[test]
    fn rejects_dangling_reference() {
        let config = declarations(json!([
            { "name": "Widget", "fields": [{ "name": "maker", "type": "reference", "target": "Maker" }] }
        ]));
        assert!(matches!(validate(&config), Err(SchemaError::UnknownReferenceTarget { .. })));

        let config = declarations(json!([
            { "name": "Widget", "fields": [{ "name": "maker", "type": "reference" }] }
        ]));
        assert!(matches!(validate(&config), Err(SchemaError::MissingReferenceTarget { .. })));
    }

    #[test]
    fn rejects_route_metacharacters_in_path() {
        let config = declarations(json!([{ "name": "Widget", "path": ":id", "fields": [] }]));
        assert!(matches!(validate(&config), Err(SchemaError::InvalidPathSegment { .. })));
    }

    #[test]
    fn rejects_self_as_field_or_identity() {
        let config = declarations(json!([
            { "name": "Link", "fields": [{ "name": "self", "type": "string", "required": true }] }
        ]));
        assert_eq!(
            validate(&config),
            Err(SchemaError::ReservedName {
                entity: "Link".into(),
                name: "self".into()
            })
        );

        let config = declarations(json!([{ "name": "Link", "identity": "self", "fields": [] }]));
        assert!(matches!(validate(&config), Err(SchemaError::ReservedName { .. })));
    }
}
