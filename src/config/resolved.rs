//! Resolved entity model: declarations validated and flattened for runtime use.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Semantic type of a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
    Decimal,
    Boolean,
    /// Integer id of an instance of another (or the same) entity.
    Reference,
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(FieldType::Integer),
            "string" => Ok(FieldType::String),
            "decimal" => Ok(FieldType::Decimal),
            "boolean" => Ok(FieldType::Boolean),
            "reference" => Ok(FieldType::Reference),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
    /// Index into `ResolvedModel::entities` for reference fields.
    pub target: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub name: String,
    pub path_segment: String,
    pub identity: String,
    /// Declaration order, identity excluded.
    pub fields: Vec<FieldInfo>,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A reference field elsewhere in the model that points at some entity.
#[derive(Clone, Debug)]
pub struct Referrer {
    pub entity: usize,
    pub field: String,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<EntityDescriptor>,
    pub entity_by_path: HashMap<String, usize>,
    /// For each entity index, the reference fields that target it.
    pub referrers: Vec<Vec<Referrer>>,
}

impl ResolvedModel {
    pub fn entity_by_path(&self, path: &str) -> Option<(usize, &EntityDescriptor)> {
        let idx = *self.entity_by_path.get(path)?;
        Some((idx, &self.entities[idx]))
    }

    pub fn entity(&self, idx: usize) -> &EntityDescriptor {
        &self.entities[idx]
    }
}
