//! Raw declaration types matching the entity JSON file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Checked during provisioning: integer, string, decimal, boolean or reference.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    /// Entity name a reference field points at.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    /// Route path segment; defaults to the uncapitalized plural of `name`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_identity")]
    pub identity: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

fn default_identity() -> String {
    "id".into()
}
