//! Runtime settings from `ENTITY_REST_*` environment variables.

use crate::config::ResolvedModel;
use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_PATH: &str = "/api";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 1000;
/// Operational routes always served at the root, whatever the base path.
pub const OPERATIONAL_PATHS: [&str; 3] = ["health", "ready", "version"];

#[derive(Clone, Debug)]
pub struct Settings {
    /// Normalized mount point: "" for root, otherwise "/seg[/seg...]" without trailing slash.
    pub base_path: String,
    pub page_size_default: u32,
    pub page_size_max: u32,
    /// When false, unknown body keys are dropped instead of rejected.
    pub reject_unknown_fields: bool,
    pub bind: String,
    pub schema_path: PathBuf,
    pub body_limit: usize,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_path: DEFAULT_BASE_PATH.into(),
            page_size_default: DEFAULT_PAGE_SIZE,
            page_size_max: MAX_PAGE_SIZE,
            reject_unknown_fields: true,
            bind: "0.0.0.0:8080".into(),
            schema_path: PathBuf::from("schema/entities.json"),
            body_limit: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let base_path = match lookup("ENTITY_REST_BASE_PATH") {
            Some(raw) => normalize_base_path(&raw)?,
            None => defaults.base_path,
        };
        let settings = Settings {
            base_path,
            page_size_default: parse_or("ENTITY_REST_PAGE_SIZE_DEFAULT", &lookup, defaults.page_size_default)?,
            page_size_max: parse_or("ENTITY_REST_PAGE_SIZE_MAX", &lookup, defaults.page_size_max)?,
            reject_unknown_fields: parse_or(
                "ENTITY_REST_REJECT_UNKNOWN_FIELDS",
                &lookup,
                defaults.reject_unknown_fields,
            )?,
            bind: lookup("ENTITY_REST_BIND").unwrap_or(defaults.bind),
            schema_path: lookup("ENTITY_REST_SCHEMA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.schema_path),
            body_limit: parse_or("ENTITY_REST_BODY_LIMIT", &lookup, defaults.body_limit)?,
            request_timeout: Duration::from_secs(parse_or(
                "ENTITY_REST_REQUEST_TIMEOUT_SECS",
                &lookup,
                defaults.request_timeout.as_secs(),
            )?),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.is_empty() && normalize_base_path(&self.base_path)? != self.base_path {
            return Err(ConfigError::InvalidBasePath {
                path: self.base_path.clone(),
                reason: "must not end with '/'",
            });
        }
        if self.page_size_max == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "ENTITY_REST_PAGE_SIZE_MAX",
                value: self.page_size_max.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        if self.page_size_default == 0 || self.page_size_default > self.page_size_max {
            return Err(ConfigError::InvalidSetting {
                key: "ENTITY_REST_PAGE_SIZE_DEFAULT",
                value: self.page_size_default.to_string(),
                reason: format!("must be between 1 and {}", self.page_size_max),
            });
        }
        Ok(())
    }

    /// With a root mount, entity collections share the namespace of the
    /// operational routes. Any collision is a startup error.
    pub fn check_mount(&self, model: &ResolvedModel) -> Result<(), ConfigError> {
        if !self.base_path.is_empty() {
            return Ok(());
        }
        match model
            .entities
            .iter()
            .find(|e| OPERATIONAL_PATHS.contains(&e.path_segment.as_str()))
        {
            Some(e) => Err(ConfigError::ReservedPath {
                path: e.path_segment.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Absolute path of an entity collection, e.g. "/api/widgets".
    pub fn collection_path(&self, path_segment: &str) -> String {
        format!("{}/{}", self.base_path, path_segment)
    }

    /// Absolute path of the index route ("/" when mounted at root).
    pub fn index_path(&self) -> String {
        if self.base_path.is_empty() {
            "/".into()
        } else {
            self.base_path.clone()
        }
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidSetting {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Validate a base path and bring it to canonical form.
/// "/" maps to "" (root mount); a trailing slash is trimmed.
pub fn normalize_base_path(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &'static str| ConfigError::InvalidBasePath {
        path: raw.to_string(),
        reason,
    };
    if !raw.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if raw.contains(['?', '#']) {
        return Err(invalid("must not contain a query or fragment"));
    }
    if raw.contains([':', '*', '{', '}']) || raw.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain route metacharacters or whitespace"));
    }
    if raw.parse::<axum::http::uri::PathAndQuery>().is_err() {
        return Err(invalid("not a valid URI path"));
    }
    let trimmed = raw.strip_suffix('/').unwrap_or(raw);
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed[1..].split('/').any(str::is_empty) {
        return Err(invalid("must not contain empty segments"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_declarations, resolve};
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let s = settings_from(&[]).unwrap();
        assert_eq!(s.base_path, "/api");
        assert_eq!(s.page_size_default, 20);
        assert_eq!(s.page_size_max, 1000);
        assert!(s.reject_unknown_fields);
        assert_eq!(s.collection_path("widgets"), "/api/widgets");
    }

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path("/rest/").unwrap(), "/rest");
        assert_eq!(normalize_base_path("/v1/data").unwrap(), "/v1/data");
        assert_eq!(normalize_base_path("/").unwrap(), "");

        let root = settings_from(&[("ENTITY_REST_BASE_PATH", "/")]).unwrap();
        assert_eq!(root.collection_path("widgets"), "/widgets");
        assert_eq!(root.index_path(), "/");
    }

    #[test]
    fn invalid_base_path_fails_fast() {
        for bad in ["api", "/api?x=1", "/a//b", "/:id", "/has space"] {
            let err = settings_from(&[("ENTITY_REST_BASE_PATH", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidBasePath { .. }), "{bad} accepted");
        }
    }

    #[test]
    fn page_size_bounds_are_checked() {
        let err = settings_from(&[("ENTITY_REST_PAGE_SIZE_DEFAULT", "50"), ("ENTITY_REST_PAGE_SIZE_MAX", "10")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "ENTITY_REST_PAGE_SIZE_DEFAULT", .. }));

        let err = settings_from(&[("ENTITY_REST_PAGE_SIZE_MAX", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "ENTITY_REST_PAGE_SIZE_MAX", .. }));
    }

    #[test]
    fn unknown_field_policy_is_configurable() {
        let s = settings_from(&[("ENTITY_REST_REJECT_UNKNOWN_FIELDS", "false")]).unwrap();
        assert!(!s.reject_unknown_fields);
    }

    #[test]
    fn root_mount_rejects_operational_paths() {
        let model = resolve(
            &parse_declarations(r#"[{ "name": "Heartbeat", "path": "health", "fields": [] }]"#).unwrap(),
        )
        .unwrap();
        let root = settings_from(&[("ENTITY_REST_BASE_PATH", "/")]).unwrap();
        let err = root.check_mount(&model).unwrap_err();
        assert!(matches!(err, ConfigError::ReservedPath { ref path } if path == "health"));

        // under a base path the same entity is fine
        assert!(Settings::default().check_mount(&model).is_ok());
    }
}
