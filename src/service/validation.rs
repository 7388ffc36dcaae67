//! Field typing and required checks against the entity descriptor.

use crate::config::{EntityDescriptor, FieldInfo, FieldType};
use crate::error::AppError;
use crate::store::Record;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Full record for create: every required field present and non-null,
    /// absent optional fields stored as null.
    pub fn validate_create(entity: &EntityDescriptor, body: &Record) -> Result<Record, AppError> {
        let mut record = Record::new();
        for field in &entity.fields {
            let value = body.get(&field.name).cloned().unwrap_or(Value::Null);
            validate_field(field, &value)?;
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }

    /// Merge a partial body over the stored record. Only present fields are checked.
    pub fn validate_update(entity: &EntityDescriptor, existing: &Record, body: &Record) -> Result<Record, AppError> {
        let mut record = existing.clone();
        for (name, value) in body {
            let field = entity
                .field(name)
                .ok_or_else(|| AppError::Validation(format!("unknown field '{}' for {}", name, entity.name)))?;
            validate_field(field, value)?;
            record.insert(name.clone(), value.clone());
        }
        Ok(record)
    }
}

fn validate_field(field: &FieldInfo, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        if field.required {
            return Err(AppError::Validation(format!("{} is required", field.name)));
        }
        return Ok(());
    }
    let ok = match field.field_type {
        FieldType::Integer => v.is_i64() || v.is_u64(),
        FieldType::Decimal => v.is_number(),
        FieldType::String => v.is_string(),
        FieldType::Boolean => v.is_boolean(),
        FieldType::Reference => v.is_u64(),
    };
    if !ok {
        return Err(AppError::Validation(format!(
            "{} must be {}",
            field.name,
            expected(field.field_type)
        )));
    }
    Ok(())
}

fn expected(t: FieldType) -> &'static str {
    match t {
        FieldType::Integer => "an integer",
        FieldType::Decimal => "a number",
        FieldType::String => "a string",
        FieldType::Boolean => "a boolean",
        FieldType::Reference => "the id of an existing instance",
    }
}
