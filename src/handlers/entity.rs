//! Entity CRUD handlers: create, read, update, delete, list, plus the collection index.

use crate::codec::{decode_body, encode_index, encode_instance, encode_page, instance_link};
use crate::config::EntityDescriptor;
use crate::error::AppError;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn resolve_entity<'a>(state: &'a AppState, path_segment: &str) -> Result<(usize, &'a EntityDescriptor), AppError> {
    state
        .store
        .model()
        .entity_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("no entity mounted at '{}'", path_segment)))
}

fn parse_id(id_str: &str) -> Result<u64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn parse_param<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str) -> Result<Option<T>, AppError> {
    params
        .get(key)
        .map(|v| {
            v.parse()
                .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key)))
        })
        .transpose()
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(encode_index(&state.settings, state.store.model()))
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (idx, entity) = resolve_entity(&state, &path_segment)?;
    let page = parse_param::<u64>(&params, "page")?;
    let page_size = parse_param::<u32>(&params, "pageSize")?;

    let result = CrudService::list(&state.store, idx, page, page_size, &state.settings)?;
    Ok(Json(encode_page(
        &state.settings,
        entity,
        &result.items,
        result.page,
        result.page_size,
        result.total_count,
    )))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (idx, entity) = resolve_entity(&state, &path_segment)?;
    let body = decode_body(&state.settings, entity, json_body(payload)?, None)?;
    let created = CrudService::create(&state.store, idx, &body)?;
    let location = instance_link(&state.settings, entity, created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(encode_instance(&state.settings, entity, &created)),
    ))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (idx, entity) = resolve_entity(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let instance = CrudService::read(&state.store, idx, id)?;
    Ok(Json(encode_instance(&state.settings, entity, &instance)))
}

/// Serves both PUT and PATCH; both are partial updates.
pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (idx, entity) = resolve_entity(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let body = decode_body(&state.settings, entity, json_body(payload)?, Some(id))?;
    let updated = CrudService::update(&state.store, idx, id, &body)?;
    Ok(Json(encode_instance(&state.settings, entity, &updated)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (idx, _) = resolve_entity(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.store, idx, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Any path or verb without a route. Reports the path as requested, before nesting strips the base path.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
