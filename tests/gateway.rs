//! Persistence gateway properties: identity, round-trips, pagination and
//! per-entity serialization of concurrent writes.

use entity_rest::{parse_declarations, provision, AppError, CrudService, Settings, Store};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

fn store() -> Store {
    let config = parse_declarations(
        r#"[
            { "name": "Widget", "fields": [
                { "name": "name", "type": "string", "required": true },
                { "name": "price", "type": "decimal" },
                { "name": "stock", "type": "integer" },
                { "name": "parent", "type": "reference", "target": "Widget" }
            ] },
            { "name": "Gadget", "fields": [{ "name": "label", "type": "string" }] }
        ]"#,
    )
    .unwrap();
    provision(&config).unwrap()
}

fn body(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("body must be an object"),
    }
}

#[test]
fn ids_are_fresh_and_never_reused() {
    let store = store();
    let mut seen = HashSet::new();
    for i in 0..10 {
        let w = CrudService::create(&store, 0, &body(json!({ "name": format!("w{i}") }))).unwrap();
        assert!(seen.insert(w.id), "id {} handed out twice", w.id);
    }
    CrudService::delete(&store, 0, 10).unwrap();
    let next = CrudService::create(&store, 0, &body(json!({ "name": "after delete" }))).unwrap();
    assert_eq!(next.id, 11);

    // a rejected create does not consume or reuse ids either
    assert!(CrudService::create(&store, 0, &body(json!({ "price": 1 }))).is_err());
    let next = CrudService::create(&store, 0, &body(json!({ "name": "again" }))).unwrap();
    assert_eq!(next.id, 12);

    // sequences are per entity type
    let g = CrudService::create(&store, 1, &body(json!({ "label": "g" }))).unwrap();
    assert_eq!(g.id, 1);
}

#[test]
fn create_then_read_round_trips() {
    let store = store();
    let created = CrudService::create(&store, 0, &body(json!({ "name": "Widget", "price": 9.99, "stock": 3 }))).unwrap();
    let fetched = CrudService::read(&store, 0, created.id).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.fields["parent"], Value::Null);
}

#[test]
fn delete_then_read_is_not_found() {
    let store = store();
    let created = CrudService::create(&store, 0, &body(json!({ "name": "w" }))).unwrap();
    CrudService::delete(&store, 0, created.id).unwrap();
    assert!(matches!(CrudService::read(&store, 0, created.id), Err(AppError::NotFound(_))));
    assert!(matches!(CrudService::delete(&store, 0, created.id), Err(AppError::NotFound(_))));
}

#[test]
fn pages_concatenate_to_insertion_order() {
    let store = store();
    let settings = Settings::default();
    let mut expected = Vec::new();
    for i in 0..23 {
        expected.push(CrudService::create(&store, 0, &body(json!({ "name": format!("w{i}") }))).unwrap().id);
    }
    // holes from deletes must not shift later pages
    CrudService::delete(&store, 0, 5).unwrap();
    expected.retain(|id| *id != 5);

    let mut collected = Vec::new();
    let mut page = 0;
    loop {
        let result = CrudService::list(&store, 0, Some(page), Some(4), &settings).unwrap();
        assert_eq!(result.total_count, 22);
        if result.items.is_empty() {
            break;
        }
        collected.extend(result.items.iter().map(|i| i.id));
        page += 1;
    }
    assert_eq!(collected, expected);
}

#[test]
fn page_size_is_clamped_to_maximum() {
    let store = store();
    let settings = Settings {
        page_size_default: 2,
        page_size_max: 3,
        ..Settings::default()
    };
    for i in 0..5 {
        CrudService::create(&store, 0, &body(json!({ "name": format!("w{i}") }))).unwrap();
    }
    let clamped = CrudService::list(&store, 0, None, Some(100), &settings).unwrap();
    assert_eq!(clamped.page_size, 3);
    assert_eq!(clamped.items.len(), 3);

    let default = CrudService::list(&store, 0, None, None, &settings).unwrap();
    assert_eq!(default.items.len(), 2);

    let beyond = CrudService::list(&store, 0, Some(50), None, &settings).unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_count, 5);
}

#[test]
fn self_reference_blocks_delete_of_parent_only() {
    let store = store();
    let parent = CrudService::create(&store, 0, &body(json!({ "name": "parent" }))).unwrap();
    let child = CrudService::create(&store, 0, &body(json!({ "name": "child", "parent": parent.id }))).unwrap();

    assert!(matches!(CrudService::delete(&store, 0, parent.id), Err(AppError::Conflict(_))));
    assert!(CrudService::read(&store, 0, parent.id).is_ok());

    // an instance referencing itself can still be deleted
    CrudService::update(&store, 0, child.id, &body(json!({ "parent": child.id }))).unwrap();
    CrudService::delete(&store, 0, child.id).unwrap();
    CrudService::delete(&store, 0, parent.id).unwrap();
}

#[test]
fn unique_decimals_compare_numerically() {
    let config = parse_declarations(
        r#"[{ "name": "Coin", "fields": [{ "name": "value", "type": "decimal", "unique": true }] }]"#,
    )
    .unwrap();
    let store = provision(&config).unwrap();
    CrudService::create(&store, 0, &body(json!({ "value": 1 }))).unwrap();
    let err = CrudService::create(&store, 0, &body(json!({ "value": 1.0 })));
    assert!(matches!(err, Err(AppError::Conflict(_))));

    let other = CrudService::create(&store, 0, &body(json!({ "value": 1.5 }))).unwrap();
    let err = CrudService::update(&store, 0, other.id, &body(json!({ "value": 1.0 })));
    assert!(matches!(err, Err(AppError::Conflict(_))));
    assert_eq!(CrudService::count(&store, 0).unwrap(), 2);
}

#[test]
fn failed_update_leaves_record_untouched() {
    let store = store();
    let created = CrudService::create(&store, 0, &body(json!({ "name": "w", "stock": 1 }))).unwrap();
    let err = CrudService::update(&store, 0, created.id, &body(json!({ "stock": "many" })));
    assert!(matches!(err, Err(AppError::Validation(_))));
    let err = CrudService::update(&store, 0, created.id, &body(json!({ "parent": 99 })));
    assert!(matches!(err, Err(AppError::Validation(_))));
    assert_eq!(CrudService::read(&store, 0, created.id).unwrap(), created);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_never_merge() {
    let store = Arc::new(store());
    let id = CrudService::create(&store, 0, &body(json!({ "name": "w0", "stock": 0 }))).unwrap().id;

    let mut handles = vec![];
    for task_id in 1..=8i64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for round in 0..50i64 {
                let n = task_id * 1000 + round;
                let patch = body(json!({ "name": format!("w{n}"), "stock": n }));
                CrudService::update(&store, 0, id, &patch).unwrap();
            }
        }));
    }
    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..200 {
                let w = CrudService::read(&store, 0, id).unwrap();
                let stock = w.fields["stock"].as_i64().unwrap();
                assert_eq!(w.fields["name"], json!(format!("w{stock}")));
            }
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    reader.await.unwrap();

    let last = CrudService::read(&store, 0, id).unwrap();
    let stock = last.fields["stock"].as_i64().unwrap();
    assert_eq!(last.fields["name"], json!(format!("w{stock}")));
    assert_eq!(stock % 1000, 49);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    let store = Arc::new(store());
    let mut handles = vec![];
    for task_id in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for i in 0..25 {
                let w = CrudService::create(&store, 0, &body(json!({ "name": format!("t{task_id}-{i}") }))).unwrap();
                ids.push(w.id);
            }
            ids
        }));
    }
    let mut all = HashSet::new();
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(all.insert(id));
        }
    }
    assert_eq!(all.len(), 200);
    assert_eq!(CrudService::count(&store, 0).unwrap(), 200);
}
