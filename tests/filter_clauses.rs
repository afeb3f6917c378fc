//! Filter Clause Tests
//!
//! End-to-end behavior of the clause tools driven by JSON filters:
//! - Operator comparison and coercion
//! - Where matching over nested paths and arrays
//! - Order with absent values and multiple keys
//! - Slice bounds
//! - Field projection keeping the primary key

use std::cmp::Ordering;
use std::sync::Arc;

use clause_engine::clause::{FieldsClauseTool, FilterErrorCode, OperatorClauseTool, OrderClauseTool, SliceClauseTool};
use clause_engine::{FilterClause, ModelDefinition, ModelRegistry, WhereClause, WhereClauseTool};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn products() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Desk", "price": 250, "stock": {"count": 3}, "tags": ["office", "wood"]}),
        json!({"id": 2, "name": "desk lamp", "price": "40", "stock": {"count": 0}, "tags": ["office"]}),
        json!({"id": 3, "name": "Chair", "price": 120, "tags": []}),
        json!({"id": 4, "name": "Shelf", "price": null, "stock": {"count": 12}, "tags": ["wood"]}),
    ]
}

fn ids(records: &[Value]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn matching(where_json: Value) -> Vec<i64> {
    let clause = WhereClause::try_from(&where_json).unwrap();
    ids(&WhereClauseTool::filter(&products(), Some(&clause)).unwrap())
}

fn sorted(records: &[Value], order: &[&str]) -> Vec<i64> {
    let mut records = records.to_vec();
    let order: Vec<String> = order.iter().map(|s| s.to_string()).collect();
    OrderClauseTool::sort(&mut records, Some(order.as_slice())).unwrap();
    ids(&records)
}

// =============================================================================
// Operator Comparison
// =============================================================================

#[test]
fn test_compare_coercion() {
    let cmp = |a: Value, b: Value| OperatorClauseTool::compare(Some(&a), Some(&b));

    assert_eq!(cmp(json!(5), json!("5")), Some(Ordering::Equal));
    assert_eq!(cmp(json!(5), json!(true)), Some(Ordering::Greater));
    assert_eq!(cmp(json!("10"), json!(9)), Some(Ordering::Greater));
    assert_eq!(cmp(json!("abc"), json!("abd")), Some(Ordering::Less));
    assert_eq!(cmp(json!(true), json!(1)), Some(Ordering::Equal));
    assert_eq!(cmp(json!(1), json!({"a": 1})), None);
    assert_eq!(cmp(json!([1]), json!([1])), Some(Ordering::Equal));
}

#[test]
fn test_compare_absent_and_null() {
    let null = Value::Null;
    assert_eq!(OperatorClauseTool::compare(None, Some(&null)), Some(Ordering::Equal));
    assert_eq!(OperatorClauseTool::compare(None, None), Some(Ordering::Equal));
    assert_eq!(OperatorClauseTool::compare(Some(&json!(0)), None), None);
}

// =============================================================================
// Where Matching
// =============================================================================

#[test]
fn test_where_operators() {
    assert_eq!(matching(json!({"price": {"gt": 100}})), vec![1, 3]);
    assert_eq!(matching(json!({"price": {"lte": 40}})), vec![2]);
    assert_eq!(matching(json!({"price": {"between": [100, 300]}})), vec![1, 3]);
    assert_eq!(matching(json!({"id": {"nin": [1, 2]}})), vec![3, 4]);
    assert_eq!(matching(json!({"price": {"exists": true}})), vec![1, 2, 3, 4]);
    assert_eq!(matching(json!({"stock": {"exists": false}})), vec![3]);
}

#[test]
fn test_where_patterns() {
    assert_eq!(matching(json!({"name": {"like": "Desk%"}})), vec![1]);
    assert_eq!(matching(json!({"name": {"ilike": "desk%"}})), vec![1, 2]);
    assert_eq!(matching(json!({"name": {"nilike": "%desk%"}})), vec![3, 4]);
    assert_eq!(matching(json!({"name": {"regexp": "^s", "flags": "i"}})), vec![4]);
}

#[test]
fn test_where_nested_paths_and_arrays() {
    assert_eq!(matching(json!({"stock.count": {"gt": 2}})), vec![1, 4]);
    assert_eq!(matching(json!({"tags": "wood"})), vec![1, 4]);
    assert_eq!(matching(json!({"tags": {"neq": "office"}})), vec![3, 4]);
}

#[test]
fn test_where_null_matches_absent() {
    assert_eq!(matching(json!({"price": null})), vec![4]);
    assert_eq!(matching(json!({"stock": null})), vec![3]);
}

#[test]
fn test_where_groups() {
    let clause = json!({
        "or": [
            {"price": {"gt": 200}},
            {"and": [{"tags": "wood"}, {"stock.count": {"gte": 10}}]}
        ]
    });
    assert_eq!(matching(clause), vec![1, 4]);
}

#[test]
fn test_where_invalid_operator_value() {
    let clause = WhereClause::try_from(&json!({"price": {"inq": 5}})).unwrap();
    let err = WhereClauseTool::filter(&products(), Some(&clause)).unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidOperatorValue);
}

// =============================================================================
// Order
// =============================================================================

#[test]
fn test_order_absent_sorts_first_ascending() {
    let records = vec![json!({"id": 1, "a": 2}), json!({"id": 2}), json!({"id": 3, "a": 1})];
    assert_eq!(sorted(&records, &["a"]), vec![2, 3, 1]);
    assert_eq!(sorted(&records, &["a DESC"]), vec![1, 3, 2]);
}

#[test]
fn test_order_multiple_keys() {
    let records = vec![
        json!({"id": 1, "group": "b", "rank": 1}),
        json!({"id": 2, "group": "a", "rank": 1}),
        json!({"id": 3, "group": "b", "rank": 2}),
        json!({"id": 4, "group": "a", "rank": 3}),
    ];
    assert_eq!(sorted(&records, &["group ASC", "rank desc"]), vec![4, 2, 3, 1]);
}

#[test]
fn test_order_ties_keep_input_order() {
    let records = vec![json!({"id": 1, "k": 1}), json!({"id": 2, "k": 1}), json!({"id": 3, "k": 0})];
    assert_eq!(sorted(&records, &["k"]), vec![3, 1, 2]);
}

#[test]
fn test_order_mixed_value_types() {
    let records: Vec<Value> = (0..60)
        .map(|i: i64| {
            let v = match (i * 7) % 4 {
                0 => json!((i * 37) % 50),
                1 => Value::Null,
                2 => json!(format!("word{}", (i * 13) % 9)),
                _ => json!(format!("{}", (i * 11) % 40)),
            };
            json!({"id": i, "v": v})
        })
        .collect();

    let mut ascending = records.clone();
    let order = vec!["v".to_string()];
    OrderClauseTool::sort(&mut ascending, Some(order.as_slice())).unwrap();

    // numeric readings first, in numeric order, then words
    let is_word = |r: &Value| r["v"].as_str().is_some_and(|s| s.starts_with("word"));
    let first_word = ascending.iter().position(is_word).unwrap();
    assert!(ascending[first_word..].iter().all(is_word));
    let numbers: Vec<f64> = ascending[..first_word]
        .iter()
        .map(|r| match &r["v"] {
            Value::Null => 0.0,
            Value::String(s) => s.parse().unwrap(),
            other => other.as_f64().unwrap(),
        })
        .collect();
    assert!(numbers.windows(2).all(|w| w[0] <= w[1]));

    let mut descending = records;
    let order = vec!["v DESC".to_string()];
    OrderClauseTool::sort(&mut descending, Some(order.as_slice())).unwrap();
    assert!(is_word(&descending[0]));
}

// =============================================================================
// Slice
// =============================================================================

#[test]
fn test_slice_bounds() {
    let records = products();
    assert_eq!(ids(&SliceClauseTool::slice(&records, Some(1), Some(2))), vec![2, 3]);
    assert_eq!(ids(&SliceClauseTool::slice(&records, Some(3), None)), vec![4]);
    assert_eq!(ids(&SliceClauseTool::slice(&records, None, Some(0))), vec![1, 2, 3, 4]);
    assert!(SliceClauseTool::slice(&records, Some(10), Some(2)).is_empty());
}

#[test]
fn test_slice_parse_rejects_non_numeric() {
    assert!(FilterClause::try_from(&json!({"skip": "two"})).is_err());
    assert!(FilterClause::try_from(&json!({"limit": -1})).is_err());
}

// =============================================================================
// Fields
// =============================================================================

fn fields_tool() -> FieldsClauseTool {
    let mut registry = ModelRegistry::new();
    registry.register(ModelDefinition::new("product")).unwrap();
    registry
        .register(ModelDefinition::new("sku").with_primary_key("code"))
        .unwrap();
    FieldsClauseTool::new(Arc::new(registry))
}

#[test]
fn test_fields_keep_primary_key() {
    let tool = fields_tool();
    let input = Value::Array(products());
    let fields = vec!["name".to_string()];

    let projected = tool.filter(&input, "product", Some(fields.as_slice())).unwrap();
    assert_eq!(projected[0], json!({"name": "Desk", "id": 1}));
    assert_eq!(projected.as_array().unwrap().len(), 4);
}

#[test]
fn test_fields_single_record_custom_key() {
    let tool = fields_tool();
    let record = json!({"code": "X1", "label": "Bolt", "weight": 3});
    let fields = vec!["label".to_string()];

    let projected = tool.filter(&record, "sku", Some(fields.as_slice())).unwrap();
    assert_eq!(projected, json!({"label": "Bolt", "code": "X1"}));
    assert_eq!(projected.to_string(), r#"{"code":"X1","label":"Bolt"}"#);
}

#[test]
fn test_fields_errors() {
    let tool = fields_tool();
    let fields = vec!["name".to_string()];

    let err = tool.filter(&json!([1, 2]), "product", Some(fields.as_slice())).unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidArgument);
    assert!(tool.filter(&json!({"id": 1}), "", Some(fields.as_slice())).is_err());
    assert!(tool.filter(&json!({"id": 1}), "missing", Some(fields.as_slice())).is_err());
}
