use std::collections::HashMap;

use grandpearl::HmsError;
use grandpearl::executor::RowSet;
use grandpearl::server::page_data;

#[test]
fn row_sets_serialise_as_columns_and_rows() {
    let rows = RowSet { columns: vec!["RoomNumber".to_string()], rows: vec![vec!["101".into()]] };
    let data = page_data(rows).expect("serialise");
    assert_eq!(data, serde_json::json!({ "columns": ["RoomNumber"], "rows": [["101"]] }));
}

#[test]
fn unserialisable_payloads_are_errors_not_nulls() {
    // JSON object keys must be strings
    let payload: HashMap<(i64, i64), i64> = HashMap::from([((1, 2), 3)]);
    assert!(matches!(page_data(payload), Err(HmsError::Serialization(_))));
}
