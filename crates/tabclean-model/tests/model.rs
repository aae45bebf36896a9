//! Integration tests for the table model.

use tabclean_model::{ColumnKind, ColumnValues, SentinelPolicy, Table};

fn emissions() -> Table {
    Table::new(
        "emissions",
        vec![
            (
                "Country Name".to_string(),
                ColumnValues::Text(vec![
                    Some("Aruba".to_string()),
                    Some("Chad".to_string()),
                    Some("Peru".to_string()),
                ]),
            ),
            (
                "1990".to_string(),
                ColumnValues::Numeric(vec![Some(0.0), Some(2.5), Some(3.5)]),
            ),
            (
                "1991".to_string(),
                ColumnValues::Numeric(vec![None, Some(1.0), Some(0.0)]),
            ),
        ],
    )
    .expect("build table")
}

#[test]
fn schema_follows_insertion_order() {
    let table = emissions();
    assert_eq!(table.column_names(), vec!["Country Name", "1990", "1991"]);
    assert_eq!(table.numeric_columns(), vec!["1990", "1991"]);
    assert_eq!(table.text_columns(), vec!["Country Name"]);
    assert_eq!(table.kind_of("1990"), Some(ColumnKind::Numeric));
}

#[test]
fn frame_mirrors_schema() {
    let table = emissions();
    let frame = table.frame();
    assert_eq!(frame.height(), 3);
    assert_eq!(frame.width(), 3);
    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["Country Name", "1990", "1991"]);
}

#[test]
fn select_reorders_columns() {
    let table = emissions();
    let selected = table
        .select(&["1991".to_string(), "Country Name".to_string()])
        .expect("select");
    assert_eq!(selected.column_names(), vec!["1991", "Country Name"]);
    assert_eq!(selected.numeric("1991").unwrap(), vec![None, Some(1.0), Some(0.0)]);
}

#[test]
fn sentinel_counts_respect_policy() {
    let table = emissions();
    let values = table.numeric("1991").unwrap();
    let zeros = values
        .iter()
        .filter(|value| SentinelPolicy::Zero.is_sentinel(**value))
        .count();
    let nulls = values
        .iter()
        .filter(|value| SentinelPolicy::Null.is_sentinel(**value))
        .count();
    assert_eq!(zeros, 1);
    assert_eq!(nulls, 1);
}
