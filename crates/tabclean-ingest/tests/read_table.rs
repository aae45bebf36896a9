use std::io::Write;

use tabclean_ingest::{IngestError, LoadOptions, read_table};
use tabclean_model::ColumnKind;
use tempfile::{NamedTempFile, TempDir};

fn create_temp_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn reads_world_bank_layout() {
    let file = create_temp_csv(
        "Country Name,Country Code,1990,1991\n\
         Aruba,ABW,0,2.5\n\
         Chad,TCD,1.25,\n",
    );
    let table = read_table(file.path(), &LoadOptions::default()).unwrap();

    assert_eq!(table.column_names(), vec!["Country Name", "Country Code", "1990", "1991"]);
    assert_eq!(table.height(), 2);
    assert_eq!(table.kind_of("Country Code"), Some(ColumnKind::Text));
    assert_eq!(table.numeric("1990").unwrap(), vec![Some(0.0), Some(1.25)]);
    assert_eq!(table.numeric("1991").unwrap(), vec![Some(2.5), None]);
}

#[test]
fn trailing_delimiter_column_is_dropped() {
    let file = create_temp_csv(
        "Country Name,Country Code,1990,1991,\n\
         Aruba,ABW,0,2.5,\n\
         Chad,TCD,1.25,,\n",
    );
    let table = read_table(file.path(), &LoadOptions::default()).unwrap();

    assert_eq!(table.column_names(), vec!["Country Name", "Country Code", "1990", "1991"]);
    assert_eq!(table.numeric("1991").unwrap(), vec![Some(2.5), None]);
}

#[test]
fn strips_bom_and_tabs_from_headers() {
    let file = create_temp_csv("\u{feff}country_name,\taqi_value\nIndia,187\n");
    let table = read_table(file.path(), &LoadOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["country_name", "aqi_value"]);
}

#[test]
fn table_is_named_after_file_stem() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("GlobalTemperatures_Cleaned.csv");
    std::fs::write(&path, "dt,LandAverageTemperature\n1750-01-01,3.034\n").unwrap();
    let table = read_table(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.name(), "GlobalTemperatures_Cleaned");
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let dir = TempDir::new().unwrap();
    let err = read_table(&dir.path().join("absent.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
    assert!(!err.is_format_error());
}

#[test]
fn ragged_rows_are_reported_with_line() {
    let file = create_temp_csv("a,b,c\n1,2,3\n4,5\n");
    let err = read_table(file.path(), &LoadOptions::default()).unwrap_err();
    match err {
        IngestError::CsvParse { line, .. } => assert_eq!(line, Some(3)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn custom_null_tokens_replace_defaults() {
    let file = create_temp_csv("v\n1\n-\nNA\n");
    let options = LoadOptions::default().with_null_tokens(vec!["-".to_string()]);
    let table = read_table(file.path(), &options).unwrap();
    // "NA" is no longer a null token, so the column cannot be numeric.
    assert_eq!(table.kind_of("v"), Some(ColumnKind::Text));
    assert_eq!(
        table.text("v").unwrap(),
        vec![Some("1".to_string()), None, Some("NA".to_string())]
    );
}
