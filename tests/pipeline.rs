use std::io::{Cursor, Read};
use std::sync::Arc;

use anomaly_detector::analysis::classify::{classify, classify_items, OutlierStatus};
use anomaly_detector::analysis::criteria::{criteria_map, Criterion};
use anomaly_detector::analysis::range::quartile_bounds;
use anomaly_detector::analysis::summary::{affected_sessions, anomaly_breakdown, summary_stats};
use anomaly_detector::data::catalog::{list_analyzable_result_names, list_item_numbers};
use anomaly_detector::data::loader::{load_bytes, FileFormat};
use anomaly_detector::data::model::{CellValue, Table};
use anomaly_detector::errors::{AnalysisError, LoadError};
use anomaly_detector::export::{results_workbook, ResultSheet};
use anomaly_detector::state::AppState;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use calamine::{Data, Reader};
use parquet::arrow::ArrowWriter;

const CSV: &str = "\
ITEM_NUMBER,TEST_NUMBER,RESULT_NAME,RESPONSE,OPERATOR
P1,101,Warp,10.0,Ann
P1,101,Fill,5.0,Ann
P1,102,Warp,14.5,Bob
P1,102,Fill,N/A,Bob
P1,103,Warp,9.0,Ann
P1,103,Test Complete?,Yes,Ann
P2,201,Warp,3.0,Cy
P2,201,Fill,5.5,Cy
";

fn csv_table() -> Table {
    load_bytes(FileFormat::Csv, CSV.as_bytes().to_vec()).unwrap()
}

fn warp_and_fill() -> Vec<Criterion> {
    vec![
        Criterion::new("Warp", 8.0, 12.0),
        Criterion::new("Fill", 4.0, 6.0),
    ]
}

#[test]
fn csv_end_to_end() {
    let table = csv_table();
    assert_eq!(table.len(), 8);
    assert_eq!(list_item_numbers(&table), vec!["P1", "P2"]);
    assert_eq!(
        list_analyzable_result_names(&table, Some("P1")),
        vec!["Fill", "Warp"]
    );

    let criteria = criteria_map(&warp_and_fill());
    let classified = classify_items(&table, &["P1", "P2"], &criteria).unwrap();
    assert_eq!(classified.len(), 8);

    let abnormal: Vec<f64> = classified
        .iter()
        .filter(|c| c.is_abnormal())
        .filter_map(|c| c.record.numeric_response())
        .collect();
    assert_eq!(abnormal, vec![14.5, 3.0]);

    // "N/A" is never flagged, and rows without a criterion carry no bounds.
    let na = &classified[3];
    assert_eq!(na.record.response, CellValue::from("N/A"));
    assert_eq!(na.status, OutlierStatus::Normal);
    let complete = &classified[5];
    assert_eq!(complete.lower_bound, None);
    assert_eq!(complete.status, OutlierStatus::Normal);

    let stats = summary_stats(&classified);
    assert_eq!(stats.total_analyzed, 8);
    assert_eq!(stats.abnormal_count, 2);
    assert_eq!(stats.normal_count, 6);
    assert!((stats.percent_abnormal - 25.0).abs() < 1e-9);

    let sessions = affected_sessions(&classified);
    let tests: Vec<&CellValue> = sessions.iter().map(|s| &s.test_number).collect();
    assert_eq!(tests, vec![&CellValue::Integer(102), &CellValue::Integer(201)]);

    let breakdown = anomaly_breakdown(&classified);
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].result_name, "Warp");
    assert_eq!(breakdown[0].anomaly_count, 2);
}

#[test]
fn csv_export_reads_back() {
    let table = csv_table();
    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();

    let sheet = ResultSheet::build(&table.columns, &classified);
    assert_eq!(sheet.highlighted_rows(), vec![2]);

    let bytes = results_workbook(&table.columns, &classified).unwrap();
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Results").unwrap();
    let grid: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

    assert_eq!(grid.len(), 1 + 6);
    assert_eq!(grid[0].len(), 8);
    assert_eq!(grid[0][4], Data::String("OPERATOR".into()));
    assert_eq!(grid[3][3], Data::Float(14.5));
    assert_eq!(grid[3][5], Data::Float(8.0));
    assert_eq!(grid[3][6], Data::Float(12.0));
    assert_eq!(grid[3][7], Data::String("ABNORMAL".into()));
    assert_eq!(grid[4][3], Data::String("N/A".into()));
    assert_eq!(grid[6][5], Data::Empty);
    assert_eq!(grid[6][7], Data::String("NORMAL".into()));
}

#[test]
fn quartile_suggestion_uses_selected_products() {
    let table = csv_table();
    let p1 = quartile_bounds(&table, &["P1"], "Warp").unwrap();
    assert!((p1.lower - 9.5).abs() < 1e-9);
    assert!((p1.upper - 12.25).abs() < 1e-9);

    // Fill for P1 has a single numeric value.
    let fill = quartile_bounds(&table, &["P1"], "Fill").unwrap();
    assert_eq!((fill.lower, fill.upper), (5.0, 5.0));

    assert!(quartile_bounds(&table, &["P1"], "Test Complete?").is_none());
}

#[test]
fn missing_columns_are_reported_by_name() {
    let csv = "ITEM_NUMBER,TEST_NUMBER,RESULT_NAME\nP1,1,Warp\n";
    let err = load_bytes(FileFormat::Csv, csv.as_bytes().to_vec()).unwrap_err();
    assert_eq!(err, LoadError::MissingColumns(vec!["RESPONSE".into()]));
    assert_eq!(err.to_string(), "Missing required columns: RESPONSE");
}

#[test]
fn header_only_file_is_empty() {
    let csv = "ITEM_NUMBER,TEST_NUMBER,RESULT_NAME,RESPONSE\n";
    let err = load_bytes(FileFormat::Csv, csv.as_bytes().to_vec()).unwrap_err();
    assert_eq!(err, LoadError::EmptyTable);
}

#[test]
fn empty_criteria_are_refused() {
    let table = csv_table();
    let criteria = criteria_map(&Vec::<Criterion>::new());
    assert_eq!(
        classify(&table, "P1", &criteria).unwrap_err(),
        AnalysisError::NoCriteria
    );
}

#[test]
fn json_records_load() {
    let json = r#"[
        {"ITEM_NUMBER": "P1", "TEST_NUMBER": 7, "RESULT_NAME": "Warp", "RESPONSE": 20.5},
        {"ITEM_NUMBER": "P1", "TEST_NUMBER": 7, "RESULT_NAME": "Fill", "RESPONSE": "bad", "NOTE": "retest"}
    ]"#;
    let table = load_bytes(FileFormat::Json, json.as_bytes().to_vec()).unwrap();
    assert_eq!(
        table.columns,
        vec!["ITEM_NUMBER", "TEST_NUMBER", "RESULT_NAME", "RESPONSE", "NOTE"]
    );
    assert_eq!(table.records[0].value("NOTE"), CellValue::Null);
    assert_eq!(table.records[1].value("NOTE"), CellValue::from("retest"));

    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();
    assert!(classified[0].is_abnormal());
    assert!(!classified[1].is_abnormal());
}

#[test]
fn xlsx_first_sheet_loads() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in ["ITEM_NUMBER", "TEST_NUMBER", "RESULT_NAME", "RESPONSE"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    sheet.write_string(1, 0, "P9").unwrap();
    sheet.write_number(1, 1, 1.0).unwrap();
    sheet.write_string(1, 2, "Warp").unwrap();
    sheet.write_number(1, 3, 7.5).unwrap();
    // row 2 left blank
    sheet.write_string(3, 0, "P9").unwrap();
    sheet.write_number(3, 1, 2.0).unwrap();
    sheet.write_string(3, 2, "Warp").unwrap();
    sheet.write_string(3, 3, "12.5").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let table = load_bytes(FileFormat::Spreadsheet, bytes).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.records[0].numeric_response(), Some(7.5));
    assert_eq!(table.records[1].numeric_response(), Some(12.5));

    let criteria = criteria_map(&[Criterion::new("Warp", 0.0, 10.0)]);
    let classified = classify(&table, "P9", &criteria).unwrap();
    assert_eq!(summary_stats(&classified).abnormal_count, 1);
    assert!(classified[1].is_abnormal());
}

#[test]
fn parquet_columns_load() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("ITEM_NUMBER", DataType::Utf8, false),
        Field::new("TEST_NUMBER", DataType::Int64, false),
        Field::new("RESULT_NAME", DataType::Utf8, false),
        Field::new("RESPONSE", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["P1", "P1", "P1"])),
            Arc::new(Int64Array::from(vec![1, 1, 2])),
            Arc::new(StringArray::from(vec!["Warp", "Fill", "Warp"])),
            Arc::new(Float64Array::from(vec![Some(11.0), None, Some(13.0)])),
        ],
    )
    .unwrap();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_bytes(FileFormat::Parquet, buf).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.records[0].test_number, CellValue::Integer(1));
    assert_eq!(table.records[1].response, CellValue::Null);

    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();
    let statuses: Vec<OutlierStatus> = classified.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutlierStatus::Normal,
            OutlierStatus::Normal,
            OutlierStatus::Abnormal
        ]
    );
}

#[test]
fn session_runs_and_exports() {
    let mut state = AppState::default();
    state.set_table(csv_table(), "results.csv");
    assert_eq!(state.selected_items.len(), 2);

    // No filters yet.
    assert_eq!(state.run_analysis().unwrap_err(), AnalysisError::NoCriteria);
    assert_eq!(
        state.status_message.as_deref(),
        Some("at least one criterion required")
    );

    state.toggle_item("P2");
    state.add_filter();
    state.add_filter();
    let targets: Vec<Option<&str>> = state
        .filters
        .iter()
        .map(|f| f.result_name.as_deref())
        .collect();
    assert_eq!(targets, vec![Some("Fill"), Some("Warp")]);

    let run = state.run_analysis().unwrap();
    assert_eq!(run.items_processed, 1);
    assert_eq!(run.filters_applied, 2);
    assert_eq!(run.records.len(), 6);
    // Warp suggested 9.5..12.25 over P1, so 9.0 and 14.5 fall outside.
    assert_eq!(summary_stats(&run.records).abnormal_count, 2);

    let path = std::env::temp_dir().join(format!(
        "anomaly_detector_session_{}.xlsx",
        std::process::id()
    ));
    state.export_results(&path).unwrap();
    let mut workbook = calamine::open_workbook_auto(&path).unwrap();
    let range = workbook.worksheet_range("Results").unwrap();
    assert_eq!(range.rows().count(), 1 + 6);
    std::fs::remove_file(&path).unwrap();

    state.clear_results();
    assert!(state.results.is_none());
    assert!(state.export_results(&path).is_err());
}

#[test]
fn repeated_headers_export_each_column() {
    let csv = "ITEM_NUMBER,TEST_NUMBER,RESULT_NAME,RESPONSE,NOTE,NOTE\nP1,1,Warp,50,first,second\n";
    let table = load_bytes(FileFormat::Csv, csv.as_bytes().to_vec()).unwrap();
    assert_eq!(table.columns[4..], ["NOTE", "NOTE.1"]);

    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();
    let bytes = results_workbook(&table.columns, &classified).unwrap();

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Results").unwrap();
    let grid: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    assert_eq!(grid[0][4], Data::String("NOTE".into()));
    assert_eq!(grid[0][5], Data::String("NOTE.1".into()));
    assert_eq!(grid[1][4], Data::String("first".into()));
    assert_eq!(grid[1][5], Data::String("second".into()));
    assert_eq!(grid[1][8], Data::String("ABNORMAL".into()));
}

// -- raw workbook inspection --

fn workbook_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut part)
        .unwrap();
    part
}

fn section<'a>(xml: &'a str, open: &str, close: &str) -> &'a str {
    let start = xml.find(open).unwrap();
    let end = start + xml[start..].find(close).unwrap();
    &xml[start..end]
}

/// Attribute of the element whose text (after the tag name) starts `tag`.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let head = &tag[..tag.find('>').unwrap_or(tag.len())];
    let key = format!(" {name}=\"");
    let start = head.find(&key)? + key.len();
    let len = head[start..].find('"')?;
    Some(&head[start..start + len])
}

/// Cell style indices whose fill is the solid highlight colour.
fn highlight_styles(styles: &str) -> Vec<usize> {
    let highlight_fills: Vec<usize> = section(styles, "<fills", "</fills>")
        .split("<fill>")
        .skip(1)
        .enumerate()
        .filter(|(_, fill)| fill.contains("solid") && fill.contains("FFFFCCCC"))
        .map(|(i, _)| i)
        .collect();

    section(styles, "<cellXfs", "</cellXfs>")
        .split("<xf")
        .skip(1)
        .enumerate()
        .filter(|(_, xf)| {
            let fill: usize = attr(xf, "fillId").map_or(0, |id| id.parse().unwrap());
            highlight_fills.contains(&fill)
        })
        .map(|(i, _)| i)
        .collect()
}

/// (row number, shaded cells, total cells) for every written row.
fn shaded_cells_per_row(sheet: &str, shaded_styles: &[usize]) -> Vec<(u32, usize, usize)> {
    section(sheet, "<sheetData", "</sheetData>")
        .split("<row")
        .skip(1)
        .map(|row| {
            let number: u32 = attr(row, "r").unwrap().parse().unwrap();
            let styles: Vec<usize> = row
                .split("<c")
                .skip(1)
                .map(|cell| attr(cell, "s").map_or(0, |s| s.parse().unwrap()))
                .collect();
            let shaded = styles.iter().filter(|s| shaded_styles.contains(s)).count();
            (number, shaded, styles.len())
        })
        .collect()
}

#[test]
fn abnormal_row_is_the_only_shaded_row() {
    let table = csv_table();
    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();
    let bytes = results_workbook(&table.columns, &classified).unwrap();

    let shaded_styles = highlight_styles(&workbook_part(&bytes, "xl/styles.xml"));
    assert!(!shaded_styles.is_empty());

    let rows = shaded_cells_per_row(
        &workbook_part(&bytes, "xl/worksheets/sheet1.xml"),
        &shaded_styles,
    );
    assert_eq!(rows.len(), 1 + 6);

    let shaded_rows: Vec<u32> = rows
        .iter()
        .filter(|(_, shaded, _)| *shaded > 0)
        .map(|(r, _, _)| *r)
        .collect();
    // header is row 1; the 14.5 Warp reading is the third data row
    assert_eq!(shaded_rows, vec![4]);

    let (_, shaded, total) = rows[3];
    assert_eq!(total, 8);
    assert_eq!(shaded, total);
}

#[test]
fn blank_cells_of_an_abnormal_row_are_shaded() {
    let csv = "ITEM_NUMBER,TEST_NUMBER,RESULT_NAME,RESPONSE,OPERATOR\nP1,1,Warp,50,\nP1,2,Warp,10,\n";
    let table = load_bytes(FileFormat::Csv, csv.as_bytes().to_vec()).unwrap();
    let criteria = criteria_map(&warp_and_fill());
    let classified = classify(&table, "P1", &criteria).unwrap();
    let bytes = results_workbook(&table.columns, &classified).unwrap();

    let shaded_styles = highlight_styles(&workbook_part(&bytes, "xl/styles.xml"));
    let rows = shaded_cells_per_row(
        &workbook_part(&bytes, "xl/worksheets/sheet1.xml"),
        &shaded_styles,
    );

    // The empty OPERATOR cell is written blank only on the abnormal row.
    assert_eq!(rows[1], (2, 8, 8));
    assert_eq!(rows[2], (3, 0, 7));
}
