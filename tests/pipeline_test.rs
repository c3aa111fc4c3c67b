mod common;

use egressos_explorer::charts::{prepare_all, ChartData, ChartView};
use egressos_explorer::data::{
    read_dual_level_csv, Level, LoaderError, COL_ADMISSION_YEAR, COL_STATUS, DAYS_PER_MONTH,
    DAYS_PER_YEAR, DUAL_LEVEL_COLUMNS,
};
use egressos_explorer::pipeline::{self, PipelineError};
use egressos_explorer::report::RunSummary;
use egressos_explorer::stats;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

use common::{setup, EGRESSOS_CSV};

#[test]
fn test_filter_keeps_target_programs_with_resolved_status() {
    let (_dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    assert_eq!(output.loaded_rows, 10);
    assert_eq!(output.retained_rows, 8);

    let records = output.table.records().unwrap();
    assert!(records
        .iter()
        .all(|r| r.program == "PGCAP" || r.program.starts_with("ECO")));
    assert!(records.iter().all(|r| r.name != "Diego" && r.name != "Elisa"));
    assert_eq!(output.table.level_count(Level::Masters).unwrap(), 4);
    assert_eq!(output.table.level_count(Level::Doctorate).unwrap(), 4);
}

#[test]
fn test_derived_metrics_follow_fixed_day_counts() {
    let (_dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    for record in output.table.records().unwrap() {
        let months = (record.status_date - record.admission_date).num_days() as f64 / DAYS_PER_MONTH;
        let age = (record.status_date - record.birth_date).num_days() as f64 / DAYS_PER_YEAR;
        assert!((record.months_to_graduation - months).abs() < 1e-9);
        assert!((record.age_at_graduation - age).abs() < 1e-9);
        assert_eq!(record.admission_year, chrono::Datelike::year(&record.admission_date));
        assert_eq!(record.graduation_year, chrono::Datelike::year(&record.status_date));
    }

    let ana_msc = output
        .table
        .records()
        .unwrap()
        .into_iter()
        .find(|r| r.name == "Ana" && r.level == Level::Masters)
        .unwrap();
    // 2010-03-01 to 2012-03-01 spans the 2012 leap day
    assert_eq!(ana_msc.days_enrolled(), 731);
    assert!((ana_msc.months_to_graduation - 731.0 / 30.0).abs() < 1e-9);
    assert!(output.table.dataframe().column(COL_ADMISSION_YEAR).is_ok());
}

#[test]
fn test_dual_level_csv_has_one_row_per_student() {
    let (_dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    let names: Vec<&str> = output
        .dual_level_records
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Fabio", "Ana"]);

    let path = &config.output.dual_level_csv;
    let header = fs::read_to_string(path).unwrap();
    let first_line = header.lines().next().unwrap();
    assert_eq!(first_line, DUAL_LEVEL_COLUMNS.join(","));

    let reread = read_dual_level_csv(path, "%Y-%m-%d").unwrap();
    assert_eq!(reread, output.dual_level_records);
    assert_eq!(reread[1].registration_id, "0001");
    assert_eq!(reread[1].program, "PGCAP");
}

#[test]
fn test_grouped_counts() {
    let (_dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    let by_level = stats::count_by_year_and_level(&output.table).unwrap();
    let total: u32 = by_level.iter().map(|c| c.count).sum();
    assert_eq!(total, 8);
    let in_2018: Vec<(&str, u32)> = by_level
        .iter()
        .filter(|c| c.year == 2018)
        .map(|c| (c.group.as_str(), c.count))
        .collect();
    assert_eq!(in_2018, vec![("DOUTORADO", 1), ("MESTRADO", 1)]);

    let decades = stats::months_by_decade(&output.table, Level::Masters).unwrap();
    let labels: Vec<String> = decades.iter().map(|d| d.label()).collect();
    assert_eq!(labels, vec!["1990-2000", "2010-2020"]);
    assert_eq!(decades[1].values.len(), 3);
}

#[test]
fn test_all_twelve_charts_are_prepared() {
    let (_dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    let charts = prepare_all(&output.table, &output.dual_level_records).unwrap();
    assert_eq!(charts.len(), 12);
    assert_eq!(
        charts.iter().map(|c| c.view).collect::<Vec<_>>(),
        ChartView::all()
    );

    match &charts[11].data {
        ChartData::Timeline(records) => assert_eq!(records.len(), 2),
        other => panic!("unexpected chart data: {:?}", other),
    }
    match &charts[1].data {
        ChartData::Violins {
            groups, reference, ..
        } => {
            assert_eq!(groups[0].values.len(), 4);
            assert_eq!(reference.map(|r| r.expected), Some(24.0));
        }
        other => panic!("unexpected chart data: {:?}", other),
    }
}

#[test]
fn test_summary_serializes_counts() {
    let (dir, config) = setup(EGRESSOS_CSV);
    let output = pipeline::run(&config).unwrap();

    let summary = RunSummary::build(&output).unwrap();
    assert_eq!(summary.dual_level_students, 2);
    assert_eq!(summary.levels.len(), 2);
    assert_eq!(summary.levels[0].graduates, 4);

    let path = dir.path().join("resumo.json");
    summary.write(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["retained_rows"], 8);
    assert_eq!(json["levels"][1]["level"], "Doctorate");
}

#[test]
fn test_malformed_date_fails_the_run() {
    let csv = EGRESSOS_CSV.replace("2017-04-01", "01/04/2017");
    let (_dir, config) = setup(&csv);
    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Derive(_)));
    assert!(!Path::new(&config.output.dual_level_csv).exists());
}

#[test]
fn test_missing_input_is_reported() {
    let (dir, mut config) = setup(EGRESSOS_CSV);
    config.input.path = dir.path().join("absent.csv");
    assert!(matches!(
        pipeline::run(&config),
        Err(PipelineError::Load(_))
    ));
}

#[test]
fn test_empty_status_in_kept_program_fails_the_run() {
    let csv = EGRESSOS_CSV.replace(
        "ECOLOGIA,0003,Bruno,2015-03-01,2017-04-01,",
        "ECOLOGIA,0003,Bruno,2015-03-01,,",
    );
    let (_dir, config) = setup(&csv);
    match pipeline::run(&config) {
        Err(PipelineError::Load(LoaderError::MissingValue { column, name, .. })) => {
            assert_eq!(column, COL_STATUS);
            assert_eq!(name, "Bruno");
        }
        other => panic!("expected a missing status error, got {:?}", other.map(|o| o.retained_rows)),
    }
    assert!(!Path::new(&config.output.dual_level_csv).exists());
}
