//! Rate files, band CSVs and history export working against real backends.

use std::path::PathBuf;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use taxlator_core::calculations::{Calculator, PayeInput, TaxRequest};
use taxlator_core::{CalculationKind, HistoryRepository, NewHistoryRecord, RateSchedule, TaxBand};
use taxlator_data::{ExportFormat, TaxBandLoader, load_schedule, write_history};
use taxlator_db_sqlite::SqliteRepository;

const BANDS_CSV: &str = include_str!("../test-data/bands_2026.csv");

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data").join(name)
}

fn date(
    y: i32,
    m: u32,
    d: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool);
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo
}

#[test]
fn test_rate_file_selects_table_by_date() {
    let schedule = load_schedule(&fixture("rates.toml")).expect("Failed to load rate file");

    assert_eq!(schedule.tables().len(), 2);
    assert_eq!(schedule.for_date(date(2025, 12, 31)), None);
    assert_eq!(
        schedule.for_date(date(2026, 6, 30)).map(|t| t.vat.domestic),
        Some(dec!(0.075))
    );
    assert_eq!(
        schedule.for_date(date(2027, 1, 1)).map(|t| t.vat.domestic),
        Some(dec!(0.10))
    );
}

#[test]
fn test_builtin_rates_match_fixture() {
    let schedule = load_schedule(&fixture("rates.toml")).unwrap();

    assert_eq!(schedule.tables()[0], RateSchedule::default().tables()[0]);
}

#[test]
fn test_band_csv_updates_loaded_schedule() {
    let mut schedule = load_schedule(&fixture("rates.toml")).unwrap();
    let records = TaxBandLoader::parse(BANDS_CSV.as_bytes()).expect("Failed to parse CSV");

    let loaded = TaxBandLoader::apply(&mut schedule, &records).expect("Failed to apply bands");

    assert_eq!(loaded, 9);
    let table_2027 = schedule.for_date(date(2027, 3, 1)).unwrap();
    assert_eq!(
        table_2027.freelancer_bands,
        vec![
            TaxBand::bounded(dec!(1000000), dec!(0)),
            TaxBand::bounded(dec!(10000000), dec!(0.15)),
            TaxBand::unbounded(dec!(0.20)),
        ]
    );
    // PAYE 2027 was not in the CSV.
    assert_eq!(table_2027.paye_bands.len(), 2);
}

#[test]
fn test_band_csv_feeds_calculation() {
    let mut schedule = RateSchedule::default();
    let records = TaxBandLoader::parse(BANDS_CSV.as_bytes()).unwrap();
    let only_2026: Vec<_> = records
        .into_iter()
        .filter(|r| r.effective_from == date(2026, 1, 1))
        .collect();
    TaxBandLoader::apply(&mut schedule, &only_2026).unwrap();

    let table = schedule.for_date(date(2026, 5, 1)).unwrap();
    let outcome = Calculator::new(table)
        .calculate_tax(&TaxRequest::Paye(PayeInput::new(dec!(10000000))))
        .unwrap();

    assert_eq!(outcome.total_tax(), dec!(951000));
}

#[tokio::test]
async fn test_export_stored_history_as_csv() {
    let repo = setup_test_db().await;
    repo.create_record(NewHistoryRecord {
        kind: CalculationKind::Cit,
        input: json!({"revenue": "120000000", "expenses": "70000000"}),
        result: json!({"tax_payable": "10000000.00"}),
    })
    .await
    .unwrap();

    let records = repo.list_records(None).await.unwrap();
    let mut out = Vec::new();
    write_history(&mut out, &records, ExportFormat::Csv).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("kind,created_at,input,result"));
    let row = lines.next().expect("one data row");
    assert!(row.starts_with("cit,"));
    assert!(row.contains(r#"""tax_payable"":""10000000.00"""#));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_export_stored_history_as_json() {
    let repo = setup_test_db().await;
    for kind in [CalculationKind::Paye, CalculationKind::Vat] {
        repo.create_record(NewHistoryRecord {
            kind,
            input: json!({}),
            result: json!({}),
        })
        .await
        .unwrap();
    }

    let records = repo.list_records(None).await.unwrap();
    let mut out = Vec::new();
    write_history(&mut out, &records, ExportFormat::Json).unwrap();

    let exported: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let kinds: Vec<&str> = exported
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["vat", "paye"]);
}
