use std::collections::HashMap;
use std::path::PathBuf;

use arima_terminal::config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SAMPLE_PATH};
use arima_terminal::evaluation::evaluate;
use arima_terminal::export::export_report;
use arima_terminal::forecaster::forecaster_from_config;
use arima_terminal::loader::{DataFormat, parse_table};
use arima_terminal::ranking::{Prediction, rank};
use arima_terminal::sign_theory::build_plan;

fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn empty_environment_uses_defaults() {
    let cfg = config_from(&[]);
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.sample_path, PathBuf::from(DEFAULT_SAMPLE_PATH));
    assert!(!cfg.narrative_enabled());
}

#[test]
fn blank_values_count_as_unset() {
    let cfg = config_from(&[("OPENAI_API_KEY", "   "), ("OPENAI_MODEL", "")]);
    assert!(cfg.api_key.is_none());
    assert_eq!(cfg.model, DEFAULT_MODEL);
}

#[test]
fn overrides_are_trimmed_and_clamped() {
    let cfg = config_from(&[
        ("OPENAI_API_KEY", " sk-test "),
        ("OPENAI_MODEL", "gpt-4o"),
        ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
        ("ARIMA_DATA_URL", "https://example.com/arima.csv"),
        ("ARIMA_SAMPLE_PATH", "/tmp/arima.csv"),
        ("ARIMA_HTTP_TIMEOUT_SECS", "1"),
    ]);
    assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
    assert_eq!(cfg.model, "gpt-4o");
    assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    assert_eq!(cfg.data_url.as_deref(), Some("https://example.com/arima.csv"));
    assert_eq!(cfg.sample_path, PathBuf::from("/tmp/arima.csv"));
    assert_eq!(cfg.http_timeout_secs, 5);
    assert!(cfg.narrative_enabled());
}

#[test]
fn unparseable_timeout_uses_default() {
    let cfg = config_from(&[("ARIMA_HTTP_TIMEOUT_SECS", "soon")]);
    assert_eq!(cfg.http_timeout_secs, AppConfig::default().http_timeout_secs);
}

#[test]
fn forecaster_choice_follows_api_key() {
    let plain = forecaster_from_config(&config_from(&[])).unwrap();
    assert_eq!(plain.name(), "deterministic");

    let keyed = forecaster_from_config(&config_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
    assert_eq!(keyed.name(), "narrative");
}

#[test]
fn report_writes_all_three_sheets() {
    let table = parse_table(include_bytes!("fixtures/race_full.csv"), DataFormat::Csv).unwrap();
    let prediction = rank(&table);
    let evaluation = evaluate(&table, 1);
    let sign = build_plan(None);

    let path = std::env::temp_dir().join(format!("arima_report_{}.xlsx", std::process::id()));
    let report = export_report(&path, &prediction, Some(&evaluation), &sign).unwrap();
    assert_eq!(report.picks, 4);
    assert!(report.evaluation_rows > 0);
    assert!(report.sign_rows >= sign.steps.len());

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn report_without_evaluation_still_exports() {
    let path = std::env::temp_dir().join(format!(
        "arima_report_empty_{}.xlsx",
        std::process::id()
    ));
    let report = export_report(&path, &Prediction::default(), None, &build_plan(None)).unwrap();
    assert_eq!(report.picks, 0);
    assert_eq!(report.evaluation_rows, 0);
    let _ = std::fs::remove_file(&path);
}
