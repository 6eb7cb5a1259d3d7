use std::path::PathBuf;
use std::sync::Arc;

use arima_terminal::config::AppConfig;
use arima_terminal::evaluation::HorseEvaluation;
use arima_terminal::forecaster::DeterministicForecaster;
use arima_terminal::loader::{DataFormat, DataSource, LoadedTable, TableCache, parse_table};
use arima_terminal::ranking::{Prediction, rank};
use arima_terminal::sign_theory::build_plan;
use arima_terminal::state::{
    AppState, Command, Delta, EMPTY_DATA_WARNING, Job, MAX_NUMBER_INPUT, NO_DATA_WARNING, Tab,
    apply_delta,
};
use arima_terminal::table::RaceTable;
use arima_terminal::worker::handle_command;

fn loaded() -> LoadedTable {
    let table = parse_table(include_bytes!("fixtures/race_tie.csv"), DataFormat::Csv).unwrap();
    LoadedTable {
        table: Arc::new(table),
        source: DataSource::Bytes,
    }
}

fn last_log(state: &AppState) -> &str {
    state.logs.back().map(String::as_str).unwrap_or_default()
}

#[test]
fn requests_without_data_warn_instead_of_dispatching() {
    let mut state = AppState::new("deterministic");
    assert!(state.request_prediction().is_none());
    assert_eq!(last_log(&state), format!("[WARN] {NO_DATA_WARNING}"));
    assert!(state.pending.is_empty());

    apply_delta(
        &mut state,
        Delta::SetData(LoadedTable {
            table: Arc::new(RaceTable::default()),
            source: DataSource::Unavailable,
        }),
    );
    assert!(state.request_evaluation().is_none());
    assert_eq!(last_log(&state), format!("[WARN] {EMPTY_DATA_WARNING}"));
}

#[test]
fn set_data_clears_stale_results() {
    let mut state = AppState::new("deterministic");
    state.prediction = Some(Prediction::default());
    state.evaluation = Some(HorseEvaluation::not_found(3));
    state.sign_plan = Some(build_plan(None));

    let cmd = state.request_load(None);
    assert!(matches!(cmd, Command::LoadDefault));
    assert!(state.is_pending(Job::Load));

    apply_delta(&mut state, Delta::SetData(loaded()));
    assert!(!state.is_pending(Job::Load));
    assert!(state.prediction.is_none());
    assert!(state.evaluation.is_none());
    assert!(state.sign_plan.is_some());
    assert_eq!(state.data.as_ref().map(|d| d.table.len()), Some(6));
    assert!(last_log(&state).contains("6行"));
}

#[test]
fn prediction_round_trip_through_worker() {
    let mut state = AppState::new("deterministic");
    apply_delta(&mut state, Delta::SetData(loaded()));

    let cmd = state.request_prediction().unwrap();
    assert!(state.is_pending(Job::Predict));

    let delta = handle_command(
        cmd,
        &DeterministicForecaster,
        &TableCache::new(),
        &AppConfig::default(),
    );
    apply_delta(&mut state, delta);
    assert!(state.pending.is_empty());
    let expected = rank(&loaded().table);
    assert_eq!(state.prediction.as_ref(), Some(&expected));
}

#[test]
fn evaluation_uses_current_number_input() {
    let mut state = AppState::new("deterministic");
    apply_delta(&mut state, Delta::SetData(loaded()));
    state.adjust_number(2);

    let cmd = state.request_evaluation().unwrap();
    assert!(matches!(cmd, Command::Evaluate { number: 3, .. }));
    let delta = handle_command(
        cmd,
        &DeterministicForecaster,
        &TableCache::new(),
        &AppConfig::default(),
    );
    apply_delta(&mut state, delta);
    assert_eq!(state.evaluation.as_ref().map(|e| e.number), Some(3));
}

#[test]
fn failed_load_is_logged_and_cleared() {
    let mut state = AppState::new("deterministic");
    let cmd = state.request_load(Some("missing/file.csv".to_string()));
    let delta = handle_command(
        cmd,
        &DeterministicForecaster,
        &TableCache::new(),
        &AppConfig::default(),
    );
    assert!(matches!(delta, Delta::Failed { job: Job::Load, .. }));
    apply_delta(&mut state, delta);
    assert!(state.pending.is_empty());
    assert!(last_log(&state).starts_with("[WARN] Load failed"));
    assert!(state.data.is_none());
}

#[test]
fn number_input_stays_in_range() {
    let mut state = AppState::new("deterministic");
    state.adjust_number(-5);
    assert_eq!(state.number_input, 1);
    state.adjust_number(100);
    assert_eq!(state.number_input, MAX_NUMBER_INPUT);

    state.type_digit(1);
    assert_eq!(state.number_input, 1);
    state.type_digit(2);
    assert_eq!(state.number_input, 12);
    state.type_digit(5);
    assert_eq!(state.number_input, 5);
    state.erase_digit();
    assert_eq!(state.number_input, 1);
}

#[test]
fn first_digit_replaces_default_number() {
    let mut state = AppState::new("deterministic");
    state.type_digit(5);
    assert_eq!(state.number_input, 5);
    state.type_digit(1);
    assert_eq!(state.number_input, 1);
    state.type_digit(4);
    assert_eq!(state.number_input, 14);

    state.erase_digit();
    assert_eq!(state.number_input, 1);
    state.type_digit(7);
    assert_eq!(state.number_input, 17);
    state.erase_digit();
    state.erase_digit();
    state.type_digit(7);
    assert_eq!(state.number_input, 7);
}

#[test]
fn running_or_stepping_starts_a_new_number() {
    let mut state = AppState::new("deterministic");
    apply_delta(&mut state, Delta::SetData(loaded()));
    state.type_digit(3);
    assert!(state.request_evaluation().is_some());
    state.type_digit(6);
    assert_eq!(state.number_input, 6);

    state.adjust_number(1);
    assert_eq!(state.number_input, 7);
    state.type_digit(2);
    assert_eq!(state.number_input, 2);
}

#[test]
fn export_requires_prediction_and_sign_plan() {
    let mut state = AppState::new("deterministic");
    assert!(state.request_export(PathBuf::from("x.xlsx")).is_none());
    assert!(!state.is_pending(Job::Export));

    state.prediction = Some(Prediction::default());
    state.sign_plan = Some(build_plan(None));
    let cmd = state.request_export(PathBuf::from("x.xlsx"));
    assert!(matches!(cmd, Some(Command::Export { evaluation: None, .. })));
    assert!(state.is_pending(Job::Export));
}

#[test]
fn tabs_cycle_in_order() {
    let mut tab = Tab::Prediction;
    let mut seen = Vec::new();
    for _ in 0..Tab::ALL.len() {
        seen.push(tab.title());
        tab = tab.next();
    }
    assert_eq!(seen, vec!["総合予想", "単体評価", "サイン理論"]);
    assert_eq!(tab, Tab::Prediction);
}

#[test]
fn log_is_capped() {
    let mut state = AppState::new("deterministic");
    for i in 0..250 {
        state.push_log(format!("line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}
