use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use arima_terminal::coerce::display_float;
use arima_terminal::config::AppConfig;
use arima_terminal::export::export_report;
use arima_terminal::forecaster::{DeterministicForecaster, Forecaster, forecaster_from_config};
use arima_terminal::loader::{DataSource, TableCache};
use arima_terminal::ranking::PredictionRole;
use arima_terminal::state::{EMPTY_DATA_WARNING, NO_DATA_WARNING};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = AppConfig::load();
    let forecaster: Arc<dyn Forecaster> = if has_flag("--deterministic") {
        Arc::new(DeterministicForecaster)
    } else {
        forecaster_from_config(&cfg)?
    };

    let cache = TableCache::new();
    let loaded = match parse_value_arg("--data") {
        Some(location) => cache.load_location(&location, cfg.http_timeout_secs)?,
        None => cache.load_default(cfg.data_url.as_deref(), &cfg.sample_path, cfg.http_timeout_secs),
    };
    if loaded.table.is_empty() {
        let warning = if loaded.source == DataSource::Unavailable {
            NO_DATA_WARNING
        } else {
            EMPTY_DATA_WARNING
        };
        return Err(anyhow!(warning));
    }
    println!("Data: {} ({} rows)", loaded.source, loaded.table.len());
    println!("Forecaster: {}", forecaster.name());

    let prediction = forecaster.predict(&loaded.table)?;
    println!();
    println!("== 総合予想 ==");
    for role in PredictionRole::ALL {
        println!("{}", prediction.line_for(role));
    }
    println!("{}", prediction.bet_plan);

    let evaluation = match parse_value_arg("--number") {
        Some(raw) => {
            let number = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("invalid --number: {raw}"))?;
            let eval = forecaster.evaluate(&loaded.table, number)?;
            println!();
            println!("== 単体評価 (馬番 {}) ==", eval.number);
            println!("総合評価: {} 点", display_float(eval.overall_score));
            println!(
                "馬 {:.2} / 騎手 {:.2} / コース {:.2}",
                eval.horse_score, eval.jockey_score, eval.course_score
            );
            println!("馬評価: {}", eval.horse_comment);
            println!("騎手評価: {}", eval.jockey_comment);
            println!("コース評価: {}", eval.course_comment);
            println!("{}", eval.summary);
            Some(eval)
        }
        None => None,
    };

    let sign = forecaster.sign_theory(None)?;
    println!();
    println!("== サイン理論 ==");
    for step in &sign.steps {
        println!("{step}");
    }
    println!("{}", sign.plan);

    if let Some(path) = parse_value_arg("--export").map(PathBuf::from) {
        let report = export_report(&path, &prediction, evaluation.as_ref(), &sign)?;
        println!();
        println!(
            "Exported {} (picks={} evaluation_rows={} sign_rows={})",
            path.display(),
            report.picks,
            report.evaluation_rows,
            report.sign_rows
        );
    }

    Ok(())
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn parse_value_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
