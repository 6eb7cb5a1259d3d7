use std::sync::Arc;

use anyhow::Result;
use chrono::Datelike;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::evaluation::{self, HorseEvaluation};
use crate::narrative::{ChatCompletionsClient, NarrativeGenerator, parse, prompt};
use crate::ranking::{self, Prediction};
use crate::sign_theory::{self, SignEvent, SignTheoryPlan};
use crate::table::RaceTable;

/// The three forecasting features behind one seam. The deterministic variant
/// never fails; the narrative variant only fails when the generator call does.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &'static str;
    fn predict(&self, table: &RaceTable) -> Result<Prediction>;
    fn evaluate(&self, table: &RaceTable, number: i64) -> Result<HorseEvaluation>;
    fn sign_theory(&self, events: Option<&[SignEvent]>) -> Result<SignTheoryPlan>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicForecaster;

impl Forecaster for DeterministicForecaster {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn predict(&self, table: &RaceTable) -> Result<Prediction> {
        Ok(ranking::rank(table))
    }

    fn evaluate(&self, table: &RaceTable, number: i64) -> Result<HorseEvaluation> {
        Ok(evaluation::evaluate(table, number))
    }

    fn sign_theory(&self, events: Option<&[SignEvent]>) -> Result<SignTheoryPlan> {
        Ok(sign_theory::build_plan(events))
    }
}

/// Asks a text generator for each result. Empty tables and unknown entrant
/// numbers short-circuit exactly like the deterministic path, without a call.
pub struct NarrativeForecaster<G> {
    generator: G,
    year: i32,
}

impl<G: NarrativeGenerator> NarrativeForecaster<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            year: chrono::Local::now().year(),
        }
    }

    /// Pin the year used for the sign-theory prompt.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }
}

impl<G: NarrativeGenerator + Send + Sync> Forecaster for NarrativeForecaster<G> {
    fn name(&self) -> &'static str {
        "narrative"
    }

    #[instrument(skip_all, fields(rows = table.len()))]
    fn predict(&self, table: &RaceTable) -> Result<Prediction> {
        if table.is_empty() {
            return Ok(ranking::rank(table));
        }
        let request = prompt::prediction_request(table)?;
        let content = self.generator.generate(&request)?;
        Ok(parse::parse_prediction_reply(&content))
    }

    #[instrument(skip(self, table))]
    fn evaluate(&self, table: &RaceTable, number: i64) -> Result<HorseEvaluation> {
        let Some(row) = table.find_by_number(number) else {
            return Ok(HorseEvaluation::not_found(number));
        };
        let request = prompt::evaluation_request(table, row, number);
        let content = self.generator.generate(&request)?;
        Ok(parse::parse_evaluation_reply(&content, row, number))
    }

    /// Generated plans carry only steps and plan text; supplied events are
    /// not forwarded to the generator.
    fn sign_theory(&self, _events: Option<&[SignEvent]>) -> Result<SignTheoryPlan> {
        let request = prompt::sign_theory_request(self.year);
        let content = self.generator.generate(&request)?;
        let (steps, plan) = parse::parse_sign_theory_reply(&content);
        Ok(SignTheoryPlan {
            steps,
            plan,
            ..SignTheoryPlan::default()
        })
    }
}

/// Narrative variant when an API key is configured, deterministic otherwise.
pub fn forecaster_from_config(cfg: &AppConfig) -> Result<Arc<dyn Forecaster>> {
    if cfg.narrative_enabled() {
        let client = ChatCompletionsClient::from_config(cfg)?;
        info!(model = client.model(), "using narrative forecaster");
        Ok(Arc::new(NarrativeForecaster::new(client)))
    } else {
        info!("no api key configured, using deterministic forecaster");
        Ok(Arc::new(DeterministicForecaster))
    }
}
