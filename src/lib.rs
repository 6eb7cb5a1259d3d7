pub mod coerce;
pub mod config;
pub mod evaluation;
pub mod export;
pub mod forecaster;
pub mod http_client;
pub mod loader;
pub mod narrative;
pub mod ranking;
pub mod scoring;
pub mod sign_theory;
pub mod state;
pub mod table;
pub mod worker;

pub use coerce::coerce;
pub use evaluation::{HorseEvaluation, evaluate};
pub use forecaster::{DeterministicForecaster, Forecaster, NarrativeForecaster, forecaster_from_config};
pub use ranking::{Prediction, PredictionRole, rank};
pub use scoring::base_score;
pub use sign_theory::{SignEvent, SignTheoryPlan, build_plan};
pub use table::{CellValue, EntrantRecord, RaceTable};
