use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::evaluation::HorseEvaluation;
use crate::loader::LoadedTable;
use crate::ranking::Prediction;
use crate::sign_theory::SignTheoryPlan;
use crate::table::RaceTable;

pub const MIN_NUMBER_INPUT: i64 = 1;
pub const MAX_NUMBER_INPUT: i64 = 20;
const MAX_LOGS: usize = 200;

pub const NO_DATA_WARNING: &str =
    "先にExcel/CSVファイルをアップロードするか、サンプルを読み込んでください。";
pub const EMPTY_DATA_WARNING: &str = "データが空です。シートや列名を確認してください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Prediction,
    Evaluation,
    SignTheory,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Prediction, Tab::Evaluation, Tab::SignTheory];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Prediction => "総合予想",
            Tab::Evaluation => "単体評価",
            Tab::SignTheory => "サイン理論",
        }
    }

    pub fn next(self) -> Tab {
        match self {
            Tab::Prediction => Tab::Evaluation,
            Tab::Evaluation => Tab::SignTheory,
            Tab::SignTheory => Tab::Prediction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Load,
    Predict,
    Evaluate,
    SignTheory,
    Export,
}

/// Work requested from the background worker.
#[derive(Debug, Clone)]
pub enum Command {
    LoadLocation(String),
    LoadDefault,
    Predict(Arc<RaceTable>),
    Evaluate { table: Arc<RaceTable>, number: i64 },
    SignTheory,
    Export {
        path: PathBuf,
        prediction: Prediction,
        evaluation: Option<HorseEvaluation>,
        sign: SignTheoryPlan,
    },
}

/// Results pushed back from the worker.
#[derive(Debug, Clone)]
pub enum Delta {
    SetData(LoadedTable),
    SetPrediction(Prediction),
    SetEvaluation(HorseEvaluation),
    SetSignTheory(SignTheoryPlan),
    Exported(PathBuf),
    Failed { job: Job, message: String },
}

#[derive(Debug)]
pub struct AppState {
    pub tab: Tab,
    pub data: Option<LoadedTable>,
    pub number_input: i64,
    /// Next typed digit replaces the number instead of extending it.
    pub number_fresh: bool,
    pub prediction: Option<Prediction>,
    pub evaluation: Option<HorseEvaluation>,
    pub sign_plan: Option<SignTheoryPlan>,
    pub pending: Vec<Job>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub forecaster: String,
}

impl AppState {
    pub fn new(forecaster: impl Into<String>) -> Self {
        Self {
            tab: Tab::Prediction,
            data: None,
            number_input: MIN_NUMBER_INPUT,
            number_fresh: true,
            prediction: None,
            evaluation: None,
            sign_plan: None,
            pending: Vec::new(),
            logs: VecDeque::new(),
            help_overlay: false,
            forecaster: forecaster.into(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn is_pending(&self, job: Job) -> bool {
        self.pending.contains(&job)
    }

    fn start(&mut self, job: Job) {
        if !self.pending.contains(&job) {
            self.pending.push(job);
        }
    }

    fn finish(&mut self, job: Job) {
        self.pending.retain(|j| *j != job);
    }

    pub fn adjust_number(&mut self, step: i64) {
        self.number_input = (self.number_input + step).clamp(MIN_NUMBER_INPUT, MAX_NUMBER_INPUT);
        self.number_fresh = true;
    }

    /// First digit after a run or an arrow key replaces the number; later digits
    /// append, restarting from the new digit once the value would leave the range.
    pub fn type_digit(&mut self, digit: u32) {
        let digit = i64::from(digit);
        let candidate = if self.number_fresh {
            digit
        } else {
            self.number_input * 10 + digit
        };
        self.number_input = if candidate <= MAX_NUMBER_INPUT {
            candidate
        } else {
            digit
        }
        .clamp(MIN_NUMBER_INPUT, MAX_NUMBER_INPUT);
        self.number_fresh = false;
    }

    /// Drop the last digit. Erasing the only digit resets to 1 and the next
    /// digit starts a new number.
    pub fn erase_digit(&mut self) {
        let rest = self.number_input / 10;
        self.number_fresh = rest < MIN_NUMBER_INPUT;
        self.number_input = rest.max(MIN_NUMBER_INPUT);
    }

    /// Loaded, non-empty table or the warning to show instead.
    pub fn require_data(&self) -> Result<Arc<RaceTable>, &'static str> {
        let Some(loaded) = &self.data else {
            return Err(NO_DATA_WARNING);
        };
        if loaded.table.is_empty() {
            return Err(EMPTY_DATA_WARNING);
        }
        Ok(loaded.table.clone())
    }

    fn request_with_data(&mut self, job: Job, build: impl FnOnce(Arc<RaceTable>) -> Command) -> Option<Command> {
        match self.require_data() {
            Ok(table) => {
                self.start(job);
                Some(build(table))
            }
            Err(warning) => {
                self.push_log(format!("[WARN] {warning}"));
                None
            }
        }
    }

    pub fn request_prediction(&mut self) -> Option<Command> {
        self.request_with_data(Job::Predict, Command::Predict)
    }

    pub fn request_evaluation(&mut self) -> Option<Command> {
        let number = self.number_input;
        self.number_fresh = true;
        self.request_with_data(Job::Evaluate, |table| Command::Evaluate { table, number })
    }

    pub fn request_sign_theory(&mut self) -> Option<Command> {
        self.start(Job::SignTheory);
        Some(Command::SignTheory)
    }

    pub fn request_load(&mut self, location: Option<String>) -> Command {
        self.start(Job::Load);
        match location {
            Some(loc) => Command::LoadLocation(loc),
            None => Command::LoadDefault,
        }
    }

    /// Export needs a prediction and a sign-theory plan; the evaluation is optional.
    pub fn request_export(&mut self, path: PathBuf) -> Option<Command> {
        let (Some(prediction), Some(sign)) = (&self.prediction, &self.sign_plan) else {
            self.push_log("[WARN] 総合予想とサイン理論を実行してからエクスポートしてください。");
            return None;
        };
        let cmd = Command::Export {
            path,
            prediction: prediction.clone(),
            evaluation: self.evaluation.clone(),
            sign: sign.clone(),
        };
        self.start(Job::Export);
        Some(cmd)
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetData(loaded) => {
            state.finish(Job::Load);
            state.push_log(format!(
                "[INFO] {} を読み込みました（{}行）",
                loaded.source,
                loaded.table.len()
            ));
            state.prediction = None;
            state.evaluation = None;
            state.data = Some(loaded);
        }
        Delta::SetPrediction(prediction) => {
            state.finish(Job::Predict);
            state.prediction = Some(prediction);
        }
        Delta::SetEvaluation(evaluation) => {
            state.finish(Job::Evaluate);
            state.evaluation = Some(evaluation);
        }
        Delta::SetSignTheory(plan) => {
            state.finish(Job::SignTheory);
            state.sign_plan = Some(plan);
        }
        Delta::Exported(path) => {
            state.finish(Job::Export);
            state.push_log(format!("[INFO] Exported {}", path.display()));
        }
        Delta::Failed { job, message } => {
            state.finish(job);
            state.push_log(format!("[WARN] {job:?} failed: {message}"));
        }
    }
}
