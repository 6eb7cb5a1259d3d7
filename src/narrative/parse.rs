use serde_json::{Map, Value};
use tracing::warn;

use crate::coerce::{coerce, coerce_str, round_to};
use crate::evaluation::HorseEvaluation;
use crate::ranking::{LabelledPick, Prediction, PredictionRole};
use crate::table::{EntrantRecord, columns};

pub const PREDICTION_PARSE_FAILED: &str =
    "JSON解析に失敗しましたが、テキストとして利用してください。\n";
pub const PREDICTION_PLAN_MISSING: &str = "フォーメーション例を生成できませんでした。";
pub const EVALUATION_PARSE_FAILED: &str = "JSON解析に失敗しました。テキスト出力を参照してください。";
pub const SIGN_THEORY_PARSE_FAILED: &str = "JSON解析に失敗しました。テキストを参照してください。";
pub const SIGN_THEORY_PLAN_MISSING: &str = "買い目案を生成できませんでした。";

/// Sub-score columns reported alongside a generated evaluation. Course aptitude
/// is consulted before the venue index here, the reverse of the scored path.
pub const NARRATIVE_COURSE_KEYS: &[&str] = &[columns::COURSE_APTITUDE, columns::VENUE_INDEX];

/// Outermost `{...}` span of a reply, so fenced or prefixed JSON still parses.
pub fn extract_json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn parse_object(content: &str) -> Result<Option<Map<String, Value>>, serde_json::Error> {
    let value: Value = serde_json::from_str(extract_json_object(content))?;
    Ok(match value {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn parse_prediction_reply(content: &str) -> Prediction {
    let mut picks = Vec::new();
    let mut bet_plan = String::new();
    match parse_object(content) {
        Ok(Some(obj)) => {
            for role in PredictionRole::ALL {
                if let Some(Value::String(text)) = obj.get(role.label()) {
                    picks.push(LabelledPick {
                        role,
                        text: text.clone(),
                    });
                }
            }
            bet_plan = value_text(obj.get("buy_plan"));
        }
        Ok(None) => warn!("prediction reply was JSON but not an object"),
        Err(err) => {
            warn!(error = %err, "prediction reply was not valid JSON");
            bet_plan = format!("{PREDICTION_PARSE_FAILED}{content}");
        }
    }
    if bet_plan.is_empty() {
        bet_plan = PREDICTION_PLAN_MISSING.to_string();
    }
    Prediction { picks, bet_plan }
}

pub fn parse_evaluation_reply(content: &str, row: &EntrantRecord, number: i64) -> HorseEvaluation {
    let mut horse_comment = String::new();
    let mut jockey_comment = String::new();
    let mut course_comment = String::new();
    let mut summary = String::new();
    let mut overall_score = 0.0;

    match parse_object(content) {
        Ok(Some(obj)) => {
            horse_comment = value_text(obj.get("horse_comment"));
            jockey_comment = value_text(obj.get("jockey_comment"));
            course_comment = value_text(obj.get("course_comment"));
            summary = value_text(obj.get("summary"));
            overall_score = match obj.get("overall_score") {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) => coerce_str(s, 0.0),
                _ => 0.0,
            };
        }
        Ok(None) | Err(_) => {
            warn!(number, "evaluation reply could not be parsed as a JSON object");
            summary = EVALUATION_PARSE_FAILED.to_string();
            horse_comment = content.to_string();
        }
    }

    HorseEvaluation {
        number,
        horse_score: row.number(columns::POTENTIAL),
        jockey_score: row.number(columns::JOCKEY_RATING),
        course_score: coerce(row.first_present(NARRATIVE_COURSE_KEYS), 0.0),
        overall_score: round_to(overall_score, 2),
        horse_comment,
        jockey_comment,
        course_comment,
        summary,
    }
}

/// Steps and plan text from a generated sign-theory reply.
pub fn parse_sign_theory_reply(content: &str) -> (Vec<String>, String) {
    let mut steps = Vec::new();
    let mut plan = String::new();
    match parse_object(content) {
        Ok(Some(obj)) => {
            if let Some(Value::Array(events)) = obj.get("events") {
                steps = events.iter().map(|e| value_text(Some(e))).collect();
            }
            plan = value_text(obj.get("plan"));
        }
        Ok(None) => warn!("sign theory reply was JSON but not an object"),
        Err(err) => {
            warn!(error = %err, "sign theory reply was not valid JSON");
            steps = vec![SIGN_THEORY_PARSE_FAILED.to_string(), content.to_string()];
        }
    }
    if plan.is_empty() {
        plan = SIGN_THEORY_PLAN_MISSING.to_string();
    }
    (steps, plan)
}
