use serde::{Deserialize, Serialize};

use crate::coerce::{coerce, display_float, round_to};
use crate::table::{EntrantRecord, RaceTable, columns};

pub const NOT_FOUND_COMMENT: &str = "対象の馬番がデータに存在しません。";
pub const NOT_FOUND_SUMMARY: &str = "データを確認してください。";

pub const HORSE_WEIGHT: f64 = 0.5;
pub const JOCKEY_WEIGHT: f64 = 0.3;
pub const COURSE_WEIGHT: f64 = 0.2;

/// Potential index, falling back to the power index when the sheet lacks it.
pub const HORSE_POTENTIAL_KEYS: &[&str] = &[columns::POTENTIAL, columns::POWER_INDEX];
/// Venue-specific index, falling back to generic course aptitude.
pub const COURSE_KEYS: &[&str] = &[columns::VENUE_INDEX, columns::COURSE_APTITUDE];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseEvaluation {
    pub number: i64,
    pub horse_score: f64,
    pub jockey_score: f64,
    pub course_score: f64,
    pub overall_score: f64,
    pub horse_comment: String,
    pub jockey_comment: String,
    pub course_comment: String,
    pub summary: String,
}

impl HorseEvaluation {
    /// Zero-filled result for a number that is not on the sheet.
    pub fn not_found(number: i64) -> Self {
        Self {
            number,
            horse_score: 0.0,
            jockey_score: 0.0,
            course_score: 0.0,
            overall_score: 0.0,
            horse_comment: NOT_FOUND_COMMENT.to_string(),
            jockey_comment: String::new(),
            course_comment: String::new(),
            summary: NOT_FOUND_SUMMARY.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.horse_comment == NOT_FOUND_COMMENT && self.overall_score == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub horse: f64,
    pub jockey: f64,
    pub course: f64,
}

impl SubScores {
    pub fn from_record(row: &EntrantRecord) -> Self {
        let horse =
            coerce(row.first_present(HORSE_POTENTIAL_KEYS), 0.0) + row.number(columns::TRAINING);
        let jockey = row.number(columns::JOCKEY_RATING) + row.number(columns::JOCKEY_WIN_RATE);
        let course = coerce(row.first_present(COURSE_KEYS), 0.0);
        Self {
            horse,
            jockey,
            course,
        }
    }

    pub fn composite(&self) -> f64 {
        round_to(
            self.horse * HORSE_WEIGHT + self.jockey * JOCKEY_WEIGHT + self.course * COURSE_WEIGHT,
            2,
        )
    }
}

pub fn evaluate(table: &RaceTable, number: i64) -> HorseEvaluation {
    let Some(row) = table.find_by_number(number) else {
        return HorseEvaluation::not_found(number);
    };

    let sub = SubScores::from_record(row);
    let overall_score = sub.composite();

    HorseEvaluation {
        number,
        horse_score: round_to(sub.horse, 2),
        jockey_score: round_to(sub.jockey, 2),
        course_score: round_to(sub.course, 2),
        overall_score,
        horse_comment: format!(
            "馬ポテンシャル: {} / 調教評価: {}。",
            shown(row, columns::POTENTIAL),
            shown(row, columns::TRAINING)
        ),
        jockey_comment: format!(
            "騎手評価: {} / 勝率: {}%。",
            shown(row, columns::JOCKEY_RATING),
            shown(row, columns::JOCKEY_WIN_RATE)
        ),
        course_comment: format!(
            "コース適性: {} / 中山実績: {}。",
            shown(row, columns::COURSE_APTITUDE),
            shown(row, columns::VENUE_INDEX)
        ),
        summary: format!(
            "総合評価 {} 点。馬の完成度を軸に、騎手の安定感と中山適性を加味したバランス型の評価です。",
            display_float(overall_score)
        ),
    }
}

fn shown(row: &EntrantRecord, column: &str) -> String {
    display_float(row.number(column))
}
