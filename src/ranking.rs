use std::cmp::Ordering;
use std::fmt;

use crate::coerce::display_number;
use crate::scoring::base_score;
use crate::table::{EntrantRecord, RaceTable, columns};

pub const EMPTY_TABLE_MESSAGE: &str = "データが空です。Excelを読み込んでください。";
pub const UNKNOWN_NAME: &str = "不明";
pub const UNKNOWN_NUMBER: &str = "?";
pub const BET_TIER_SEPARATOR: &str = "・";

/// Ordered prediction marks, most favoured first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredictionRole {
    Favorite,
    Rival,
    Dark,
    Longshot,
    Danger,
}

impl PredictionRole {
    pub const ALL: [PredictionRole; 5] = [
        PredictionRole::Favorite,
        PredictionRole::Rival,
        PredictionRole::Dark,
        PredictionRole::Longshot,
        PredictionRole::Danger,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PredictionRole::Favorite => "◎本命",
            PredictionRole::Rival => "○対抗",
            PredictionRole::Dark => "▲単穴",
            PredictionRole::Longshot => "☆穴馬",
            PredictionRole::Danger => "✕危険馬",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

impl fmt::Display for PredictionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelledPick {
    pub role: PredictionRole,
    pub text: String,
}

/// Labelled picks (at most one per role, in role order) and the staking text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    pub picks: Vec<LabelledPick>,
    pub bet_plan: String,
}

impl Prediction {
    pub fn pick(&self, role: PredictionRole) -> Option<&str> {
        self.picks
            .iter()
            .find(|p| p.role == role)
            .map(|p| p.text.as_str())
    }

    /// Display line for a role, reporting unassigned roles as missing data.
    pub fn line_for(&self, role: PredictionRole) -> String {
        self.pick(role)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}: データ不足", role.label()))
    }
}

#[derive(Debug, Clone)]
pub struct ScoredEntrant<'a> {
    pub record: &'a EntrantRecord,
    pub score: f64,
    pub row_index: usize,
}

/// Score every row and order best-first. Equal scores fall back to ascending
/// entrant number when the table has that column (missing numbers last), then
/// to original row order.
pub fn score_and_sort(table: &RaceTable) -> Vec<ScoredEntrant<'_>> {
    let by_number = table.has_column(columns::NUMBER);
    let mut scored: Vec<ScoredEntrant<'_>> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(row_index, record)| ScoredEntrant {
            record,
            score: base_score(record),
            row_index,
        })
        .collect();

    scored.sort_by(|a, b| {
        let primary = b.score.total_cmp(&a.score);
        if primary != Ordering::Equal || !by_number {
            return primary;
        }
        match (a.record.entrant_number(), b.record.entrant_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    scored
}

pub fn rank(table: &RaceTable) -> Prediction {
    if table.is_empty() {
        return Prediction {
            picks: Vec::new(),
            bet_plan: EMPTY_TABLE_MESSAGE.to_string(),
        };
    }

    let ranked = score_and_sort(table);
    let picks = PredictionRole::ALL
        .iter()
        .zip(ranked.iter())
        .map(|(role, entrant)| LabelledPick {
            role: *role,
            text: pick_text(*role, entrant.record),
        })
        .collect();

    let top_numbers: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|entrant| number_text(entrant.record))
        .collect();

    Prediction {
        picks,
        bet_plan: format_bet_plan(&top_numbers),
    }
}

fn pick_text(role: PredictionRole, record: &EntrantRecord) -> String {
    let name = record
        .get(columns::NAME)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    format!("{}: {} (馬番 {})", role.label(), name, number_text(record))
}

fn number_text(record: &EntrantRecord) -> String {
    record
        .entrant_number()
        .map(display_number)
        .unwrap_or_else(|| UNKNOWN_NUMBER.to_string())
}

/// Three-tier box suggestion from the top-ranked numbers (best first).
pub fn format_bet_plan(top_numbers: &[String]) -> String {
    let tier = |n: usize| top_numbers[..n.min(top_numbers.len())].join(BET_TIER_SEPARATOR);
    format!(
        "三連複フォーメーション例: 1列目 {}, 2列目 {}, 3列目 {}〜人気薄を網羅。",
        tier(1),
        tier(2),
        tier(3)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bet_plan_with_short_list() {
        let plan = format_bet_plan(&["4".to_string()]);
        assert_eq!(
            plan,
            "三連複フォーメーション例: 1列目 4, 2列目 4, 3列目 4〜人気薄を網羅。"
        );
    }

    #[test]
    fn labels_round_trip() {
        for role in PredictionRole::ALL {
            assert_eq!(PredictionRole::from_label(role.label()), Some(role));
        }
        assert_eq!(PredictionRole::from_label("buy_plan"), None);
    }
}
