use crate::coerce::coerce;
use crate::table::{EntrantRecord, columns};

/// Weighted numeric features summed into the base score.
pub const FEATURE_WEIGHTS: &[(&str, f64)] = &[
    (columns::OVERALL_RATING, 1.0),
    (columns::RECENT_FORM, 1.0),
    (columns::SPEED_INDEX, 1.0),
    (columns::TRAINING, 0.5),
];

/// Categorical columns that award a flat bonus when graded well.
pub const BONUS_FLAGS: &[&str] = &[
    columns::GRADED_RECORD,
    columns::VENUE_RECORD,
    columns::TURF_APTITUDE,
];

/// Grade marks that qualify for the bonus.
pub const QUALIFYING_MARKS: &[&str] = &["◎", "○", "▲", "A", "B"];

pub const BONUS_PER_FLAG: f64 = 1.5;

/// Deterministic ranking score for one entrant. Missing columns count as 0.
pub fn base_score(record: &EntrantRecord) -> f64 {
    let weighted: f64 = FEATURE_WEIGHTS
        .iter()
        .map(|(column, weight)| coerce(record.get(column), 0.0) * weight)
        .sum();
    let bonus = BONUS_FLAGS
        .iter()
        .filter(|flag| is_qualifying_mark(&record.text(flag)))
        .count() as f64
        * BONUS_PER_FLAG;
    weighted + bonus
}

pub fn is_qualifying_mark(raw: &str) -> bool {
    QUALIFYING_MARKS.contains(&raw.trim())
}
