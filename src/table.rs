use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::coerce::{coerce, display_float};

/// Column names used by the race sheet. Any subset may be present.
pub mod columns {
    pub const NUMBER: &str = "馬番";
    pub const NAME: &str = "馬名";
    pub const OVERALL_RATING: &str = "総合評価";
    pub const RECENT_FORM: &str = "近走指数";
    pub const SPEED_INDEX: &str = "スピード指数";
    pub const TRAINING: &str = "調教評価";
    pub const GRADED_RECORD: &str = "重賞実績";
    pub const VENUE_RECORD: &str = "中山実績";
    pub const TURF_APTITUDE: &str = "芝適性";
    pub const POTENTIAL: &str = "馬ポテンシャル";
    pub const POWER_INDEX: &str = "馬力指数";
    pub const JOCKEY_RATING: &str = "騎手評価";
    pub const JOCKEY_WIN_RATE: &str = "騎手勝率";
    pub const COURSE_APTITUDE: &str = "コース適性";
    pub const VENUE_INDEX: &str = "中山実績指数";

    /// Columns shown in previews and sent to the narrative generator, in order.
    pub const DISPLAY: &[&str] = &[
        NUMBER,
        NAME,
        OVERALL_RATING,
        RECENT_FORM,
        SPEED_INDEX,
        TRAINING,
        GRADED_RECORD,
        VENUE_RECORD,
        TURF_APTITUDE,
        POTENTIAL,
        JOCKEY_RATING,
        JOCKEY_WIN_RATE,
        COURSE_APTITUDE,
        VENUE_INDEX,
    ];
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Classify a raw cell from a text source: blank → `Empty`, numeric → `Number`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => CellValue::Number(v),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Number(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) => f.write_str(&display_float(*v)),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

/// One entrant row, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrantRecord {
    values: HashMap<String, CellValue>,
}

impl EntrantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Ordered-fallback lookup: the value of the first key whose column exists in
    /// this record, even when that value is blank. Later keys are only consulted
    /// when earlier columns are missing altogether.
    pub fn first_present(&self, keys: &[&str]) -> Option<&CellValue> {
        keys.iter().find_map(|key| self.values.get(*key))
    }

    /// Coerced numeric value of a column (default 0).
    pub fn number(&self, column: &str) -> f64 {
        coerce(self.get(column), 0.0)
    }

    /// Trimmed display form of a column, empty when absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column)
            .map(|v| v.to_string().trim().to_string())
            .unwrap_or_default()
    }

    /// Entrant number when the cell holds (or parses as) a number.
    pub fn entrant_number(&self) -> Option<f64> {
        let value = self.get(columns::NUMBER)?;
        let n = coerce(Some(value), f64::NAN);
        if n.is_nan() { None } else { Some(n) }
    }

    pub fn name(&self) -> Option<&str> {
        match self.get(columns::NAME)? {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Ordered rows plus the ordered column list they were read with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceTable {
    columns: Vec<String>,
    rows: Vec<EntrantRecord>,
}

impl RaceTable {
    /// Rows missing a declared column get an `Empty` cell so every record carries
    /// the full column set.
    pub fn new(columns: Vec<String>, rows: Vec<EntrantRecord>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                for col in &columns {
                    if !row.contains(col) {
                        row.insert(col.clone(), CellValue::Empty);
                    }
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build from records, deriving the column list in first-seen order.
    pub fn from_records(records: Vec<Vec<(&str, CellValue)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            for (col, _) in &record {
                if !columns.iter().any(|c| c == col) {
                    columns.push((*col).to_string());
                }
            }
            rows.push(EntrantRecord::from_pairs(record));
        }
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[EntrantRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// First row whose entrant number equals `number`. `None` when the number
    /// column is absent or nothing matches.
    pub fn find_by_number(&self, number: i64) -> Option<&EntrantRecord> {
        if !self.has_column(columns::NUMBER) {
            return None;
        }
        let target = number as f64;
        self.rows
            .iter()
            .find(|row| row.entrant_number().is_some_and(|n| n == target))
    }

    /// Force the entrant-number column to numbers; unparseable cells become blank.
    pub fn normalize_entrant_numbers(&mut self) {
        if !self.has_column(columns::NUMBER) {
            return;
        }
        for row in &mut self.rows {
            let normalized = match row.entrant_number() {
                Some(n) => CellValue::Number(n),
                None => CellValue::Empty,
            };
            row.insert(columns::NUMBER, normalized);
        }
    }

    /// Known display columns present in this table, in display order.
    pub fn display_columns(&self) -> Vec<&str> {
        columns::DISPLAY
            .iter()
            .copied()
            .filter(|c| self.has_column(c))
            .collect()
    }

    /// Row as a JSON object in column order.
    pub fn row_to_json(&self, row: &EntrantRecord) -> Value {
        let mut obj = serde_json::Map::new();
        for col in &self.columns {
            let value = row.get(col).map(CellValue::to_json).unwrap_or(Value::Null);
            obj.insert(col.clone(), value);
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_classifies_cells() {
        assert_eq!(CellValue::from_raw("  "), CellValue::Empty);
        assert_eq!(CellValue::from_raw(" 3.5 "), CellValue::Number(3.5));
        assert_eq!(CellValue::from_raw("◎"), CellValue::Text("◎".to_string()));
    }

    #[test]
    fn first_present_prefers_earlier_existing_column() {
        let row = EntrantRecord::from_pairs([("b", 2.0), ("a", 1.0)]);
        assert_eq!(row.first_present(&["a", "b"]), Some(&CellValue::Number(1.0)));
        assert_eq!(row.first_present(&["z", "b"]), Some(&CellValue::Number(2.0)));
        assert_eq!(row.first_present(&["y", "z"]), None);
    }

    #[test]
    fn first_present_does_not_skip_blank_columns() {
        let mut row = EntrantRecord::new();
        row.insert("a", CellValue::Empty);
        row.insert("b", 5.0);
        assert_eq!(row.first_present(&["a", "b"]), Some(&CellValue::Empty));
    }

    #[test]
    fn normalize_blanks_unparseable_numbers() {
        let mut table = RaceTable::from_records(vec![
            vec![(columns::NUMBER, CellValue::from(" 7 "))],
            vec![(columns::NUMBER, CellValue::from("取消"))],
        ]);
        table.normalize_entrant_numbers();
        assert_eq!(table.rows()[0].get(columns::NUMBER), Some(&CellValue::Number(7.0)));
        assert_eq!(table.rows()[1].get(columns::NUMBER), Some(&CellValue::Empty));
    }

    #[test]
    fn new_fills_missing_cells() {
        let table = RaceTable::from_records(vec![
            vec![("x", CellValue::from(1.0))],
            vec![("y", CellValue::from(2.0))],
        ]);
        assert_eq!(table.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(table.rows()[0].get("y"), Some(&CellValue::Empty));
    }
}
