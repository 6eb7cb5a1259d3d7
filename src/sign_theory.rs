use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MIN_NUMBER: i64 = 1;
pub const MAX_NUMBER: i64 = 18;
pub const MAX_PAIRS: usize = 10;

/// A themed event and the numbers it brings to mind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignEvent {
    pub title: String,
    pub numbers: Vec<i64>,
}

impl SignEvent {
    pub fn new(title: impl Into<String>, numbers: &[i64]) -> Self {
        Self {
            title: title.into(),
            numbers: numbers.to_vec(),
        }
    }
}

pub fn default_events() -> Vec<SignEvent> {
    vec![
        SignEvent::new("阪神淡路大震災から30年", &[1, 7, 30]),
        SignEvent::new("エリザベス女王生誕99周年からの節目", &[9, 9, 12]),
        SignEvent::new("阪神優勝関連の数字", &[6, 18]),
        SignEvent::new("東京オリンピック開催から4年", &[2, 4, 20]),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignTheoryPlan {
    pub events: Vec<SignEvent>,
    pub unique_numbers: Vec<i64>,
    pub pairs: Vec<(i64, i64)>,
    pub steps: Vec<String>,
    pub plan: String,
}

/// Build the sign-theory plan. `None` or an empty slice uses the built-in events.
pub fn build_plan(events: Option<&[SignEvent]>) -> SignTheoryPlan {
    let events: Vec<SignEvent> = match events {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => default_events(),
    };

    let steps: Vec<String> = events.iter().map(step_line).collect();

    let unique_numbers: Vec<i64> = events
        .iter()
        .flat_map(|e| e.numbers.iter().copied())
        .filter(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n))
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect();

    let pairs = ascending_pairs(&unique_numbers, MAX_PAIRS);
    let plan = format_plan(&unique_numbers, &pairs);

    SignTheoryPlan {
        events,
        unique_numbers,
        pairs,
        steps,
        plan,
    }
}

fn step_line(event: &SignEvent) -> String {
    format!("・{}: {} が浮上", event.title, join_numbers(&event.numbers))
}

/// Pairs `a < b` in nested ascending order, truncated to `limit`.
pub fn ascending_pairs(numbers: &[i64], limit: usize) -> Vec<(i64, i64)> {
    numbers
        .iter()
        .enumerate()
        .flat_map(|(i, a)| numbers[i + 1..].iter().map(move |b| (*a, *b)))
        .filter(|(a, b)| a < b)
        .take(limit)
        .collect()
}

fn format_plan(numbers: &[i64], pairs: &[(i64, i64)]) -> String {
    let pair_text = pairs
        .iter()
        .map(|(a, b)| format!("{a}-{b}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "サイン有力数字: {}\n買い目案 (ワイド/三連複): {}",
        join_numbers(numbers),
        pair_text
    )
}

fn join_numbers(numbers: &[i64]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_follow_nested_order() {
        assert_eq!(ascending_pairs(&[1, 2, 3], 10), vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(ascending_pairs(&[1, 2, 3], 2), vec![(1, 2), (1, 3)]);
        assert!(ascending_pairs(&[5], 10).is_empty());
    }

    #[test]
    fn step_line_lists_raw_numbers() {
        let line = step_line(&SignEvent::new("t", &[9, 9, 30]));
        assert_eq!(line, "・t: 9, 9, 30 が浮上");
    }
}
