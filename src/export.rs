use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::coerce::display_float;
use crate::evaluation::HorseEvaluation;
use crate::ranking::{Prediction, PredictionRole};
use crate::sign_theory::SignTheoryPlan;

pub struct ExportReport {
    pub picks: usize,
    pub evaluation_rows: usize,
    pub sign_rows: usize,
}

pub fn export_report(
    path: &Path,
    prediction: &Prediction,
    evaluation: Option<&HorseEvaluation>,
    sign: &SignTheoryPlan,
) -> Result<ExportReport> {
    let prediction_rows = prediction_rows(prediction);
    let evaluation_rows = evaluation.map(evaluation_rows).unwrap_or_default();
    let sign_rows = sign_rows(sign);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Prediction")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Evaluation")?;
        write_rows(sheet, &evaluation_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("SignTheory")?;
        write_rows(sheet, &sign_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(path = %path.display(), "report exported");

    Ok(ExportReport {
        picks: prediction.picks.len(),
        evaluation_rows: evaluation_rows.len().saturating_sub(1),
        sign_rows: sign_rows.len().saturating_sub(1),
    })
}

fn prediction_rows(prediction: &Prediction) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["印".to_string(), "予想".to_string()]];
    for role in PredictionRole::ALL {
        rows.push(vec![role.label().to_string(), prediction.line_for(role)]);
    }
    rows.push(vec!["買い方".to_string(), prediction.bet_plan.clone()]);
    rows
}

fn evaluation_rows(eval: &HorseEvaluation) -> Vec<Vec<String>> {
    vec![
        vec!["項目".to_string(), "点数".to_string(), "コメント".to_string()],
        vec![
            "馬".to_string(),
            display_float(eval.horse_score),
            eval.horse_comment.clone(),
        ],
        vec![
            "騎手".to_string(),
            display_float(eval.jockey_score),
            eval.jockey_comment.clone(),
        ],
        vec![
            "コース".to_string(),
            display_float(eval.course_score),
            eval.course_comment.clone(),
        ],
        vec![
            format!("総合 (馬番 {})", eval.number),
            display_float(eval.overall_score),
            eval.summary.clone(),
        ],
    ]
}

fn sign_rows(sign: &SignTheoryPlan) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["区分".to_string(), "内容".to_string()]];
    for step in &sign.steps {
        rows.push(vec!["出来事".to_string(), step.clone()]);
    }
    for line in sign.plan.lines() {
        rows.push(vec!["プラン".to_string(), line.to_string()]);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_rows_mark_missing_roles() {
        let rows = prediction_rows(&Prediction::default());
        assert_eq!(rows.len(), 1 + PredictionRole::ALL.len() + 1);
        assert_eq!(rows[1][1], "◎本命: データ不足");
    }

    #[test]
    fn sign_rows_split_plan_lines() {
        let plan = crate::sign_theory::build_plan(None);
        let rows = sign_rows(&plan);
        assert_eq!(rows.len(), 1 + plan.steps.len() + 2);
    }
}
