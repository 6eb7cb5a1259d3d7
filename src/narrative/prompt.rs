use anyhow::{Context, Result};

use super::{DEFAULT_TEMPERATURE, NarrativeRequest, SIGN_THEORY_TEMPERATURE};
use crate::coerce::display_number;
use crate::ranking::PredictionRole;
use crate::table::{CellValue, EntrantRecord, RaceTable, columns};

/// Rows sent to the generator are capped to keep prompts small.
pub const MAX_PROMPT_ROWS: usize = 20;

/// CSV view of the table for prompts: known display columns when any are
/// present (otherwise every column), first `max_rows` rows.
pub fn format_table_for_prompt(table: &RaceTable, max_rows: usize) -> Result<String> {
    let display = table.display_columns();
    let columns: Vec<&str> = if display.is_empty() {
        table.columns().iter().map(String::as_str).collect()
    } else {
        display
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&columns)
        .context("write prompt header")?;
    for row in table.rows().iter().take(max_rows) {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| prompt_cell(row, c))
            .collect();
        writer.write_record(&cells).context("write prompt row")?;
    }
    let bytes = writer.into_inner().context("flush prompt csv")?;
    String::from_utf8(bytes).context("prompt csv not utf8")
}

/// Entrant numbers go out as integers; other cells use their display form.
fn prompt_cell(row: &EntrantRecord, column: &str) -> String {
    match row.get(column) {
        Some(CellValue::Number(n)) if column == columns::NUMBER => display_number(*n),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

pub fn prediction_request(table: &RaceTable) -> Result<NarrativeRequest> {
    let labels = PredictionRole::ALL
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>();
    let keys = labels
        .iter()
        .map(|l| format!("'{l}'"))
        .chain(std::iter::once("'buy_plan'".to_string()))
        .collect::<Vec<_>>()
        .join(",");
    let system = format!(
        "あなたは有馬記念の予想専門家です。入力された表を根拠に、{}と推奨の買い方を日本語で出力してください。\
         出力は必ずJSON形式で、keysを [{}] としてください。",
        labels.join("、"),
        keys
    );
    let table_text = format_table_for_prompt(table, MAX_PROMPT_ROWS)?;
    let user = format!(
        "以下の出走データを参考に予想をしてください。各印には馬番と理由を付けてください。\nデータ:\n{table_text}"
    );
    Ok(NarrativeRequest {
        system,
        user,
        temperature: DEFAULT_TEMPERATURE,
    })
}

pub fn evaluation_request(table: &RaceTable, row: &EntrantRecord, number: i64) -> NarrativeRequest {
    let system = "あなたは競馬データアナリストです。入力される行データを読み、\
                  STEP1 馬評価、STEP2 騎手評価、STEP3 コース評価、STEP4 総合評価を順に考察してください。\
                  日本語で簡潔に説明し、JSONで出力してください。\
                  JSON keys: horse_comment, jockey_comment, course_comment, summary, overall_score。\
                  overall_scoreは0-100点の数値で。"
        .to_string();
    let row_text = table.row_to_json(row).to_string();
    NarrativeRequest {
        system,
        user: format!("対象馬番 {number} のデータ: {row_text}"),
        temperature: DEFAULT_TEMPERATURE,
    }
}

pub fn sign_theory_request(year: i32) -> NarrativeRequest {
    NarrativeRequest {
        system: format!(
            "あなたはサイン理論の専門家です。{year}年の出来事や話題から数字を抽出し、\
             有馬記念の買い目に使える数字セットとフォーメーション案を提案してください。\
             JSON形式で、events(文字列リスト)とplan(文字列)を返してください。"
        ),
        user: format!(
            "{year}年に起きた出来事や予定を3-5個挙げ、それぞれに関連する数字を示し、\
             そこから導かれる買い目案をまとめてください。"
        ),
        temperature: SIGN_THEORY_TEMPERATURE,
    }
}
