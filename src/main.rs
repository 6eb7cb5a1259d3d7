use std::fs::{self, OpenOptions};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use tracing_subscriber::EnvFilter;

use arima_terminal::coerce::display_float;
use arima_terminal::config::{AppConfig, app_cache_dir};
use arima_terminal::forecaster::forecaster_from_config;
use arima_terminal::loader::TableCache;
use arima_terminal::ranking::PredictionRole;
use arima_terminal::state::{AppState, Command, Delta, Job, Tab, apply_delta};
use arima_terminal::table::columns;
use arima_terminal::worker::spawn_worker;

const PREVIEW_ROWS: usize = 10;
const EXPORT_FILE: &str = "arima_report.xlsx";

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<Command>,
}

impl App {
    fn send(&mut self, cmd: Option<Command>) {
        let Some(cmd) = cmd else { return };
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Worker unavailable");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.state.tab = self.state.tab.next(),
            KeyCode::BackTab | KeyCode::Left => {
                self.state.tab = self.state.tab.next().next();
            }
            KeyCode::Enter | KeyCode::Char('r') => self.run_current_tab(),
            KeyCode::Char('o') => {
                let cmd = self.state.request_load(None);
                self.send(Some(cmd));
            }
            KeyCode::Char('e') => {
                let path = export_path();
                let cmd = self.state.request_export(path);
                self.send(cmd);
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Up | KeyCode::Char('+') if self.state.tab == Tab::Evaluation => {
                self.state.adjust_number(1)
            }
            KeyCode::Down | KeyCode::Char('-') if self.state.tab == Tab::Evaluation => {
                self.state.adjust_number(-1)
            }
            KeyCode::Backspace if self.state.tab == Tab::Evaluation => self.state.erase_digit(),
            KeyCode::Char(c) if self.state.tab == Tab::Evaluation && c.is_ascii_digit() => {
                if let Some(d) = c.to_digit(10) {
                    self.state.type_digit(d);
                }
            }
            _ => {}
        }
    }

    fn run_current_tab(&mut self) {
        let cmd = match self.state.tab {
            Tab::Prediction => self.state.request_prediction(),
            Tab::Evaluation => self.state.request_evaluation(),
            Tab::SignTheory => self.state.request_sign_theory(),
        };
        self.send(cmd);
    }
}

fn export_path() -> PathBuf {
    app_cache_dir()
        .map(|dir| dir.join(EXPORT_FILE))
        .unwrap_or_else(|| PathBuf::from(EXPORT_FILE))
}

fn init_file_logging() {
    let Some(dir) = app_cache_dir() else { return };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("arima_terminal.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::load();
    init_file_logging();

    let forecaster = forecaster_from_config(&cfg)?;
    let cache = Arc::new(TableCache::new());
    let initial = std::env::args().nth(1);

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let mut app = App {
        state: AppState::new(forecaster.name()),
        should_quit: false,
        cmd_tx,
    };
    spawn_worker(tx, cmd_rx, forecaster, cache, cfg);

    let cmd = app.state.request_load(initial);
    app.send(Some(cmd));

    enable_raw_mode()?;
    let mut terminal = or_restore(setup_terminal, || {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Run a setup step, undoing terminal modes when it fails.
fn or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    setup().inspect_err(|_| restore())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let selected = Tab::ALL.iter().position(|t| *t == state.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(header_title(state)),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    match state.tab {
        Tab::Prediction => render_prediction(frame, chunks[1], state),
        Tab::Evaluation => render_evaluation(frame, chunks[1], state),
        Tab::SignTheory => render_sign_theory(frame, chunks[1], state),
    }

    render_console(frame, chunks[2], state);

    let footer = Paragraph::new(
        "Tab/←/→ Switch | Enter/r Run | ↑/↓ or digits Number | o Reload sample | e Export | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_title(state: &AppState) -> String {
    let data = match &state.data {
        Some(loaded) => format!("{} ({}行)", loaded.source, loaded.table.len()),
        None => "データ未読込".to_string(),
    };
    format!(" 有馬記念 AI予想 | {} | {} ", state.forecaster, data)
}

fn pending_line(state: &AppState, job: Job) -> Option<Line<'static>> {
    state.is_pending(job).then(|| {
        Line::styled(
            "実行中...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )
    })
}

fn render_prediction(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    lines.extend(pending_line(state, Job::Predict));
    match &state.prediction {
        Some(prediction) => {
            for role in PredictionRole::ALL {
                lines.push(Line::raw(prediction.line_for(role)));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "推奨買い方",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(prediction.bet_plan.clone()));
        }
        None => lines.push(Line::raw(
            "Enterで、読み込んだデータを元に『◎本命〜✕危険馬』と買い目案を提示します。",
        )),
    }
    let picks = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("印付き予想"));
    frame.render_widget(picks, cols[0]);

    let preview = Paragraph::new(preview_text(state))
        .block(Block::default().borders(Borders::ALL).title("データ"));
    frame.render_widget(preview, cols[1]);
}

fn preview_text(state: &AppState) -> String {
    let Some(loaded) = &state.data else {
        return format!(
            "期待する主な列名例: {}\n(不足していても動きますが、精度は落ちます)",
            columns::DISPLAY.join(", ")
        );
    };
    let table = &loaded.table;
    let shown: Vec<&str> = [columns::NUMBER, columns::NAME, columns::OVERALL_RATING]
        .into_iter()
        .filter(|c| table.has_column(c))
        .collect();
    let mut out = shown.join(" | ");
    for row in table.rows().iter().take(PREVIEW_ROWS) {
        out.push('\n');
        let cells: Vec<String> = shown.iter().map(|c| row.text(c)).collect();
        out.push_str(&cells.join(" | "));
    }
    if table.len() > PREVIEW_ROWS {
        out.push_str(&format!("\n… 他 {} 行", table.len() - PREVIEW_ROWS));
    }
    out
}

fn render_evaluation(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = vec![
        Line::raw(format!("馬番を入力: {}  (↑/↓, 数字キー)", state.number_input)),
        Line::raw(""),
    ];
    lines.extend(pending_line(state, Job::Evaluate));
    match &state.evaluation {
        Some(eval) => {
            lines.push(Line::styled(
                format!("馬番 {} の評価 / 総合評価 {} 点", eval.number, display_float(eval.overall_score)),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(format!(
                "馬 {:.2} / 騎手 {:.2} / コース {:.2}",
                eval.horse_score, eval.jockey_score, eval.course_score
            )));
            lines.push(Line::raw(format!("馬評価: {}", eval.horse_comment)));
            lines.push(Line::raw(format!("騎手評価: {}", eval.jockey_comment)));
            lines.push(Line::raw(format!("コース評価: {}", eval.course_comment)));
            lines.push(Line::styled(
                eval.summary.clone(),
                Style::default().fg(Color::Cyan),
            ));
        }
        None => lines.push(Line::raw(
            "馬番を入力してEnterを押すと、馬・騎手・コースを個別分析し統合評価を返します。",
        )),
    }
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("単体評価"));
    frame.render_widget(body, area);
}

fn render_sign_theory(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    lines.extend(pending_line(state, Job::SignTheory));
    match &state.sign_plan {
        Some(plan) => {
            lines.push(Line::styled(
                "今年の出来事 & 抽出数字",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.extend(plan.steps.iter().map(|s| Line::raw(s.clone())));
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "買い方プラン",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.extend(plan.plan.lines().map(|l| Line::raw(l.to_string())));
        }
        None => lines.push(Line::raw(
            "Enterで、今年の出来事からサイン数字を抽出し買い目案を提示します。",
        )),
    }
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("サイン理論"));
    frame.render_widget(body, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title("Console"));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Arima Terminal - Help",
        "",
        "Global:",
        "  Tab / → / ←   Switch tab",
        "  Enter / r     Run current tab",
        "  o             Reload sample data",
        "  e             Export results (.xlsx)",
        "  ?             Toggle help",
        "  q             Quit",
        "",
        "単体評価:",
        "  ↑/↓ or +/-    Change number",
        "  0-9           Type number",
        "  Backspace     Erase digit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn failed_setup_runs_restore() {
        let restored = Cell::new(false);
        let result: io::Result<()> = or_restore(
            || Err(io::Error::other("no tty")),
            || restored.set(true),
        );
        assert!(result.is_err());
        assert!(restored.get());
    }

    #[test]
    fn successful_setup_skips_restore() {
        let restored = Cell::new(false);
        let value = or_restore(|| Ok(7), || restored.set(true)).unwrap();
        assert_eq!(value, 7);
        assert!(!restored.get());
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 60, area);
        assert!(popup.width > 0 && popup.width <= 60);
        assert!(popup.x + popup.width <= area.width);
        assert!(popup.y + popup.height <= area.height);
    }
}
