//! 终端界面：模式选择 + 搜索框 + 卡片网格 + 详情浮层。
//!
//! All search state lives in [`UiState`]; this module only translates terminal
//! events into [`Action`]s and runs the effects on worker threads.

use std::collections::HashSet;
use std::process::Command;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{debug, info};

mod clipboard;
mod cover;
mod detail;
mod grid;
mod home;

use cover::CoverCache;

use super::LaunchOptions;
use crate::base_system::context::Config;
use crate::base_system::logging::take_broadcast_rx;
use crate::catalog::covers::CoverSize;
use crate::catalog::{CatalogClient, SearchMode};
use crate::search::{
    Action, Effect, FetchCompletion, FetchTicket, SearchController, StalePolicy, Trigger,
    UiState, update,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Modes,
    Input,
    Button,
    Grid,
}

#[derive(Debug)]
enum WorkerMsg {
    SearchDone(FetchCompletion),
    CoverDone {
        id: u64,
        size: CoverSize,
        result: Result<Vec<String>>,
    },
}

/// Rects from the last draw, for mouse hit-testing.
#[derive(Debug, Clone, Default)]
struct HomeLayout {
    modes: Vec<(SearchMode, Rect)>,
    input: Rect,
    button: Rect,
    grid: Rect,
    cards: Vec<(usize, Rect)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct DetailLayout {
    panel: Rect,
    body: Rect,
    close: Rect,
    link: Option<Rect>,
}

struct App {
    state: UiState,
    controller: SearchController,
    config: Config,
    focus: Focus,
    status: String,
    logs: Vec<String>,
    should_quit: bool,

    // grid
    grid_cursor: usize,
    grid_scroll: usize,
    grid_columns: usize,

    // overlay
    detail_scroll: u16,

    covers: CoverCache,

    // layout cache (for mouse)
    home_layout: HomeLayout,
    detail_layout: Option<DetailLayout>,

    // worker
    worker_tx: Sender<WorkerMsg>,
    worker_rx: Receiver<WorkerMsg>,

    // spinner
    spinner_idx: usize,
    spinner_last: Instant,

    // log
    log_rx: Option<crossbeam_channel::Receiver<String>>,
}

const DEFAULT_STATUS: &str = "Enter: search  Tab: focus  ←/→: mode  q: quit";

impl App {
    fn new(
        config: Config,
        controller: SearchController,
        mode: SearchMode,
        worker_tx: Sender<WorkerMsg>,
        worker_rx: Receiver<WorkerMsg>,
    ) -> Self {
        let policy = StalePolicy::from_discard_flag(config.discard_stale_responses);
        let covers = CoverCache::new(config.show_covers);
        Self {
            state: UiState::new(mode, policy),
            controller,
            config,
            focus: Focus::Input,
            status: DEFAULT_STATUS.to_string(),
            logs: Vec::new(),
            should_quit: false,
            grid_cursor: 0,
            grid_scroll: 0,
            grid_columns: 1,
            detail_scroll: 0,
            covers,
            home_layout: HomeLayout::default(),
            detail_layout: None,
            worker_tx,
            worker_rx,
            spinner_idx: 0,
            spinner_last: Instant::now(),
            log_rx: take_broadcast_rx(),
        }
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        let trimmed = msg.trim_end_matches(['\r', '\n']);
        self.logs.push(trimmed.to_string());
        if self.logs.len() > 200 {
            let overflow = self.logs.len() - 200;
            self.logs.drain(0..overflow);
        }
    }

    fn overlay_open(&self) -> bool {
        self.state.overlay_book().is_some()
    }
}

pub fn run(config: Config, launch: LaunchOptions) -> Result<()> {
    let client = CatalogClient::from_config(&config).context("init catalog client")?;
    let controller = SearchController::new(client);

    let (worker_tx, worker_rx) = mpsc::channel();
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("init terminal")?;

    let mut app = App::new(config, controller, launch.mode, worker_tx, worker_rx);
    start(&mut app, launch.query);
    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

/// Submit the `--query` text. Blank text surfaces the empty-query error.
fn start(app: &mut App, query: Option<String>) {
    if let Some(query) = query {
        dispatch(app, Action::EditQuery(query));
        dispatch(app, Action::Submit(Trigger::Commit));
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        tick_spinner(app);
        poll_worker(app);
        drain_log_channel(app);
        cover::request_visible(app);

        terminal.draw(|f| {
            home::draw_home(f, app);
            if app.overlay_open() {
                detail::draw_detail(f, app);
            } else {
                app.detail_layout = None;
            }
        })?;

        if !handle_event(app)? {
            break;
        }
    }
    Ok(())
}

fn handle_event(app: &mut App) -> Result<bool> {
    if !event::poll(Duration::from_millis(200)).context("poll event")? {
        return Ok(true);
    }

    let evt = event::read().context("read event")?;
    if let Event::Key(key) = &evt
        && is_interrupt(key)
    {
        app.should_quit = true;
    } else if app.overlay_open() {
        detail::handle_event_detail(app, evt)?;
    } else {
        home::handle_event_home(app, evt)?;
    }
    Ok(!app.should_quit)
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c'))
}

/// Apply an action and start whatever fetch it asks for.
fn dispatch(app: &mut App, action: Action) {
    if let Some(Effect::Fetch(ticket)) = update(&mut app.state, action) {
        start_search_task(app, ticket);
    }
}

fn start_search_task(app: &mut App, ticket: FetchTicket) {
    info!(target: "ui", "提交搜索 #{}", ticket.generation);
    app.spinner_idx = 0;
    app.spinner_last = Instant::now();
    app.detail_scroll = 0;
    let tx = app.worker_tx.clone();
    app.controller.spawn(ticket, move |done| {
        let _ = tx.send(WorkerMsg::SearchDone(done));
    });
}

fn poll_worker(app: &mut App) {
    while let Ok(msg) = app.worker_rx.try_recv() {
        match msg {
            WorkerMsg::SearchDone(completion) => {
                dispatch(app, Action::FetchFinished(completion));
                on_results_changed(app);
                debug!(
                    target: "ui",
                    "搜索 #{} 阶段 {:?}, 结果 {} 条",
                    app.state.generation(),
                    app.state.phase(),
                    app.state.results().len()
                );
            }
            WorkerMsg::CoverDone { id, size, result } => {
                app.covers.finish(id, size, result);
            }
        }
    }
}

fn on_results_changed(app: &mut App) {
    let len = app.state.results().len();
    app.grid_cursor = app
        .state
        .selected_index()
        .unwrap_or(0)
        .min(len.saturating_sub(1));
    app.grid_scroll = 0;
    if len == 0 && app.focus == Focus::Grid {
        app.focus = Focus::Input;
    }

    let mut shown: HashSet<u64> = app
        .state
        .results()
        .iter()
        .filter_map(|b| b.summary.cover_id)
        .collect();
    shown.extend(app.state.overlay_book().and_then(|b| b.summary.cover_id));
    app.covers.retain_art(&shown);
}

const SPINNER_FRAMES: &[char] = &['|', '/', '-', '\\'];

const LOG_HEIGHT: u16 = 7;

fn spinner_frame(app: &App) -> char {
    SPINNER_FRAMES[app.spinner_idx % SPINNER_FRAMES.len()]
}

fn tick_spinner(app: &mut App) {
    if !app.state.is_loading() {
        return;
    }
    if app.spinner_last.elapsed() < Duration::from_millis(140) {
        return;
    }
    app.spinner_idx = (app.spinner_idx + 1) % SPINNER_FRAMES.len();
    app.spinner_last = Instant::now();
}

fn split_with_log(area: Rect) -> (Rect, Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(LOG_HEIGHT.max(4)),
            Constraint::Length(LOG_HEIGHT),
        ])
        .split(area);
    let main = layout.first().copied().unwrap_or(area);
    let log = layout.get(1).copied().unwrap_or(Rect {
        x: area.x,
        y: area
            .y
            .saturating_add(area.height.saturating_sub(LOG_HEIGHT)),
        width: area.width,
        height: LOG_HEIGHT,
    });
    (main, log)
}

fn render_log_box(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if app.logs.is_empty() {
        lines.push(Line::from("Log: empty"));
    } else {
        // stick to the newest entries
        let visible = area.height.saturating_sub(2).max(1) as usize;
        lines.extend(
            app.logs
                .iter()
                .rev()
                .take(visible)
                .rev()
                .map(|m| style_log_line(m)),
        );
    }

    let log = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(log, area);
}

fn style_log_line(line: &str) -> Line<'static> {
    let mut parts = line.split_whitespace();
    let ts = parts.next().unwrap_or("");
    let level = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest: Vec<&str> = parts.collect();

    let mut spans: Vec<Span<'static>> = Vec::new();
    if !ts.is_empty() {
        spans.push(Span::styled(
            ts.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if !level.is_empty() {
        let color = match level.as_str() {
            "ERROR" => Color::Red,
            "WARN" => Color::Yellow,
            "INFO" => Color::Cyan,
            "DEBUG" | "TRACE" => Color::Gray,
            _ => Color::White,
        };
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            level,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(target) = rest.first()
        && !target.is_empty()
    {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            (*target).to_string(),
            Style::default().fg(Color::LightBlue),
        ));
    }

    let message = rest.iter().skip(1).copied().collect::<Vec<_>>().join(" ");
    if !message.is_empty() {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(message));
    }

    Line::from(spans)
}

fn drain_log_channel(app: &mut App) {
    if let Some(rx) = app.log_rx.clone() {
        for line in rx.try_iter() {
            app.push_log(line);
        }
    }
}

fn pos_in(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x
        && col < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

/// Open a URL with the platform's default handler.
fn open_url(url: &str) -> Result<()> {
    let spawn_result = if cfg!(target_os = "windows") {
        // explorer.exe leaves the console modes alone, cmd.exe does not
        Command::new("explorer")
            .arg(url)
            .spawn()
            .or_else(|_| Command::new("cmd").args(["/C", "start", url]).spawn())
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    // some openers still toggle console modes
    let _ = enable_raw_mode();
    let mut out = std::io::stdout();
    let _ = execute!(&mut out, EnableMouseCapture);

    spawn_result
        .map(|_| ())
        .with_context(|| format!("open {url}"))
}

#[cfg(test)]
mod testing {
    use ratatui::backend::TestBackend;
    use serde_json::Value;

    use super::*;
    use crate::catalog::client::testing::RecordingTransport;

    /// App backed by a canned catalog response, covers disabled.
    pub(super) fn app_with(response: Value) -> App {
        let transport = RecordingTransport::new(Ok(response));
        let client = CatalogClient::new(transport, "https://openlibrary.org");
        let config = Config {
            show_covers: false,
            ..Config::default()
        };
        let (tx, rx) = mpsc::channel();
        App::new(config, SearchController::new(client), SearchMode::Title, tx, rx)
    }

    /// Run a search to completion on the test thread.
    pub(super) fn search_now(app: &mut App, query: &str) {
        update(&mut app.state, Action::EditQuery(query.to_string()));
        if let Some(Effect::Fetch(ticket)) = update(&mut app.state, Action::Submit(Trigger::Commit)) {
            let done = app.controller.execute(&ticket);
            update(&mut app.state, Action::FetchFinished(done));
            on_results_changed(app);
        }
    }

    /// Draw one frame so the layout caches used for mouse hits are filled.
    pub(super) fn draw(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| {
                home::draw_home(f, app);
                if app.overlay_open() {
                    detail::draw_detail(f, app);
                } else {
                    app.detail_layout = None;
                }
            })
            .unwrap();
    }

    pub(super) fn left_click(column: u16, row: u16) -> Event {
        Event::Mouse(event::MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }
}
