//! 无 UI（旧 CLI）交互入口。
//!
//! 使用标准输入输出逐行交互，驱动与 TUI 相同的搜索状态机。

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use crossterm::event::DisableMouseCapture;
use crossterm::execute;
use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};
use tracing::info;

use super::LaunchOptions;
use super::view::{
    self, APP_TITLE, CardView, DETAIL_TITLE, DetailView, IDLE_EXAMPLES, IDLE_HINT, LINK_LABEL,
    ResultsBody, TAGLINE,
};
use crate::base_system::context::Config;
use crate::catalog::{CatalogClient, SearchMode};
use crate::search::{Action, SearchController, StalePolicy, Trigger, UiState, update};

const LIST_TITLE_WIDTH: usize = 72;

const HELP: &str = "\
Type a search term and press Enter.
  :mode <title|author|subject>   switch search mode
  :view <N>                      show details for result N
  :help                          show this help
  :q                             quit";

/// Session-wide settings needed to render links and cover URLs.
struct Session<'a> {
    controller: SearchController,
    state: UiState,
    catalog_base: &'a str,
    covers_base: &'a str,
}

pub fn run(config: &Config, launch: LaunchOptions) -> Result<()> {
    // leftover raw mode from a crashed TUI run breaks line input
    let _ = disable_raw_mode();
    let mut out = io::stdout();
    let _ = execute!(out, DisableMouseCapture, LeaveAlternateScreen);

    let client = CatalogClient::from_config(config).context("init catalog client")?;
    let mut session = Session {
        controller: SearchController::new(client),
        state: UiState::new(
            launch.mode,
            StalePolicy::from_discard_flag(config.discard_stale_responses),
        ),
        catalog_base: config.catalog_root(),
        covers_base: config.covers_root(),
    };

    writeln!(out, "{APP_TITLE} v{}\n{TAGLINE}\n", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "{IDLE_HINT}\n{IDLE_EXAMPLES}\n\n{HELP}\n")?;

    session.start(launch.query.as_deref(), &mut out)?;

    let stdin = io::stdin();
    session.repl(stdin.lock(), &mut out)
}

impl Session<'_> {
    /// Run the `--query` search, if any. Blank text reports the empty-query error.
    fn start(&mut self, query: Option<&str>, out: &mut impl Write) -> Result<()> {
        match query {
            Some(query) => self.search(query, out),
            None => Ok(()),
        }
    }

    fn repl(&mut self, mut input: impl BufRead, out: &mut impl Write) -> Result<()> {
        loop {
            write!(out, "[{}] > ", self.state.mode().label())?;
            out.flush().ok();

            let mut line = String::new();
            if input.read_line(&mut line).context("read stdin")? == 0 {
                writeln!(out)?;
                break;
            }
            let text = line.trim_end_matches(['\r', '\n']);

            match parse_command(text) {
                Command::Quit => break,
                Command::Help => writeln!(out, "{HELP}")?,
                Command::Mode(mode) => {
                    update(&mut self.state, Action::SetMode(mode));
                    writeln!(out, "Search mode: {}", mode.label())?;
                }
                Command::View(n) => self.view(n, out)?,
                Command::BadCommand(msg) => writeln!(out, "{msg}")?,
                Command::Search(query) => self.search(query, out)?,
            }
        }
        writeln!(out, "Bye.")?;
        Ok(())
    }

    fn search(&mut self, query: &str, out: &mut impl Write) -> Result<()> {
        update(&mut self.state, Action::EditQuery(query.to_string()));
        if !query.trim().is_empty() {
            writeln!(out, "Searching...")?;
        }
        let phase = self.controller.search(&mut self.state, Trigger::Commit);
        info!(target: "ui", "搜索结束: {phase:?}");
        self.print_results(out)
    }

    fn print_results(&self, out: &mut impl Write) -> Result<()> {
        if let Some(err) = self.state.error() {
            writeln!(out, "! {err}\n")?;
        }
        if view::results_body(&self.state) != ResultsBody::Cards {
            return Ok(());
        }

        let results = self.state.results();
        writeln!(out, "{}\n", view::found_banner(results.len()))?;
        for (idx, book) in results.iter().enumerate() {
            let card = CardView::build(&book.summary, self.covers_base, LIST_TITLE_WIDTH);
            writeln!(out, "{:>2}. {}", idx + 1, card.title_lines.join(" "))?;
            let meta: Vec<String> = [card.authors, card.year, card.rating.map(|r| format!("★ {r}"))]
                .into_iter()
                .flatten()
                .collect();
            if !meta.is_empty() {
                writeln!(out, "    {}", meta.join(" · "))?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn view(&mut self, n: usize, out: &mut impl Write) -> Result<()> {
        if n == 0 || n > self.state.results().len() {
            writeln!(out, "No result #{n}.")?;
            return Ok(());
        }
        update(&mut self.state, Action::Select(n - 1));
        if let Some(book) = self.state.overlay_book() {
            let detail = DetailView::build(book, self.catalog_base, self.covers_base);
            print_detail(&detail, out)?;
        }
        update(&mut self.state, Action::CloseDetail);
        Ok(())
    }
}

fn print_detail(detail: &DetailView, out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n===== {DETAIL_TITLE} =====")?;
    writeln!(out, "{}", detail.title)?;
    for (label, value) in detail.facts() {
        writeln!(out, "  {label}: {value}")?;
    }
    if !detail.subjects.is_empty() {
        writeln!(out, "  Subjects: {}", detail.subjects.join(" | "))?;
    }
    if let Some(link) = &detail.link {
        writeln!(out, "  {LINK_LABEL} {link}")?;
    }
    writeln!(out)?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Help,
    Mode(SearchMode),
    View(usize),
    BadCommand(String),
    Search(&'a str),
}

fn parse_command(text: &str) -> Command<'_> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Command::Search(text);
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();
    match (name, arg) {
        ("q" | "quit", _) => Command::Quit,
        ("help" | "h", _) => Command::Help,
        ("mode" | "m", Some(label)) => Command::Mode(SearchMode::from_label(label)),
        ("view" | "v", Some(n)) => match n.parse() {
            Ok(n) => Command::View(n),
            Err(_) => Command::BadCommand(format!("Not a result number: {n}")),
        },
        _ => Command::BadCommand(format!("Unknown command: {trimmed} (try :help)")),
    }
}
