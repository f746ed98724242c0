//! TUI 首页：模式选择、搜索框、按钮、结果区。

use super::*;

use crate::ui::view::{
    self, APP_TITLE, CardView, IDLE_EXAMPLES, IDLE_HINT, ResultsBody, TAGLINE,
};

pub(super) fn handle_event_home(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Paste(s) => {
            if app.focus == Focus::Input {
                push_input(app, &s);
            }
        }
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Tab => cycle_focus(app, true),
            KeyCode::BackTab => cycle_focus(app, false),
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                paste_clipboard(app)
            }
            KeyCode::Char(c)
                if app.focus == Focus::Input
                    && !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                push_input(app, &c.to_string());
            }
            KeyCode::Backspace if app.focus == Focus::Input => {
                let mut text = app.state.query().to_string();
                text.pop();
                super::dispatch(app, Action::EditQuery(text));
            }
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Esc => app.focus = Focus::Input,
            KeyCode::Left | KeyCode::Right if app.focus == Focus::Modes => {
                let mode = if key.code == KeyCode::Left {
                    app.state.mode().prev()
                } else {
                    app.state.mode().next()
                };
                super::dispatch(app, Action::SetMode(mode));
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home
            | KeyCode::End
                if app.focus == Focus::Grid =>
            {
                app.grid_cursor = grid::move_cursor(
                    app.grid_cursor,
                    app.state.results().len(),
                    app.grid_columns,
                    key.code,
                );
            }
            KeyCode::Enter => match app.focus {
                Focus::Input => submit(app, Trigger::Commit),
                Focus::Button | Focus::Modes => submit(app, Trigger::Button),
                Focus::Grid => select_card(app, app.grid_cursor),
            },
            KeyCode::Char(' ') if app.focus == Focus::Button => submit(app, Trigger::Button),
            _ => {}
        },
        Event::Mouse(me) => handle_mouse_home(app, me),
        _ => {}
    }
    Ok(())
}

fn handle_mouse_home(app: &mut App, me: event::MouseEvent) {
    let layout = app.home_layout.clone();
    match me.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((mode, _)) = layout
                .modes
                .iter()
                .find(|(_, r)| pos_in(*r, me.column, me.row))
            {
                app.focus = Focus::Modes;
                super::dispatch(app, Action::SetMode(*mode));
            } else if pos_in(layout.input, me.column, me.row) {
                app.focus = Focus::Input;
            } else if pos_in(layout.button, me.column, me.row) {
                app.focus = Focus::Button;
                submit(app, Trigger::Button);
            } else if let Some((idx, _)) = layout
                .cards
                .iter()
                .find(|(_, r)| pos_in(*r, me.column, me.row))
            {
                app.focus = Focus::Grid;
                app.grid_cursor = *idx;
                select_card(app, *idx);
            }
        }
        MouseEventKind::ScrollUp if pos_in(layout.grid, me.column, me.row) => {
            app.grid_cursor = app.grid_cursor.saturating_sub(app.grid_columns.max(1));
        }
        MouseEventKind::ScrollDown if pos_in(layout.grid, me.column, me.row) => {
            app.grid_cursor = grid::move_cursor(
                app.grid_cursor,
                app.state.results().len(),
                app.grid_columns,
                KeyCode::Down,
            );
        }
        _ => {}
    }
}

fn push_input(app: &mut App, s: &str) {
    let text = format!("{}{}", app.state.query(), s.replace(['\r', '\n'], " "));
    super::dispatch(app, Action::EditQuery(text));
}

fn paste_clipboard(app: &mut App) {
    if app.focus != Focus::Input {
        return;
    }
    match super::clipboard::get_text() {
        Ok(Some(text)) => push_input(app, &text),
        Ok(None) => app.status = "Clipboard is empty or unavailable in this build".to_string(),
        Err(e) => app.status = format!("Could not read clipboard: {e}"),
    }
}

fn submit(app: &mut App, trigger: Trigger) {
    if trigger == Trigger::Button && !app.state.can_submit() {
        debug!(target: "ui", "搜索进行中，按钮无效");
        return;
    }
    super::dispatch(app, Action::Submit(trigger));
}

fn select_card(app: &mut App, idx: usize) {
    super::dispatch(app, Action::Select(idx));
    if app.state.selected_index() == Some(idx) {
        app.detail_scroll = 0;
    }
}

fn cycle_focus(app: &mut App, forward: bool) {
    let has_cards = !app.state.results().is_empty() && !app.state.is_loading();
    let order: &[Focus] = if has_cards {
        &[Focus::Modes, Focus::Input, Focus::Button, Focus::Grid]
    } else {
        &[Focus::Modes, Focus::Input, Focus::Button]
    };
    let pos = order.iter().position(|f| *f == app.focus).unwrap_or(0);
    let next = if forward {
        (pos + 1) % order.len()
    } else {
        (pos + order.len() - 1) % order.len()
    };
    app.focus = order[next];
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

pub(super) fn draw_home(frame: &mut ratatui::Frame, app: &mut App) {
    let (main, log_area) = super::split_with_log(frame.size());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(6),
        ])
        .split(main);

    draw_header(frame, layout[0], app);
    let modes = draw_modes(frame, layout[1], app);
    let (input, button) = draw_search_row(frame, layout[2], app);

    if let Some(err) = app.state.error() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" ! {err}"),
                Style::default().fg(Color::Red),
            )),
            layout[3],
        );
    }

    let (grid, cards) = draw_results(frame, layout[4], app);
    app.home_layout = HomeLayout {
        modes,
        input,
        button,
        grid,
        cards,
    };

    super::render_log_box(frame, log_area, app);
}

fn draw_header(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                APP_TITLE,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::styled(app.status.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(TAGLINE, Style::default().fg(Color::Gray))),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_modes(frame: &mut ratatui::Frame, area: Rect, app: &App) -> Vec<(SearchMode, Rect)> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::Modes))
        .title("Search by");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut tabs = Vec::new();
    let mut x = inner.x;
    for mode in SearchMode::SELECTABLE {
        let label = format!(" {} ", mode.label());
        let width = (label.len() as u16).min(inner.right().saturating_sub(x));
        if width == 0 {
            break;
        }
        let rect = Rect {
            x,
            y: inner.y,
            width,
            height: inner.height.min(1),
        };
        let style = if mode == app.state.mode() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightBlue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(Paragraph::new(Span::styled(label, style)), rect);
        tabs.push((mode, rect));
        x = x.saturating_add(width + 2);
    }
    tabs
}

fn draw_search_row(frame: &mut ratatui::Frame, area: Rect, app: &App) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(18)])
        .split(area);

    let input = if app.state.query().is_empty() {
        Paragraph::new(Span::styled(
            view::input_placeholder(&app.state),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(format!("> {}", app.state.query()))
    };
    frame.render_widget(
        input.block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, Focus::Input)),
        ),
        cols[0],
    );

    let label = if app.state.is_loading() {
        format!("{} {}", super::spinner_frame(app), view::button_label(&app.state))
    } else {
        view::button_label(&app.state).to_string()
    };
    let button_style = if app.state.can_submit() {
        focus_style(app, Focus::Button).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(label, button_style))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(focus_style(app, Focus::Button)),
            ),
        cols[1],
    );

    (cols[0], cols[1])
}

fn draw_results(
    frame: &mut ratatui::Frame,
    area: Rect,
    app: &mut App,
) -> (Rect, Vec<(usize, Rect)>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::Grid))
        .title("Results");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match view::results_body(&app.state) {
        ResultsBody::Hint => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    IDLE_HINT,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(IDLE_EXAMPLES, Style::default().fg(Color::DarkGray))),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            (inner, Vec::new())
        }
        ResultsBody::Spinner => {
            let text = format!("{} Searching...", super::spinner_frame(app));
            frame.render_widget(
                Paragraph::new(vec![Line::from(""), Line::from(text)])
                    .alignment(Alignment::Center),
                inner,
            );
            (inner, Vec::new())
        }
        ResultsBody::Nothing => (inner, Vec::new()),
        ResultsBody::Cards => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(inner);
            let banner = Line::from(Span::styled(
                view::found_banner(app.state.results().len()),
                Style::default().fg(Color::Gray),
            ))
            .alignment(Alignment::Center);
            frame.render_widget(Paragraph::new(banner), rows[0]);

            let grid_area = rows[1];
            let geo = grid::geometry(grid_area);
            app.grid_columns = geo.columns;
            app.grid_scroll = grid::scroll_to_cursor(app.grid_cursor, app.grid_scroll, geo);

            let covers_base = app.config.covers_root();
            let cards: Vec<CardView> = app
                .state
                .results()
                .iter()
                .map(|b| CardView::build(&b.summary, covers_base, grid::title_width()))
                .collect();
            let cursor = (app.focus == Focus::Grid).then_some(app.grid_cursor);
            let placed =
                grid::draw_grid(frame, grid_area, &cards, cursor, app.grid_scroll, &app.covers);
            (grid_area, placed)
        }
    }
}
