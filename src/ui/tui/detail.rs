//! 详情浮层。Esc / x / [ Close ] / 点击浮层外部关闭。

use super::*;

use crate::catalog::covers::PLACEHOLDER_GLYPH;
use crate::ui::view::{DETAIL_TITLE, DetailView, LINK_LABEL};

const CLOSE_LABEL: &str = "[ Close ]";
const COVER_COLUMN: u16 = 26;

pub(super) fn handle_event_detail(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('q') => close(app),
            KeyCode::Enter | KeyCode::Char('o') => open_selected_link(app),
            KeyCode::Up => app.detail_scroll = app.detail_scroll.saturating_sub(1),
            KeyCode::Down => app.detail_scroll = app.detail_scroll.saturating_add(1),
            KeyCode::PageUp => app.detail_scroll = app.detail_scroll.saturating_sub(10),
            KeyCode::PageDown => app.detail_scroll = app.detail_scroll.saturating_add(10),
            _ => {}
        },
        Event::Mouse(me) => {
            let Some(layout) = app.detail_layout else {
                return Ok(());
            };
            match me.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    if pos_in(layout.close, me.column, me.row)
                        || !pos_in(layout.panel, me.column, me.row)
                    {
                        close(app);
                    } else if let Some(link) = layout.link
                        && pos_in(link, me.column, me.row)
                    {
                        open_selected_link(app);
                    }
                }
                MouseEventKind::ScrollUp if pos_in(layout.body, me.column, me.row) => {
                    app.detail_scroll = app.detail_scroll.saturating_sub(1);
                }
                MouseEventKind::ScrollDown if pos_in(layout.body, me.column, me.row) => {
                    app.detail_scroll = app.detail_scroll.saturating_add(1);
                }
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

fn close(app: &mut App) {
    super::dispatch(app, Action::CloseDetail);
    app.detail_scroll = 0;
    app.detail_layout = None;
}

fn open_selected_link(app: &mut App) {
    let Some(view) = current_view(app) else {
        return;
    };
    let Some(url) = view.link else {
        app.status = "This record has no catalog link".to_string();
        return;
    };
    match open_url(&url) {
        Ok(()) => {
            info!(target: "ui", "已在浏览器打开: {url}");
            app.status = format!("Opened {url}");
        }
        Err(err) => {
            tracing::warn!(target: "ui", "打开浏览器失败: {err:#}");
            app.status = format!("Could not open browser: {err}");
        }
    }
}

fn current_view(app: &App) -> Option<DetailView> {
    app.state
        .overlay_book()
        .map(|b| DetailView::build(b, app.config.catalog_root(), app.config.covers_root()))
}

/// Centered panel leaving a margin around the screen edge.
fn panel_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(4).min(96);
    let height = area.height.saturating_sub(2).min(32);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

pub(super) fn draw_detail(frame: &mut ratatui::Frame, app: &mut App) {
    let Some(view) = current_view(app) else {
        app.detail_layout = None;
        return;
    };

    let panel = panel_rect(frame.size());
    frame.render_widget(Clear, panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            DETAIL_TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Left);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    let (body, actions) = (rows[0], rows[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(COVER_COLUMN), Constraint::Min(10)])
        .split(body);

    let cover = cover_lines(app, &view, columns[0].height as usize);
    frame.render_widget(
        Paragraph::new(cover).alignment(Alignment::Center),
        columns[0],
    );

    let info = Paragraph::new(info_lines(&view))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(info, columns[1]);

    let (close, link) = draw_actions(frame, actions, &view);
    app.detail_layout = Some(DetailLayout {
        panel,
        body,
        close,
        link,
    });
}

fn cover_lines(app: &App, view: &DetailView, height: usize) -> Vec<Line<'static>> {
    if let Some(art) = view
        .cover_id
        .and_then(|id| app.covers.lines(id, CoverSize::Large))
    {
        return art.iter().cloned().map(Line::from).collect();
    }
    let mut lines = vec![Line::from(""); height / 2];
    lines.push(Line::from(PLACEHOLDER_GLYPH));
    lines
}

fn info_lines(view: &DetailView) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            view.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (label, value) in view.facts() {
        let value_style = match label {
            "ISBN" => Style::default().fg(Color::Magenta),
            "Rating" => Style::default().fg(Color::Yellow),
            _ => Style::default(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::styled(value.to_string(), value_style),
        ]));
    }

    if !view.subjects.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Subjects", label_style)));
        let chip = Style::default().fg(Color::Black).bg(Color::LightBlue);
        let mut spans = Vec::new();
        for subject in &view.subjects {
            spans.push(Span::styled(format!(" {subject} "), chip));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Action row: link on the left, close button on the right.
fn draw_actions(frame: &mut ratatui::Frame, area: Rect, view: &DetailView) -> (Rect, Option<Rect>) {
    let close_w = Span::raw(CLOSE_LABEL).width() as u16;
    let close = Rect {
        x: area.x + area.width.saturating_sub(close_w),
        y: area.y,
        width: close_w.min(area.width),
        height: area.height,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            CLOSE_LABEL,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        close,
    );

    let link = view.link.as_ref().map(|_| {
        let label = format!("[ {LINK_LABEL} ]");
        let width = (Span::raw(label.as_str()).width() as u16).min(area.width.saturating_sub(close_w));
        let rect = Rect {
            x: area.x,
            y: area.y,
            width,
            height: area.height,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::UNDERLINED),
            )),
            rect,
        );
        rect
    });
    (close, link)
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::catalog::BookDetail;

    #[test]
    fn panel_is_centered_inside_screen() {
        let area = Rect::new(0, 0, 120, 40);
        let panel = panel_rect(area);
        assert_eq!(panel.width, 96);
        assert_eq!(panel.height, 32);
        assert_eq!(panel.x, 12);
        assert_eq!(panel.y, 4);

        let small = panel_rect(Rect::new(0, 0, 40, 12));
        assert_eq!(small.width, 36);
        assert_eq!(small.height, 10);
    }

    #[test]
    fn info_lists_only_present_facts() {
        let mut book = BookDetail::default();
        book.summary.title = Some("Emma".into());
        book.isbns = vec!["9780141439587".into()];
        book.subjects = vec!["Courtship".into()];
        let view = DetailView::build(&book, "https://openlibrary.org", "https://covers.openlibrary.org");

        let text: Vec<String> = info_lines(&view)
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[0], "Emma");
        assert!(text.iter().any(|l| l == "ISBN: 9780141439587"));
        assert!(text.iter().any(|l| l.contains(" Courtship ")));
        assert!(!text.iter().any(|l| l.starts_with("Pages")));
    }

    fn app_with_open_overlay() -> App {
        let mut app = testing::app_with(serde_json::json!({
            "docs": [
                {"key": "/works/OL27448W", "title": "The Hobbit", "author_name": ["J.R.R. Tolkien"]},
                {"key": "/works/OL27479W", "title": "The Silmarillion"}
            ]
        }));
        testing::search_now(&mut app, "tolkien");
        super::super::dispatch(&mut app, Action::Select(1));
        testing::draw(&mut app);
        app
    }

    #[test]
    fn click_outside_panel_closes() {
        let mut app = app_with_open_overlay();
        let panel = app.detail_layout.unwrap().panel;
        assert!(panel.x > 0 && panel.y > 0);

        handle_event_detail(&mut app, testing::left_click(0, 0)).unwrap();
        assert_eq!(app.state.selected_index(), None);
        assert_eq!(app.state.results().len(), 2);
    }

    #[test]
    fn click_on_close_button_closes() {
        let mut app = app_with_open_overlay();
        let close = app.detail_layout.unwrap().close;

        handle_event_detail(&mut app, testing::left_click(close.x + 1, close.y)).unwrap();
        assert_eq!(app.state.selected_index(), None);
    }

    #[test]
    fn click_inside_body_keeps_overlay() {
        let mut app = app_with_open_overlay();
        let body = app.detail_layout.unwrap().body;

        handle_event_detail(&mut app, testing::left_click(body.x + 1, body.y + 1)).unwrap();
        assert_eq!(app.state.selected_index(), Some(1));
        assert!(app.overlay_open());
    }

    #[test]
    fn escape_and_x_close() {
        for code in [KeyCode::Esc, KeyCode::Char('x')] {
            let mut app = app_with_open_overlay();
            let key = KeyEvent::new(code, KeyModifiers::NONE);
            handle_event_detail(&mut app, Event::Key(key)).unwrap();
            assert_eq!(app.state.selected_index(), None);
        }
    }
}
