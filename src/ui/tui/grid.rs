//! 结果网格：每条结果一张卡片。

use super::*;
use super::cover::CoverCache;

use crate::catalog::covers::PLACEHOLDER_GLYPH;
use crate::ui::view::CardView;

pub(super) const CARD_WIDTH: u16 = 30;
pub(super) const CARD_HEIGHT: u16 = 12;
const COVER_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct GridGeometry {
    pub columns: usize,
    pub rows: usize,
}

pub(super) fn geometry(area: Rect) -> GridGeometry {
    GridGeometry {
        columns: (area.width / CARD_WIDTH).max(1) as usize,
        rows: (area.height / CARD_HEIGHT).max(1) as usize,
    }
}

/// Title column budget inside a card.
pub(super) fn title_width() -> usize {
    CARD_WIDTH.saturating_sub(2) as usize
}

/// First visible row such that the cursor's row is on screen.
pub(super) fn scroll_to_cursor(cursor: usize, scroll: usize, geo: GridGeometry) -> usize {
    let row = cursor / geo.columns.max(1);
    if row < scroll {
        row
    } else if row >= scroll + geo.rows {
        row + 1 - geo.rows
    } else {
        scroll
    }
}

pub(super) fn move_cursor(cursor: usize, len: usize, columns: usize, code: KeyCode) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let columns = columns.max(1);
    match code {
        KeyCode::Left => cursor.saturating_sub(1),
        KeyCode::Right => (cursor + 1).min(last),
        KeyCode::Up => cursor.saturating_sub(columns),
        KeyCode::Down => {
            if cursor + columns <= last {
                cursor + columns
            } else {
                cursor
            }
        }
        KeyCode::Home => 0,
        KeyCode::End => last,
        _ => cursor,
    }
    .min(last)
}

/// Draw visible cards and return their screen rects by result index.
pub(super) fn draw_grid(
    frame: &mut ratatui::Frame,
    area: Rect,
    cards: &[CardView],
    cursor: Option<usize>,
    scroll: usize,
    covers: &CoverCache,
) -> Vec<(usize, Rect)> {
    let geo = geometry(area);
    let mut placed = Vec::new();

    for (idx, card) in cards.iter().enumerate().skip(scroll * geo.columns) {
        let slot = idx - scroll * geo.columns;
        let (row, col) = (slot / geo.columns, slot % geo.columns);
        if row >= geo.rows {
            break;
        }
        let rect = Rect {
            x: area.x + col as u16 * CARD_WIDTH,
            y: area.y + row as u16 * CARD_HEIGHT,
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        }
        .intersection(area);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }

        draw_card(frame, rect, card, cursor == Some(idx), covers);
        placed.push((idx, rect));
    }
    placed
}

fn draw_card(
    frame: &mut ratatui::Frame,
    rect: Rect,
    card: &CardView,
    highlighted: bool,
    covers: &CoverCache,
) {
    let border = if highlighted {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let mut lines: Vec<Line> = cover_lines(card, covers)
        .into_iter()
        .map(|l| Line::from(l).alignment(Alignment::Center))
        .collect();

    let title_style = Style::default().add_modifier(Modifier::BOLD);
    for i in 0..2 {
        let text = card.title_lines.get(i).cloned().unwrap_or_default();
        lines.push(Line::from(Span::styled(text, title_style)));
    }
    if let Some(authors) = &card.authors {
        lines.push(Line::from(Span::styled(
            authors.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    if let Some(year) = &card.year {
        lines.push(Line::from(Span::styled(
            year.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(rating) = &card.rating {
        lines.push(Line::from(Span::styled(
            format!("★ {rating}"),
            Style::default().fg(Color::Yellow),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn cover_lines(card: &CardView, covers: &CoverCache) -> Vec<String> {
    if let Some(art) = card
        .cover_id
        .and_then(|id| covers.lines(id, CoverSize::Medium))
    {
        let mut out: Vec<String> = art.iter().take(COVER_ROWS).cloned().collect();
        out.resize(COVER_ROWS, String::new());
        return out;
    }

    let mut out = vec![String::new(); COVER_ROWS];
    out[COVER_ROWS / 2] = PLACEHOLDER_GLYPH.to_string();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BookSummary;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn card(title: &str) -> CardView {
        let book = BookSummary {
            title: Some(title.to_string()),
            author_names: vec!["J. K. Rowling".into()],
            first_publish_year: Some(1997),
            ..BookSummary::default()
        };
        CardView::build(&book, "https://covers.openlibrary.org", title_width())
    }

    #[test]
    fn single_card_shows_title_author_year() {
        let mut terminal = Terminal::new(TestBackend::new(80, 14)).unwrap();
        let cards = vec![card("Harry Potter")];
        let covers = CoverCache::new(false);
        let mut placed = Vec::new();
        terminal
            .draw(|f| {
                placed = draw_grid(f, f.size(), &cards, Some(0), 0, &covers);
            })
            .unwrap();

        assert_eq!(placed.len(), 1);
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Harry Potter"));
        assert!(text.contains("J. K. Rowling"));
        assert!(text.contains("1997"));
        assert!(!text.contains("/ 5"));
    }

    #[test]
    fn cards_flow_left_to_right_in_order() {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        let cards: Vec<_> = ["A", "B", "C", "D"].iter().map(|t| card(t)).collect();
        let covers = CoverCache::new(false);
        let mut placed = Vec::new();
        terminal
            .draw(|f| {
                placed = draw_grid(f, f.size(), &cards, None, 0, &covers);
            })
            .unwrap();

        let order: Vec<_> = placed.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(placed[1].1.y, placed[0].1.y);
        assert!(placed[3].1.y > placed[0].1.y);
    }

    #[test]
    fn scrolling_keeps_cursor_row_visible() {
        let geo = GridGeometry { columns: 3, rows: 2 };
        assert_eq!(scroll_to_cursor(0, 0, geo), 0);
        assert_eq!(scroll_to_cursor(7, 0, geo), 1);
        assert_eq!(scroll_to_cursor(1, 2, geo), 0);
        assert_eq!(scroll_to_cursor(4, 1, geo), 1);
    }

    #[test]
    fn cursor_moves_within_bounds() {
        assert_eq!(move_cursor(0, 5, 3, KeyCode::Left), 0);
        assert_eq!(move_cursor(4, 5, 3, KeyCode::Right), 4);
        assert_eq!(move_cursor(1, 5, 3, KeyCode::Down), 4);
        assert_eq!(move_cursor(2, 5, 3, KeyCode::Down), 2);
        assert_eq!(move_cursor(4, 5, 3, KeyCode::Up), 1);
        assert_eq!(move_cursor(3, 0, 3, KeyCode::Down), 0);
    }
}
