//! Drawing the review screen.

use ratatui::prelude::*;
use ratatui::widgets::*;
use tidymark::model::{Action, truncate_chars};
use tidymark::ui::BatchReview;

use crate::app::App;

/// Lines each bookmark takes in the list: header, domain, reasoning, gap.
const ROW_HEIGHT: usize = 4;

/// Map an action to its list colour.
pub fn action_style(action: &Action) -> Style {
    match action {
        Action::Keep => Style::default().fg(Color::Green),
        Action::Delete => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Action::Archive => Style::default().fg(Color::Blue),
        Action::Move { .. } => Style::default().fg(Color::Magenta),
    }
}

// ── Root Render ───────────────────────────────────────────────────────

pub(crate) fn render(frame: &mut Frame, review: &BatchReview, app: &mut App) {
    // [3] header | [flex] bookmarks | [3] key hints.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], review, app);
    render_rows(frame, chunks[1], review, app);
    render_hints(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, area: Rect, review: &BatchReview, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {} bookmarks", review.len()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if !review.collection_name.is_empty() {
        spans.push(Span::raw(format!(" from '{}'", review.collection_name)));
    }
    spans.push(Span::raw("   "));
    for (label, count) in app.tally() {
        if count > 0 {
            spans.push(Span::raw(format!("{label} {count}  ")));
        }
    }

    let title = if review.batch_label.is_empty() {
        " Review ".to_string()
    } else {
        format!(" {} ", review.batch_label)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_rows(frame: &mut Frame, area: Rect, review: &BatchReview, app: &mut App) {
    let visible = (area.height.saturating_sub(2) as usize / ROW_HEIGHT).max(1);
    if app.cursor < app.scroll {
        app.scroll = app.cursor;
    } else if app.cursor >= app.scroll + visible {
        app.scroll = app.cursor + 1 - visible;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, ((bookmark, decision), row)) in review
        .bookmarks
        .iter()
        .zip(&review.decisions)
        .zip(&app.rows)
        .enumerate()
        .skip(app.scroll)
        .take(visible)
    {
        let is_selected = i == app.cursor;
        let marker = if is_selected { "> " } else { "  " };
        let title_style = if is_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let mut header = vec![
            Span::styled(format!("{marker}{:2}. ", i + 1), title_style),
            Span::styled(truncate_chars(&bookmark.title, 60), title_style),
            Span::raw("  "),
        ];
        for (j, choice) in row.choices.iter().enumerate() {
            let style = if j == row.selected {
                action_style(choice).add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            header.push(Span::styled(format!(" {choice} "), style));
        }
        lines.push(Line::from(header));
        lines.push(Line::from(vec![
            Span::raw("      "),
            Span::styled(bookmark.domain.clone(), Style::default().fg(Color::Blue)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("      "),
            Span::styled(
                format!("{} {}", decision.action.icon(), decision.reasoning),
                Style::default().fg(Color::Gray),
            ),
        ]));
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {}/{} ", app.cursor + 1, app.rows.len()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let hints = Paragraph::new(
        " [Up/Down] move  [Left/Right] change action  [Enter] apply selection  [q/Esc] save and quit ",
    )
    .style(Style::default().fg(Color::DarkGray))
    .block(block);
    frame.render_widget(hints, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::review;
    use ratatui::backend::TestBackend;

    #[test]
    fn renders_titles_and_actions() {
        let review = review();
        let mut app = App::new(&review);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|frame| render(frame, &review, &mut app))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("b1"));
        assert!(text.contains("MOVE → Gaming"));
        assert!(text.contains("dead link"));
        assert!(text.contains("Batch 1"));
    }

    #[test]
    fn scroll_follows_cursor() {
        let review = review();
        let mut app = App::new(&review);
        app.cursor = 2;
        // Room for a single row.
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, &review, &mut app))
            .unwrap();
        assert_eq!(app.scroll, 2);
    }
}
