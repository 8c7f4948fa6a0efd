use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Pane};
use crate::models::ProcessStatus;
use crate::tui::InputMode;

pub fn draw(frame: &mut Frame, app: &App) {
    // Main horizontal split: 1/3 left, 2/3 right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3), // Left pane: categories
            Constraint::Ratio(2, 3), // Right pane: entries + detail
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Category list
            Constraint::Length(1), // Key hints
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40), // Entry list
            Constraint::Min(0),         // Selected entry
            Constraint::Length(1),      // Processing status
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_category_list(frame, app, left_chunks[1]);
    render_hints(frame, left_chunks[2]);

    render_entry_list(frame, app, right_chunks[0]);
    render_entry_detail(frame, app, right_chunks[1]);
    render_status(frame, app, right_chunks[2]);

    if app.input_mode != InputMode::Normal {
        render_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn pane_border(app: &App, pane: Pane) -> Style {
    if app.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let llm = if app.llm_ready { "LLM ready" } else { "LLM offline" };
    let stats = format!(" {} Categories | {}", app.categories.len(), llm);

    let block = Block::default()
        .title(" Page Knowledge ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_category_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .categories
        .iter()
        .map(|category| ListItem::new(Line::from(category.name.as_str())))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Categories ")
                .borders(Borders::ALL)
                .border_style(pane_border(app, Pane::Categories)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.categories.is_empty() {
        state.select(Some(app.selected_category));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("j/k:nav  tab:pane  /:search  a:add  ?:help  q:quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_entry_list(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (&app.search_query, app.selected_category()) {
        (Some(query), _) => format!(" Search: {query} "),
        (None, Some(category)) => format!(" {} ", category.name),
        (None, None) => " Content ".to_string(),
    };

    let items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let line = Line::from(vec![
                Span::styled(
                    entry.created_at.format("%Y-%m-%d ").to_string(),
                    Style::default().fg(Color::Blue),
                ),
                Span::styled(entry.title.as_str(), Style::default().fg(Color::White)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(pane_border(app, Pane::Entries)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.entries.is_empty() {
        state.select(Some(app.selected_entry));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_entry_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let Some(entry) = app.selected_entry() else {
        let paragraph = Paragraph::new("Nothing selected. Press 'a' to add a page.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    };

    let categories = app
        .entry_categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let lines = vec![
        Line::from(Span::styled(
            entry.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(entry.url.as_str(), Style::default().fg(Color::Blue))),
        Line::from(Span::styled(categories, Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(entry.summary.as_str()),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.status {
        ProcessStatus::Idle => String::new(),
        ProcessStatus::Processing(url) => format!("⏳ Processing {url} ({} running)", app.in_flight),
        ProcessStatus::Processed(done) => format!("✓ {done}"),
        ProcessStatus::Failed(e) => format!("❌ {e}"),
        ProcessStatus::LlmNotReady => "⚠️  LLM not ready, browsing only".to_string(),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let title = match app.input_mode {
        InputMode::Url => " Add page - Enter URL ",
        _ => " Search titles and summaries ",
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = [
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   Tab      Switch pane",
        "   Enter    Show category content",
        "",
        " Actions:",
        "   a        Add page by URL",
        "   /        Search",
        "   Esc      Clear search",
        "   o        Open in browser",
        "   r        Reload",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
