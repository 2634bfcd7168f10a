use crate::app::App;
use crate::card::{meta_line, truncate_to_width, DeletePhase};
use crate::form::{EntryForm, Field};
use crate::journal_entry::JournalEntry;
use crate::journal_state::ListStatus;
use color_eyre::Result;
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{stdout, Stdout};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Owns the terminal for the lifetime of the app and restores it on drop.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Tui { terminal })
    }

    pub fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|f| render(f, app))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "My Simple Journal",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("[n] New Entry", Style::default().fg(Color::Blue)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    match app.journal().status() {
        ListStatus::Loading => render_loading(f, chunks[1], app),
        ListStatus::Errored(message) => render_error(f, chunks[1], message),
        ListStatus::Ready if app.journal().get_entries().is_empty() => {
            render_empty(f, chunks[1])
        }
        ListStatus::Ready => render_cards(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(form) = app.form() {
        render_form(f, form, spinner(app));
    }
}

fn spinner(app: &App) -> &'static str {
    SPINNER[app.spinner_frame() % SPINNER.len()]
}

fn render_loading(f: &mut Frame, area: Rect, app: &App) {
    let loading = Paragraph::new(format!("{} Loading journal entries...", spinner(app)))
        .style(Style::default().fg(Color::Blue))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let panel = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to retry"),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title("Error"),
    );
    f.render_widget(panel, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let empty = Paragraph::new(vec![
        Line::from(Span::styled(
            "No Journal Entries Found",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press \"n\" to start writing your first thought!"),
    ])
    .style(Style::default().fg(Color::Gray))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(empty, area);
}

fn render_cards(f: &mut Frame, area: Rect, app: &App) {
    // Borders plus the highlight symbol.
    let body_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .journal()
        .get_entries()
        .iter()
        .map(|entry| entry_card(entry, app, body_width))
        .collect();

    let cards = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Entries"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    f.render_stateful_widget(
        cards,
        area,
        &mut ListState::default().with_selected(Some(app.selected())),
    );
}

fn entry_card<'a>(entry: &JournalEntry, app: &App, body_width: usize) -> ListItem<'a> {
    let important = app.journal().is_important(entry.id);
    let star = if important { "★" } else { "☆" };
    let title_style = if important {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let actions = match app.cards().phase(entry.id) {
        DeletePhase::Idle => Line::from(Span::styled(
            "[e] Edit  [d] Delete  [i] Important",
            Style::default().fg(Color::DarkGray),
        )),
        DeletePhase::Confirming => Line::from(vec![
            Span::styled(
                "Are you sure you want to delete this entry? ",
                Style::default().fg(Color::Red),
            ),
            Span::styled("[y] Confirm Delete", Style::default().fg(Color::Red)),
            Span::raw("  [n] Cancel"),
        ]),
        DeletePhase::Deleting => Line::from(Span::styled(
            format!("{} Deleting", spinner(app)),
            Style::default().fg(Color::Red),
        )),
    };

    ListItem::new(vec![
        Line::from(vec![
            Span::styled(format!("{star} "), Style::default().fg(Color::Yellow)),
            Span::styled(entry.title.clone(), title_style),
        ]),
        Line::from(Span::styled(
            meta_line(entry),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(truncate_to_width(&entry.body, body_width)),
        actions,
        Line::from(""),
    ])
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(notice) = app.journal().notice() {
        Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else {
        let mut spans = vec![
            Span::raw("Up/Down: Navigate, "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": new, "),
            Span::styled("e", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": edit, "),
            Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": delete, "),
            Span::styled("i", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": important, "),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": quit"),
        ];
        if let Some(synced) = app.journal().last_synced() {
            spans.push(Span::raw(format!("   Synced {}", synced.format("%H:%M:%S"))));
        }
        Line::from(spans)
    };

    let bar = Paragraph::new(line)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(bar, area);
}

fn render_form(f: &mut Frame, form: &EntryForm, spinner: &str) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .title(form.heading())
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(if form.error().is_some() { 3 } else { 0 }),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(inner);

    if let Some(error) = form.error() {
        let error_box = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        f.render_widget(error_box, chunks[0]);
    }

    let field_block = |label: &'static str, field: Field| {
        let style = if form.focus() == field && !form.is_saving() {
            Style::default().fg(Color::Blue)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(label)
    };

    let title_input = Paragraph::new(form.title.clone()).block(field_block("Title", Field::Title));
    f.render_widget(title_input, chunks[1]);

    let body_input = Paragraph::new(form.body.clone())
        .wrap(Wrap { trim: false })
        .block(field_block("Body", Field::Body));
    f.render_widget(body_input, chunks[2]);

    let footer = if form.is_saving() {
        Line::from(Span::styled(
            format!("{spinner} Saving..."),
            Style::default().fg(Color::Blue),
        ))
    } else {
        let submit_style = if form.can_submit() {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Line::from(vec![
            Span::styled(format!("Ctrl+S: {}", form.submit_label()), submit_style),
            Span::raw("  Tab: Switch field  Esc: Close"),
        ])
    };
    f.render_widget(
        Paragraph::new(footer).alignment(Alignment::Right),
        chunks[3],
    );
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
