//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a
//! ratatui Frame, and never mutate state or return effects.

use divvy_core::routing::RouteState;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use unicode_width::UnicodeWidthStr;

use crate::state::{AppState, SignUpField};

/// Spinner frames for in-flight operations.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

fn spinner(app: &AppState) -> &'static str {
    SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()]
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    match app.router.current() {
        RouteState::Undetermined => render_undetermined(app, frame),
        RouteState::SignUp => render_sign_up(app, frame),
        RouteState::WaitingForConfirmation { .. } => render_confirmation(app, frame),
        RouteState::ExpenseList => render_expenses(app, frame),
    }
}

/// Session fate unknown: a neutral frame, deliberately without any screen
/// chrome, so nothing flashes while a stored session restores.
fn render_undetermined(app: &AppState, frame: &mut Frame) {
    let area = centered_line(frame.area());
    let line = Line::from(vec![
        Span::styled(spinner(app), Style::default().fg(Color::Cyan)),
        Span::raw(" restoring session"),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_sign_up(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(3), // email
            Constraint::Length(3), // password
            Constraint::Length(1), // status line
            Constraint::Min(0),
            Constraint::Length(1), // help
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new("divvy — create your account").style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    render_input_field(
        frame,
        chunks[1],
        "Email",
        &app.sign_up.email,
        app.sign_up.focus == SignUpField::Email,
    );
    // The password renders as mask dots; width math still holds, one
    // column per character.
    let masked = "•".repeat(app.sign_up.password.chars().count());
    render_input_field(
        frame,
        chunks[2],
        "Password",
        &masked,
        app.sign_up.focus == SignUpField::Password,
    );

    let status = if app.sign_up.is_loading {
        Line::from(vec![
            Span::styled(spinner(app), Style::default().fg(Color::Cyan)),
            Span::raw(" signing up…"),
        ])
    } else if let Some(error) = &app.sign_up.error {
        Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(notice) = &app.sign_up.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(status), chunks[3]);

    render_help(frame, chunks[5], "tab switch field · enter sign up · esc quit");
}

fn render_input_field(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title.to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(value.to_string()), inner);

    if focused {
        // Place the terminal cursor after the last character.
        let cursor_x = inner.x + value.width() as u16;
        frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

fn render_confirmation(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new("divvy — confirming your account").style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    let status = match &app.confirmation.error {
        Some(error) => Line::from(Span::styled(
            format!("Confirmation failed: {error}"),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(vec![
            Span::styled(spinner(app), Style::default().fg(Color::Cyan)),
            Span::raw(" exchanging confirmation code…"),
        ]),
    };
    frame.render_widget(Paragraph::new(status), chunks[1]);

    render_help(frame, chunks[3], "esc back to sign-up");
}

fn render_expenses(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // status
            Constraint::Min(0),    // table
            Constraint::Length(1), // help
        ])
        .split(area);

    let title = match &app.default_group {
        Some(group) => format!("divvy — expenses · {group}"),
        None => "divvy — expenses".to_string(),
    };
    frame.render_widget(
        Paragraph::new(title).style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    let status = if app.expenses.is_loading {
        Line::from(vec![
            Span::styled(spinner(app), Style::default().fg(Color::Cyan)),
            Span::raw(" loading…"),
        ])
    } else if let Some(error) = &app.expenses.error {
        Line::from(Span::styled(
            format!("Query failed: {error}"),
            Style::default().fg(Color::Red),
        ))
    } else if app.expenses.rows.is_empty() {
        Line::from(Span::styled(
            "No transactions yet.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(format!("{} transactions", app.expenses.rows.len()))
    };
    frame.render_widget(Paragraph::new(status), chunks[1]);

    let header = Row::new(vec!["Date", "Amount", "Memo", "Group"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = app
        .expenses
        .rows
        .iter()
        .map(|tx| {
            Row::new(vec![
                Cell::from(tx.date.to_string()),
                Cell::from(format!("{:>10.2}", tx.amount)),
                Cell::from(tx.memo.clone().unwrap_or_default()),
                Cell::from(tx.group_id.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(20),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .column_spacing(2);
    frame.render_widget(table, chunks[2]);

    render_help(frame, chunks[3], "r reload · q quit");
}

fn render_help(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y, area.width, 1)
}
