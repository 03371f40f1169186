//! TUI Rendering
//!
//! Translates `AppState` into Ratatui widgets and draws to the terminal frame.

use std::rc::Rc;

use aqualabel_core::{NoticeLevel, Stage};
use aqualabel_media::image_dimensions;
use aqualabel_understanding::MineralValue;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::AppState;

/// Main draw loop function.
pub fn draw_ui(f: &mut Frame, state: &AppState) {
    let rows = screen_rows(f.size());

    let body = body_columns(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(body[0]);

    draw_header(f, rows[0], state);
    draw_image(f, left[0], state);
    draw_minerals(f, left[1], state);
    draw_raw_text(f, body[1], state);
    draw_footer(f, rows[2], state);
}

fn screen_rows(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title + stage
            Constraint::Min(8),    // Body
            Constraint::Length(4), // Notice + keys
        ])
        .split(area)
}

fn body_columns(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area)
}

/// Text width inside the bordered model output pane for a given screen size.
pub fn raw_text_width(screen: Rect) -> u16 {
    body_columns(screen_rows(screen)[1])[1].width.saturating_sub(2)
}

/// Rows `text` occupies when word-wrapped to `width` columns.
pub fn wrapped_line_count(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut rows = 0usize;
    for line in text.lines() {
        let mut used = 0usize;
        let mut line_rows = 1usize;
        for word in line.split(' ') {
            let len = word.chars().count();
            let needed = if used == 0 { len } else { used + 1 + len };
            if needed <= width {
                used = needed;
            } else if len <= width {
                line_rows += 1;
                used = len;
            } else {
                // Words longer than the pane are broken across rows.
                line_rows += usize::from(used > 0) + (len - 1) / width;
                used = (len - 1) % width + 1;
            }
        }
        rows += line_rows;
    }
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn stage_badge(stage: Stage) -> Span<'static> {
    let (text, color) = match stage {
        Stage::Idle => (" CAMERA OFF ", Color::DarkGray),
        Stage::Capturing => (" ● LIVE ", Color::Red),
        Stage::Captured => (" CAPTURED ", Color::Blue),
        Stage::Processing => (" PROCESSING... ", Color::Yellow),
        Stage::Done => (" DONE ", Color::Green),
    };
    Span::styled(
        text,
        Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
    )
}

fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let line = Line::from(vec![
        Span::styled("AquaLabel ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        stage_badge(session.stage()),
        Span::raw(format!(
            "  camera: {}  model: {} ({})",
            session.capture_name(),
            session.settings().model,
            session.provider_name()
        )),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_image(f: &mut Frame, area: Rect, state: &AppState) {
    let lines = match state.session.captured_image() {
        Some(image) => {
            let dims = image_dimensions(image.data())
                .map(|(w, h)| format!("{w}x{h}"))
                .unwrap_or_else(|| "unknown size".to_string());
            vec![
                Line::from(format!("{} · {}", image.format(), dims)),
                Line::from(format!("{:.1} KB from {}", image.len() as f64 / 1024.0, image.source())),
                Line::from(format!("taken {}", image.captured_at().format("%H:%M:%S"))),
            ]
        }
        None if state.session.stage() == Stage::Capturing => {
            vec![Line::from("Camera is live."), Line::from("Press c to take the photo.")]
        }
        None => vec![Line::from("No photo yet."), Line::from("Press c to start the camera.")],
    };
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title("Photo").borders(Borders::ALL)),
        area,
    );
}

fn draw_minerals(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let readings = session.readings();
    let lines: Vec<Line> = session
        .labels()
        .rules()
        .iter()
        .map(|rule| {
            let (value, style) = match readings.and_then(|r| r.get(rule.field())) {
                Some(MineralValue::Found(v)) => (format!("{v} mg"), Style::default().fg(Color::Green)),
                Some(MineralValue::NotFound) => (MineralValue::NotFound.to_string(), Style::default().fg(Color::DarkGray)),
                None => ("-".to_string(), Style::default().fg(Color::DarkGray)),
            };
            Line::from(vec![
                Span::styled(format!("{:<12}", rule.label()), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(value, style),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title("Minerals").borders(Borders::ALL)),
        area,
    );
}

fn draw_raw_text(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let text = match session.inference_result() {
        Some(result) => result.text().to_string(),
        None if session.stage() == Stage::Processing => "Processing...".to_string(),
        None => String::new(),
    };
    let title = match session.inference_result() {
        Some(result) => format!("Model output ({} ms)", result.latency_ms()),
        None => "Model output".to_string(),
    };
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((state.raw_scroll, 0))
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(widget, area);
}

fn draw_footer(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let notice = match session.notice() {
        Some(n) => {
            let color = match n.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(Span::styled(n.message.clone(), Style::default().fg(color)))
        }
        None => Line::from(""),
    };

    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);
    let stage = session.stage();
    let capture_label = if stage == Stage::Capturing { "[c] snapshot" } else { "[c] camera" };
    let infer_label = if stage == Stage::Processing { "[i] Processing..." } else { "[i] analyze" };
    let keys = Line::from(vec![
        Span::styled(
            capture_label,
            if matches!(stage, Stage::Idle | Stage::Capturing) { enabled } else { disabled },
        ),
        Span::raw("  "),
        Span::styled("[r] retake", if stage.can_retake() { enabled } else { disabled }),
        Span::raw("  "),
        Span::styled(infer_label, if stage == Stage::Captured { enabled } else { disabled }),
        Span::raw("  "),
        Span::styled("[↑/↓] scroll  [q] quit", enabled),
    ]);

    f.render_widget(
        Paragraph::new(vec![notice, keys]).block(Block::default().borders(Borders::TOP)),
        area,
    );
}
