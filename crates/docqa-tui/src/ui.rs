use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use docqa_core::{ChatMessage, ChatRole, MAX_UPLOAD_BYTES};
use crate::app::{App, ChatScreen, InputMode, Screen, UploadScreen};

const SPINNER: [&str; 3] = ["◐", "◓", "◑"];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("**") else {
            break;
        };
        if end == 0 {
            break;
        }

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after_open[..end].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[end + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let frame_idx = app.animation_frame as usize % SPINNER.len();
    match &mut app.screen {
        Screen::Upload(upload) => render_upload_screen(upload, frame_idx, frame, body_area),
        Screen::Chat(chat) => render_chat_screen(chat, frame_idx, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let document = match &app.screen {
        Screen::Chat(chat) => format!(" {} ", chat.document_name),
        Screen::Upload(_) => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Document Q&A ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("| {} ", app.screen_title()), Style::default().fg(Color::White)),
        Span::styled(document, Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, input_mode) = match &app.screen {
        Screen::Upload(upload) => (" UPLOAD ", upload.input_mode),
        Screen::Chat(chat) => (" CHAT ", chat.input_mode),
    };
    let mode_style = match input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |k: &'static str, label: &'static str| {
        [Span::styled(k, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    match &app.screen {
        Screen::Upload(upload) if upload.form.is_uploading() => {
            hints.extend(hint(" Ctrl+C ", " quit "));
        }
        Screen::Upload(upload) => match upload.input_mode {
            InputMode::Editing => {
                hints.extend(hint(" Enter ", " upload "));
                hints.extend(hint(" Esc ", " done "));
            }
            InputMode::Normal => {
                hints.extend(hint(" i ", " type path "));
                if upload.form.selected().is_some() {
                    hints.extend(hint(" d ", " remove "));
                    hints.extend(hint(" r ", " retry "));
                }
                hints.extend(hint(" q ", " quit "));
            }
        },
        Screen::Chat(chat) => match chat.input_mode {
            InputMode::Editing => {
                hints.extend(hint(" Enter ", " send "));
                hints.extend(hint(" PgUp/PgDn ", " scroll "));
                hints.extend(hint(" Esc ", " done "));
            }
            InputMode::Normal => {
                hints.extend(hint(" j/k ", " scroll "));
                hints.extend(hint(" i ", " ask "));
                hints.extend(hint(" c ", " clear "));
                hints.extend(hint(" b ", " back to upload "));
                hints.extend(hint(" q ", " quit "));
            }
        },
    }

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_upload_screen(upload: &mut UploadScreen, frame_idx: usize, frame: &mut Frame, area: Rect) {
    let [_, column, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Max(72),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [intro_area, drop_area, message_area, input_area, _] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(8),
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(column);

    // Store drop zone for mouse hit-testing
    upload.drop_area = Some(drop_area);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled("Upload PDF Document", Style::default().bold())),
        Line::from(Span::styled(
            "Drag and drop your PDF file here or type its path",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(intro, intro_area);

    let form = &upload.form;
    let border_color = if form.is_uploading() {
        Color::Yellow
    } else if form.is_drag_over() {
        Color::Cyan
    } else if form.selected().is_some() {
        Color::Green
    } else {
        Color::DarkGray
    };

    let drop_block = Block::default()
        .borders(Borders::ALL)
        .border_type(if form.is_drag_over() { BorderType::Thick } else { BorderType::Rounded })
        .border_style(Style::default().fg(border_color));

    let drop_text = if form.is_uploading() {
        vec![
            Line::default(),
            Line::from(Span::styled(SPINNER[frame_idx], Style::default().fg(Color::Yellow))),
            Line::from("Processing document..."),
            Line::from(Span::styled(
                "This may take a few moments",
                Style::default().fg(Color::Gray),
            )),
        ]
    } else if let Some(file) = form.selected() {
        vec![
            Line::default(),
            Line::from(Span::styled(file.name.clone(), Style::default().bold())),
            Line::from(Span::styled(file.human_size(), Style::default().fg(Color::Gray))),
            Line::from(Span::styled("d to remove", Style::default().fg(Color::DarkGray))),
        ]
    } else {
        vec![
            Line::default(),
            Line::from(Span::styled("⇩", Style::default().fg(Color::Cyan))),
            Line::from("Click to type a path or drag a PDF here"),
            Line::from(Span::styled(
                format!("Maximum file size: {}MB", MAX_UPLOAD_BYTES / 1024 / 1024),
                Style::default().fg(Color::Gray),
            )),
        ]
    };

    let drop_zone = Paragraph::new(drop_text)
        .block(drop_block)
        .alignment(Alignment::Center);
    frame.render_widget(drop_zone, drop_area);

    let message = if let Some(error) = form.display_error() {
        Some(Line::from(Span::styled(
            format!("✗ {}", error),
            Style::default().fg(Color::Red),
        )))
    } else if form.selected().is_some() && !form.is_uploading() {
        Some(Line::from(Span::styled(
            "✓ File selected successfully!",
            Style::default().fg(Color::Green),
        )))
    } else {
        None
    };
    if let Some(message) = message {
        frame.render_widget(
            Paragraph::new(message).wrap(Wrap { trim: true }).alignment(Alignment::Center),
            message_area,
        );
    }

    let editing = upload.input_mode == InputMode::Editing && !form.is_uploading();
    render_input(
        frame,
        input_area,
        " File path ",
        &upload.path_input,
        upload.path_cursor,
        "/path/to/document.pdf",
        editing,
        form.is_uploading(),
    );
}

fn render_chat_screen(chat: &mut ChatScreen, frame_idx: usize, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " {} · {} chunks ",
            chat.document_name, chat.document.total_chunks
        ));
    let inner = chat_block.inner(chat_area);
    frame.render_widget(chat_block, chat_area);

    let mut lines: Vec<Line> = Vec::new();
    for msg in chat.transcript.messages() {
        lines.extend(message_lines(msg, frame_idx));
    }

    let transcript = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    // Scroll against the word-wrapped height, not the logical line count
    let wrapped = u16::try_from(transcript.line_count(inner.width)).unwrap_or(u16::MAX);
    chat.set_viewport(wrapped, inner.height);
    frame.render_widget(transcript.scroll((chat.scroll, 0)), inner);

    let awaiting = chat.transcript.is_awaiting();
    let editing = chat.input_mode == InputMode::Editing && !awaiting;
    let placeholder = if awaiting {
        "Waiting for response..."
    } else {
        "Ask a question about your document..."
    };
    render_input(
        frame,
        input_area,
        " Question ",
        &chat.input,
        chat.cursor,
        placeholder,
        editing,
        awaiting,
    );
}

fn message_lines(msg: &ChatMessage, frame_idx: usize) -> Vec<Line<'static>> {
    let time = msg.timestamp.format("%H:%M").to_string();
    let (author, color) = match msg.role {
        ChatRole::User => ("You", Color::Cyan),
        ChatRole::Assistant => ("AI", Color::Yellow),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(author, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray)),
    ])];

    if msg.pending {
        // Typing indicator: cycles through ".", "..", "..."
        let dots = ".".repeat(frame_idx + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    match msg.role {
        ChatRole::User => {
            lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
        }
        ChatRole::Assistant => {
            lines.extend(msg.content.lines().map(parse_markdown_line));
        }
    }
    lines.push(Line::default());
    lines
}

#[allow(clippy::too_many_arguments)]
fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    cursor: usize,
    placeholder: &str,
    editing: bool,
    disabled: bool,
) {
    let border_color = if disabled {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let text = if value.is_empty() || disabled {
        Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value.to_string())
    };

    frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);

    if editing {
        let max_x = area.x + area.width.saturating_sub(2);
        let x = (area.x + 1 + cursor as u16).min(max_x);
        frame.set_cursor_position((x, area.y + 1));
    }
}
