use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, ChatScreen, InputMode, Screen, UploadScreen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply a line-editing key to an input box. Returns false if the key is not an edit.
fn edit_line(input: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            *cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

fn insert_text(input: &mut String, cursor: &mut usize, text: &str) {
    // Single-line inputs: pasted newlines become spaces
    let cleaned: String = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
    let byte_pos = char_to_byte_index(input, *cursor);
    input.insert_str(byte_pos, &cleaned);
    *cursor += cleaned.chars().count();
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    let (on_chat, mode) = match &app.screen {
        Screen::Upload(upload) => (false, upload.input_mode),
        Screen::Chat(chat) => (true, chat.input_mode),
    };

    match (on_chat, mode) {
        (false, InputMode::Normal) => handle_upload_normal(app, key),
        (false, InputMode::Editing) => handle_upload_editing(app, key),
        (true, InputMode::Normal) => handle_chat_normal(app, key),
        (true, InputMode::Editing) => handle_chat_editing(app, key),
    }
}

fn upload_screen(app: &mut App) -> Option<&mut UploadScreen> {
    match &mut app.screen {
        Screen::Upload(upload) => Some(upload),
        Screen::Chat(_) => None,
    }
}

fn chat_screen(app: &mut App) -> Option<&mut ChatScreen> {
    match &mut app.screen {
        Screen::Chat(chat) => Some(chat),
        Screen::Upload(_) => None,
    }
}

fn handle_upload_normal(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('q') {
        app.should_quit = true;
        return;
    }

    let Some(upload) = upload_screen(app) else {
        return;
    };
    // Inputs are disabled while the upload is in flight
    if upload.form.is_uploading() {
        return;
    }

    match key.code {
        KeyCode::Char('i') | KeyCode::Char('o') | KeyCode::Char('/') | KeyCode::Enter => {
            upload.input_mode = InputMode::Editing;
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            upload.form.remove();
        }
        KeyCode::Char('r') => app.retry_upload(),
        _ => {}
    }
}

fn handle_upload_editing(app: &mut App, key: KeyEvent) {
    let Some(upload) = upload_screen(app) else {
        return;
    };
    if upload.form.is_uploading() {
        if key.code == KeyCode::Esc {
            upload.input_mode = InputMode::Normal;
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            upload.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit_path(),
        _ => {
            edit_line(&mut upload.path_input, &mut upload.path_cursor, key);
        }
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('b') => app.back_to_upload(),
        _ => {
            let Some(chat) = chat_screen(app) else {
                return;
            };
            match key.code {
                KeyCode::Char('i') | KeyCode::Enter => chat.input_mode = InputMode::Editing,
                KeyCode::Char('c') => {
                    chat.clear();
                }
                KeyCode::Char('j') | KeyCode::Down => chat.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => chat.scroll_up(),
                KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    chat.scroll_page_down();
                }
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    chat.scroll_page_up();
                }
                KeyCode::PageDown => chat.scroll_page_down(),
                KeyCode::PageUp => chat.scroll_page_up(),
                KeyCode::Char('G') => chat.scroll_to_bottom(),
                KeyCode::Char('g') => chat.scroll_to_top(),
                _ => {}
            }
        }
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    let api = app.api.clone();
    let Some(chat) = chat_screen(app) else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            chat.input_mode = InputMode::Normal;
        }
        KeyCode::PageDown => chat.scroll_page_down(),
        KeyCode::PageUp => chat.scroll_page_up(),
        // The input is disabled while an answer is pending
        _ if chat.transcript.is_awaiting() => {}
        KeyCode::Enter => {
            chat.submit(&api);
        }
        _ => {
            edit_line(&mut chat.input, &mut chat.cursor, key);
        }
    }
}

fn handle_paste(app: &mut App, text: &str) {
    match &mut app.screen {
        // A file dropped onto the terminal arrives as its pasted path
        Screen::Upload(upload) => {
            if upload.form.is_uploading() {
                return;
            }
            if upload.input_mode == InputMode::Editing && !upload.path_input.is_empty() {
                insert_text(&mut upload.path_input, &mut upload.path_cursor, text);
            } else {
                app.drop_path(text);
            }
        }
        Screen::Chat(chat) => {
            if chat.input_mode == InputMode::Editing && !chat.transcript.is_awaiting() {
                insert_text(&mut chat.input, &mut chat.cursor, text);
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match &mut app.screen {
        Screen::Upload(upload) => {
            let inside = upload
                .drop_area
                .is_some_and(|area| point_in_rect(mouse.column, mouse.row, area));

            match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    if inside {
                        upload.form.drag_enter();
                    } else {
                        upload.form.drag_leave();
                    }
                }
                // Clicking the drop zone opens the path input, like a file picker
                MouseEventKind::Down(MouseButton::Left) if inside && !upload.form.is_uploading() => {
                    upload.input_mode = InputMode::Editing;
                }
                _ => {}
            }
        }
        Screen::Chat(chat) => match mouse.kind {
            MouseEventKind::ScrollDown => chat.scroll_down(),
            MouseEventKind::ScrollUp => chat.scroll_up(),
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use docqa_core::ApiClient;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, AppEvent::Key(key(KeyCode::Char(c))));
        }
    }

    #[test]
    fn test_edit_line_is_utf8_safe() {
        let mut input = String::new();
        let mut cursor = 0;
        for c in "héllo".chars() {
            edit_line(&mut input, &mut cursor, key(KeyCode::Char(c)));
        }
        edit_line(&mut input, &mut cursor, key(KeyCode::Left));
        edit_line(&mut input, &mut cursor, key(KeyCode::Left));
        edit_line(&mut input, &mut cursor, key(KeyCode::Left));
        edit_line(&mut input, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(input, "hllo");
        assert_eq!(cursor, 1);
    }

    #[tokio::test]
    async fn test_typed_non_pdf_path_shows_error() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:1"));
        type_text(&mut app, "/tmp/picture.png");
        handle_event(&mut app, AppEvent::Key(key(KeyCode::Enter)));

        let Screen::Upload(upload) = &app.screen else {
            panic!("expected upload screen");
        };
        assert!(upload.form.display_error().is_some());
        assert!(app.upload_task.is_none());
    }

    #[tokio::test]
    async fn test_mouse_over_drop_zone_highlights() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:1"));
        if let Screen::Upload(upload) = &mut app.screen {
            upload.drop_area = Some(Rect::new(10, 5, 20, 6));
        }

        let moved = |column, row| MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        handle_event(&mut app, AppEvent::Mouse(moved(12, 6)));
        let Screen::Upload(upload) = &app.screen else {
            panic!("expected upload screen");
        };
        assert!(upload.form.is_drag_over());

        handle_event(&mut app, AppEvent::Mouse(moved(0, 0)));
        let Screen::Upload(upload) = &app.screen else {
            panic!("expected upload screen");
        };
        assert!(!upload.form.is_drag_over());
        assert!(upload.form.selected().is_none());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:1"));
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            }),
        );
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_only_b_leaves_chat() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:1"));
        app.screen = Screen::Chat(ChatScreen::new(crate::app::Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_value(serde_json::json!({
                "id": "doc-1",
                "filename": "a.pdf",
                "contentType": "application/pdf",
                "size": 64,
                "totalChunks": 1,
                "createdAt": "2024-05-01T10:00:00"
            }))
            .unwrap(),
        }));
        handle_event(&mut app, AppEvent::Key(key(KeyCode::Esc)));

        handle_event(&mut app, AppEvent::Key(key(KeyCode::Backspace)));
        assert!(matches!(app.screen, Screen::Chat(_)));

        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('b'))));
        assert!(matches!(app.screen, Screen::Upload(_)));
    }
}
