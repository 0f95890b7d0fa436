use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tably_core::{ConversationPhase, PresentationKind};
use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::LoaderTick => app.tick_loader(),
        AppEvent::Outcome(outcome) => app.on_outcome(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any phase
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(2) / 2);
            return;
        }
        _ => {}
    }

    match app.phase() {
        ConversationPhase::Idle => handle_input_editing(app, key),
        ConversationPhase::AwaitingFormat => handle_format_picker(app, key),
        // Controls are hidden while a request is in flight
        ConversationPhase::Busy => {}
    }
}

fn handle_input_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_format_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.abandon_format(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.format_prev(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.format_next(),
        KeyCode::Enter | KeyCode::Char(' ') => app.choose_highlighted_format(),
        KeyCode::Char(c @ '1'..='6') => {
            let index = (c as usize) - ('1' as usize);
            if let Some(kind) = PresentationKind::ALL.get(index).copied() {
                app.format_cursor = index;
                app.choose_format(kind);
            }
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tably_core::{AnalysisClient, AnalyzeResponse, Outcome};
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(AnalysisClient::new("http://127.0.0.1:1"), tx, Duration::from_millis(600))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn await_format(app: &mut App, query: &str) {
        type_text(app, query);
        press(app, KeyCode::Enter);
        let request = app.conversation.in_flight().unwrap();
        app.on_outcome(Outcome::Analyzed {
            request,
            result: Ok(AnalyzeResponse::new("Sure", true)),
        });
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_editing_keys() {
        let mut app = test_app();
        type_text(&mut app, "tacos");
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Left);
        type_text(&mut app, "é");

        assert_eq!(app.input, "acéo");
        assert_eq!(app.input_cursor, 3);
    }

    #[tokio::test]
    async fn test_enter_on_blank_input_does_nothing() {
        let mut app = test_app();
        press(&mut app, KeyCode::Enter);
        assert!(app.conversation.log().is_empty());
        assert_eq!(app.phase(), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_typing_ignored_while_busy() {
        let mut app = test_app();
        type_text(&mut app, "sales");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), ConversationPhase::Busy);

        type_text(&mut app, "more");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('3'));

        assert!(app.input.is_empty());
        assert_eq!(app.conversation.log().len(), 1);
    }

    #[tokio::test]
    async fn test_number_key_picks_format() {
        let mut app = test_app();
        await_format(&mut app, "revenue by day");

        press(&mut app, KeyCode::Char('5'));

        assert_eq!(app.phase(), ConversationPhase::Busy);
        assert_eq!(app.format_cursor, 4);
        let echo = app.conversation.log().entries()[2].as_text().unwrap();
        assert_eq!(echo.content, "Format Selected: Table");
    }

    #[tokio::test]
    async fn test_arrow_and_enter_pick_format() {
        let mut app = test_app();
        await_format(&mut app, "revenue by day");

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        let echo = app.conversation.log().entries()[2].as_text().unwrap();
        assert_eq!(echo.content, "Format Selected: Line");
    }

    #[tokio::test]
    async fn test_escape_abandons_pending_query() {
        let mut app = test_app();
        await_format(&mut app, "revenue by day");

        press(&mut app, KeyCode::Esc);

        assert_eq!(app.phase(), ConversationPhase::Idle);
        assert!(app.conversation.pending_query().is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_in_any_phase() {
        let mut app = test_app();
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
