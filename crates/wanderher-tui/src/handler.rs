use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use futures_util::StreamExt;
use ratatui::layout::Rect;
use wanderher_core::{RelayClient, Submission};

use crate::app::{App, WHEEL_STEP};
use crate::tui::{AppEvent, EventSender};

pub fn handle_event(app: &mut App, event: AppEvent, tx: &EventSender) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(id, reply) => app.apply_reply(id, reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => {
            if let Some(submission) = app.submit() {
                spawn_reply(app.relay.clone(), submission, tx.clone());
            }
        }
        KeyCode::PageUp => app.scroll_up(app.page_height()),
        KeyCode::PageDown => app.scroll_down(app.page_height()),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Stream the reply for `submission` in the background, forwarding each
/// event to the UI loop tagged with the placeholder id.
fn spawn_reply(relay: RelayClient, submission: Submission, tx: EventSender) {
    let Submission { reply_id, history } = submission;

    tokio::spawn(async move {
        let replies = relay.reply_stream(history);
        futures_util::pin_mut!(replies);

        while let Some(reply) = replies.next().await {
            if tx.send(AppEvent::Reply(reply_id, reply)).is_err() {
                tracing::debug!("UI closed before the reply finished");
                break;
            }
        }
    });
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_STEP),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use tokio::sync::mpsc;
    use wanderher_core::persona::APOLOGY;
    use wanderher_core::ReplyEvent;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn setup() -> (App, EventSender, mpsc::UnboundedReceiver<AppEvent>) {
        // Nothing listens on the discard port
        let app = App::new(RelayClient::new("http://127.0.0.1:9"));
        let (tx, rx) = mpsc::unbounded_channel();
        (app, tx, rx)
    }

    #[test]
    fn test_typing_edits_input() {
        let (mut app, tx, _rx) = setup();
        for c in "Lisbon".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)), &tx);
        }
        handle_event(&mut app, key(KeyCode::Home), &tx);
        handle_event(&mut app, key(KeyCode::Delete), &tx);
        handle_event(&mut app, key(KeyCode::End), &tx);
        handle_event(&mut app, key(KeyCode::Backspace), &tx);

        assert_eq!(app.input, "isbo");
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, tx, _rx) = setup();
        handle_event(&mut app, key(KeyCode::Esc), &tx);
        assert!(app.should_quit);

        let (mut app, tx, _rx) = setup();
        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        handle_event(&mut app, AppEvent::Key(ctrl_c), &tx);
        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_enter_on_empty_input_sends_nothing() {
        let (mut app, tx, mut rx) = setup();
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        assert_eq!(app.conversation.entries().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enter_streams_reply_into_placeholder() {
        let (mut app, tx, mut rx) = setup();
        for c in "hi".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)), &tx);
        }
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        assert!(app.input.is_empty());
        assert_eq!(app.conversation.entries().len(), 3);
        let placeholder = app.conversation.pending_reply().unwrap();

        // The relay is unreachable, so the task reports a failure
        let event = rx.recv().await.unwrap();
        match &event {
            AppEvent::Reply(id, ReplyEvent::Failed(_)) => assert_eq!(*id, placeholder),
            other => panic!("unexpected event: {:?}", other),
        }

        handle_event(&mut app, event, &tx);
        assert_eq!(app.conversation.get(placeholder).unwrap().content, APOLOGY);
        assert!(!app.conversation.is_loading());
    }

    #[test]
    fn test_wheel_scrolls_only_inside_chat() {
        let (mut app, tx, _rx) = setup();
        app.chat_area = Some(Rect::new(0, 1, 40, 10));
        app.chat_width = 38;
        app.chat_height = 2;
        app.scroll_to_bottom();
        let bottom = app.scroll;
        assert!(bottom >= WHEEL_STEP);

        let wheel = |row| {
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollUp,
                column: 5,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };

        handle_event(&mut app, wheel(20), &tx);
        assert_eq!(app.scroll, bottom);

        handle_event(&mut app, wheel(3), &tx);
        assert_eq!(app.scroll, bottom - WHEEL_STEP);
        assert!(!app.follow);
    }
}
