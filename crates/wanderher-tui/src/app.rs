use ratatui::layout::Rect;
use wanderher_core::{Conversation, MessageId, Phase, RelayClient, ReplyEvent, SubmitError, Submission};

/// Lines the chat pane moves per mouse wheel notch
pub const WHEEL_STEP: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Rows `text` occupies when wrapped at `width` columns.
fn wrapped_height(text: &str, width: usize) -> usize {
    text.lines()
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum()
}

pub struct App {
    pub should_quit: bool,
    pub conversation: Conversation,
    pub relay: RelayClient,

    // Input box
    pub input: String,
    pub cursor: usize, // in chars, not bytes
    pub notice: Option<String>,

    // Chat pane
    pub scroll: u16,
    /// Keep the newest content in view; cleared when the user scrolls up
    pub follow: bool,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(relay: RelayClient) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),
            relay,
            input: String::new(),
            cursor: 0,
            notice: None,
            scroll: 0,
            follow: true,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
        }
    }

    /// Hand the input box to the conversation.
    ///
    /// The box is cleared only when the turn is accepted.
    pub fn submit(&mut self) -> Option<Submission> {
        match self.conversation.submit(&self.input) {
            Ok(submission) => {
                self.input.clear();
                self.cursor = 0;
                self.notice = None;
                self.animation_frame = 0;
                self.follow = true;
                self.scroll_to_bottom();
                Some(submission)
            }
            Err(SubmitError::Empty) => None,
            Err(e @ SubmitError::Busy) => {
                self.notice = Some(e.to_string());
                None
            }
        }
    }

    pub fn apply_reply(&mut self, id: MessageId, event: ReplyEvent) {
        self.conversation.apply(id, event);
        if !self.conversation.is_loading() {
            self.notice = None;
        }
        if self.follow {
            self.scroll_to_bottom();
        }
    }

    /// Whether the placeholder is still waiting for its first fragment
    pub fn is_thinking(&self) -> bool {
        self.conversation.phase() == Phase::Sending
    }

    pub fn tick_animation(&mut self) {
        if self.is_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
        self.notice = None;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Chat scrolling

    /// Rows the chat history needs at the current pane width, capped at
    /// `u16::MAX` (the widest scroll offset ratatui takes).
    ///
    /// Mirrors the layout in `ui::render_chat`: a label row, the content (or
    /// the thinking indicator), then a blank row per message.
    pub fn chat_line_count(&self) -> u16 {
        let width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };
        let pending = self.conversation.pending_reply();

        let rows: usize = self
            .conversation
            .entries()
            .iter()
            .map(|entry| {
                let body = if entry.message.content.is_empty() && pending == Some(entry.id) {
                    1
                } else {
                    wrapped_height(&entry.message.content, width)
                };
                body + 2
            })
            .sum();

        rows.min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_line_count().saturating_sub(visible)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = self.scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow = self.scroll >= max;
    }

    pub fn page_height(&self) -> u16 {
        self.chat_height.saturating_sub(1).max(1)
    }
}
