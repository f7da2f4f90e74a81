use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

use super::history::PromptHistory;

/// Event emitted by [`PromptInput`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    None,
    /// Enter on a non-blank prompt; carries the trimmed text.
    Submit(String),
    /// Esc cleared the line.
    Cleared,
    HistoryChanged,
}

const PLACEHOLDER: &str = "Ask about headcount, leave, salaries, hiring...";

/// Single-line prompt editor wrapping tui-textarea, with prompt history
pub struct PromptInput {
    textarea: TextArea<'static>,
    history: PromptHistory,
    text_style: Style,
    cursor_color: Color,
    focused: bool,
}

impl PromptInput {
    pub fn new(history: PromptHistory) -> Self {
        let mut input = Self {
            textarea: TextArea::default(),
            history,
            text_style: Style::default(),
            cursor_color: Color::Reset,
            focused: true,
        };
        input.reset_textarea(String::new());
        input
    }

    /// Colors from theme: text_primary for text, cursor_focused for the cursor
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_style = Style::default().fg(theme.get("text_primary"));
        self.cursor_color = theme.get("cursor_focused");
        let value = self.value();
        self.reset_textarea(value);
        self
    }

    pub fn with_block(mut self, block: Block<'static>) -> Self {
        self.textarea.set_block(block);
        self
    }

    pub fn set_block(&mut self, block: Block<'static>) {
        self.textarea.set_block(block);
    }

    fn reset_textarea(&mut self, value: String) {
        let block = self.textarea.block().cloned();
        let single_line = value.replace(['\n', '\r'], " ");
        let cursor = single_line.chars().count();
        self.textarea = TextArea::new(vec![single_line]);
        if let Some(block) = block {
            self.textarea.set_block(block);
        }
        self.textarea.set_style(self.text_style);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_placeholder_text(PLACEHOLDER);
        self.textarea
            .set_placeholder_style(Style::default().fg(Color::DarkGray));
        self.textarea
            .move_cursor(CursorMove::Jump(0, cursor.min(u16::MAX as usize) as u16));
        self.apply_cursor_style();
    }

    fn apply_cursor_style(&mut self) {
        let style = if !self.focused {
            // Same as the text style hides the cursor
            self.text_style
        } else if self.cursor_color == Color::Reset {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            let fg = match self.cursor_color {
                Color::Black | Color::Red | Color::Blue | Color::Magenta | Color::DarkGray => {
                    Color::White
                }
                _ => Color::Black,
            };
            Style::default().bg(self.cursor_color).fg(fg)
        };
        self.textarea.set_cursor_style(style);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_cursor_style();
    }

    pub fn value(&self) -> String {
        self.textarea.lines().first().cloned().unwrap_or_default()
    }

    pub fn set_value(&mut self, value: String) {
        self.reset_textarea(value);
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    pub fn clear(&mut self) {
        self.history.reset_navigation();
        self.reset_textarea(String::new());
    }

    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> PromptEvent {
        match event.code {
            KeyCode::Enter => {
                let prompt = self.value().trim().to_string();
                if prompt.is_empty() {
                    return PromptEvent::None;
                }
                self.history.record(&prompt);
                self.clear();
                PromptEvent::Submit(prompt)
            }
            KeyCode::Esc => {
                self.clear();
                PromptEvent::Cleared
            }
            KeyCode::Up => {
                if let Some(entry) = self.history.older(&self.value()) {
                    self.reset_textarea(entry);
                }
                PromptEvent::HistoryChanged
            }
            KeyCode::Down => {
                if let Some(entry) = self.history.newer() {
                    self.reset_textarea(entry);
                }
                PromptEvent::HistoryChanged
            }
            _ => {
                let input = key_event_to_input(event);
                if input.key != Key::Null {
                    self.textarea.input(input);
                    self.history.reset_navigation();
                }
                PromptEvent::None
            }
        }
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        _ => Key::Null,
    };

    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Widget for &PromptInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut PromptInput, text: &str) {
        for c in text.chars() {
            input.handle_key(&key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_trimmed_prompt_and_clears() {
        let mut input = PromptInput::new(PromptHistory::in_memory(10));
        type_text(&mut input, " headcount ");
        assert_eq!(
            input.handle_key(&key(KeyCode::Enter)),
            PromptEvent::Submit("headcount".to_string())
        );
        assert!(input.is_empty());
        assert_eq!(input.history().entries(), ["headcount"]);
    }

    #[test]
    fn blank_enter_does_nothing() {
        let mut input = PromptInput::new(PromptHistory::in_memory(10));
        type_text(&mut input, "   ");
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), PromptEvent::None);
    }

    #[test]
    fn up_recalls_previous_prompt() {
        let mut input = PromptInput::new(PromptHistory::in_memory(10));
        type_text(&mut input, "salary");
        input.handle_key(&key(KeyCode::Enter));
        input.handle_key(&key(KeyCode::Up));
        assert_eq!(input.value(), "salary");
        input.handle_key(&key(KeyCode::Down));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn esc_clears() {
        let mut input = PromptInput::new(PromptHistory::in_memory(10));
        type_text(&mut input, "abc");
        assert_eq!(input.handle_key(&key(KeyCode::Esc)), PromptEvent::Cleared);
        assert!(input.is_empty());
    }
}
