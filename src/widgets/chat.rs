//! Message list: user prompts on the right, assistant replies on the left,
//! charts drawn inline below the reply text. Newest messages sit at the
//! bottom; scrolling moves the window up from there.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{StatefulWidget, Widget},
};

use crate::config::{ColorParser, LayoutConfig, Theme};
use crate::conversation::{ChatMessage, Sender};
use crate::layout::layout_payload;
use crate::scene::{build_scene, ChartPalette, Scene};

use super::scene_canvas::{rows_for, SceneCanvas};

const CHART_INDENT: u16 = 2;
const MIN_CHART_ROWS: u16 = 6;
const MAX_CHART_ROWS: u16 = 20;

/// Scroll position in rows above the bottom of the conversation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatScroll {
    pub offset: usize,
    /// Largest useful offset, updated on render.
    pub max: usize,
}

impl ChatScroll {
    pub fn up(&mut self, rows: usize) {
        self.offset = (self.offset + rows).min(self.max);
    }

    pub fn down(&mut self, rows: usize) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn to_bottom(&mut self) {
        self.offset = 0;
    }
}

enum Piece {
    Text(Line<'static>),
    Chart(Scene, u16),
}

impl Piece {
    fn rows(&self) -> usize {
        match self {
            Piece::Text(_) => 1,
            Piece::Chart(_, rows) => *rows as usize,
        }
    }
}

/// Greedy word wrap on character counts. Long words are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let mut word = word.to_string();
            loop {
                let used = line.chars().count();
                let needed = word.chars().count() + usize::from(used > 0);
                if used + needed <= width {
                    if used > 0 {
                        line.push(' ');
                    }
                    line.push_str(&word);
                    break;
                }
                if used > 0 {
                    out.push(std::mem::take(&mut line));
                    continue;
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                out.push(head);
                if word.is_empty() {
                    break;
                }
            }
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

pub struct ChatView<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    parser: &'a ColorParser,
    layout: &'a LayoutConfig,
    palette: &'a ChartPalette,
}

impl<'a> ChatView<'a> {
    pub fn new(
        messages: &'a [ChatMessage],
        theme: &'a Theme,
        parser: &'a ColorParser,
        layout: &'a LayoutConfig,
        palette: &'a ChartPalette,
    ) -> Self {
        Self {
            messages,
            theme,
            parser,
            layout,
            palette,
        }
    }

    fn pieces(&self, width: u16) -> Vec<Piece> {
        let text_width = (width as usize).saturating_sub(4).max(8);
        let dim = Style::default().fg(self.theme.get("dimmed"));
        let body = Style::default().fg(self.theme.get("text_primary"));
        let mut pieces = Vec::new();

        for msg in self.messages {
            let (name, color, right) = match msg.sender {
                Sender::User => ("You", self.theme.get("user_message"), true),
                Sender::Ai => ("Assistant", self.theme.get("assistant_message"), false),
            };
            let align = |line: Line<'static>| {
                if right {
                    line.right_aligned()
                } else {
                    line
                }
            };

            pieces.push(Piece::Text(align(Line::from(vec![
                Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}", msg.timestamp.format("%H:%M")), dim),
            ]))));

            let response = msg.response.as_ref();
            if let Some(title) = response.and_then(|r| r.title.as_deref()) {
                pieces.push(Piece::Text(Line::styled(
                    title.to_string(),
                    body.add_modifier(Modifier::BOLD),
                )));
            }
            if let Some(desc) = response.and_then(|r| r.description.as_deref()) {
                for l in wrap_text(desc, text_width) {
                    pieces.push(Piece::Text(Line::styled(l, dim)));
                }
            }
            if !msg.text.is_empty() {
                for l in wrap_text(&msg.text, text_width) {
                    pieces.push(Piece::Text(align(Line::styled(l, body))));
                }
            }
            if let Some(layout) = response.and_then(|r| layout_payload(&r.payload, self.layout)) {
                let scene = build_scene(&layout, self.palette, self.layout, None);
                let chart_width = width.saturating_sub(CHART_INDENT);
                let rows = rows_for(&scene, chart_width, MIN_CHART_ROWS, MAX_CHART_ROWS);
                pieces.push(Piece::Chart(scene, rows));
            }
            pieces.push(Piece::Text(Line::default()));
        }
        pieces
    }
}

impl StatefulWidget for ChatView<'_> {
    type State = ChatScroll;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ChatScroll) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let pieces = self.pieces(area.width);
        let total: usize = pieces.iter().map(Piece::rows).sum();
        let height = area.height as usize;
        state.max = total.saturating_sub(height);
        state.offset = state.offset.min(state.max);

        // Window of content rows [first, first + height)
        let first = total.saturating_sub(height + state.offset);
        let text_color = self.theme.get("text_primary");
        let mut row = 0usize;
        for piece in &pieces {
            let rows = piece.rows();
            let (start, end) = (row, row + rows);
            row = end;
            if end <= first || start >= first + height {
                continue;
            }
            match piece {
                Piece::Text(line) => {
                    let y = area.y + (start - first) as u16;
                    let rect = Rect::new(area.x + 1, y, area.width.saturating_sub(2), 1);
                    line.clone().render(rect, buf);
                }
                Piece::Chart(scene, chart_rows) => {
                    let width = area.width.saturating_sub(CHART_INDENT);
                    let scratch_area = Rect::new(0, 0, width, *chart_rows);
                    let mut scratch = Buffer::empty(scratch_area);
                    let mut canvas = SceneCanvas::new(scene, self.parser);
                    if text_color != Color::Reset {
                        canvas = canvas.with_text_color(text_color);
                    }
                    canvas.render(scratch_area, &mut scratch);
                    for r in start.max(first)..end.min(first + height) {
                        let src_y = (r - start) as u16;
                        let dst_y = area.y + (r - first) as u16;
                        for x in 0..width {
                            buf[(area.x + CHART_INDENT + x, dst_y)] = scratch[(x, src_y)].clone();
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn wrap_splits_long_words_and_keeps_newlines() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn scroll_is_clamped() {
        let mut s = ChatScroll { offset: 0, max: 5 };
        s.up(10);
        assert_eq!(s.offset, 5);
        s.down(2);
        assert_eq!(s.offset, 3);
        s.to_bottom();
        assert_eq!(s.offset, 0);
    }
}
