use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

const CONTROLS: [(&str, &str); 6] = [
    ("Enter", "Send"),
    ("Esc", "Clear"),
    ("PgUp/PgDn", "Scroll"),
    ("^E", "Export"),
    ("^L", "Reset"),
    ("^C", "Quit"),
];

/// Key hints bar along the bottom of the chat screen
pub struct Controls {
    /// Replies still waiting on the simulated latency
    pub pending: usize,
    pub bg: Color,
    pub key_fg: Color,
    pub status_fg: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            pending: 0,
            bg: Color::DarkGray,
            key_fg: Color::Reset,
            status_fg: Color::White,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending(mut self, pending: usize) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_colors(mut self, bg: Color, key_fg: Color, status_fg: Color) -> Self {
        self.bg = bg;
        self.key_fg = key_fg;
        self.status_fg = status_fg;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bar = Style::default().bg(self.bg);

        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            Paragraph::new(*key)
                .style(Style::default().fg(self.key_fg).bold())
                .centered()
                .render(layout[i * 2], buf);
            Paragraph::new(*action).style(bar).render(layout[i * 2 + 1], buf);
        }

        let status = match self.pending {
            0 => String::new(),
            1 => "Assistant is typing... ".to_string(),
            n => format!("{} replies pending ", n),
        };
        Paragraph::new(status)
            .style(bar.fg(self.status_fg))
            .right_aligned()
            .render(layout[CONTROLS.len() * 2], buf);
    }
}
