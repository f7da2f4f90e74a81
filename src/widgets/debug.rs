use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "send", "export") for debugging key handling.
    pub last_action: String,
    pub messages: usize,
    pub pending: usize,
    /// Kind and degenerate flag of the newest chart, e.g. "pie" or "bar (degenerate)".
    pub last_chart: Option<String>,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chart = self.last_chart.as_deref().unwrap_or("-");
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_action={} frames={} messages={} pending={} chart={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            self.messages,
            self.pending,
            chart
        ))
        .render(area, buf);
    }
}
