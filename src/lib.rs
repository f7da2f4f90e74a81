use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, StatefulWidget};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error_display;
pub mod export;
pub mod layout;
pub mod logging;
pub mod payload;
pub mod scene;
pub mod widgets;

pub use cache::CacheManager;
pub use cli::{Args, ExportFormat};
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};

use classifier::Classifier;
use config::{ExportConfig, LayoutConfig};
use conversation::Conversation;
use payload::ChatResponse;
use scene::{build_scene, ChartPalette, Scene};
use widgets::chat::{ChatScroll, ChatView};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::history::PromptHistory;
use widgets::prompt_input::{PromptEvent, PromptInput};

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "hrviz";

/// Rows moved by PageUp/PageDown
const PAGE_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Submit a prompt to the assistant
    Send(String),
    /// Save the newest chart to the export directory
    Export,
    Reset,
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

/// Lay out `response` and build its scene. `None` for text-only responses.
pub fn scene_for_response(
    response: &ChatResponse,
    cfg: &LayoutConfig,
    palette: &ChartPalette,
) -> Option<Scene> {
    let layout = layout::layout_payload(&response.payload, cfg)?;
    Some(build_scene(&layout, palette, cfg, response.title.as_deref()))
}

/// Render a response straight to a file, as `--query` and `--payload` do.
pub fn render_response_to_file(
    response: &ChatResponse,
    path: &Path,
    format: ExportFormat,
    config: &AppConfig,
) -> Result<()> {
    let palette = ChartPalette::from_config(&config.theme.chart)?;
    let scene = scene_for_response(response, &config.layout, &palette).ok_or_else(|| {
        eyre!(
            "The response is plain text and has no chart to export: {}",
            response.text
        )
    })?;
    export::export_scene(path, &scene, format, config.export.scale)
}

pub struct App {
    conversation: Conversation,
    input: PromptInput,
    scroll: ChatScroll,
    theme: Theme,
    parser: ColorParser,
    layout: LayoutConfig,
    palette: ChartPalette,
    export: ExportConfig,
    welcome_prompts: usize,
    debug: DebugState,
}

impl App {
    pub fn new(
        config: &AppConfig,
        classifier: Box<dyn Classifier>,
        history: PromptHistory,
    ) -> Result<App> {
        let theme = Theme::from_config(&config.theme)?;
        let palette = ChartPalette::from_config(&config.theme.chart)?;
        let delay = Duration::from_millis(config.chat.reply_delay_ms);
        let input = PromptInput::new(history).with_theme(&theme).with_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.get("input_border_active")))
                .title(" Message "),
        );

        Ok(App {
            conversation: Conversation::new(classifier, delay),
            input,
            scroll: ChatScroll::default(),
            theme,
            parser: ColorParser::new(),
            layout: config.layout.clone(),
            palette,
            export: config.export.clone(),
            welcome_prompts: config.chat.welcome_prompts,
            debug: DebugState::default(),
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn input(&self) -> &PromptInput {
        &self.input
    }

    /// Post the welcome message with `seed` choosing the sample prompts.
    pub fn greet(&mut self, seed: u64) {
        self.conversation.greet(self.welcome_prompts, seed);
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Append replies that are due. Returns true when the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        let fired = self.conversation.poll(now);
        if fired.is_empty() {
            return false;
        }
        if let Some(msg) = fired
            .iter()
            .rev()
            .filter_map(|id| self.conversation.message(*id))
            .find(|m| m.has_chart())
        {
            self.debug.last_chart = msg
                .response
                .as_ref()
                .and_then(|r| layout::layout_payload(&r.payload, &self.layout))
                .map(|l| {
                    if l.is_degenerate() {
                        format!("{} (degenerate)", l.name())
                    } else {
                        l.name().to_string()
                    }
                });
        }
        self.scroll.to_bottom();
        true
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.debug.on_key(event);
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('c') if ctrl => Some(AppEvent::Exit),
            KeyCode::Char('e') if ctrl => Some(AppEvent::Export),
            KeyCode::Char('l') if ctrl => Some(AppEvent::Reset),
            KeyCode::Char('q') if event.modifiers.is_empty() && self.input.is_empty() => {
                Some(AppEvent::Exit)
            }
            KeyCode::PageUp => {
                self.scroll.up(PAGE_ROWS);
                None
            }
            KeyCode::PageDown => {
                self.scroll.down(PAGE_ROWS);
                None
            }
            _ => match self.input.handle_key(event) {
                PromptEvent::Submit(prompt) => Some(AppEvent::Send(prompt)),
                PromptEvent::None | PromptEvent::Cleared | PromptEvent::HistoryChanged => None,
            },
        }
    }

    fn export_directory(&self) -> PathBuf {
        match self.export.directory.as_deref() {
            Some(dir) => expand_home(dir),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Export the newest chart. Returns the written path.
    fn export_latest(&self) -> Result<PathBuf> {
        let response = self
            .conversation
            .latest_chart()
            .and_then(|m| m.response.as_ref())
            .ok_or_else(|| eyre!("There is no chart to export yet"))?;
        let scene = scene_for_response(response, &self.layout, &self.palette)
            .ok_or_else(|| eyre!("The latest response has no chart"))?;
        let format = ExportFormat::from_extension(&self.export.format)
            .ok_or_else(|| eyre!("Unknown export format '{}'", self.export.format))?;
        let dir = self.export_directory();
        std::fs::create_dir_all(&dir)?;
        let path = export::unique_export_path(&dir, response.title.as_deref(), format);
        export::export_scene(&path, &scene, format, self.export.scale)?;
        Ok(path)
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Send(prompt) => {
                self.debug.last_action = "send".to_string();
                self.conversation.send(prompt, Instant::now());
                self.scroll.to_bottom();
                None
            }
            AppEvent::Export => {
                self.debug.last_action = "export".to_string();
                match self.export_latest() {
                    Ok(path) => {
                        self.conversation
                            .notify(format!("Chart saved to {}", path.display()));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "export failed");
                        self.conversation
                            .notify(error_display::user_message_from_report(&e, None));
                    }
                }
                self.scroll.to_bottom();
                None
            }
            AppEvent::Reset => {
                self.debug.last_action = "reset".to_string();
                self.conversation.reset();
                self.scroll.to_bottom();
                self.debug.last_chart = None;
                self.greet(rand::random());
                None
            }
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        self.debug.messages = self.conversation.messages().len();
        self.debug.pending = self.conversation.pending_count();

        let background_color = self.color("background");
        Block::default()
            .style(Style::default().bg(background_color))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(3)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // Controls
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        ChatView::new(
            self.conversation.messages(),
            &self.theme,
            &self.parser,
            &self.layout,
            &self.palette,
        )
        .render(layout[0], buf, &mut self.scroll);

        (&self.input).render(layout[1], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[2], buf);
        }

        let controls = Controls::new()
            .with_pending(self.conversation.pending_count())
            .with_colors(
                self.color("controls_bg"),
                self.color("primary"),
                self.color("text_secondary"),
            );
        (&controls).render(layout[layout.len() - 1], buf);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;

    fn app(delay_ms: u64) -> App {
        let mut config = AppConfig::default();
        config.chat.reply_delay_ms = delay_ms;
        let classifier = KeywordClassifier::builtin().unwrap();
        App::new(
            &config,
            Box::new(classifier),
            PromptHistory::in_memory(10),
        )
        .unwrap()
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<AppEvent> {
        app.event(&AppEvent::Key(KeyEvent::new(code, modifiers)))
    }

    #[test]
    fn enter_turns_input_into_send_event() {
        let mut app = app(0);
        for c in "headcount".chars() {
            press(&mut app, KeyCode::Char(c), KeyModifiers::NONE);
        }
        match press(&mut app, KeyCode::Enter, KeyModifiers::NONE) {
            Some(AppEvent::Send(text)) => assert_eq!(text, "headcount"),
            other => panic!("expected Send, got {:?}", other),
        }
    }

    #[test]
    fn reply_arrives_on_tick() {
        let mut app = app(0);
        app.event(&AppEvent::Send("headcount by department".to_string()));
        assert_eq!(app.conversation().pending_count(), 1);
        assert!(app.tick(Instant::now()));
        assert_eq!(app.conversation().pending_count(), 0);
        assert!(app.conversation().latest_chart().is_some());
        assert!(!app.tick(Instant::now()));
    }

    #[test]
    fn q_quits_only_on_empty_input() {
        let mut app = app(0);
        assert!(matches!(
            press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE),
            Some(AppEvent::Exit)
        ));
        press(&mut app, KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE).is_none());
        assert_eq!(app.input().value(), "aq");
        assert!(matches!(
            press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(AppEvent::Exit)
        ));
    }

    #[test]
    fn reset_cancels_pending_replies() {
        let mut app = app(60_000);
        app.event(&AppEvent::Send("leave".to_string()));
        assert_eq!(app.conversation().pending_count(), 1);
        app.event(&AppEvent::Reset);
        assert_eq!(app.conversation().pending_count(), 0);
        // Only the new welcome message remains
        assert_eq!(app.conversation().messages().len(), 1);
    }

    #[test]
    fn export_without_chart_reports_in_conversation() {
        let mut app = app(0);
        app.event(&AppEvent::Export);
        let last = app.conversation().messages().last().unwrap();
        assert!(last.text.contains("no chart"));
    }

    #[test]
    fn renders_without_panicking() {
        let mut app = app(0);
        app.enable_debug();
        app.greet(7);
        app.event(&AppEvent::Send("salary ranges".to_string()));
        app.tick(Instant::now());
        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Assistant"));
        assert!(text.contains("Send"));
    }

    #[test]
    fn render_response_to_file_rejects_text() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_response_to_file(
            &ChatResponse::text("hello"),
            &dir.path().join("out.svg"),
            ExportFormat::Svg,
            &AppConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("plain text"));
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("charts"), PathBuf::from("charts"));
    }
}
