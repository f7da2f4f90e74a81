use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::scene::{ChartPalette, Rgba};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub chat: ChatConfig,
    pub layout: LayoutConfig,
    pub export: ExportConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Simulated assistant latency before a reply is appended
    pub reply_delay_ms: u64,
    /// Number of sample prompts shown in the welcome message
    pub welcome_prompts: usize,
    /// Optional JSON catalog replacing the built-in canned responses
    pub catalog_path: Option<String>,
    pub history_limit: usize,
}

/// Geometry constants for the layout engine. All lengths are in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub chart_width: f64,
    /// Height of the bar and line track
    pub track_height: f64,
    pub pie_radius: f64,
    pub row_height: f64,
    pub label_width: f64,
    /// Approximate width of one label character
    pub char_width: f64,
    pub gantt_track_width: f64,
    /// Width of the longest task, as a percentage of the gantt track
    pub gantt_max_pct: f64,
    pub gantt_min_width: f64,
    pub waterfall_track_width: f64,
    /// Rows whose label contains this text are drawn as totals
    pub waterfall_total_marker: String,
    /// Share of the global max above which heatmap text turns light
    pub heatmap_text_threshold: f64,
    pub heatmap_cell_width: f64,
    pub treemap_container_width: f64,
    /// Pixels per percentage point of budget
    pub treemap_scale: f64,
    pub treemap_min_size: f64,
    pub treemap_gap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// "svg" or "png"
    pub format: String,
    /// Directory for charts exported from the chat screen (default: current directory)
    pub directory: Option<String>,
    /// Pixel multiplier applied to PNG output
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
    pub chart: ChartColorConfig,
}

/// Terminal colors for the chat screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub user_message: String,
    pub assistant_message: String,
    pub input_border: String,
    pub input_border_active: String,
    pub cursor_focused: String,
}

/// Hex colors used when drawing chart scenes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartColorConfig {
    pub series: Vec<String>,
    pub positive: String,
    pub negative: String,
    pub neutral: String,
    pub heatmap_base: String,
    pub text_light: String,
    pub text_dark: String,
    pub grid: String,
    pub background: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Write a log file to the cache directory even without --debug
    pub log_to_file: bool,
    /// Log filter, e.g. "info" or "hrviz=debug"
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            chat: ChatConfig::default(),
            layout: LayoutConfig::default(),
            export: ExportConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            welcome_prompts: 3,
            catalog_path: None,
            history_limit: 1000,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            chart_width: 480.0,
            track_height: 150.0,
            pie_radius: 80.0,
            row_height: 24.0,
            label_width: 120.0,
            char_width: 7.0,
            gantt_track_width: 400.0,
            gantt_max_pct: 60.0,
            gantt_min_width: 20.0,
            waterfall_track_width: 150.0,
            waterfall_total_marker: "Headcount".to_string(),
            heatmap_text_threshold: 0.7,
            heatmap_cell_width: 56.0,
            treemap_container_width: 480.0,
            treemap_scale: 6.0,
            treemap_min_size: 36.0,
            treemap_gap: 4.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "svg".to_string(),
            directory: None,
            scale: 1.0,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
            chart: ChartColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            user_message: "cyan".to_string(),
            assistant_message: "green".to_string(),
            input_border: "cyan".to_string(),
            input_border_active: "yellow".to_string(),
            cursor_focused: "reset".to_string(),
        }
    }
}

impl Default for ChartColorConfig {
    fn default() -> Self {
        Self {
            series: [
                "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899",
                "#84cc16",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            positive: "#22c55e".to_string(),
            negative: "#ef4444".to_string(),
            neutral: "#64748b".to_string(),
            heatmap_base: "#2563eb".to_string(),
            text_light: "#ffffff".to_string(),
            text_dark: "#1f2937".to_string(),
            grid: "#e5e7eb".to_string(),
            background: "#ffffff".to_string(),
            label: "#374151".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_to_file: false,
            log_level: "info".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    /// Load configuration using the config.toml managed by `manager`
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();

        if let Some(user_config) = Self::load_user_config(manager)? {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    fn load_user_config(manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.chat.merge(other.chat);
        self.layout.merge(other.layout);
        self.export.merge(other.export);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        match self.export.format.as_str() {
            "svg" | "png" => {}
            other => {
                return Err(eyre!(
                    "Invalid export format: {}. Must be 'svg' or 'png'",
                    other
                ))
            }
        }

        self.layout.validate()?;

        if !(self.export.scale > 0.0 && self.export.scale <= 8.0) {
            return Err(eyre!("export.scale must be in (0, 8]"));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;
        ChartPalette::from_config(&self.theme.chart)?;

        Ok(())
    }
}

/// Overwrite each listed field of `$self` with `$other`'s value when it differs from the default.
macro_rules! merge_changed {
    ($self:ident, $other:ident, $default:ident, [$($field:ident),+ $(,)?]) => {
        $(
            if $other.$field != $default.$field {
                $self.$field = $other.$field;
            }
        )+
    };
}

impl ChatConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChatConfig::default();
        merge_changed!(self, other, default, [reply_delay_ms, welcome_prompts, history_limit]);
        if other.catalog_path.is_some() {
            self.catalog_path = other.catalog_path;
        }
    }
}

impl LayoutConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LayoutConfig::default();
        merge_changed!(
            self,
            other,
            default,
            [
                chart_width,
                track_height,
                pie_radius,
                row_height,
                label_width,
                char_width,
                gantt_track_width,
                gantt_max_pct,
                gantt_min_width,
                waterfall_track_width,
                waterfall_total_marker,
                heatmap_text_threshold,
                heatmap_cell_width,
                treemap_container_width,
                treemap_scale,
                treemap_min_size,
                treemap_gap,
            ]
        );
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("chart_width", self.chart_width),
            ("track_height", self.track_height),
            ("pie_radius", self.pie_radius),
            ("row_height", self.row_height),
            ("char_width", self.char_width),
            ("gantt_track_width", self.gantt_track_width),
            ("waterfall_track_width", self.waterfall_track_width),
            ("heatmap_cell_width", self.heatmap_cell_width),
            ("treemap_container_width", self.treemap_container_width),
            ("treemap_scale", self.treemap_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(eyre!("layout.{} must be greater than 0", name));
            }
        }
        if !(self.gantt_max_pct > 0.0 && self.gantt_max_pct <= 100.0) {
            return Err(eyre!("layout.gantt_max_pct must be in (0, 100]"));
        }
        if !(0.0..=1.0).contains(&self.heatmap_text_threshold) {
            return Err(eyre!("layout.heatmap_text_threshold must be in [0, 1]"));
        }
        if self.treemap_min_size < 0.0 || self.gantt_min_width < 0.0 || self.treemap_gap < 0.0 {
            return Err(eyre!("layout minimum sizes and gaps must not be negative"));
        }
        Ok(())
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        merge_changed!(self, other, default, [format, scale]);
        if other.directory.is_some() {
            self.directory = other.directory;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        merge_changed!(self, other, default, [event_poll_interval_ms]);
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
        self.chart.merge(other.chart);
    }
}

impl ColorConfig {
    /// Name and value of every terminal color, in declaration order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("primary", self.primary.as_str()),
            ("secondary", self.secondary.as_str()),
            ("success", self.success.as_str()),
            ("error", self.error.as_str()),
            ("warning", self.warning.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("background", self.background.as_str()),
            ("controls_bg", self.controls_bg.as_str()),
            ("text_primary", self.text_primary.as_str()),
            ("text_secondary", self.text_secondary.as_str()),
            ("user_message", self.user_message.as_str()),
            ("assistant_message", self.assistant_message.as_str()),
            ("input_border", self.input_border.as_str()),
            ("input_border_active", self.input_border_active.as_str()),
            ("cursor_focused", self.cursor_focused.as_str()),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        merge_changed!(
            self,
            other,
            default,
            [
                primary,
                secondary,
                success,
                error,
                warning,
                dimmed,
                background,
                controls_bg,
                text_primary,
                text_secondary,
                user_message,
                assistant_message,
                input_border,
                input_border_active,
                cursor_focused,
            ]
        );
    }
}

impl ChartColorConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartColorConfig::default();
        merge_changed!(
            self,
            other,
            default,
            [
                series,
                positive,
                negative,
                neutral,
                heatmap_base,
                text_light,
                text_dark,
                grid,
                background,
                label,
            ]
        );
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        merge_changed!(self, other, default, [enabled, log_to_file, log_level]);
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') {
            let rgba = Rgba::from_hex(trimmed)?;
            return Ok(self.rgb_to_terminal(rgba.r, rgba.g, rgba.b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        let lower = trimmed.to_lowercase();
        if let Some(num_str) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
                Ok(Color::Indexed(8))
            }
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" | "default" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(N), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Convert RGB values to appropriate terminal color based on capabilities
    pub fn rgb_to_terminal(&self, r: u8, g: u8, b: u8) -> Color {
        if self.no_color {
            Color::Reset
        } else if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert RGB to nearest 256-color palette index (xterm palette)
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Get a color by name, returns None if not found
    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

impl Default for Theme {
    fn default() -> Self {
        // The default palette only uses names the parser accepts.
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unchanged_defaults() {
        let mut base = AppConfig::default();
        base.layout.track_height = 200.0;
        let mut other = AppConfig::default();
        other.chat.reply_delay_ms = 50;
        base.merge(other);
        assert_eq!(base.layout.track_height, 200.0);
        assert_eq!(base.chat.reply_delay_ms, 50);
    }

    #[test]
    fn layout_validation_rejects_zero_track() {
        let mut config = AppConfig::default();
        config.layout.track_height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
