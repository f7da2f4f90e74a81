//! Shared CLI definitions for hrviz.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Output format for rendered charts.
/// When `--format` is not specified, format is detected from the output file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics, written as plain text
    Svg,
    /// Portable network graphics, rasterized
    Png,
}

impl ExportFormat {
    /// Detect export format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "svg", "png").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Get file extension for this export format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// Command-line arguments for hrviz
#[derive(Clone, Parser, Debug)]
#[command(
    name = "hrviz",
    version,
    about = "HR analytics assistant in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Answer a single question and write the resulting chart to --output, then exit
    #[arg(long = "query", value_name = "TEXT", conflicts_with = "payload")]
    pub query: Option<String>,

    /// Render a response payload (JSON) to --output, then exit
    #[arg(long = "payload", value_name = "FILE")]
    pub payload: Option<PathBuf>,

    /// Output file for --query or --payload
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Force output format (svg, png). By default the format is detected from the --output extension.
    #[arg(long = "format", value_enum)]
    pub format: Option<ExportFormat>,

    /// Print the sample prompts known to the assistant and exit
    #[arg(long = "list-prompts", action)]
    pub list_prompts: bool,

    /// Simulated assistant latency in milliseconds (overrides config [chat] reply_delay_ms)
    #[arg(long = "reply-delay-ms", value_name = "MS")]
    pub reply_delay_ms: Option<u64>,

    /// Load canned responses from this JSON catalog instead of the built-in one
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Enable debug mode: show the debug bar and write a log file to the cache directory
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/hrviz/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// True when the arguments ask for a one-shot render instead of the interactive UI.
    pub fn is_one_shot(&self) -> bool {
        self.query.is_some() || self.payload.is_some()
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("chart.svg")),
            Some(ExportFormat::Svg)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out/chart.PNG")),
            Some(ExportFormat::Png)
        );
        assert_eq!(ExportFormat::from_path(Path::new("chart.eps")), None);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Svg.extension(), "svg");
        assert_eq!(ExportFormat::Png.extension(), "png");
    }

    #[test]
    fn test_one_shot_detection() {
        let args = Args::parse_from(["hrviz", "--query", "leave", "-o", "x.svg"]);
        assert!(args.is_one_shot());
        let args = Args::parse_from(["hrviz", "--debug"]);
        assert!(!args.is_one_shot());
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["hrviz", "--force"]).is_err());
        assert!(Args::try_parse_from(["hrviz", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_markdown_lists_options() {
        let md = render_options_markdown();
        assert!(md.contains("--query"));
        assert!(md.contains("--list-prompts"));
        assert!(!md.contains("`--help`"));
    }
}
