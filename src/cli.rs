//! Command-line interface, shared with the build script through `hrviz-cli`.

pub use hrviz_cli::{render_options_markdown, Args, ExportFormat};
