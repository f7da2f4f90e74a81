//! User-facing error message formatting.
//!
//! Uses typed error matching (serde_json categories, io::ErrorKind) rather
//! than string parsing to produce short, actionable messages.

use std::io;
use std::path::Path;

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check write access.".to_string(),
        ErrorKind::AlreadyExists => "File already exists.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Interrupted => "Operation interrupted.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("space left") {
                return "No space left on device. Free up disk space and try again.".to_string();
            }
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            return if context.is_some() {
                format!("I/O error: {}", msg)
            } else {
                msg
            };
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a serde_json::Error by its category, keeping the position.
pub fn user_message_from_json(err: &serde_json::Error) -> String {
    use serde_json::error::Category;

    match err.classify() {
        Category::Syntax => format!(
            "Not valid JSON (line {}, column {}).",
            err.line(),
            err.column()
        ),
        Category::Eof => "JSON ended unexpectedly. Is the file truncated?".to_string(),
        Category::Data => format!("Unexpected JSON shape: {}", err),
        Category::Io => format!("Could not read JSON: {}", err),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find serde_json::Error or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    let with_path = |msg: String| match path {
        Some(p) => format!("{}: {}", p.display(), msg),
        None => msg,
    };

    for cause in report.chain() {
        if let Some(json_err) = cause.downcast_ref::<serde_json::Error>() {
            return with_path(user_message_from_json(json_err));
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return with_path(user_message_from_io(io_err, None));
        }
    }

    // Our own reports carry the useful detail in the chain; keep it on one line.
    let joined = report
        .chain()
        .map(|c| c.to_string())
        .map(|s| s.lines().next().unwrap_or_default().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(": ");
    if joined.is_empty() {
        with_path("An error occurred".to_string())
    } else {
        with_path(joined)
    }
}
