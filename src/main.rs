use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use hrviz::classifier::{Classifier, KeywordClassifier};
use hrviz::error_display::user_message_from_report;
use hrviz::export::resolve_format;
use hrviz::payload::ChatResponse;
use hrviz::widgets::history::PromptHistory;
use hrviz::{expand_home, render_response_to_file};
use hrviz::{App, AppConfig, AppEvent, Args, CacheManager, ConfigManager, APP_NAME};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn load_classifier(args: &Args, config: &AppConfig) -> Result<KeywordClassifier> {
    let path = args
        .catalog
        .clone()
        .or_else(|| config.chat.catalog_path.as_deref().map(expand_home));
    match path {
        Some(path) => KeywordClassifier::from_path(&path),
        None => KeywordClassifier::builtin(),
    }
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let classifier = load_classifier(args, config)?;
    let history = match CacheManager::new(APP_NAME) {
        Ok(cache) => PromptHistory::persistent(cache.history_file(), config.chat.history_limit),
        Err(e) => {
            tracing::warn!(error = %e, "no cache directory, prompt history kept in memory");
            PromptHistory::in_memory(config.chat.history_limit)
        }
    };
    let mut app = App::new(config, Box::new(classifier), history)?;
    if args.debug || config.debug.enabled {
        app.enable_debug();
    }
    app.greet(rand::random());
    render(&mut terminal, &mut app)?;

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let mut updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        // Replies that came due since the last pass
        updated |= app.tick(Instant::now());

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

/// Answer `--query` or `--payload` without starting the UI.
fn run_one_shot(args: &Args, config: &AppConfig) -> Result<()> {
    let output = args
        .output
        .as_ref()
        .ok_or_else(|| eyre!("--output is required with --query or --payload"))?;
    let format = resolve_format(output, args.format)?;

    let response = match (&args.query, &args.payload) {
        (Some(query), _) => {
            let classifier = load_classifier(args, config)?;
            classifier.classify(query).ok_or_else(|| {
                eyre!(
                    "No response matches '{}'. Try one of: {}",
                    query,
                    classifier.prompts().join("; ")
                )
            })?
        }
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)?;
            ChatResponse::from_json(&json)?
        }
        (None, None) => return Err(eyre!("Nothing to render")),
    };

    render_response_to_file(&response, output, format, config)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Configuration written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

fn init_logging(args: &Args, config: &AppConfig) {
    if !(args.debug || config.debug.log_to_file) {
        return;
    }
    let path = match CacheManager::new(APP_NAME) {
        Ok(cache) => cache.log_file(),
        Err(_) => std::env::temp_dir().join(APP_NAME).join(hrviz::cache::LOG_FILE),
    };
    if let Err(e) = hrviz::logging::init_file_logging(&path, &config.debug.log_level) {
        eprintln!("Warning: {}", e);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", user_message_from_report(&e, None));
            std::process::exit(1);
        }
    };
    if let Some(ms) = args.reply_delay_ms {
        config.chat.reply_delay_ms = ms;
    }

    if args.list_prompts {
        let classifier = load_classifier(&args, &config)?;
        for prompt in classifier.prompts() {
            println!("{}", prompt);
        }
        return Ok(());
    }

    init_logging(&args, &config);
    color_eyre::install()?;

    if args.is_one_shot() {
        if let Err(e) = run_one_shot(&args, &config) {
            eprintln!("Error: {}", user_message_from_report(&e, None));
            std::process::exit(1);
        }
        return Ok(());
    }

    let terminal = ratatui::init();
    let result = run(terminal, &args, &config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", user_message_from_report(&e, None));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_requires_output() {
        let args = Args::parse_from(["hrviz", "--query", "headcount"]);
        let err = run_one_shot(&args, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--output"));
    }

    #[test]
    fn one_shot_query_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("headcount.svg");
        let args = Args::parse_from([
            "hrviz",
            "--query",
            "headcount by department",
            "--output",
            out.to_str().unwrap(),
        ]);
        run_one_shot(&args, &AppConfig::default()).unwrap();
        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn unmatched_query_lists_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.svg");
        let args = Args::parse_from([
            "hrviz",
            "--query",
            "zzz qqq",
            "--output",
            out.to_str().unwrap(),
        ]);
        let err = run_one_shot(&args, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Try one of"));
    }
}
