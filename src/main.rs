//! usrapi-manager binary entry point.
//!
//! Parses the command line, sets up file logging, initializes the terminal in
//! raw mode, runs the TUI event loop, and restores the terminal state on exit.
//!
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usrapi_manager::api::HttpUserApi;
use usrapi_manager::app::keymap::Keymap;
use usrapi_manager::app::{self, AppState, Theme};
use usrapi_manager::config::{Args, Paths, normalize_api_url};
use usrapi_manager::error::{Context, Result};

/// Send `tracing` output to `path`; the terminal belongs to the TUI.
fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_ctx(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()?;
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let api_url = normalize_api_url(&args.api_url)?;
    let paths = Paths::resolve(&args)?;
    init_tracing(&paths.log)?;
    info!(api_url = %api_url, config_dir = %paths.dir.display(), "starting");

    let state = AppState::new(
        Arc::new(HttpUserApi::new(&api_url)),
        Theme::load_or_init(&paths.theme),
        Keymap::load_or_init(&paths.keybinds),
    );

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    info!("stopped");
    Ok(())
}
