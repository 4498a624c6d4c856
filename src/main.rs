mod app;
mod config;
mod error;
mod event;
mod games;
mod scores;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use app::App;
use config::Config;
use event::{Event, EventHandler};
use games::GameKind;
use scores::BestScores;

/// Classic arcade games in the terminal
#[derive(Parser)]
#[command(name = "retro-arcade", version)]
#[command(about = "Thirty-two classic arcade games in the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start straight into a game, e.g. `tetris`
    #[arg(short, long)]
    game: Option<String>,

    /// Milliseconds per frame
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Directory for best scores and the log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the game keys and exit
    #[arg(long)]
    list: bool,
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

fn init_logging(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;
    let log_file = std::fs::File::create(config.log_path())
        .with_context(|| format!("creating log file {}", config.log_path().display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for kind in GameKind::ALL {
            println!("{:<12} {}", kind.key(), kind.title());
        }
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path).context("loading config")?;
    if let Some(tick) = cli.tick_ms {
        config.tick_ms = tick.clamp(1, 1000);
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let start_key = cli.game.or_else(|| config.start_game.clone());
    let start = match start_key {
        Some(key) => Some(GameKind::from_key(&key).ok_or(error::Error::UnknownGame(key))?),
        None => None,
    };

    init_logging(&config)?;
    info!(tick_ms = config.tick_ms, data_dir = %config.data_dir.display(), "starting");

    // Put the terminal back before the default hook prints
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(BestScores::load(&config.scores_path()), start);
    let event_handler = EventHandler::new(config.tick_ms);

    let result = run(&mut terminal, &mut app, &event_handler);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Tick(dt_ms) => app.on_tick(dt_ms),
            Event::Key(key) => app.on_key(key),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
