use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use revadim::{
    app::{App, KeyOutcome},
    config::{Config, ConfigStore, FileConfigStore},
    game::{Game, Phase},
    leaderboard::{ScoreStore, SqliteScoreStore},
    runtime::{Event, FixedTicker, Runner, TermEventSource},
    words::WordSet,
    TICK_RATE_MS,
};

/// terminal quiz game for the layers of Hebrew
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal quiz game: classify each displayed Hebrew word into its linguistic layer before the round timer runs out. Scores land on a shared leaderboard."
)]
struct Cli {
    /// number of seconds per round
    #[clap(short = 's', long)]
    secs: Option<u64>,

    /// embedded word dataset to play with
    #[clap(short = 'd', long)]
    dataset: Option<String>,

    /// player name pre-filled on the score screen
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// leaderboard database path (defaults to the shared state dir)
    #[clap(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.secs {
            config.round_secs = secs;
        }
        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(name) = &self.name {
            config.player_name = Some(name.clone());
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut config = FileConfigStore::new().load();
    cli.apply(&mut config);

    let word_set = WordSet::load(&config.dataset)?;
    let store = match &cli.db_path {
        Some(path) => SqliteScoreStore::with_path(path)?,
        None => SqliteScoreStore::new()?,
    };

    let (events, tx) = TermEventSource::new();
    let subscription = store.subscribe(Box::new(move |entries| {
        let _ = tx.send(Event::Leaderboard(entries.to_vec()));
    }));

    let game = Game::new(word_set, config.round_secs as f64);
    let mut app = App::new(game, config.player_name.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app, &store, events);

    // Release the subscription before teardown so a late snapshot can't
    // touch a dead loop.
    subscription.unsubscribe();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &dyn ScoreStore,
    events: TermEventSource,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            Event::Tick => {
                app.game.on_tick();
                // Redraw on ticks only while the countdown is visibly moving.
                if app.game.phase == Phase::Playing || app.game.is_locked() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            Event::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Event::Leaderboard(entries) => {
                app.game.set_leaderboard(entries);
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Event::Key(key) => {
                if let KeyOutcome::Quit = app.handle_key(key, store) {
                    break;
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
