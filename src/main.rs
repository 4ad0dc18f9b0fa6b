mod config;
mod error;
mod games;
mod storage;
mod term;

use clap::{Parser, Subcommand};
use config::Settings;
use error::GameError;
use games::GameId;
use games::whack::WhackConfig;
use std::io::Write;
use std::path::PathBuf;
use storage::FileStore;

#[derive(Parser)]
#[command(name = "arcade-minis", version, about = "Tiny terminal arcade: memory, whac-a-mole and tic-tac-toe")]
struct Cli
{
    /// Where the high score and log files live.
    #[arg(long, env = "ARCADE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter such as `info` or `arcade_minis=debug`. Logging is off without it.
    #[arg(long, env = "ARCADE_LOG", global = true)]
    log: Option<String>,

    /// Log file path (defaults to arcade-minis.log in the data directory).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command
{
    /// List the available games and their routes.
    List,
    /// Memory matching game.
    Memory,
    /// Whac-a-mole reflex game.
    Whack
    {
        /// Session length in seconds.
        #[arg(long)]
        seconds: Option<u64>,
        /// Don't ring the terminal bell on hits.
        #[arg(long)]
        mute: bool,
    },
    /// Two-player tic-tac-toe.
    Tictactoe,
    /// Open a game by route, e.g. `/memoryGame`.
    Open
    {
        route: String,
    },
}

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), GameError>
{
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.data_dir, cli.log, cli.log_file);
    config::init_tracing(&settings)?;
    tracing::debug!(data_dir = %settings.data_dir.display(), "settings resolved");

    match cli.command {
        None => interactive_menu(&settings),
        Some(Command::List) => {
            list_games();
            Ok(())
        }
        Some(Command::Memory) => run_game(GameId::Memory, &settings, WhackConfig::default()),
        Some(Command::Whack { seconds, mute }) => {
            let config = WhackConfig::new(seconds, mute)?;
            run_game(GameId::Whack, &settings, config)
        }
        Some(Command::Tictactoe) => run_game(GameId::TicTacToe, &settings, WhackConfig::default()),
        Some(Command::Open { route }) => {
            let id = games::find(&route).ok_or_else(|| {
                GameError::usage(format!("Unknown route '{route}'. Run `arcade-minis list`."))
            })?;
            run_game(id, &settings, WhackConfig::default())
        }
    }
}

fn run_game(id: GameId, settings: &Settings, whack: WhackConfig) -> Result<(), GameError>
{
    match id {
        GameId::Memory => games::memory::run(),
        GameId::TicTacToe => games::tictactoe::run(),
        GameId::Whack => {
            let store = FileStore::open(settings.storage_path())?;
            games::whack::run(store, whack)
        }
    }
}

fn interactive_menu(settings: &Settings) -> Result<(), GameError>
{
    let registry = games::registry();
    println!("Arcade Minis");
    println!();
    println!("Select a little game:");
    for (idx, game) in registry.iter().enumerate() {
        println!("  {}. {:<10} {:<13} - {}", idx + 1, game.name, game.route, game.description);
    }
    println!();
    print!("Enter number, name or route (default 1, q to quit): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let choice = input.trim();

    if choice.is_empty() {
        return run_game(registry[0].id, settings, WhackConfig::default());
    }
    if choice.eq_ignore_ascii_case("q") {
        return Ok(());
    }
    if let Ok(index) = choice.parse::<usize>() {
        if index >= 1 && index <= registry.len() {
            return run_game(registry[index - 1].id, settings, WhackConfig::default());
        }
    }

    match games::find(choice) {
        Some(id) => run_game(id, settings, WhackConfig::default()),
        None => Err(GameError::usage("Invalid selection.")),
    }
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<10} {:<13} - {}", game.name, game.route, game.description);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent()
    {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_whack_options_and_routes()
    {
        let cli = Cli::try_parse_from(["arcade-minis", "whack", "--seconds", "10", "--mute"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Whack {
                seconds: Some(10),
                mute: true
            })
        ));

        let cli = Cli::try_parse_from(["arcade-minis", "open", "/memoryGame", "--data-dir", "/tmp/a"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/a")));
        match cli.command {
            Some(Command::Open { route }) => assert_eq!(games::find(&route), Some(GameId::Memory)),
            _ => panic!("expected open"),
        }
    }
}
