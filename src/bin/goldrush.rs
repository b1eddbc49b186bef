use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use goldrush::mapfile::MapFile;
use goldrush::moves::MoveOutcome;
use goldrush::session::{Session, SessionNames};
use goldrush::ui::{Console, Key};
use goldrush::SessionError;

/// Shared-memory gold chase. The first process supplies a map and hosts the
/// session; every later process runs with no arguments and joins it.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the map file. Supplying one starts a new session as host;
    /// omit it to join the running session.
    map: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Quiet unless RUST_LOG says otherwise; log lines would tear the TUI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("goldrush: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let names = SessionNames::default();
    let mut session = match &args.map {
        Some(path) => {
            let map = MapFile::load(path).map_err(SessionError::from)?;
            Session::host(&map, names)?
        }
        None => Session::join(names)?,
    };

    let mut console = Console::new()?;
    console.notice(&format!("player #{}", session.slot()));

    loop {
        console.draw(session.rows(), session.cols(), &session.grid())?;
        match console.read_key()? {
            Key::Quit => break,
            Key::Move(direction) => match session.make_move(direction)? {
                MoveOutcome::Won => {
                    console.notice("found real gold!");
                    console.notice("You Won!");
                }
                MoveOutcome::FoundDecoy => console.notice("found fool's gold!"),
                MoveOutcome::Left => break,
                MoveOutcome::Moved | MoveOutcome::Rejected => {}
            },
        }
    }

    // Restore the terminal before teardown so any exit logging is readable.
    drop(console);
    session.leave();
    Ok(())
}
