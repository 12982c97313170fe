use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use learn_four::board::{Board, Mark};
use learn_four::config::{GameParameters, NUM_EPISODES};
use learn_four::players::{evaluate, AlphaBetaPlayer, Player, RandomPlayer, TrainedPlayer};
use learn_four::storage::{dated_file_name, read_tables, write_tables};
use learn_four::{generate_tables, train_both_players};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "play_four", about = "Q-learning agents for Connect-Four style games")]
struct Cli {
    /// JSON metafile with the game parameters; defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enumerate every reachable position and save the untrained tables
    Generate {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Train both players on a generated table file
    Train {
        tables: PathBuf,
        #[arg(short, long, default_value_t = NUM_EPISODES)]
        episodes: usize,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also save each player's table as it finishes
        #[arg(long)]
        per_player: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a trained table against a random or searching opponent
    Evaluate {
        tables: PathBuf,
        #[arg(short, long, default_value_t = 100)]
        games: usize,
        #[arg(short, long, value_enum, default_value_t = Side::First)]
        mark: Side,
        #[arg(long, value_enum, default_value_t = Opponent::Random)]
        opponent: Opponent,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Opponent {
    Random,
    Search,
}

impl From<Side> for Mark {
    fn from(side: Side) -> Self {
        match side {
            Side::First => Mark::First,
            Side::Second => Mark::Second,
        }
    }
}

fn load_params(path: Option<&Path>) -> Result<GameParameters> {
    let params = match path {
        Some(path) => GameParameters::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => GameParameters::default(),
    };
    params.validate()?;
    Ok(params)
}

fn generate(params: &GameParameters, out: Option<PathBuf>) -> Result<()> {
    let out = out.unwrap_or_else(|| PathBuf::from(dated_file_name("tables", "json")));
    Board::new(params.size_x, params.size_y).draw();
    let tables = generate_tables(params);
    write_tables(&out, &tables).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "Saved {} first-player and {} second-player states to {}",
        tables.first.len(),
        tables.second.len(),
        out.display()
    );
    Ok(())
}

fn train(
    params: &GameParameters,
    tables: &Path,
    episodes: usize,
    out: Option<PathBuf>,
    per_player: bool,
    seed: Option<u64>,
) -> Result<()> {
    let loaded = read_tables(tables).with_context(|| format!("reading {}", tables.display()))?;
    let seed = seed.unwrap_or_else(rand::random);
    let outputs = if per_player {
        [
            Some(PathBuf::from(dated_file_name("tables1", "json"))),
            Some(PathBuf::from(dated_file_name("tables2", "json"))),
        ]
    } else {
        [None, None]
    };
    println!(
        "Training {episodes} episodes per player with seed {seed}, started {}",
        Local::now().format("%H:%M:%S")
    );
    let trained = train_both_players(params, &loaded, episodes, outputs, Some(seed))?;
    let out = out.unwrap_or_else(|| PathBuf::from(dated_file_name("trained", "json")));
    write_tables(&out, &trained).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "Training finished {}, saved to {}",
        Local::now().format("%H:%M:%S"),
        out.display()
    );
    Ok(())
}

fn run_evaluation(
    params: &GameParameters,
    tables: &Path,
    games: usize,
    mark: Mark,
    opponent: Opponent,
) -> Result<()> {
    let loaded = read_tables(tables).with_context(|| format!("reading {}", tables.display()))?;
    if loaded.first.size_x() != params.size_x {
        bail!(
            "{} holds a board {} columns wide, parameters say {}",
            tables.display(),
            loaded.first.size_x(),
            params.size_x
        );
    }
    let table = match mark {
        Mark::First => loaded.first,
        Mark::Second => loaded.second,
    };
    let mut agent = TrainedPlayer::new("trained", table, params);
    let mut rival: Box<dyn Player> = match opponent {
        Opponent::Random => Box::new(RandomPlayer::new("random", mark.other())),
        Opponent::Search => Box::new(AlphaBetaPlayer::new("alpha-beta", mark.other(), params)),
    };
    let record = evaluate(&mut agent, rival.as_mut(), games, params);
    println!(
        "{} ({}) against {}: {record}",
        agent.get_name(),
        mark.as_char(),
        rival.get_name()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let params = load_params(cli.config.as_deref())?;
    match cli.command {
        Command::Generate { out } => generate(&params, out),
        Command::Train {
            tables,
            episodes,
            out,
            per_player,
            seed,
        } => train(&params, &tables, episodes, out, per_player, seed),
        Command::Evaluate {
            tables,
            games,
            mark,
            opponent,
        } => run_evaluation(&params, &tables, games, mark.into(), opponent),
    }
}
