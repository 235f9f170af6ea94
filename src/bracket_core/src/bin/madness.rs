//! madness: generate, load, and score March Madness brackets.
//!
//! Usage: `madness [--config FILE] <load|new|gen|best|convert> ...`

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing::{error, info, warn};

use bracket_core::bracket::{Bracket, ScoringOptions};
use bracket_core::config::Config;
use bracket_core::logging::init_logging;
use bracket_core::picker::{Chalk, Simulated};
use bracket_core::topology::{Round, Topology};
use bracket_core::{batch, store, Error, MAX_SCORE};

#[derive(Parser, Debug)]
#[command(name = "madness")]
#[command(about = "Simulate and score NCAA tournament brackets")]
struct Args {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Forecast table supplying the field (overrides the config)
    #[arg(long, global = true)]
    teams: Option<PathBuf>,

    /// Bracket file with actual results (overrides the config)
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    /// Score a play-in loser's games as misses
    #[arg(long, global = true)]
    no_forgive_playin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a saved bracket, print it and score it
    Load {
        file: PathBuf,

        /// Print side by side with the reference instead
        #[arg(short, long)]
        diff: bool,
    },
    /// Build and play a new bracket from the forecast table
    New {
        /// Write the bracket to this file
        #[arg(short, long)]
        save: Option<PathBuf>,

        #[arg(short, long)]
        diff: bool,

        /// Seed for a reproducible simulation
        #[arg(long)]
        seed: Option<u64>,

        /// Always advance the better seed
        #[arg(long)]
        chalk: bool,
    },
    /// Generate many simulated brackets into a directory
    Gen {
        #[arg(short, long)]
        number: usize,

        /// Output directory, cleared first [default: brackets_<timestamp>]
        #[arg(short, long)]
        folder: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Find the highest scoring bracket in a directory
    Best { folder: PathBuf },
    /// Convert a forecast table into a bracket file of settled results
    Convert { forecasts: PathBuf, output: PathBuf },
}

struct Session {
    config: Config,
    topology: Arc<Topology>,
    options: ScoringOptions,
}

impl Session {
    fn new(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(teams) = &args.teams {
            config.data.teams = teams.clone();
        }
        if let Some(reference) = &args.reference {
            config.data.reference = reference.clone();
        }
        let mut options = config.scoring;
        if args.no_forgive_playin {
            options.forgive_playin = false;
        }
        let topology = config.topology();
        Ok(Session {
            config,
            topology,
            options,
        })
    }

    fn field(&self) -> Result<Vec<bracket_core::Team>> {
        let path = &self.config.data.teams;
        store::read_teams(path, &self.config.team_filter())
            .with_context(|| format!("reading teams from {}", path.display()))
    }

    fn reference(&self) -> Result<Bracket> {
        let path = &self.config.data.reference;
        store::load(path, Arc::clone(&self.topology))
            .with_context(|| format!("loading reference bracket {}", path.display()))
    }

    /// The reference, or None with a warning when the file does not exist.
    fn optional_reference(&self) -> Result<Option<Bracket>> {
        match store::load(&self.config.data.reference, Arc::clone(&self.topology)) {
            Ok(bracket) => Ok(Some(bracket)),
            Err(Error::FileNotFound(path)) => {
                warn!(path = %path.display(), "no reference bracket, skipping score");
                Ok(None)
            }
            Err(e) => Err(e).context("loading reference bracket"),
        }
    }

    fn report(&self, bracket: &Bracket, diff: bool) -> Result<()> {
        let reference = self.optional_reference()?;
        match (&reference, diff) {
            (Some(reference), true) => println!("{}", bracket.diff(reference)),
            _ => println!("{}", bracket),
        }
        if let Some(reference) = &reference {
            print_score(bracket, reference, &self.options);
        }
        Ok(())
    }
}

fn print_score(bracket: &Bracket, reference: &Bracket, options: &ScoringOptions) {
    let by_round = bracket.score_by_round(reference, options);
    for (round, points) in Round::iter().skip(1).zip(by_round) {
        println!("{:>14}: {}", round.to_string(), points);
    }
    println!("SCORE: {}/{}", by_round.iter().sum::<u32>(), MAX_SCORE);
}

fn default_folder() -> PathBuf {
    let stamp = Local::now().format("brackets_%Y-%m-%d_%H:%M:%S");
    PathBuf::from(stamp.to_string())
}

fn run(args: Args) -> Result<bool> {
    let session = Session::new(&args)?;

    match args.command {
        Command::Load { file, diff } => {
            let bracket = store::load(&file, Arc::clone(&session.topology))
                .with_context(|| format!("loading bracket {}", file.display()))?;
            session.report(&bracket, diff)?;
        }
        Command::New { save, diff, seed, chalk } => {
            let topology = Arc::clone(&session.topology);
            let mut bracket = Bracket::with_topology(session.field()?, topology)?;
            let champion = if chalk {
                bracket.play(&mut Chalk)?
            } else {
                bracket.play(&mut Simulated::from_seed(seed))?
            };
            info!(champion = %champion, "bracket played");
            if let Some(path) = save {
                store::save(&bracket, &path)
                    .with_context(|| format!("saving bracket {}", path.display()))?;
                info!(path = %path.display(), "bracket saved");
            }
            session.report(&bracket, diff)?;
        }
        Command::Gen { number, folder, seed } => {
            let folder = folder.unwrap_or_else(default_folder);
            let teams = session.field()?;
            let topology = Arc::clone(&session.topology);
            let report = batch::generate_brackets(number, &teams, topology, &folder, seed)
                .with_context(|| format!("generating brackets in {}", folder.display()))?;
            println!("wrote {} brackets to {}", report.written.len(), folder.display());
            for (index, e) in &report.failures {
                error!(index, error = %e, "bracket failed");
            }
            return Ok(report.is_success());
        }
        Command::Best { folder } => {
            let reference = session.reference()?;
            let topology = Arc::clone(&session.topology);
            let result =
                batch::find_best_bracket(&folder, &reference, &session.options, topology)?;
            summarize_search(&folder, &result, &reference, &session.options);
        }
        Command::Convert { forecasts, output } => {
            let filter = session.config.team_filter();
            let rows = store::convert_forecasts_file(&forecasts, &output, &filter)
                .with_context(|| format!("converting {}", forecasts.display()))?;
            println!("wrote {} teams to {}", rows, output.display());
        }
    }
    Ok(true)
}

fn summarize_search(
    folder: &Path,
    result: &batch::SearchResult,
    reference: &Bracket,
    options: &ScoringOptions,
) {
    let Some(best) = &result.best else {
        println!("no readable brackets in {}", folder.display());
        return;
    };
    println!("{}", best.bracket);
    print_score(&best.bracket, reference, options);
    println!("best: {}", best.path.display());
    if let Some(stats) = &result.stats {
        println!(
            "{} brackets: mean {:.2}, std dev {:.2}, min {}, max {}",
            stats.count, stats.mean, stats.std_dev, stats.min, stats.max
        );
    }
    if !result.skipped.is_empty() {
        println!("{} files skipped", result.skipped.len());
    }
}

fn main() {
    init_logging();

    let args = Args::parse();
    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
