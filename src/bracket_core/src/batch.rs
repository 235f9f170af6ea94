use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use tracing::{info, warn};

use crate::bracket::{Bracket, ScoringOptions};
use crate::error::{Error, Result};
use crate::picker::Simulated;
use crate::store;
use crate::team::Team;
use crate::topology::Topology;

/// Outcome of a bulk generation run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, in bracket order.
    pub written: Vec<PathBuf>,
    /// Brackets that failed, by index. Their siblings are unaffected.
    pub failures: Vec<(usize, Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remove `folder` if it exists and create it empty.
///
/// Destructive: anything already in the directory is deleted.
pub fn prepare_output_dir(folder: &Path) -> Result<()> {
    if folder.exists() {
        warn!(folder = %folder.display(), "output directory exists, clearing it");
        fs::remove_dir_all(folder).map_err(|e| Error::io(folder, e))?;
    }
    fs::create_dir_all(folder).map_err(|e| Error::io(folder, e))
}

/// Play `count` simulated brackets and save them as
/// `bracket_{i}.csv` in a freshly cleared `folder`.
///
/// Each bracket gets its own seed drawn from a master ChaCha8 stream, so a
/// given `seed` reproduces the whole batch regardless of thread scheduling.
pub fn generate_brackets(
    count: usize,
    teams: &[Team],
    topology: Arc<Topology>,
    folder: &Path,
    seed: Option<u64>,
) -> Result<BatchReport> {
    prepare_output_dir(folder)?;
    write_brackets(count, teams, topology, folder, seed)
}

/// Like [`generate_brackets`], but writes into `folder` as it is.
pub fn write_brackets(
    count: usize,
    teams: &[Team],
    topology: Arc<Topology>,
    folder: &Path,
    seed: Option<u64>,
) -> Result<BatchReport> {
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let seeds: Vec<u64> = (0..count).map(|_| rng.gen::<u64>()).collect();

    // Parallel generation; every bracket owns its own heap and rng
    let results: Vec<(usize, Result<PathBuf>)> = seeds
        .par_iter()
        .enumerate()
        .map(|(index, &sim_seed)| {
            let result = generate_one(index, sim_seed, teams, &topology, folder);
            (index, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (index, result) in results {
        match result {
            Ok(path) => report.written.push(path),
            Err(e) => {
                warn!(index, error = %e, "bracket generation failed");
                report.failures.push((index, e));
            }
        }
    }
    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "batch complete"
    );
    Ok(report)
}

fn generate_one(
    index: usize,
    seed: u64,
    teams: &[Team],
    topology: &Arc<Topology>,
    folder: &Path,
) -> Result<PathBuf> {
    let mut bracket = Bracket::with_topology(teams.to_vec(), Arc::clone(topology))?;
    let champion = bracket.play(&mut Simulated::from_seed(Some(seed)))?.clone();

    // Written under a temporary name so a failure never leaves a partial file
    let path = folder.join(format!("bracket_{}.csv", index));
    let partial = folder.join(format!("bracket_{}.csv.part", index));
    let placed = store::save(&bracket, &partial)
        .and_then(|()| fs::rename(&partial, &path).map_err(|e| Error::io(&path, e)));
    if let Err(e) = placed {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    info!(index, champion = %champion, "saved bracket");
    Ok(path)
}

/// A saved bracket and its score against the reference.
#[derive(Clone, Debug)]
pub struct ScoredBracket {
    pub path: PathBuf,
    pub score: u32,
    pub bracket: Bracket,
}

/// Summary statistics over the scores of a directory of brackets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single bracket.
    pub std_dev: f64,
    pub min: u32,
    pub max: u32,
}

impl ScoreStats {
    pub fn from_scores(scores: &[u32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let values: Vec<f64> = scores.iter().map(|&s| f64::from(s)).collect();
        Some(ScoreStats {
            count: scores.len(),
            mean: values.iter().mean(),
            std_dev: values.iter().std_dev(),
            min: scores.iter().copied().min().unwrap_or(0),
            max: scores.iter().copied().max().unwrap_or(0),
        })
    }
}

/// Result of searching a directory for the best bracket.
#[derive(Debug, Default)]
pub struct SearchResult {
    pub best: Option<ScoredBracket>,
    pub stats: Option<ScoreStats>,
    /// Files that could not be loaded.
    pub skipped: Vec<(PathBuf, Error)>,
}

/// Score every `*.csv` bracket in `folder` against `reference` and keep the
/// highest. Ties go to the first file in path order.
pub fn find_best_bracket(
    folder: &Path,
    reference: &Bracket,
    options: &ScoringOptions,
    topology: Arc<Topology>,
) -> Result<SearchResult> {
    let entries = fs::read_dir(folder).map_err(|e| Error::io(folder, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(folder, e))?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();

    let loaded: Vec<(PathBuf, Result<Bracket>)> = paths
        .into_par_iter()
        .map(|path| {
            let bracket = store::load(&path, Arc::clone(&topology));
            (path, bracket)
        })
        .collect();

    let mut result = SearchResult::default();
    let mut scores = Vec::new();
    for (path, bracket) in loaded {
        let bracket = match bracket {
            Ok(bracket) => bracket,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable bracket");
                result.skipped.push((path, e));
                continue;
            }
        };
        let score = bracket.score(reference, options);
        info!(path = %path.display(), score, "scored bracket");
        scores.push(score);
        if result.best.as_ref().map_or(true, |best| score > best.score) {
            result.best = Some(ScoredBracket {
                path,
                score,
                bracket,
            });
        }
    }
    result.stats = ScoreStats::from_scores(&scores);
    Ok(result)
}
