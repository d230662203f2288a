use neatwork::logging::Stats;
use neatwork::{
    Candidate, GeneticConfig, Genome, NetworkFactory, Organism, Population, PopulationConfig,
    RunError,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use std::env;
use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;

const ERROR_MARGIN: f32 = 0.3;
const MAX_GENERATIONS: usize = 100;
const DEFAULT_TRIALS: usize = 100;

/// Both halves of the configuration, as read from a RON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct XorConfig {
    population: PopulationConfig,
    genetic: GeneticConfig,
}

impl Default for XorConfig {
    fn default() -> Self {
        XorConfig {
            population: PopulationConfig {
                population_size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
                fitness_threshold: 16.0,
                ..PopulationConfig::default()
            },
            genetic: GeneticConfig::default(),
        }
    }
}

fn evaluate_xor(candidate: Candidate<'_>) -> f32 {
    let mut network = candidate.network;

    let values = [
        ([0.0, 0.0, 1.0], 0.0),
        ([0.0, 1.0, 1.0], 1.0),
        ([1.0, 0.0, 1.0], 1.0),
        ([1.0, 1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (error, (input, output)) in errors.iter_mut().zip(&values) {
        *error = match network.activate(input) {
            Ok(outputs) => (outputs[0] - output).abs().min(1.0),
            Err(_) => 1.0,
        };
        if *error < ERROR_MARGIN {
            *error = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f32>()).powf(2.0)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_target(false)
        .compact()
        .init();

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => ron::from_str(&fs::read_to_string(&path)?)?,
        None => XorConfig::default(),
    };
    let trials = match args.next() {
        Some(trials) => trials.parse()?,
        None => DEFAULT_TRIALS,
    };

    stress_test(&config, trials)
}

/// Evolves `trials` independent populations in parallel,
/// and reports how many generations the successful ones took.
fn stress_test(config: &XorConfig, trials: usize) -> Result<(), Box<dyn Error>> {
    let outcomes: Vec<Option<(usize, Organism)>> = (0..trials)
        .into_par_iter()
        .map(|trial| run_trial(config, trial as u64))
        .collect::<Result<_, String>>()?;

    let successes: Vec<&(usize, Organism)> = outcomes.iter().flatten().collect();
    info!(trials, successes = successes.len(), "stress test complete");

    println!(
        "Successful run generation count {}, {}% failure rate over {} trials",
        Stats::from(successes.iter().map(|(generation, _)| *generation as f32)),
        (trials - successes.len()) as f32 * 100.0 / trials.max(1) as f32,
        trials
    );

    if let Some((generation, champion)) = successes.first() {
        println!("First champion (generation {}):", generation);
        println!(
            "{}",
            ron::ser::to_string_pretty(champion, ron::ser::PrettyConfig::default())?
        );
    }
    Ok(())
}

/// Runs a single seeded trial. Returns the generation and champion
/// of a successful run, `None` if it ran out of generations.
fn run_trial(config: &XorConfig, seed: u64) -> Result<Option<(usize, Organism)>, String> {
    let mut population =
        Population::with_seed(config.population.clone(), config.genetic.clone(), seed)
            .map_err(|e| e.to_string())?;
    let network = NetworkFactory::build_with_bias(population.innovations_mut(), 2, 1);
    population.populate(Organism::new(Genome::from(network)));

    match population.run(MAX_GENERATIONS, None, evaluate_xor) {
        Ok(champion) => Ok(Some((population.generation(), champion))),
        Err(RunError::BudgetExhausted { best_fitness, .. }) => {
            warn!(seed, ?best_fitness, "trial ran out of generations");
            Ok(None)
        }
        Err(e) => {
            warn!(seed, "trial failed: {}", e);
            Ok(None)
        }
    }
}
