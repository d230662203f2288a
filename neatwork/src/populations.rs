//! A Population is a collection of organisms.
//! These are grouped into species, which are
//! evolved generation after generation using a
//! host-supplied fitness function as the source
//! of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod organism;
mod species;

use crate::genomics::{ConfigError, GeneticConfig, Genome, InnovationCounter};
use crate::networks::Network;
pub use config::PopulationConfig;
pub use errors::{EvolutionError, RunError};
use offspring_factory::{OffspringFactory, SuperChampion};
pub use organism::Organism;
pub use species::{Species, SpeciesId};

use rand::prelude::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use std::convert::Infallible;
use std::thread;
use std::time::Duration;

/// What the fitness function gets to see of an organism.
///
/// `network` is a freshly reset copy of the organism's
/// phenotype, so it can be activated freely without
/// touching the genome.
pub struct Candidate<'a> {
    pub network: Network,
    pub organism: &'a Organism,
    pub population: &'a Population,
}

/// A population of organisms, and the machinery to evolve them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    species: Vec<Species>,
    innovations: InnovationCounter,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
    rng: ChaCha8Rng,
}

impl Population {
    /// Creates an empty population using the passed
    /// configurations, seeding its generator from entropy.
    /// Fill it with [`populate`](Population::populate).
    ///
    /// # Errors
    ///
    /// Returns the first problem found validating either configuration.
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Result<Population, ConfigError> {
        Population::with_rng(population_config, genetic_config, ChaCha8Rng::from_entropy())
    }

    /// Like [`new`](Population::new), but the population's
    /// generator is seeded with `seed`, making every
    /// subsequent operation reproducible.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Population, PopulationConfig};
    ///
    /// let population =
    ///     Population::with_seed(PopulationConfig::default(), GeneticConfig::default(), 7).unwrap();
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.organisms().count(), 0);
    ///
    /// let invalid = PopulationConfig {
    ///     survival_threshold: 2.0,
    ///     ..PopulationConfig::default()
    /// };
    /// assert!(Population::with_seed(invalid, GeneticConfig::default(), 7).is_err());
    /// ```
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        seed: u64,
    ) -> Result<Population, ConfigError> {
        Population::with_rng(population_config, genetic_config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        rng: ChaCha8Rng,
    ) -> Result<Population, ConfigError> {
        population_config.validate()?;
        genetic_config.validate()?;
        Ok(Population {
            species: vec![],
            innovations: InnovationCounter::new(),
            generation: 1,
            population_config,
            genetic_config,
            rng,
        })
    }

    /// Replaces the population with [`population_size`] copies
    /// of `seed`, each with its weights mutated, and speciates them.
    ///
    /// The innovation counter is advanced past every
    /// identifier already used by the seed.
    ///
    /// [`population_size`]: PopulationConfig::population_size
    pub fn populate(&mut self, seed: Organism) {
        self.species.clear();
        self.innovations.observe(seed.network());
        for _ in 0..self.population_config.population_size.get() {
            let mut organism = seed.offspring(self.generation);
            organism
                .genome_mut()
                .mutate_weights(&self.genetic_config, &mut self.rng);
            Organism::speciate(
                organism,
                &self.population_config,
                &self.genetic_config,
                &mut self.species,
                self.generation,
            );
        }
        info!(
            organisms = self.population_config.population_size.get(),
            species = self.species.len(),
            "population seeded"
        );
    }

    /// Returns the current generation number, starting at 1.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns an iterator over all current organisms,
    /// species by species.
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.species.iter().flat_map(|s| s.organisms.iter())
    }

    /// Returns the organism with the highest current fitness,
    /// or `None` if the population is empty.
    pub fn champion(&self) -> Option<&Organism> {
        self.organisms().max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Returns the counter identifiers of new structure are drawn from.
    pub fn innovations(&self) -> &InnovationCounter {
        &self.innovations
    }

    /// Mutable access to the innovation counter, for
    /// building seed networks that share its numbering.
    pub fn innovations_mut(&mut self) -> &mut InnovationCounter {
        &mut self.innovations
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    /// Evaluates the fitness of every organism, in order,
    /// using the passed evaluator. Higher is better.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Genome, NetworkFactory, Organism, Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     population_size: NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::default()
    /// };
    /// let mut population = Population::with_seed(config, GeneticConfig::default(), 3).unwrap();
    /// let network = NetworkFactory::build(population.innovations_mut(), 1, 1);
    /// population.populate(Organism::new(Genome::from(network)));
    ///
    /// let mut score = 0.0;
    /// population.evaluate_fitness(|_| {
    ///     score += 1.0;
    ///     score
    /// });
    /// assert_eq!(population.champion().map(|o| o.fitness()), Some(10.0));
    /// ```
    pub fn evaluate_fitness<F>(&mut self, mut evaluator: F)
    where
        F: FnMut(Candidate<'_>) -> f32,
    {
        for (s, o) in self.positions() {
            let fitness = evaluator(self.candidate(s, o));
            self.species[s].organisms[o].fitness = fitness;
        }
    }

    /// Breeds the next generation.
    ///
    /// Every species has its fitness adjusted and its weakest
    /// members culled. The survivors are allotted offspring in
    /// proportion to their fitness relative to the population
    /// average, and the species reproduce, best first. The old
    /// generation is then discarded, along with any species left
    /// without members.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::DegeneratePopulation`] without
    /// changing anything if the population is empty or its average
    /// fitness is not a positive number.
    pub fn epoch(&mut self) -> Result<(), EvolutionError> {
        let overall_average = self.overall_average();
        if !(overall_average.is_finite() && overall_average > 0.0) {
            warn!(
                generation = self.generation,
                overall_average, "degenerate population"
            );
            return Err(EvolutionError::DegeneratePopulation);
        }

        self.generation += 1;
        self.adjust_compatibility_threshold();

        for species in &mut self.species {
            species.adjust_fitness(&self.population_config, &mut self.rng);
        }
        for species in &mut self.species {
            species.organisms.retain(|o| !o.kill);
        }

        let size = self.population_config.population_size.get() as f32;
        for species in &mut self.species {
            for organism in &mut species.organisms {
                organism.expected_offspring =
                    offspring_count(organism.original_fitness / overall_average);
            }
            species.expected_offspring =
                offspring_count(species.average_fitness() / overall_average * size);
        }

        let mut sorted_species: Vec<usize> = (0..self.species.len()).collect();
        sorted_species.sort_by(|&a, &b| {
            self.species[b]
                .max_fitness()
                .total_cmp(&self.species[a].max_fitness())
        });

        let super_champion = self.super_champion();
        let parents: Vec<Vec<Organism>> =
            self.species.iter().map(|s| s.organisms.clone()).collect();

        let mut factory = OffspringFactory::new(
            &parents,
            &sorted_species,
            &mut self.species,
            &mut self.innovations,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
            super_champion,
            self.generation,
        );
        for &index in &sorted_species {
            factory.reproduce(index);
        }

        for (species, parents) in self.species.iter_mut().zip(&parents) {
            species.organisms.drain(..parents.len());
        }
        self.species.retain(|s| !s.organisms.is_empty());
        for species in &mut self.species {
            species.age += 1;
        }

        info!(
            generation = self.generation,
            species = self.species.len(),
            organisms = self.organisms().count(),
            best_fitness = self
                .species
                .iter()
                .map(|s| s.max_fitness())
                .fold(0.0, f32::max),
            compatibility_threshold = self.population_config.compatibility_threshold,
            "epoch complete"
        );
        Ok(())
    }

    /// Repeatedly evaluates every organism with `fitness` and
    /// breeds a new generation, for at most `max_runs` generations.
    ///
    /// Returns a copy of the first organism whose fitness reaches
    /// the [fitness threshold], as soon as it is evaluated. If
    /// `delay` is set, the thread sleeps that long after each epoch.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::BudgetExhausted`] if no organism reached
    /// the threshold, or [`RunError::Evolution`] if a generation could
    /// not be bred.
    ///
    /// [fitness threshold]: PopulationConfig::fitness_threshold
    pub fn run<F>(
        &mut self,
        max_runs: usize,
        delay: Option<Duration>,
        mut fitness: F,
    ) -> Result<Organism, RunError<Infallible>>
    where
        F: FnMut(Candidate<'_>) -> f32,
    {
        self.try_run(max_runs, delay, |candidate| Ok(fitness(candidate)))
    }

    /// Like [`run`](Population::run), but with a fallible
    /// fitness function. The first error it returns aborts
    /// the run, as [`RunError::Fitness`].
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Genome, NetworkFactory, Organism, Population, PopulationConfig, RunError};
    ///
    /// let mut population =
    ///     Population::with_seed(PopulationConfig::default(), GeneticConfig::default(), 5).unwrap();
    /// let network = NetworkFactory::build(population.innovations_mut(), 2, 1);
    /// population.populate(Organism::new(Genome::from(network)));
    ///
    /// let result = population.try_run(10, None, |mut candidate| {
    ///     candidate.network.activate(&[1.0]).map(|outputs| outputs[0])
    /// });
    /// assert!(matches!(result, Err(RunError::Fitness(_))));
    /// ```
    pub fn try_run<F, E>(
        &mut self,
        max_runs: usize,
        delay: Option<Duration>,
        mut fitness: F,
    ) -> Result<Organism, RunError<E>>
    where
        F: FnMut(Candidate<'_>) -> Result<f32, E>,
    {
        let threshold = self.population_config.fitness_threshold;
        let mut best_fitness: Option<f32> = None;

        for run in 1..=max_runs {
            for (s, o) in self.positions() {
                let value = fitness(self.candidate(s, o)).map_err(RunError::Fitness)?;
                let organism = &mut self.species[s].organisms[o];
                organism.fitness = value;
                best_fitness = Some(best_fitness.map_or(value, |best| best.max(value)));

                if value >= threshold {
                    info!(
                        generation = self.generation,
                        fitness = value,
                        "solution found"
                    );
                    return Ok(organism.clone());
                }
            }

            if run < max_runs {
                self.epoch()?;
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
            }
        }

        info!(generations = max_runs, ?best_fitness, "run budget exhausted");
        Err(RunError::BudgetExhausted {
            generations: max_runs,
            best_fitness,
        })
    }

    /// (species, organism) index pairs of every organism, in order.
    fn positions(&self) -> Vec<(usize, usize)> {
        self.species
            .iter()
            .enumerate()
            .flat_map(|(s, species)| (0..species.organisms.len()).map(move |o| (s, o)))
            .collect()
    }

    fn candidate(&self, species: usize, organism: usize) -> Candidate<'_> {
        let organism = &self.species[species].organisms[organism];
        Candidate {
            network: organism.network().copy(),
            organism,
            population: self,
        }
    }

    /// Sum of the species' mean raw fitness, or NaN
    /// if there are no organisms at all. Fitness values
    /// that are not finite count as 0.
    fn overall_average(&self) -> f32 {
        let mut populated = self
            .species
            .iter()
            .filter(|s| !s.organisms.is_empty())
            .peekable();
        if populated.peek().is_none() {
            return f32::NAN;
        }
        populated
            .map(|s| {
                s.organisms.iter().map(Organism::raw_fitness).sum::<f32>()
                    / s.organisms.len() as f32
            })
            .sum()
    }

    /// Nudges the compatibility threshold towards
    /// producing the target number of species.
    fn adjust_compatibility_threshold(&mut self) {
        let config = &mut self.population_config;
        let count = self.species.len();
        if !config.adjust_compatibility_threshold || count == config.compatibility_modifier_target {
            return;
        }
        if count > config.compatibility_modifier_target {
            config.compatibility_threshold += config.compatibility_modifier;
        } else {
            config.compatibility_threshold -= config.compatibility_modifier;
        }
        config.compatibility_threshold = config
            .compatibility_threshold
            .max(config.compatibility_modifier);
        debug!(
            threshold = config.compatibility_threshold,
            species = count,
            "compatibility threshold adjusted"
        );
    }

    /// Finds the organism with the highest original fitness.
    /// It only gets special clones if it heads its species.
    fn super_champion(&self) -> Option<SuperChampion> {
        let mut best: Option<(usize, usize, &Organism)> = None;
        for (s, species) in self.species.iter().enumerate() {
            for (o, organism) in species.organisms.iter().enumerate() {
                if best.map_or(true, |(.., b)| organism.original_fitness > b.original_fitness) {
                    best = Some((s, o, organism));
                }
            }
        }
        match best {
            Some((species, 0, organism)) => Some(SuperChampion {
                species,
                remaining: organism.expected_offspring,
            }),
            _ => None,
        }
    }
}

/// Rounds an offspring share to a whole count.
/// Anything that is not a positive number gets none.
fn offspring_count(share: f32) -> usize {
    if share.is_finite() && share > 0.0 {
        share.round() as usize
    } else {
        0
    }
}
