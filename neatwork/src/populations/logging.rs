//! Generational snapshots of a population, for
//! reporting on how a run progressed.
use super::{Organism, Population, SpeciesId};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllOrganisms,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no organisms.
    NoOrganisms,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub organism_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (name, stats) in &self.organism_stats {
            writeln!(f, "\t{}: {}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// Every statistic of an empty sequence is NaN.
    ///
    /// # Examples
    /// ```
    /// use neatwork::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
    /// assert_eq!(stats.median, 2.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f32::NAN,
                minimum: f32::NAN,
                mean: f32::NAN,
                median: f32::NAN,
            };
        }
        data.sort_by(f32::total_cmp);

        let len = data.len();
        let mid = len / 2;
        let median = if len % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[len - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / len as f32,
            median,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.4}, min {:.4}, mean {:.4}, median {:.4}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of organisms from a population.
///
/// Species entries carry the number of generations
/// since the species last improved.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Species IDs, organisms and stagnation level.
    Species(Vec<(SpeciesId, Vec<Organism>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesId, Organism, usize)>),
    /// Only the population champion.
    PopulationChampion(Organism),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use neatwork::logging::{EvolutionLogger, GenerationMemberRecord, ReportingLevel};
    /// use neatwork::{GeneticConfig, Genome, NetworkFactory, Organism, Population, PopulationConfig};
    ///
    /// let mut population =
    ///     Population::with_seed(PopulationConfig::default(), GeneticConfig::default(), 1).unwrap();
    /// let network = NetworkFactory::build(population.innovations_mut(), 2, 1);
    /// population.populate(Organism::new(Genome::from(network)));
    /// population.evaluate_fitness(|_| 1.0);
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// logger.log(
    ///     &population,
    ///     |o| [o.fitness(), o.network().synapse_count() as f32],
    ///     ["fitness", "synapses"],
    /// );
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.generation_number, 1);
    /// assert_eq!(log.organism_stats[0].1.mean, 1.0);
    /// assert_eq!(log.organism_stats[1].1.maximum, 2.0);
    /// assert!(matches!(log.generation_sample, GenerationMemberRecord::PopulationChampion(_)));
    /// ```
    pub fn log<F, const N: usize>(
        &mut self,
        population: &Population,
        stat_extractor: F,
        stat_names: [&str; N],
    ) where
        F: Fn(&Organism) -> [f32; N],
    {
        let stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(population.organisms().map(stat_extractor)))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();

        let stagnation = |s: &super::Species| s.age().saturating_sub(s.age_of_last_improvement());
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllOrganisms => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| (s.id(), s.organisms().to_vec(), stagnation(s)))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .filter_map(|s| s.champion().map(|c| (s.id(), c.clone(), stagnation(s))))
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => population
                .champion()
                .cloned()
                .map_or(GenerationMemberRecord::None, |champion| {
                    GenerationMemberRecord::PopulationChampion(champion)
                }),
            ReportingLevel::NoOrganisms => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            species_count: population.species().count(),
            organism_stats: stats,
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs: Vec<Vec<T>> = (0..N).map(|_| vec![]).collect();
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}
