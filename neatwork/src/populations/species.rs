use super::{Organism, PopulationConfig};
use crate::Genome;

use rand::prelude::{Rng, SliceRandom};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize, pub usize);

/// Fitness multiplier applied to stagnated species.
const STAGNATION_PENALTY: f32 = 0.01;
/// Species at most this old get their fitness
/// multiplied by [`PopulationConfig::age_significance`].
const YOUTH_AGE: usize = 10;
/// Floor applied to every fitness before sharing.
const MIN_FITNESS: f32 = 0.0001;

/// Species are collections of reproductively
/// compatible (within the [compatibility threshold])
/// organisms. Membership is decided by comparing against
/// a _specimen_: a copy of the genome of a random member,
/// redrawn every generation.
///
/// Species that have not improved their best fitness in
/// [`dropoff_age`] generations are considered stagnated,
/// and their members' fitness is heavily penalized.
///
/// [compatibility threshold]: PopulationConfig::compatibility_threshold
/// [`dropoff_age`]: PopulationConfig::dropoff_age
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesId,
    pub(super) organisms: Vec<Organism>,
    specimen: Genome,
    pub(super) age: usize,
    age_of_last_improvement: usize,
    max_fitness: f32,
    average_fitness: f32,
    pub(super) expected_offspring: usize,
    extinct: bool,
}

impl Species {
    /// Creates a new species containing only `founder`,
    /// whose genome becomes the specimen.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{Genome, Organism, Species, SpeciesId};
    ///
    /// let species = Species::new(SpeciesId(1, 0), Organism::new(Genome::new()));
    ///
    /// assert_eq!(species.id(), SpeciesId(1, 0));
    /// assert_eq!(species.organisms().len(), 1);
    /// assert_eq!(species.organisms()[0].species(), Some(SpeciesId(1, 0)));
    /// ```
    pub fn new(id: SpeciesId, founder: Organism) -> Species {
        let mut species = Species {
            id,
            organisms: vec![],
            specimen: founder.genome().clone(),
            age: 0,
            age_of_last_improvement: 0,
            max_fitness: 0.0,
            average_fitness: 0.0,
            expected_offspring: 0,
            extinct: false,
        };
        species.add_organism(founder);
        species
    }

    /// Returns a fitness-biased index into a list of
    /// species sorted best first: a standard normal
    /// deviate is rounded, capped at 1, and wrapped into
    /// the list's bounds. Returns `None` for an empty list.
    ///
    /// # Examples
    /// ```
    /// use neatwork::Species;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// for _ in 0..100 {
    ///     let index = Species::pick(5, &mut rng).unwrap();
    ///     assert!(index < 5);
    /// }
    /// assert_eq!(Species::pick(0, &mut rng), None);
    /// ```
    pub fn pick<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let deviate: f64 = rng.sample(StandardNormal);
        let offset = (deviate.round() as i64).min(1);
        Some(offset.rem_euclid(len as i64) as usize)
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the species' members. After fitness adjustment
    /// they are sorted by decreasing adjusted fitness.
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// Returns the genome new organisms are compared against.
    pub fn specimen(&self) -> &Genome {
        &self.specimen
    }

    /// Returns the first member of the species: after
    /// fitness adjustment, the fittest one.
    pub fn champion(&self) -> Option<&Organism> {
        self.organisms.first()
    }

    /// Number of epochs the species has survived.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Age of the species the last time its best
    /// fitness improved.
    pub fn age_of_last_improvement(&self) -> usize {
        self.age_of_last_improvement
    }

    /// Best unadjusted fitness ever reached by a member.
    pub fn max_fitness(&self) -> f32 {
        self.max_fitness
    }

    /// Mean unadjusted fitness of the members,
    /// as of the last fitness adjustment.
    pub fn average_fitness(&self) -> f32 {
        self.average_fitness
    }

    /// Offspring allotted to the species in the last epoch.
    pub fn expected_offspring(&self) -> usize {
        self.expected_offspring
    }

    /// Whether the species was stagnated at the
    /// last fitness adjustment.
    pub fn extinct(&self) -> bool {
        self.extinct
    }

    /// Adds an organism to the species, pointing its
    /// species reference here.
    pub fn add_organism(&mut self, mut organism: Organism) {
        organism.species = Some(self.id);
        self.organisms.push(organism);
    }

    /// Shapes the members' fitness for reproduction.
    ///
    /// Each member's raw fitness (0 if not a finite number)
    /// is saved as its original fitness, then penalized if the species is stagnated,
    /// boosted if the species is young, floored at 0.0001
    /// and shared among the members. Members are then sorted
    /// by decreasing adjusted fitness, a new specimen is drawn,
    /// and every member past the survival cutoff is marked
    /// to be killed.
    pub fn adjust_fitness<R: Rng + ?Sized>(&mut self, config: &PopulationConfig, rng: &mut R) {
        if self.organisms.is_empty() {
            return;
        }
        self.extinct =
            (self.age + 1).saturating_sub(self.age_of_last_improvement) > config.dropoff_age;

        let count = self.organisms.len() as f32;
        for organism in &mut self.organisms {
            organism.original_fitness = organism.raw_fitness();
            let mut fitness = organism.original_fitness;
            if self.extinct {
                fitness *= STAGNATION_PENALTY;
            }
            if self.age <= YOUTH_AGE {
                fitness *= config.age_significance;
            }
            organism.fitness = fitness.max(MIN_FITNESS) / count;
        }

        self.organisms.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        if let Some(specimen) = self.organisms.choose(rng) {
            self.specimen = specimen.genome().clone();
        }

        self.average_fitness =
            self.organisms.iter().map(|o| o.original_fitness).sum::<f32>() / count;

        let top = self.organisms[0].original_fitness;
        if top > self.max_fitness {
            self.max_fitness = top;
            self.age_of_last_improvement = self.age;
        }

        let remove_from = (count * config.survival_threshold).floor() as usize + 1;
        for organism in self.organisms.iter_mut().skip(remove_from) {
            organism.kill = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn species_of(fitnesses: &[f32]) -> Species {
        let mut organisms = fitnesses.iter().map(|&f| {
            let mut organism = Organism::new(Genome::new());
            organism.set_fitness(f);
            organism
        });
        let mut species = Species::new(SpeciesId(1, 0), organisms.next().unwrap());
        for organism in organisms {
            species.add_organism(organism);
        }
        species
    }

    fn config() -> PopulationConfig {
        PopulationConfig {
            survival_threshold: 0.5,
            dropoff_age: 15,
            age_significance: 1.0,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn adjustment_sorts_and_shares() {
        let mut species = species_of(&[1.0, 4.0, 2.0, 3.0]);
        species.adjust_fitness(&config(), &mut ChaCha8Rng::seed_from_u64(0));

        let adjusted: Vec<f32> = species.organisms().iter().map(|o| o.fitness()).collect();
        assert_eq!(adjusted, vec![1.0, 0.75, 0.5, 0.25]);
        let original: Vec<f32> = species
            .organisms()
            .iter()
            .map(|o| o.original_fitness())
            .collect();
        assert_eq!(original, vec![4.0, 3.0, 2.0, 1.0]);
        assert_eq!(species.average_fitness(), 2.5);
        assert_eq!(species.max_fitness(), 4.0);
        assert_eq!(species.champion().map(|o| o.original_fitness()), Some(4.0));
    }

    #[test]
    fn survival_cutoff() {
        let mut species = species_of(&[1.0, 4.0, 2.0, 3.0]);
        species.adjust_fitness(&config(), &mut ChaCha8Rng::seed_from_u64(0));
        // floor(4 * 0.5) + 1 = 3 survivors.
        let killed: Vec<bool> = species.organisms().iter().map(|o| o.kill()).collect();
        assert_eq!(killed, vec![false, false, false, true]);
    }

    #[test]
    fn stagnated_species_are_penalized() {
        let mut species = species_of(&[2.0, 2.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        species.adjust_fitness(&config(), &mut rng);
        assert!(!species.extinct());
        assert_eq!(species.age_of_last_improvement(), 0);

        // No improvement since age 0.
        species.age = 14;
        for organism in &mut species.organisms {
            organism.set_fitness(2.0);
        }
        species.adjust_fitness(&config(), &mut rng);
        assert!(!species.extinct());

        species.age = 15;
        for organism in &mut species.organisms {
            organism.set_fitness(2.0);
        }
        species.adjust_fitness(&config(), &mut rng);
        assert!(species.extinct());
        assert_eq!(species.organisms()[0].fitness(), 2.0 * 0.01 / 2.0);
    }

    #[test]
    fn young_species_are_boosted() {
        let mut species = species_of(&[1.0]);
        let config = PopulationConfig {
            age_significance: 3.0,
            ..config()
        };
        species.adjust_fitness(&config, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(species.organisms()[0].fitness(), 3.0);

        species.organisms[0].set_fitness(1.0);
        species.age = 11;
        species.adjust_fitness(&config, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(species.organisms()[0].fitness(), 1.0);
    }

    #[test]
    fn non_finite_fitness_reads_as_zero() {
        let mut species = species_of(&[f32::NAN, 2.0, f32::INFINITY]);
        species.adjust_fitness(&config(), &mut ChaCha8Rng::seed_from_u64(0));

        let original: Vec<f32> = species
            .organisms()
            .iter()
            .map(|o| o.original_fitness())
            .collect();
        assert_eq!(original, vec![2.0, 0.0, 0.0]);
        assert_eq!(species.average_fitness(), 2.0 / 3.0);
        assert_eq!(species.max_fitness(), 2.0);
        assert!(species.organisms().iter().all(|o| o.fitness().is_finite()));
    }

    #[test]
    fn empty_species_are_left_alone() {
        let mut species = species_of(&[1.0]);
        species.organisms.clear();
        species.adjust_fitness(&config(), &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(species.average_fitness(), 0.0);
    }

    #[test]
    fn picks_favour_the_front() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut counts = [0; 4];
        for _ in 0..4000 {
            counts[Species::pick(4, &mut rng).unwrap()] += 1;
        }
        // Index 2 is only reached by deviates rounding to -2 or below.
        assert!(counts[0] > counts[2]);
        assert!(counts[1] > counts[2]);
        assert!(counts[3] > counts[2]);
        assert_eq!(Species::pick(1, &mut rng), Some(0));
    }
}
