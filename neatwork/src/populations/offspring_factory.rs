use super::*;
use crate::rng::RngCoin;

/// Species elitism applies only to species allotted
/// more than this many offspring.
const ELITISM_MIN_OFFSPRING: usize = 5;
/// Attempts at finding a mate in another species.
const INTER_SPECIES_TRIES: usize = 5;

/// The population champion, when it heads its species,
/// and the number of clones it still has to produce.
#[derive(Debug, Clone, Copy)]
pub(super) struct SuperChampion {
    pub(super) species: usize,
    pub(super) remaining: usize,
}

/// Auxiliary type for offspring generation.
/// Breeds each species from a snapshot of the
/// survivors of the previous generation, placing
/// every child straight into its species.
pub(super) struct OffspringFactory<'a, R: Rng + ?Sized> {
    parents: &'a [Vec<Organism>],
    sorted_species: &'a [usize],
    species: &'a mut Vec<Species>,
    innovations: &'a mut InnovationCounter,
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
    super_champion: Option<SuperChampion>,
    generation: usize,
}

impl<'a, R: Rng + ?Sized> OffspringFactory<'a, R> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        parents: &'a [Vec<Organism>],
        sorted_species: &'a [usize],
        species: &'a mut Vec<Species>,
        innovations: &'a mut InnovationCounter,
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
        super_champion: Option<SuperChampion>,
        generation: usize,
    ) -> OffspringFactory<'a, R> {
        OffspringFactory {
            parents,
            sorted_species,
            species,
            innovations,
            genetic_config,
            population_config,
            rng,
            super_champion,
            generation,
        }
    }

    /// Produces the offspring allotted to the species at `index`.
    ///
    /// Each child is, in order of precedence: a clone of the
    /// population champion while it has clones left, the
    /// species champion unchanged (once, for species allotted
    /// more than 5 offspring), a mutated clone of a random
    /// survivor, or the child of two mated survivors.
    pub(super) fn reproduce(&mut self, index: usize) {
        let all_parents = self.parents;
        let parents = &all_parents[index];
        let expected = self.species[index].expected_offspring;
        if parents.is_empty() {
            return;
        }

        let champion = &parents[0];
        let mut champion_added = false;

        for _ in 0..expected {
            let child = match self.super_champion.as_mut() {
                Some(super_champion)
                    if super_champion.species == index && super_champion.remaining > 0 =>
                {
                    let mut child = champion.offspring(self.generation);
                    if super_champion.remaining == 1 {
                        child
                            .genome_mut()
                            .mutate(self.genetic_config, self.innovations, self.rng);
                    }
                    super_champion.remaining -= 1;
                    child
                }
                _ if !champion_added && expected > ELITISM_MIN_OFFSPRING => {
                    champion_added = true;
                    champion.offspring(self.generation)
                }
                _ if self.rng.gen::<f32>() < self.population_config.mutate_only_probability => {
                    let parent = &parents[self.rng.gen_range(0..parents.len())];
                    let mut child = parent.offspring(self.generation);
                    child
                        .genome_mut()
                        .mutate(self.genetic_config, self.innovations, self.rng);
                    child
                }
                _ => self.mate(index, parents),
            };

            Organism::speciate(
                child,
                self.population_config,
                self.genetic_config,
                self.species,
                self.generation,
            );
        }

        debug!(
            species = ?self.species[index].id(),
            parents = parents.len(),
            offspring = expected,
            "species reproduced"
        );
    }

    /// Mates a random survivor with a mate from the same
    /// species or, rarely, with the champion of another.
    fn mate(&mut self, index: usize, parents: &'a [Organism]) -> Organism {
        let mom = &parents[self.rng.gen_range(0..parents.len())];
        let dad = if self.rng.gen::<f32>() > self.population_config.inter_species_mate_rate {
            &parents[self.rng.gen_range(0..parents.len())]
        } else {
            self.foreign_champion(index)
        };

        let mut child = Organism::crossover(
            dad,
            mom,
            self.genetic_config,
            &mut RngCoin::new(&mut *self.rng),
        );
        child.generation = self.generation;

        if self.rng.gen::<f32>() < self.population_config.mutate_only_probability
            || Genome::compatibility(mom.genome(), dad.genome(), self.genetic_config) == 0.0
        {
            child
                .genome_mut()
                .mutate(self.genetic_config, self.innovations, self.rng);
        }
        child
    }

    /// Picks the champion of another species, biased towards
    /// the fittest ones. Falls back to the species' own
    /// champion if none is found in a few attempts.
    fn foreign_champion(&mut self, index: usize) -> &'a Organism {
        let all_parents = self.parents;
        let mut chosen = index;
        for _ in 0..INTER_SPECIES_TRIES {
            if chosen != index {
                break;
            }
            if let Some(pick) = Species::pick(self.sorted_species.len(), self.rng) {
                let candidate = self.sorted_species[pick];
                if !all_parents[candidate].is_empty() {
                    chosen = candidate;
                }
            }
        }
        &all_parents[chosen][0]
    }
}
