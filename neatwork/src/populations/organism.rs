use super::{PopulationConfig, Species, SpeciesId};
use crate::genomics::{GeneticConfig, Genome};
use crate::networks::{is_recurrent, Network};
use crate::rng::Coin;
use crate::{Innovation, NeuronId};

use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::BTreeSet;

/// Organisms are genomes together with the
/// bookkeeping evolution needs: fitness, species
/// membership, generation and allotted offspring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    genome: Genome,
    pub(super) fitness: f32,
    pub(super) original_fitness: f32,
    pub(super) generation: usize,
    pub(super) expected_offspring: usize,
    pub(super) kill: bool,
    pub(super) species: Option<SpeciesId>,
}

impl Organism {
    /// Returns an organism of generation 0 with
    /// zero fitness and no species.
    pub fn new(genome: Genome) -> Organism {
        Organism {
            genome,
            fitness: 0.0,
            original_fitness: 0.0,
            generation: 0,
            expected_offspring: 0,
            kill: false,
            species: None,
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub(super) fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    /// Shorthand for the genome's network.
    pub fn network(&self) -> &Network {
        self.genome.network()
    }

    /// Returns the organism's current fitness.
    /// Between fitness adjustment and the end of the
    /// epoch this is the shared, adjusted value.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Current fitness, with anything that is not
    /// a finite number read as 0.
    pub(super) fn raw_fitness(&self) -> f32 {
        if self.fitness.is_finite() {
            self.fitness
        } else {
            0.0
        }
    }

    /// Returns the fitness recorded before the last adjustment.
    pub fn original_fitness(&self) -> f32 {
        self.original_fitness
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn expected_offspring(&self) -> usize {
        self.expected_offspring
    }

    /// Whether the organism was left out of
    /// the survivors at the last adjustment.
    pub fn kill(&self) -> bool {
        self.kill
    }

    /// Returns the ID of the species the organism
    /// was placed in, if any.
    pub fn species(&self) -> Option<SpeciesId> {
        self.species
    }

    /// Returns an independent copy of the organism,
    /// bookkeeping included.
    pub fn copy(&self) -> Organism {
        Organism {
            genome: self.genome.copy(),
            ..self.clone()
        }
    }

    /// Returns a copy of the organism's genome as
    /// a fresh organism of the specified generation.
    pub(super) fn offspring(&self, generation: usize) -> Organism {
        Organism {
            generation,
            ..Organism::new(self.genome.copy())
        }
    }

    /// Mates two organisms.
    ///
    /// The fitter parent is the one with strictly higher
    /// fitness (`first` on ties). Neurons and synapses present
    /// in both parents are taken from the fitter one when
    /// `coin` lands `true`, and from the other otherwise; those
    /// present in only one parent are always inherited. Genes
    /// are processed in ascending id order, so a fixed coin gives
    /// a reproducible child.
    ///
    /// Under [`feed_forward_only`], a synapse that would close a
    /// cycle in the child is left out. A synapse duplicating the
    /// endpoints of an already inherited enabled synapse is
    /// inherited disabled.
    ///
    /// [`feed_forward_only`]: GeneticConfig::feed_forward_only
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Genome, InnovationCounter, NetworkFactory, Organism};
    ///
    /// let mut counter = InnovationCounter::new();
    /// let first = Organism::new(Genome::from(NetworkFactory::build(&mut counter, 2, 1)));
    /// let mut second = first.copy();
    /// second.set_fitness(1.0);
    ///
    /// // Matching genes always come from the less fit parent.
    /// let child = Organism::crossover(&first, &second, &GeneticConfig::default(), &mut || false);
    /// assert_eq!(child.network().describe_synapses(), "1:1->3 2:2->3");
    /// assert_eq!(child.fitness(), 0.0);
    /// assert_eq!(child.species(), None);
    /// ```
    pub fn crossover<C: Coin + ?Sized>(
        first: &Organism,
        second: &Organism,
        config: &GeneticConfig,
        coin: &mut C,
    ) -> Organism {
        let (more_fit, less_fit) = if second.fitness > first.fitness {
            (second.network(), first.network())
        } else {
            (first.network(), second.network())
        };

        let mut child = Network::new();

        let neuron_ids: BTreeSet<NeuronId> = more_fit
            .neurons()
            .chain(less_fit.neurons())
            .map(|n| n.id())
            .collect();
        for id in neuron_ids {
            let neuron = match (more_fit.neuron(id), less_fit.neuron(id)) {
                (Some(more), Some(less)) => {
                    if coin.flip() {
                        more
                    } else {
                        less
                    }
                }
                (Some(neuron), None) | (None, Some(neuron)) => neuron,
                (None, None) => continue,
            };
            child.insert_neuron(neuron.detached());
        }

        let innovations: BTreeSet<Innovation> = more_fit
            .synapses()
            .chain(less_fit.synapses())
            .map(|s| s.innovation())
            .collect();
        for innovation in innovations {
            let synapse = match (more_fit.synapse(innovation), less_fit.synapse(innovation)) {
                (Some(more), Some(less)) => {
                    if coin.flip() {
                        more
                    } else {
                        less
                    }
                }
                (Some(synapse), None) | (None, Some(synapse)) => synapse,
                (None, None) => continue,
            };
            let (from, to) = synapse.endpoints();
            if config.feed_forward_only && is_recurrent(from, to, &child) {
                continue;
            }

            let mut synapse = synapse.clone();
            if synapse.enabled() && child.enabled_connection_exists(from, to) {
                synapse.disable();
            }
            child.insert_synapse(synapse);
        }

        Organism::new(Genome::from(child))
    }

    /// Places `organism` in the first species whose specimen
    /// is within the compatibility threshold, skipping species
    /// with no members. If none is, a new species is created
    /// for it, identified by `generation` and the number of
    /// species already born in that generation.
    ///
    /// Returns the ID of the species the organism joined.
    pub fn speciate(
        organism: Organism,
        population_config: &PopulationConfig,
        genetic_config: &GeneticConfig,
        species: &mut Vec<Species>,
        generation: usize,
    ) -> SpeciesId {
        let threshold = population_config.compatibility_threshold;
        if let Some(compatible) = species.iter_mut().find(|s| {
            !s.organisms.is_empty()
                && Genome::compatibility(&organism.genome, s.specimen(), genetic_config)
                    < threshold
        }) {
            compatible.add_organism(organism);
            return compatible.id();
        }

        let born = species.iter().filter(|s| s.id().0 == generation).count();
        let id = SpeciesId(generation, born);
        debug!(species = ?id, "new species");
        species.push(Species::new(id, organism));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::InnovationCounter;
    use crate::networks::{NetworkFactory, Neuron, NeuronType, Synapse};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn organism(network: Network, fitness: f32) -> Organism {
        let mut organism = Organism::new(Genome::from(network));
        organism.set_fitness(fitness);
        organism
    }

    #[test]
    fn the_coin_picks_between_matching_genes() {
        let mut counter = InnovationCounter::new();
        let network = NetworkFactory::build(&mut counter, 2, 1);
        let mut heavy = network.clone();
        for synapse in heavy.synapses_mut() {
            synapse.set_weight(5.0);
        }
        let fitter = organism(heavy, 2.0);
        let weaker = organism(network, 1.0);
        let config = GeneticConfig::default();

        let child = Organism::crossover(&weaker, &fitter, &config, &mut || true);
        assert_eq!(child.genome().weights(), vec![5.0, 5.0]);
        let child = Organism::crossover(&weaker, &fitter, &config, &mut || false);
        assert_eq!(child.genome().weights(), vec![1.0, 1.0]);
    }

    #[test]
    fn ties_favour_the_first_parent() {
        let mut counter = InnovationCounter::new();
        let network = NetworkFactory::build(&mut counter, 2, 1);
        let mut heavy = network.clone();
        for synapse in heavy.synapses_mut() {
            synapse.set_weight(5.0);
        }
        let first = organism(heavy, 1.0);
        let second = organism(network, 1.0);

        let child = Organism::crossover(&first, &second, &GeneticConfig::default(), &mut || true);
        assert_eq!(child.genome().weights(), vec![5.0, 5.0]);
        assert_eq!(child.fitness(), 0.0);
        assert_eq!(child.species(), None);
    }

    #[test]
    fn children_are_never_aliased() {
        let mut counter = InnovationCounter::new();
        let first = organism(NetworkFactory::build(&mut counter, 2, 1), 1.0);
        let second = first.copy();
        let config = GeneticConfig::default();
        let mut child = Organism::crossover(&first, &second, &config, &mut || true);

        child.genome_mut().network_mut().synapse_mut(1).unwrap().set_weight(-3.0);
        assert_eq!(first.genome().weights(), vec![1.0, 1.0]);
        assert_eq!(second.genome().weights(), vec![1.0, 1.0]);
    }

    #[test]
    fn cycles_are_left_out_when_feed_forward_only() {
        // Parent A: 1 -> 3 -> 4 -> 2. Parent B: 1 -> 3 -> 2, 1 -> 4 -> 3 (innovation 9).
        let mut a = Network::new();
        let mut b = Network::new();
        for network in [&mut a, &mut b] {
            network.add_neuron(Neuron::new(1, NeuronType::Input)).unwrap();
            network.add_neuron(Neuron::new(2, NeuronType::Output)).unwrap();
            network.add_neuron(Neuron::new(3, NeuronType::Hidden)).unwrap();
            network.add_neuron(Neuron::new(4, NeuronType::Hidden)).unwrap();
            network.add_synapse(Synapse::new(1, 1, 3, 1.0)).unwrap();
        }
        a.add_synapse(Synapse::new(2, 3, 4, 1.0)).unwrap();
        a.add_synapse(Synapse::new(3, 4, 2, 1.0)).unwrap();
        b.add_synapse(Synapse::new(4, 3, 2, 1.0)).unwrap();
        b.add_synapse(Synapse::new(5, 1, 4, 1.0)).unwrap();
        b.add_synapse(Synapse::new(9, 4, 3, 1.0)).unwrap();

        let (a, b) = (organism(a, 1.0), organism(b, 1.0));
        let config = GeneticConfig {
            feed_forward_only: true,
            ..GeneticConfig::zero()
        };
        let child = Organism::crossover(&a, &b, &config, &mut || true);
        assert_eq!(child.network().describe_synapses(), "1:1->3 2:3->4 3:4->2 4:3->2 5:1->4");

        let config = GeneticConfig {
            feed_forward_only: false,
            ..config
        };
        let child = Organism::crossover(&a, &b, &config, &mut || true);
        assert_eq!(child.network().synapse_count(), 6);
    }

    #[test]
    fn duplicated_endpoints_stay_disabled() {
        let mut a = Network::new();
        a.add_neuron(Neuron::new(1, NeuronType::Input)).unwrap();
        a.add_neuron(Neuron::new(2, NeuronType::Output)).unwrap();
        let mut b = a.clone();
        a.add_synapse(Synapse::new(1, 1, 2, 1.0)).unwrap();
        b.add_synapse(Synapse::new(2, 1, 2, 1.0)).unwrap();

        let child = Organism::crossover(
            &organism(a, 1.0),
            &organism(b, 1.0),
            &GeneticConfig::default(),
            &mut || true,
        );
        assert_eq!(child.network().describe_synapses(), "1:1->2 2:1->2*");

        let mut genome = child.genome().copy();
        assert_eq!(genome.re_enable_gene(), None);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(genome.mutate_toggle_enable(20, &mut rng), 0);
        assert_eq!(genome.network().describe_synapses(), "1:1->2 2:1->2*");
        assert_eq!(genome.network_mut().activate(&[1.0]), Ok(vec![1.0]));

        // With both disabled, exactly one of them may come back.
        genome.network_mut().synapse_mut(1).unwrap().disable();
        let mut twin = genome.copy();
        assert_eq!(genome.re_enable_gene(), Some(1));
        assert_eq!(genome.re_enable_gene(), None);
        assert!(twin.mutate_toggle_enable(20, &mut rng) >= 1);
        assert_eq!(twin.network().enabled_synapses().count(), 1);
    }

    #[test]
    fn speciation_is_first_match() {
        let population_config = PopulationConfig {
            compatibility_threshold: 0.5,
            ..PopulationConfig::zero()
        };
        let genetic_config = GeneticConfig::default();
        let mut counter = InnovationCounter::new();
        let seed = Organism::new(Genome::from(NetworkFactory::build(&mut counter, 2, 1)));
        let mut species = vec![];

        let speciate = |organism: Organism, species: &mut Vec<Species>| {
            Organism::speciate(organism, &population_config, &genetic_config, species, 3)
        };

        let first = speciate(seed.copy(), &mut species);
        let second = speciate(seed.copy(), &mut species);
        assert_eq!(first, SpeciesId(3, 0));
        assert_eq!(second, SpeciesId(3, 0));

        let stranger = Organism::new(Genome::from(NetworkFactory::build(&mut counter, 2, 1)));
        let third = speciate(stranger, &mut species);
        assert_eq!(third, SpeciesId(3, 1));
        assert_eq!(species.len(), 2);
        assert_eq!(species[0].organisms().len(), 2);
        assert!(species
            .iter()
            .all(|s| s.organisms().iter().all(|o| o.species() == Some(s.id()))));
    }

    #[test]
    fn speciation_skips_empty_species() {
        let population_config = PopulationConfig {
            compatibility_threshold: 0.5,
            ..PopulationConfig::zero()
        };
        let genetic_config = GeneticConfig::default();
        let mut counter = InnovationCounter::new();
        let seed = Organism::new(Genome::from(NetworkFactory::build(&mut counter, 2, 1)));

        let mut emptied = Species::new(SpeciesId(2, 0), seed.copy());
        emptied.organisms.clear();
        let mut species = vec![emptied];

        let id = Organism::speciate(seed, &population_config, &genetic_config, &mut species, 3);
        assert_eq!(id, SpeciesId(3, 0));
        assert_eq!(species.len(), 2);
        assert!(species[0].organisms().is_empty());
        assert_eq!(species[1].organisms().len(), 1);
    }
}
