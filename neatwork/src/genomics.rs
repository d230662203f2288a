//! A Genome is the mutable genotype of a candidate
//! solution: a [`Network`] together with the operators
//! that grow and perturb it.
//!
//! Every operator that adds structure draws its identifiers
//! from an [`InnovationCounter`], and every stochastic
//! operator takes its generator explicitly.
mod config;
mod errors;
mod innovation;

pub use config::GeneticConfig;
pub use errors::ConfigError;
pub(crate) use errors::{non_negative, positive, probability};
pub use innovation::InnovationCounter;

use crate::networks::{is_recurrent, Network, Neuron, NeuronType, Synapse};
use crate::{Innovation, NeuronId};

use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Genomes are the focus of evolution in NEAT.
/// Each wraps exactly one network, which is copied
/// along with the genome and never shared.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    network: Network,
}

impl Genome {
    /// Returns a genome wrapping an empty network.
    pub fn new() -> Genome {
        Genome::default()
    }

    /// Returns the wrapped network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns the wrapped network mutably.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Unwraps the genome into its network.
    pub fn into_network(self) -> Network {
        self.network
    }

    /// Returns an independent copy of the genome.
    pub fn copy(&self) -> Genome {
        Genome {
            network: self.network.copy(),
        }
    }

    /// Returns the weights of all synapses,
    /// in ascending innovation order.
    pub fn weights(&self) -> Vec<f32> {
        self.network.synapses().map(Synapse::weight).collect()
    }

    /// Induces a _neuron addition mutation_: a random enabled
    /// synapse `a -> b` is disabled and replaced by a new hidden
    /// neuron `n` with synapses `a -> n` (weight 1) and `n -> b`
    /// (the old weight). Returns the new neuron's id, or `None`
    /// if the genome has no enabled synapse to split.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{Genome, InnovationCounter, NetworkFactory};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut counter = InnovationCounter::new();
    /// let mut genome = Genome::from(NetworkFactory::build(&mut counter, 2, 1));
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// assert_eq!(genome.mutate_add_node(&mut counter, &mut rng), Some(4));
    /// assert_eq!(genome.network().neuron_count(), 4);
    /// assert_eq!(genome.network().synapse_count(), 4);
    /// assert_eq!(genome.network().enabled_synapses().count(), 3);
    ///
    /// assert_eq!(Genome::new().mutate_add_node(&mut counter, &mut rng), None);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        counter: &mut InnovationCounter,
        rng: &mut R,
    ) -> Option<NeuronId> {
        let (split, from, to, weight) = self
            .network
            .enabled_synapses()
            .choose(rng)
            .map(|s| (s.innovation(), s.from(), s.to(), s.weight()))?;

        if let Some(synapse) = self.network.synapse_mut(split) {
            synapse.disable();
        }
        let neuron = counter.next_neuron();
        self.network.insert_neuron(Neuron::new(neuron, NeuronType::Hidden));
        self.network.insert_synapse(Synapse::new(counter.next_innovation(), from, neuron, 1.0));
        self.network.insert_synapse(Synapse::new(counter.next_innovation(), neuron, to, weight));

        Some(neuron)
    }

    /// Induces a _synapse addition mutation_, trying up to
    /// [`add_connection_tries`] random neuron pairs. The source
    /// is any non-output neuron, the target any non-input neuron
    /// other than the source. A pair is rejected if the two are
    /// already connected or, under [`feed_forward_only`], if the
    /// new synapse would close a cycle.
    ///
    /// Returns the new synapse's innovation number, or `None`
    /// if no valid pair was found.
    ///
    /// [`add_connection_tries`]: GeneticConfig::add_connection_tries
    /// [`feed_forward_only`]: GeneticConfig::feed_forward_only
    pub fn mutate_add_synapse<R: Rng + ?Sized>(
        &mut self,
        config: &GeneticConfig,
        counter: &mut InnovationCounter,
        rng: &mut R,
    ) -> Option<Innovation> {
        let sources: Vec<NeuronId> = self
            .network
            .neurons()
            .filter(|n| !n.is_output())
            .map(Neuron::id)
            .collect();
        let targets: Vec<NeuronId> = self
            .network
            .neurons()
            .filter(|n| !n.is_input())
            .map(Neuron::id)
            .collect();

        for _ in 0..config.add_connection_tries {
            let from = *sources.choose(rng)?;
            let to = match targets.iter().filter(|&&t| t != from).choose(rng) {
                Some(to) => *to,
                None => continue,
            };

            if self.network.connection_exists(from, to)
                || (config.feed_forward_only && is_recurrent(from, to, &self.network))
            {
                continue;
            }

            let innovation = counter.next_innovation();
            let weight = random_weight(config.mutation_power, rng);
            self.network.insert_synapse(Synapse::new(innovation, from, to, weight));
            return Some(innovation);
        }

        None
    }

    /// Induces a _weight mutation_. For every synapse a
    /// perturbation is drawn from `[-mutation_power, mutation_power]`;
    /// enabled synapses are then nudged by it with chance
    /// [`genome_weight_perturbed`], or have their weight replaced
    /// by it otherwise.
    ///
    /// [`genome_weight_perturbed`]: GeneticConfig::genome_weight_perturbed
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Genome, InnovationCounter, NetworkFactory};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     mutation_power: 0.5,
    ///     genome_weight_perturbed: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = Genome::from(NetworkFactory::build(&mut InnovationCounter::new(), 2, 1));
    /// assert_eq!(genome.weights(), vec![1.0, 1.0]);
    ///
    /// genome.mutate_weights(&config, &mut ChaCha8Rng::seed_from_u64(3));
    /// assert!(genome.weights().iter().all(|w| (0.5..=1.5).contains(w)));
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for synapse in self.network.synapses_mut() {
            let perturbation = random_weight(config.mutation_power, rng);
            if synapse.enabled() {
                let weight = if rng.gen::<f32>() < config.genome_weight_perturbed {
                    synapse.weight() + perturbation
                } else {
                    perturbation
                };
                synapse.set_weight(weight);
            }
        }
    }

    /// Picks `times` random synapses and toggles them.
    /// An enabled synapse is disabled only if its source neuron
    /// keeps another enabled outgoing synapse. A disabled synapse
    /// is re-enabled unless another enabled synapse already joins
    /// the same two neurons.
    ///
    /// Returns the number of synapses actually toggled.
    pub fn mutate_toggle_enable<R: Rng + ?Sized>(&mut self, times: usize, rng: &mut R) -> usize {
        let mut toggled = 0;
        for _ in 0..times {
            let (innovation, (from, to), enabled) = match self.network.synapses().choose(rng) {
                Some(s) => (s.innovation(), s.endpoints(), s.enabled()),
                None => break,
            };

            let toggle = if enabled {
                self.has_other_enabled_output(from, innovation)
            } else {
                !self.network.enabled_connection_exists(from, to)
            };
            if toggle {
                if let Some(synapse) = self.network.synapse_mut(innovation) {
                    if enabled {
                        synapse.disable();
                    } else {
                        synapse.enable();
                    }
                    toggled += 1;
                }
            }
        }
        toggled
    }

    fn has_other_enabled_output(&self, neuron: NeuronId, except: Innovation) -> bool {
        self.network.neuron(neuron).map_or(false, |n| {
            n.output_synapses()
                .iter()
                .filter(|&&innovation| innovation != except)
                .filter_map(|&innovation| self.network.synapse(innovation))
                .any(Synapse::enabled)
        })
    }

    /// Re-enables the disabled synapse with the lowest
    /// innovation number, returning it if one was found.
    /// Synapses whose endpoints are already joined by an
    /// enabled synapse are passed over.
    pub fn re_enable_gene(&mut self) -> Option<Innovation> {
        let innovation = self
            .network
            .synapses()
            .find(|s| !s.enabled() && !self.network.enabled_connection_exists(s.from(), s.to()))
            .map(Synapse::innovation)?;
        self.network.synapse_mut(innovation)?.enable();
        Some(innovation)
    }

    /// Applies a random round of mutations.
    ///
    /// With chance [`mutate_add_node_probability`] a neuron is
    /// added; failing that, with chance
    /// [`mutate_add_connection_probability`] a synapse is added.
    /// If neither happened, weight mutation, toggling and
    /// re-enabling are each rolled for independently.
    ///
    /// [`mutate_add_node_probability`]: GeneticConfig::mutate_add_node_probability
    /// [`mutate_add_connection_probability`]: GeneticConfig::mutate_add_connection_probability
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        config: &GeneticConfig,
        counter: &mut InnovationCounter,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < config.mutate_add_node_probability {
            self.mutate_add_node(counter, rng);
        } else if rng.gen::<f32>() < config.mutate_add_connection_probability {
            self.mutate_add_synapse(config, counter, rng);
        } else {
            if rng.gen::<f32>() < config.mutate_connection_weights_probability {
                self.mutate_weights(config, rng);
            }
            if rng.gen::<f32>() < config.mutate_toggle_enable_probability {
                self.mutate_toggle_enable(1, rng);
            }
            if rng.gen::<f32>() < config.re_enable_gene_probability {
                self.re_enable_gene();
            }
        }
    }

    /// Computes the compatibility distance between two genomes.
    ///
    /// The difference in synapse counts is taken as the number
    /// of excess genes, and the remaining unmatched innovations
    /// as disjoint genes. Both are normalized by the larger synapse
    /// count, and the mean absolute weight difference of matching
    /// genes is added on top.
    ///
    /// Symmetric, and exactly 0 for identical genomes.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{GeneticConfig, Genome, InnovationCounter, NetworkFactory};
    ///
    /// let config = GeneticConfig::default();
    /// let mut counter = InnovationCounter::new();
    /// let first = Genome::from(NetworkFactory::build(&mut counter, 2, 1));
    /// let second = Genome::from(NetworkFactory::build(&mut counter, 2, 1));
    ///
    /// assert_eq!(Genome::compatibility(&first, &first.copy(), &config), 0.0);
    /// // No innovation in common: 4 disjoint genes over 2 synapses.
    /// assert_eq!(Genome::compatibility(&first, &second, &config), 2.0);
    /// ```
    pub fn compatibility(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        let (first, second) = (&first.network, &second.network);

        let excess = first.synapse_count().abs_diff(second.synapse_count());
        let mut unmatched = 0;
        let mut matching = vec![];
        // Ascending innovation order keeps the result
        // bit-for-bit identical when the arguments are swapped.
        for synapse in first.synapses() {
            match second.synapse(synapse.innovation()) {
                Some(other) => matching.push((synapse.weight() - other.weight()).abs()),
                None => unmatched += 1,
            }
        }
        unmatched += second
            .synapses()
            .filter(|s| first.synapse(s.innovation()).is_none())
            .count();
        let disjoint = unmatched - excess;
        let normalizer = first.synapse_count().max(second.synapse_count()).max(1) as f32;

        (excess as f32 * config.excess_coefficient + disjoint as f32 * config.disjoint_coefficient)
            / normalizer
            + mean(&matching) * config.weight_difference_coefficient
    }
}

impl From<Network> for Genome {
    fn from(network: Network) -> Self {
        Genome { network }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome [{}]", self.network)
    }
}

/// Draws a weight uniformly from `[-power, power]`.
pub(crate) fn random_weight<R: Rng + ?Sized>(power: f32, rng: &mut R) -> f32 {
    if power > 0.0 && power.is_finite() {
        rng.gen_range(-power..=power)
    } else {
        0.0
    }
}

/// Mean of `values`, or 0 if there are none.
fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::NetworkFactory;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn factory_genome(counter: &mut InnovationCounter) -> Genome {
        Genome::from(NetworkFactory::build(counter, 2, 1))
    }

    /// 1 -> 3 -> 2, with no direct synapse from 1 to 2.
    fn split_genome() -> Genome {
        let mut network = Network::new();
        network.add_neuron(Neuron::new(1, NeuronType::Input)).unwrap();
        network.add_neuron(Neuron::new(2, NeuronType::Output)).unwrap();
        network.add_neuron(Neuron::new(3, NeuronType::Hidden)).unwrap();
        network.add_synapse(Synapse::new(1, 1, 3, 1.0)).unwrap();
        network.add_synapse(Synapse::new(2, 3, 2, 1.0)).unwrap();
        Genome::from(network)
    }

    #[test]
    fn add_node_splits_a_synapse() {
        let mut counter = InnovationCounter::new();
        let mut genome = factory_genome(&mut counter);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        genome.network_mut().synapse_mut(1).unwrap().set_weight(0.3);
        genome.network_mut().synapse_mut(2).unwrap().set_weight(0.3);

        let neuron = genome.mutate_add_node(&mut counter, &mut rng).unwrap();

        let disabled: Vec<_> = genome.network().synapses().filter(|s| !s.enabled()).collect();
        assert_eq!(disabled.len(), 1);
        let (from, to) = disabled[0].endpoints();
        let incoming = genome.network().synapse(3).unwrap();
        let outgoing = genome.network().synapse(4).unwrap();
        assert_eq!(incoming.endpoints(), (from, neuron));
        assert_eq!(incoming.weight(), 1.0);
        assert_eq!(outgoing.endpoints(), (neuron, to));
        assert_eq!(outgoing.weight(), 0.3);
    }

    #[test]
    fn add_node_ignores_disabled_synapses() {
        let mut counter = InnovationCounter::new();
        let mut genome = factory_genome(&mut counter);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        genome.network_mut().synapse_mut(1).unwrap().disable();

        genome.mutate_add_node(&mut counter, &mut rng);
        assert!(!genome.network().synapse(2).unwrap().enabled());

        genome.network_mut().synapse_mut(3).unwrap().disable();
        genome.network_mut().synapse_mut(4).unwrap().disable();
        assert_eq!(genome.mutate_add_node(&mut counter, &mut rng), None);
        assert_eq!(genome.network().synapse_count(), 4);
    }

    #[test]
    fn add_synapse_on_fully_connected_network() {
        let config = GeneticConfig::default();
        let mut counter = InnovationCounter::new();
        let mut genome = factory_genome(&mut counter);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert_eq!(genome.mutate_add_synapse(&config, &mut counter, &mut rng), None);
        assert_eq!(genome.network().synapse_count(), 2);
    }

    #[test]
    fn add_synapse_finds_the_free_pair() {
        let config = GeneticConfig {
            add_connection_tries: 200,
            mutation_power: 1.0,
            feed_forward_only: true,
            ..GeneticConfig::zero()
        };
        let mut counter = InnovationCounter::new();
        let mut genome = split_genome();
        counter.observe(genome.network());
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let innovation = genome
            .mutate_add_synapse(&config, &mut counter, &mut rng)
            .unwrap();
        let synapse = genome.network().synapse(innovation).unwrap();
        assert_eq!(innovation, 3);
        assert_eq!(synapse.endpoints(), (1, 2));
        assert!(synapse.weight().abs() <= 1.0);
        assert_eq!(genome.mutate_add_synapse(&config, &mut counter, &mut rng), None);
    }

    #[test]
    fn add_synapse_respects_feed_forward_only() {
        let config = GeneticConfig {
            add_connection_tries: 100,
            mutation_power: 1.0,
            feed_forward_only: true,
            ..GeneticConfig::zero()
        };
        let mut counter = InnovationCounter::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut genome = factory_genome(&mut counter);
        for _ in 0..5 {
            genome.mutate_add_node(&mut counter, &mut rng);
        }
        for _ in 0..20 {
            genome.mutate_add_synapse(&config, &mut counter, &mut rng);
        }

        let network = genome.network();
        assert!(network.synapse_count() > 7);
        for synapse in network.synapses() {
            // No path may lead from the synapse's target back to its source.
            assert!(!is_recurrent(synapse.from(), synapse.to(), network));
        }
    }

    #[test]
    fn weights_are_replaced() {
        let config = GeneticConfig {
            mutation_power: 0.5,
            genome_weight_perturbed: 0.0,
            ..GeneticConfig::zero()
        };
        let mut counter = InnovationCounter::new();
        let mut genome = factory_genome(&mut counter);
        genome.network_mut().synapse_mut(2).unwrap().disable();

        genome.mutate_weights(&config, &mut ChaCha8Rng::seed_from_u64(6));
        let weights = genome.weights();
        assert!((-0.5..=0.5).contains(&weights[0]));
        assert_eq!(weights[1], 1.0);
    }

    #[test]
    fn toggling_never_strands_a_neuron() {
        let mut counter = InnovationCounter::new();
        // Each input has a single outgoing synapse.
        let mut genome = factory_genome(&mut counter);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(genome.mutate_toggle_enable(10, &mut rng), 0);
        assert!(genome.network().synapses().all(Synapse::enabled));

        genome.network_mut().synapse_mut(1).unwrap().disable();
        assert!(genome.mutate_toggle_enable(50, &mut rng) >= 1);
        assert!(genome.network().synapse(1).unwrap().enabled());
    }

    #[test]
    fn toggling_disables_redundant_outputs() {
        let mut counter = InnovationCounter::new();
        // One input feeding two outputs.
        let mut genome = Genome::from(NetworkFactory::build(&mut counter, 1, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        assert_eq!(genome.mutate_toggle_enable(1, &mut rng), 1);
        assert_eq!(genome.network().enabled_synapses().count(), 1);
    }

    #[test]
    fn re_enabling_picks_the_oldest_gene() {
        let mut counter = InnovationCounter::new();
        let mut genome = Genome::from(NetworkFactory::build(&mut counter, 3, 1));
        assert_eq!(genome.re_enable_gene(), None);

        genome.network_mut().synapse_mut(3).unwrap().disable();
        genome.network_mut().synapse_mut(2).unwrap().disable();
        assert_eq!(genome.re_enable_gene(), Some(2));
        assert_eq!(genome.re_enable_gene(), Some(3));
        assert_eq!(genome.re_enable_gene(), None);
    }

    #[test]
    fn mutate_only_adds_structure_when_asked() {
        let config = GeneticConfig {
            mutate_add_node_probability: 1.0,
            ..GeneticConfig::default()
        };
        let mut counter = InnovationCounter::new();
        let mut genome = factory_genome(&mut counter);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        genome.mutate(&config, &mut counter, &mut rng);
        assert_eq!(genome.network().neuron_count(), 4);

        let config = GeneticConfig {
            mutate_add_node_probability: 0.0,
            mutate_add_connection_probability: 0.0,
            mutate_connection_weights_probability: 0.0,
            mutate_toggle_enable_probability: 0.0,
            re_enable_gene_probability: 0.0,
            ..GeneticConfig::default()
        };
        let before = genome.clone();
        genome.mutate(&config, &mut counter, &mut rng);
        assert_eq!(genome, before);
    }

    #[test]
    fn compatibility_is_symmetric() {
        let config = GeneticConfig::default();
        let mut counter = InnovationCounter::new();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let first = factory_genome(&mut counter);
        let mut second = first.copy();
        second.mutate_add_node(&mut counter, &mut rng);
        second.mutate_weights(&config, &mut rng);

        let forward = Genome::compatibility(&first, &second, &config);
        let backward = Genome::compatibility(&second, &first, &config);
        assert!(forward > 0.0);
        assert_eq!(forward, backward);
    }

    #[test]
    fn compatibility_with_empty_genomes() {
        let config = GeneticConfig::default();
        assert_eq!(Genome::compatibility(&Genome::new(), &Genome::new(), &config), 0.0);

        let mut counter = InnovationCounter::new();
        let genome = factory_genome(&mut counter);
        // Two excess genes over two synapses.
        assert_eq!(Genome::compatibility(&genome, &Genome::new(), &config), 1.0);
    }
}
