//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Candidate solutions are [`Network`]s: directed graphs of [`Neuron`]s
//! joined by weighted [`Synapse`]s, each synapse tagged with the innovation
//! number under which it first appeared. A [`Genome`] wraps a network and
//! mutates it, an [`Organism`] adds the evolutionary bookkeeping, and a
//! [`Population`] groups organisms into [`Species`] and breeds them,
//! generation after generation, against a host-supplied fitness function.
//!
//! Networks activate in a single pass: inputs are written directly into the
//! input neurons, hidden neurons fire in id order, and outputs are read last.
//! Recurrent connections are allowed (unless disabled through
//! [`GeneticConfig::feed_forward_only`]) and read the previous activation of
//! their source neuron; the network is never iterated to a fixed point.
//!
//! # Example usage: evolving an XOR approximator
//! ```
//! use neatwork::{
//!     GeneticConfig, Genome, NetworkFactory, Organism, Population, PopulationConfig, RunError,
//! };
//! use std::num::NonZeroUsize;
//!
//! let population_config = PopulationConfig {
//!     population_size: NonZeroUsize::new(50).unwrap(),
//!     fitness_threshold: 0.9,
//!     ..PopulationConfig::default()
//! };
//! let mut population =
//!     Population::with_seed(population_config, GeneticConfig::default(), 42).unwrap();
//!
//! // Two inputs plus a bias neuron, one output, fully connected.
//! let network = NetworkFactory::build_with_bias(population.innovations_mut(), 2, 1);
//! population.populate(Organism::new(Genome::from(network)));
//!
//! let result = population.run(20, None, |mut candidate| {
//!     let cases = [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)];
//!     let error: f32 = cases
//!         .iter()
//!         .map(|([a, b], expected)| {
//!             let output = candidate.network.activate(&[*a, *b, 1.0]).unwrap()[0];
//!             (output - expected).abs().min(1.0)
//!         })
//!         .sum();
//!     (4.0 - error) / 4.0
//! });
//!
//! match result {
//!     Ok(champion) => assert!(champion.fitness() >= 0.9),
//!     Err(RunError::BudgetExhausted { generations, .. }) => assert_eq!(generations, 20),
//!     Err(e) => panic!("{}", e),
//! }
//! ```

pub mod genomics;
pub mod networks;
pub mod populations;
pub mod rng;

pub use genomics::{ConfigError, GeneticConfig, Genome, InnovationCounter};
pub use networks::{
    is_recurrent, ActivationType, Network, NetworkError, NetworkFactory, Neuron, NeuronType,
    Synapse,
};
pub use populations::{
    logging, Candidate, EvolutionError, Organism, Population, PopulationConfig, RunError,
    Species, SpeciesId,
};
pub use rng::{Coin, RngCoin};

/// Identifier type used to designate historically
/// identical synapses for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier of a neuron. Unique within a network, and
/// shared by the copies of that neuron inherited by descendants.
pub type NeuronId = usize;
