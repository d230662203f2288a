//! A Network is the executable graph evolved by
//! the algorithm: neurons keyed by id, synapses keyed
//! by innovation number.
//!
//! Neurons never hold references to their synapses, only
//! innovation numbers, so cloning a network yields a fully
//! independent graph with no shared state.
mod errors;
mod factory;
mod neurons;
mod synapses;

pub use errors::NetworkError;
pub use factory::NetworkFactory;
pub use neurons::{ActivationType, Neuron, NeuronType};
pub use synapses::Synapse;

use crate::{Innovation, NeuronId};
use neurons::saturate;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A directed, possibly recurrent, neural network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    neurons: BTreeMap<NeuronId, Neuron>,
    synapses: BTreeMap<Innovation, Synapse>,
    inputs: Vec<NeuronId>,
    outputs: Vec<NeuronId>,
    hidden: Vec<NeuronId>,
}

impl Network {
    /// Returns an empty network.
    pub fn new() -> Network {
        Network::default()
    }

    /// Adds a neuron to the network. Any synapse references
    /// held by the passed neuron are discarded; they are
    /// rebuilt as synapses get added.
    ///
    /// # Errors
    ///
    /// Fails if a neuron with the same id already exists.
    pub fn add_neuron(&mut self, neuron: Neuron) -> Result<(), NetworkError> {
        if self.neurons.contains_key(&neuron.id()) {
            return Err(NetworkError::DuplicateNeuron(neuron.id()));
        }
        self.insert_neuron(neuron.detached());
        Ok(())
    }

    /// Adds a synapse to the network, registering it with
    /// both of its endpoints.
    ///
    /// # Errors
    ///
    /// Fails if the innovation number is already taken,
    /// or if either endpoint is missing from the network.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{Network, NetworkError, Neuron, NeuronType, Synapse};
    ///
    /// let mut network = Network::new();
    /// network.add_neuron(Neuron::new(1, NeuronType::Input)).unwrap();
    /// network.add_neuron(Neuron::new(2, NeuronType::Output)).unwrap();
    ///
    /// assert!(network.add_synapse(Synapse::new(1, 1, 2, 0.5)).is_ok());
    /// assert_eq!(
    ///     network.add_synapse(Synapse::new(1, 1, 2, 0.5)),
    ///     Err(NetworkError::DuplicateSynapse(1)),
    /// );
    /// assert_eq!(
    ///     network.add_synapse(Synapse::new(2, 1, 3, 0.5)),
    ///     Err(NetworkError::MissingEndpoint { innovation: 2, neuron: 3 }),
    /// );
    /// ```
    pub fn add_synapse(&mut self, synapse: Synapse) -> Result<(), NetworkError> {
        if self.synapses.contains_key(&synapse.innovation()) {
            return Err(NetworkError::DuplicateSynapse(synapse.innovation()));
        }
        for neuron in [synapse.from(), synapse.to()] {
            if !self.neurons.contains_key(&neuron) {
                return Err(NetworkError::MissingEndpoint {
                    innovation: synapse.innovation(),
                    neuron,
                });
            }
        }
        self.insert_synapse(synapse);
        Ok(())
    }

    /// Inserts a neuron with no checks, filing it
    /// under the inputs, outputs or hidden neurons.
    pub(crate) fn insert_neuron(&mut self, neuron: Neuron) {
        let id = neuron.id();
        match neuron.neuron_type() {
            NeuronType::Bias | NeuronType::Input => self.inputs.push(id),
            NeuronType::Output => self.outputs.push(id),
            NeuronType::Hidden => {
                if let Err(i) = self.hidden.binary_search(&id) {
                    self.hidden.insert(i, id);
                }
            }
        }
        self.neurons.insert(id, neuron);
    }

    /// Inserts a synapse with no checks. Endpoints missing
    /// from the network are simply not linked.
    pub(crate) fn insert_synapse(&mut self, synapse: Synapse) {
        let innovation = synapse.innovation();
        if let Some(from) = self.neurons.get_mut(&synapse.from()) {
            from.outputs.push(innovation);
        }
        if let Some(to) = self.neurons.get_mut(&synapse.to()) {
            to.inputs.push(innovation);
        }
        self.synapses.insert(innovation, synapse);
    }

    /// Returns the neuron with the specified id, if any.
    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// Returns the synapse with the specified innovation number, if any.
    pub fn synapse(&self, innovation: Innovation) -> Option<&Synapse> {
        self.synapses.get(&innovation)
    }

    pub(crate) fn synapse_mut(&mut self, innovation: Innovation) -> Option<&mut Synapse> {
        self.synapses.get_mut(&innovation)
    }

    /// Iterates over all neurons in ascending id order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.neurons.values()
    }

    /// Iterates over all synapses, enabled or not,
    /// in ascending innovation order.
    pub fn synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses.values()
    }

    pub(crate) fn synapses_mut(&mut self) -> impl Iterator<Item = &mut Synapse> {
        self.synapses.values_mut()
    }

    /// Iterates over the enabled synapses in ascending innovation order.
    pub fn enabled_synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses.values().filter(|s| s.enabled())
    }

    /// Ids of the input neurons (bias included), in activation order.
    pub fn inputs(&self) -> &[NeuronId] {
        &self.inputs
    }

    /// Ids of the output neurons, in the order their
    /// values are returned by [`activate`](Network::activate).
    pub fn outputs(&self) -> &[NeuronId] {
        &self.outputs
    }

    /// Returns the number of neurons in the network.
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Returns the number of synapses in the network, disabled ones included.
    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Whether any synapse, enabled or not, leads from `from` to `to`.
    pub fn connection_exists(&self, from: NeuronId, to: NeuronId) -> bool {
        self.neurons.get(&from).map_or(false, |neuron| {
            neuron
                .outputs
                .iter()
                .filter_map(|innovation| self.synapses.get(innovation))
                .any(|synapse| synapse.to() == to)
        })
    }

    /// Whether an enabled synapse leads from `from` to `to`.
    pub(crate) fn enabled_connection_exists(&self, from: NeuronId, to: NeuronId) -> bool {
        self.neurons.get(&from).map_or(false, |neuron| {
            neuron
                .outputs
                .iter()
                .filter_map(|innovation| self.synapses.get(innovation))
                .any(|synapse| synapse.enabled() && synapse.to() == to)
        })
    }

    /// Activates the network once, returning the
    /// activation of each output neuron.
    ///
    /// Inputs are assigned directly as the activations of
    /// the input neurons (non-finite values are read as 0).
    /// Hidden neurons then fire in ascending id order, followed
    /// by the outputs. A synapse whose source has not fired yet
    /// in this pass carries that neuron's previous activation,
    /// so recurrent connections see the last pass's values.
    ///
    /// # Errors
    ///
    /// Fails if the number of inputs differs from the number
    /// of input neurons.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{InnovationCounter, NetworkError, NetworkFactory};
    ///
    /// let mut network = NetworkFactory::build(&mut InnovationCounter::new(), 2, 1);
    /// assert_eq!(network.activate(&[0.25, 0.5]), Ok(vec![0.75]));
    /// assert_eq!(network.activate(&[-1.0, 0.5]), Ok(vec![0.0]));
    /// assert_eq!(
    ///     network.activate(&[1.0]),
    ///     Err(NetworkError::InputLengthMismatch { expected: 2, actual: 1 }),
    /// );
    /// ```
    pub fn activate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        if inputs.len() != self.inputs.len() {
            return Err(NetworkError::InputLengthMismatch {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }

        for (id, value) in self.inputs.iter().zip(inputs) {
            if let Some(neuron) = self.neurons.get_mut(id) {
                neuron.activation = if value.is_finite() { *value } else { 0.0 };
            }
        }

        for i in 0..self.hidden.len() {
            let id = self.hidden[i];
            self.fire(id);
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for i in 0..self.outputs.len() {
            let id = self.outputs[i];
            outputs.push(self.fire(id));
        }
        Ok(outputs)
    }

    /// Computes a neuron's state from its enabled incoming
    /// synapses and squashes it into its activation.
    fn fire(&mut self, id: NeuronId) -> f32 {
        let state = match self.neurons.get(&id) {
            Some(neuron) => neuron
                .inputs
                .iter()
                .filter_map(|innovation| self.synapses.get(innovation))
                .filter(|synapse| synapse.enabled())
                .map(|synapse| {
                    let upstream = self
                        .neurons
                        .get(&synapse.from())
                        .map_or(0.0, |n| n.activation);
                    upstream * synapse.weight()
                })
                .sum::<f32>(),
            None => return 0.0,
        };

        match self.neurons.get_mut(&id) {
            Some(neuron) => {
                neuron.state = saturate(state);
                neuron.activation = neuron.activation_type().apply(neuron.state);
                neuron.activation
            }
            None => 0.0,
        }
    }

    /// Clears the activation state of every neuron.
    pub fn reset(&mut self) {
        for neuron in self.neurons.values_mut() {
            neuron.activation = 0.0;
            neuron.state = 0.0;
        }
    }

    /// Returns an independent copy of the network's
    /// topology and weights, with cleared activation state.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{InnovationCounter, NetworkFactory};
    ///
    /// let mut original = NetworkFactory::build(&mut InnovationCounter::new(), 2, 1);
    /// let mut copy = original.copy();
    /// copy.activate(&[1.0, 1.0]).unwrap();
    ///
    /// assert_eq!(copy.describe_synapses(), original.describe_synapses());
    /// assert!(original.neurons().all(|n| n.activation() == 0.0));
    /// ```
    pub fn copy(&self) -> Network {
        let mut copy = self.clone();
        copy.reset();
        copy
    }

    /// Describes every synapse as `innovation:from->to`,
    /// suffixed with `*` when disabled, separated by spaces.
    pub fn describe_synapses(&self) -> String {
        self.synapses
            .values()
            .map(|synapse| synapse.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Describes every neuron as `id:inputs:[..]:outputs:[..]`,
    /// listing its synapses as `from->to` in attachment order.
    pub fn describe_neurons(&self) -> String {
        let describe = |innovations: &[Innovation]| {
            innovations
                .iter()
                .filter_map(|innovation| self.synapses.get(innovation))
                .map(Synapse::short_description)
                .collect::<Vec<_>>()
                .join(",")
        };
        self.neurons
            .values()
            .map(|neuron| {
                format!(
                    "{}:inputs:[{}]:outputs:[{}]",
                    neuron.id(),
                    describe(&neuron.inputs),
                    describe(&neuron.outputs),
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe_synapses())
    }
}

/// Checks whether adding a synapse from `from` to `to`
/// would close a directed cycle in `network`.
///
/// Disabled synapses are followed too, as they may be
/// re-enabled later. A self-loop is always recurrent.
///
/// # Examples
/// ```
/// use neatwork::{is_recurrent, InnovationCounter, NetworkFactory};
///
/// let network = NetworkFactory::build(&mut InnovationCounter::new(), 2, 1);
/// assert!(!is_recurrent(1, 3, &network));
/// assert!(is_recurrent(3, 1, &network));
/// assert!(is_recurrent(2, 2, &network));
/// ```
pub fn is_recurrent(from: NeuronId, to: NeuronId, network: &Network) -> bool {
    let mut visited: HashSet<NeuronId, RandomState> = HashSet::default();
    let mut stack = vec![to];

    while let Some(current) = stack.pop() {
        if current == from {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(neuron) = network.neuron(current) {
            stack.extend(
                neuron
                    .output_synapses()
                    .iter()
                    .filter_map(|innovation| network.synapse(*innovation))
                    .map(Synapse::to),
            );
        }
    }

    false
}
