use crate::networks::Network;
use crate::{Innovation, NeuronId};

use serde::{Deserialize, Serialize};

/// An `InnovationCounter` mints the identifiers of new structure:
/// innovation numbers for synapses and ids for neurons.
///
/// Both sequences start at 1 and only ever grow, so two synapses
/// created at different points of a run never share an innovation
/// number. The counter is owned by the [`Population`] and passed
/// explicitly to every operation that adds structure.
///
/// [`Population`]: crate::Population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationCounter {
    next_innovation: Innovation,
    next_neuron: NeuronId,
}

impl InnovationCounter {
    /// Returns a fresh counter.
    ///
    /// # Examples
    /// ```
    /// use neatwork::InnovationCounter;
    ///
    /// let mut counter = InnovationCounter::new();
    /// assert_eq!(counter.next_innovation(), 1);
    /// assert_eq!(counter.next_innovation(), 2);
    /// assert_eq!(counter.next_neuron(), 1);
    /// ```
    pub fn new() -> InnovationCounter {
        InnovationCounter {
            next_innovation: 1,
            next_neuron: 1,
        }
    }

    /// Returns an unused innovation number.
    pub fn next_innovation(&mut self) -> Innovation {
        let innovation = self.next_innovation;
        self.next_innovation += 1;
        innovation
    }

    /// Returns an unused neuron id.
    pub fn next_neuron(&mut self) -> NeuronId {
        let id = self.next_neuron;
        self.next_neuron += 1;
        id
    }

    /// Advances both sequences past every identifier
    /// already present in `network`, so networks built
    /// elsewhere can be evolved without id collisions.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{InnovationCounter, NetworkFactory};
    ///
    /// let network = NetworkFactory::build(&mut InnovationCounter::new(), 2, 2);
    /// let mut counter = InnovationCounter::new();
    /// counter.observe(&network);
    ///
    /// assert_eq!(counter.next_innovation(), 5);
    /// assert_eq!(counter.next_neuron(), 5);
    /// ```
    pub fn observe(&mut self, network: &Network) {
        if let Some(max) = network.synapses().map(|s| s.innovation()).max() {
            self.next_innovation = self.next_innovation.max(max + 1);
        }
        if let Some(max) = network.neurons().map(|n| n.id()).max() {
            self.next_neuron = self.next_neuron.max(max + 1);
        }
    }

    /// Returns the last innovation number handed out, if any.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.next_innovation.checked_sub(1).filter(|&i| i > 0)
    }

    /// Returns the last neuron id handed out, if any.
    pub fn max_neuron(&self) -> Option<NeuronId> {
        self.next_neuron.checked_sub(1).filter(|&i| i > 0)
    }
}

impl Default for InnovationCounter {
    fn default() -> Self {
        Self::new()
    }
}
