use crate::{Innovation, NeuronId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Synapses are the weighted, directed edges of a network.
///
/// Disabled synapses take no part in activation, but stay
/// in the network for the sake of genetic history.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Synapse {
    innovation: Innovation,
    from: NeuronId,
    to: NeuronId,
    weight: f32,
    enabled: bool,
}

impl Synapse {
    /// Returns a new, enabled synapse between the specified neurons.
    ///
    /// # Examples
    /// ```
    /// use neatwork::Synapse;
    ///
    /// let synapse = Synapse::new(3, 1, 4, 0.5);
    /// assert!(synapse.enabled());
    /// assert_eq!(synapse.to_string(), "3:1->4");
    /// ```
    pub fn new(innovation: Innovation, from: NeuronId, to: NeuronId, weight: f32) -> Synapse {
        Synapse {
            innovation,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Returns the synapse's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the neuron the synapse leaves from.
    pub fn from(&self) -> NeuronId {
        self.from
    }

    /// Returns the id of the neuron the synapse leads to.
    pub fn to(&self) -> NeuronId {
        self.to
    }

    /// Returns the synapse's endpoints as `(from, to)`.
    pub fn endpoints(&self) -> (NeuronId, NeuronId) {
        (self.from, self.to)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Suppresses the synapse. Its innovation number is kept.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Formats the synapse without its innovation number,
    /// as `from->to`, with a trailing `*` when disabled.
    pub fn short_description(&self) -> String {
        format!(
            "{}->{}{}",
            self.from,
            self.to,
            if self.enabled { "" } else { "*" }
        )
    }
}

impl fmt::Display for Synapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.innovation, self.short_description())
    }
}
