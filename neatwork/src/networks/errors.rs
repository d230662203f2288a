use crate::{Innovation, NeuronId};

use std::error::Error;
use std::fmt;

/// An error type indicating an invalid operation
/// on a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The number of inputs passed to an activation
    /// differs from the number of input neurons.
    InputLengthMismatch { expected: usize, actual: usize },
    /// A neuron with the same id is already present.
    DuplicateNeuron(NeuronId),
    /// A synapse with the same innovation number is already present.
    DuplicateSynapse(Innovation),
    /// One of the synapse's endpoints is not in the network.
    MissingEndpoint {
        innovation: Innovation,
        neuron: NeuronId,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputLengthMismatch { expected, actual } => write!(
                f,
                "network activated with {} inputs, expected {}",
                actual, expected
            ),
            Self::DuplicateNeuron(id) => write!(f, "duplicate neuron insertion with id {}", id),
            Self::DuplicateSynapse(innovation) => {
                write!(f, "duplicate synapse insertion with innovation {}", innovation)
            }
            Self::MissingEndpoint { innovation, neuron } => write!(
                f,
                "synapse {} references nonexistant neuron {}",
                innovation, neuron
            ),
        }
    }
}

impl Error for NetworkError {}
