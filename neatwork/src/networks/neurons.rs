use crate::{Innovation, NeuronId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Slope of the steepened logistic curve.
const SIGMOID_SLOPE: f32 = 4.924273;

/// An ActivationType represents the function
/// a neuron applies to its accumulated state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // 0   if x < 0
    // x   if x ≥ 0
    #[default]
    ReLU,
    // 1 / (1 + exp(-4.924273x))
    Sigmoid,
    // x
    Identity,
}

impl ActivationType {
    /// Applies the activation function to `x`.
    ///
    /// Results are always finite: overflow saturates
    /// to the largest representable magnitude, and
    /// undefined results (NaN) become 0.
    ///
    /// # Examples
    /// ```
    /// use neatwork::ActivationType;
    ///
    /// assert_eq!(ActivationType::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(ActivationType::ReLU.apply(2.5), 2.5);
    /// assert_eq!(ActivationType::ReLU.apply(f32::INFINITY), f32::MAX);
    /// assert_eq!(ActivationType::Identity.apply(f32::NEG_INFINITY), f32::MIN);
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        let y = match self {
            ActivationType::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            ActivationType::Sigmoid => 1.0 / (1.0 + (-SIGMOID_SLOPE * x).exp()),
            ActivationType::Identity => x,
        };
        saturate(y)
    }
}

/// Clamps `x` into the finite range, mapping NaN to 0.
pub(crate) fn saturate(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(f32::MIN, f32::MAX)
    }
}

/// A NeuronType indicates the role of
/// the neuron within its network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeuronType {
    /// Input neuron fed with a constant by the host.
    Bias,
    /// Input neurons.
    Input,
    /// Neurons added through mutation.
    Hidden,
    /// Output neurons.
    Output,
}

/// Neurons are the vertices of a network, between
/// which synapses are created.
///
/// A neuron only records the innovation numbers of
/// its synapses; the synapses themselves are owned by
/// the network.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Neuron {
    id: NeuronId,
    neuron_type: NeuronType,
    activation_type: ActivationType,
    pub(super) activation: f32,
    pub(super) state: f32,
    pub(super) inputs: Vec<Innovation>,
    pub(super) outputs: Vec<Innovation>,
}

impl Neuron {
    /// Generate a new neuron with the default activation function.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{ActivationType, Neuron, NeuronType};
    ///
    /// let neuron = Neuron::new(5, NeuronType::Hidden);
    /// assert_eq!(neuron.activation_type(), ActivationType::ReLU);
    /// assert_eq!(neuron.activation(), 0.0);
    /// ```
    pub fn new(id: NeuronId, neuron_type: NeuronType) -> Neuron {
        Self::with_activation_type(id, neuron_type, ActivationType::default())
    }

    /// Generate a new neuron with the passed parameters.
    pub fn with_activation_type(
        id: NeuronId,
        neuron_type: NeuronType,
        activation_type: ActivationType,
    ) -> Neuron {
        Neuron {
            id,
            neuron_type,
            activation_type,
            activation: 0.0,
            state: 0.0,
            inputs: vec![],
            outputs: vec![],
        }
    }

    /// Returns a copy of the neuron with no synapses
    /// and a cleared activation state.
    pub(crate) fn detached(&self) -> Neuron {
        Self::with_activation_type(self.id, self.neuron_type, self.activation_type)
    }

    /// Returns the neuron's identifier.
    pub fn id(&self) -> NeuronId {
        self.id
    }

    /// Returns the neuron's type.
    pub fn neuron_type(&self) -> NeuronType {
        self.neuron_type
    }

    /// Returns the neuron's activation function.
    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }

    /// Returns the last computed output of the neuron.
    pub fn activation(&self) -> f32 {
        self.activation
    }

    /// Returns the weighted input sum computed
    /// during the neuron's last activation.
    pub fn state(&self) -> f32 {
        self.state
    }

    /// Whether the neuron is fed directly by the host
    /// (bias neurons count as inputs).
    pub fn is_input(&self) -> bool {
        matches!(self.neuron_type, NeuronType::Input | NeuronType::Bias)
    }

    /// Whether the neuron is an output neuron.
    pub fn is_output(&self) -> bool {
        self.neuron_type == NeuronType::Output
    }

    /// Returns the innovation numbers of the neuron's incoming
    /// synapses, in the order they were attached.
    pub fn input_synapses(&self) -> &[Innovation] {
        &self.inputs
    }

    /// Returns the innovation numbers of the neuron's outgoing
    /// synapses, in the order they were attached.
    pub fn output_synapses(&self) -> &[Innovation] {
        &self.outputs
    }
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, {:?}, IN: {:?}, OUT: {:?}]",
            self.id, self.neuron_type, self.activation_type, self.inputs, self.outputs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_is_clamped_and_finite() {
        let relu = ActivationType::ReLU;
        assert_eq!(relu.apply(0.0), 0.0);
        assert_eq!(relu.apply(-0.5), 0.0);
        assert_eq!(relu.apply(5.0), 5.0);
        assert_eq!(relu.apply(f32::INFINITY), f32::MAX);
        assert_eq!(relu.apply(f32::NEG_INFINITY), 0.0);
        assert_eq!(relu.apply(f32::NAN), 0.0);
    }

    #[test]
    fn sigmoid_saturates() {
        let sigmoid = ActivationType::Sigmoid;
        assert!(sigmoid.apply(100.0) <= 1.0);
        assert!(sigmoid.apply(-100.0) >= 0.0);
        assert_eq!(sigmoid.apply(f32::NAN), 0.0);
    }

    #[test]
    fn bias_counts_as_input() {
        assert!(Neuron::new(0, NeuronType::Bias).is_input());
        assert!(Neuron::new(1, NeuronType::Input).is_input());
        assert!(!Neuron::new(2, NeuronType::Hidden).is_input());
        assert!(Neuron::new(3, NeuronType::Output).is_output());
    }

    #[test]
    fn detached_copies_forget_synapses() {
        let mut neuron =
            Neuron::with_activation_type(4, NeuronType::Hidden, ActivationType::Sigmoid);
        neuron.inputs.push(1);
        neuron.outputs.push(2);
        neuron.activation = 0.7;

        let copy = neuron.detached();
        assert_eq!(copy.id(), 4);
        assert_eq!(copy.activation_type(), ActivationType::Sigmoid);
        assert!(copy.input_synapses().is_empty());
        assert!(copy.output_synapses().is_empty());
        assert_eq!(copy.activation(), 0.0);
    }
}
