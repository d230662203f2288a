use super::{Network, Neuron, NeuronType, Synapse};
use crate::genomics::InnovationCounter;

/// Builds minimal starting topologies: every
/// input neuron connected to every output neuron,
/// with no hidden neurons in between.
pub struct NetworkFactory;

impl NetworkFactory {
    /// Builds a fully connected network with no hidden
    /// neurons and every weight set to 1.
    ///
    /// Neuron ids and innovation numbers are drawn from
    /// `counter`: first the inputs, then the outputs, then
    /// one synapse per input-output pair, inputs major.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{InnovationCounter, NetworkFactory};
    ///
    /// let mut counter = InnovationCounter::new();
    /// let network = NetworkFactory::build(&mut counter, 3, 1);
    ///
    /// assert_eq!(network.inputs().len(), 3);
    /// assert_eq!(network.outputs().len(), 1);
    /// assert_eq!(network.describe_synapses(), "1:1->4 2:2->4 3:3->4");
    /// ```
    pub fn build(counter: &mut InnovationCounter, inputs: usize, outputs: usize) -> Network {
        Self::build_inner(counter, inputs, outputs, false)
    }

    /// Same as [`build`], with an additional bias neuron
    /// placed after the regular inputs. The bias is an input
    /// neuron like any other: the host decides which constant
    /// to feed it on each activation.
    ///
    /// [`build`]: NetworkFactory::build
    pub fn build_with_bias(
        counter: &mut InnovationCounter,
        inputs: usize,
        outputs: usize,
    ) -> Network {
        Self::build_inner(counter, inputs, outputs, true)
    }

    fn build_inner(
        counter: &mut InnovationCounter,
        inputs: usize,
        outputs: usize,
        bias: bool,
    ) -> Network {
        let mut network = Network::new();

        let mut input_ids: Vec<_> = (0..inputs)
            .map(|_| Neuron::new(counter.next_neuron(), NeuronType::Input))
            .collect();
        if bias {
            input_ids.push(Neuron::new(counter.next_neuron(), NeuronType::Bias));
        }
        let output_ids: Vec<_> = (0..outputs)
            .map(|_| Neuron::new(counter.next_neuron(), NeuronType::Output))
            .collect();

        let pairs: Vec<_> = input_ids
            .iter()
            .flat_map(|i| output_ids.iter().map(move |o| (i.id(), o.id())))
            .collect();
        for neuron in input_ids.into_iter().chain(output_ids) {
            network.insert_neuron(neuron);
        }
        for (from, to) in pairs {
            network.insert_synapse(Synapse::new(counter.next_innovation(), from, to, 1.0));
        }

        network
    }
}
