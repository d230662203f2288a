use super::errors::{non_negative, positive, probability, ConfigError};

use serde::{Deserialize, Serialize};

/// Configuration data for genome mutation
/// and inter-genome operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Maximum number of attempts at finding a free
    /// neuron pair during a synapse addition mutation.
    pub add_connection_tries: usize,
    /// Bound of the uniform distribution new and
    /// perturbed weights are drawn from.
    pub mutation_power: f32,
    /// Chance that a weight mutation nudges a weight
    /// instead of replacing it.
    pub genome_weight_perturbed: f32,
    /// Chance of a neuron addition mutation.
    pub mutate_add_node_probability: f32,
    /// Chance of a synapse addition mutation,
    /// if no neuron was added.
    pub mutate_add_connection_probability: f32,
    /// Chance of weight mutation, if no structure was added.
    pub mutate_connection_weights_probability: f32,
    /// Chance of a toggle mutation, if no structure was added.
    pub mutate_toggle_enable_probability: f32,
    /// Chance of re-enabling a disabled synapse,
    /// if no structure was added.
    pub re_enable_gene_probability: f32,
    /// Forbid synapses closing directed cycles.
    pub feed_forward_only: bool,
    /// Weight of excess genes in genetic distance.
    pub excess_coefficient: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_coefficient: f32,
    /// Weight of the mean weight difference of
    /// matching genes in genetic distance.
    pub weight_difference_coefficient: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration.
    /// All values are 0 or `false`.
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            add_connection_tries: 0,
            mutation_power: 0.0,
            genome_weight_perturbed: 0.0,
            mutate_add_node_probability: 0.0,
            mutate_add_connection_probability: 0.0,
            mutate_connection_weights_probability: 0.0,
            mutate_toggle_enable_probability: 0.0,
            re_enable_gene_probability: 0.0,
            feed_forward_only: false,
            excess_coefficient: 0.0,
            disjoint_coefficient: 0.0,
            weight_difference_coefficient: 0.0,
        }
    }

    /// Checks every value for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first offending field: probabilities must
    /// lie in `[0, 1]`, the mutation power must be positive, and
    /// coefficients must be finite and non-negative.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{ConfigError, GeneticConfig};
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    ///
    /// let config = GeneticConfig {
    ///     mutate_add_node_probability: 1.5,
    ///     ..GeneticConfig::default()
    /// };
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(ConfigError::OutOfRange { field: "mutate_add_node_probability", value: 1.5 }),
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mutation_power", self.mutation_power)?;
        probability("genome_weight_perturbed", self.genome_weight_perturbed)?;
        probability("mutate_add_node_probability", self.mutate_add_node_probability)?;
        probability(
            "mutate_add_connection_probability",
            self.mutate_add_connection_probability,
        )?;
        probability(
            "mutate_connection_weights_probability",
            self.mutate_connection_weights_probability,
        )?;
        probability(
            "mutate_toggle_enable_probability",
            self.mutate_toggle_enable_probability,
        )?;
        probability("re_enable_gene_probability", self.re_enable_gene_probability)?;
        non_negative("excess_coefficient", self.excess_coefficient)?;
        non_negative("disjoint_coefficient", self.disjoint_coefficient)?;
        non_negative(
            "weight_difference_coefficient",
            self.weight_difference_coefficient,
        )
    }
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            add_connection_tries: 20,
            mutation_power: 2.5,
            genome_weight_perturbed: 0.9,
            mutate_add_node_probability: 0.03,
            mutate_add_connection_probability: 0.05,
            mutate_connection_weights_probability: 0.9,
            mutate_toggle_enable_probability: 0.0,
            re_enable_gene_probability: 0.05,
            feed_forward_only: true,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_difference_coefficient: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_needs_a_mutation_power() {
        assert_eq!(
            GeneticConfig::zero().validate(),
            Err(ConfigError::NotPositive {
                field: "mutation_power",
                value: 0.0
            })
        );
        let config = GeneticConfig {
            mutation_power: 1.0,
            ..GeneticConfig::zero()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let config = GeneticConfig {
            disjoint_coefficient: f32::INFINITY,
            ..GeneticConfig::default()
        };
        assert!(config.validate().is_err());
        let config = GeneticConfig {
            genome_weight_perturbed: f32::NAN,
            ..GeneticConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: GeneticConfig =
            serde_json::from_str(r#"{ "mutation_power": 1.0, "feed_forward_only": false }"#)
                .unwrap();
        assert_eq!(config.mutation_power, 1.0);
        assert!(!config.feed_forward_only);
        assert_eq!(config.add_connection_tries, 20);
    }
}
