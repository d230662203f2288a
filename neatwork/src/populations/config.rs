use crate::genomics::{non_negative, positive, probability, ConfigError};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// must be in the range [0.0, 1.0]. This is checked
/// by [`validate`](PopulationConfig::validate) when
/// the population is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of organisms the population is filled with.
    pub population_size: NonZeroUsize,
    /// Fitness at which an organism is considered a solution.
    pub fitness_threshold: f32,
    /// Chance that an offspring is a mutated clone
    /// instead of the result of mating.
    pub mutate_only_probability: f32,
    /// Chance that a mate is chosen from another species.
    pub inter_species_mate_rate: f32,
    /// Fraction of each species allowed to survive
    /// into the next generation's parent pool.
    pub survival_threshold: f32,
    /// Generations without improvement before a
    /// species' fitness is penalized.
    pub dropoff_age: usize,
    /// Fitness multiplier for species 10 generations old or younger.
    pub age_significance: f32,
    /// Genetic distance below which two genomes
    /// belong to the same species.
    pub compatibility_threshold: f32,
    /// Whether the compatibility threshold is adjusted each
    /// generation to steer the species count towards
    /// [`compatibility_modifier_target`].
    ///
    /// [`compatibility_modifier_target`]: PopulationConfig::compatibility_modifier_target
    pub adjust_compatibility_threshold: bool,
    /// Step applied to the compatibility threshold
    /// when adjusting it. Also its lower bound.
    pub compatibility_modifier: f32,
    /// Desired number of species.
    pub compatibility_modifier_target: usize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0 or `false`, except for the
    /// population size, which is 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use neatwork::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     survival_threshold: 0.5,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::MIN,
            fitness_threshold: 0.0,
            mutate_only_probability: 0.0,
            inter_species_mate_rate: 0.0,
            survival_threshold: 0.0,
            dropoff_age: 0,
            age_significance: 0.0,
            compatibility_threshold: 0.0,
            adjust_compatibility_threshold: false,
            compatibility_modifier: 0.0,
            compatibility_modifier_target: 0,
        }
    }

    /// Checks every value for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first offending field: probabilities
    /// must lie in `[0, 1]`, the fitness threshold must be
    /// a number, and the remaining real values must be finite
    /// and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fitness_threshold.is_nan() {
            return Err(ConfigError::OutOfRange {
                field: "fitness_threshold",
                value: f64::NAN,
            });
        }
        probability("mutate_only_probability", self.mutate_only_probability)?;
        probability("inter_species_mate_rate", self.inter_species_mate_rate)?;
        probability("survival_threshold", self.survival_threshold)?;
        non_negative("age_significance", self.age_significance)?;
        non_negative("compatibility_threshold", self.compatibility_threshold)?;
        non_negative("compatibility_modifier", self.compatibility_modifier)?;
        if self.adjust_compatibility_threshold {
            positive("compatibility_modifier", self.compatibility_modifier)?;
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            population_size: NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN),
            fitness_threshold: 0.9,
            mutate_only_probability: 0.2,
            inter_species_mate_rate: 0.001,
            survival_threshold: 0.2,
            dropoff_age: 15,
            age_significance: 1.0,
            compatibility_threshold: 3.0,
            adjust_compatibility_threshold: false,
            compatibility_modifier: 0.3,
            compatibility_modifier_target: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PopulationConfig::default().validate().is_ok());
        assert!(PopulationConfig::zero().validate().is_ok());
    }

    #[test]
    fn probabilities_are_checked() {
        let config = PopulationConfig {
            inter_species_mate_rate: -0.1,
            ..PopulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "inter_species_mate_rate",
                ..
            })
        ));
    }

    #[test]
    fn adjusting_needs_a_modifier() {
        let config = PopulationConfig {
            adjust_compatibility_threshold: true,
            compatibility_modifier: 0.0,
            ..PopulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "compatibility_modifier",
                value: 0.0
            })
        );
    }

    #[test]
    fn zero_sized_populations_do_not_deserialize() {
        let parsed: Result<PopulationConfig, _> =
            serde_json::from_str(r#"{ "population_size": 0 }"#);
        assert!(parsed.is_err());

        let parsed: PopulationConfig =
            serde_json::from_str(r#"{ "population_size": 12, "dropoff_age": 3 }"#).unwrap();
        assert_eq!(parsed.population_size.get(), 12);
        assert_eq!(parsed.dropoff_age, 3);
        assert_eq!(parsed.survival_threshold, 0.2);
    }
}
