use std::error::Error;
use std::fmt;

/// An error type indicating that a generation
/// could not be bred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionError {
    /// The population is empty, or its overall average
    /// fitness is not a positive number, so no offspring
    /// can be allotted.
    DegeneratePopulation,
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePopulation => {
                write!(f, "attempted evolution on degenerate population")
            }
        }
    }
}

impl Error for EvolutionError {}

/// An error type indicating that a run
/// ended without finding a solution.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError<E> {
    /// The fitness function failed.
    Fitness(E),
    /// A generation could not be bred.
    Evolution(EvolutionError),
    /// No organism reached the fitness threshold
    /// within the allotted generations.
    BudgetExhausted {
        generations: usize,
        /// Highest fitness seen during the run, if
        /// any organism was evaluated.
        best_fitness: Option<f32>,
    },
}

impl<E: fmt::Display> fmt::Display for RunError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fitness(e) => write!(f, "fitness evaluation failed: {}", e),
            Self::Evolution(e) => write!(f, "{}", e),
            Self::BudgetExhausted {
                generations,
                best_fitness: Some(best),
            } => write!(
                f,
                "no solution found within {} generations (best fitness {})",
                generations, best
            ),
            Self::BudgetExhausted {
                generations,
                best_fitness: None,
            } => write!(f, "no solution found within {} generations", generations),
        }
    }
}

impl<E: Error + 'static> Error for RunError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fitness(e) => Some(e),
            Self::Evolution(e) => Some(e),
            Self::BudgetExhausted { .. } => None,
        }
    }
}

impl<E> From<EvolutionError> for RunError<E> {
    fn from(e: EvolutionError) -> Self {
        Self::Evolution(e)
    }
}
