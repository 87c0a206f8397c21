use super::sampling::select_indexes;
use super::{Assignment, Population, Requirement, Variable, MIN_ASSIGNMENTS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Errors returned when constructing a [`Mutation`] with parameters outside
/// their valid ranges.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("no-preference probability must be in [0.0, 1.0), got {0}")]
    NoPreferenceProbabilityOutOfRange(f64),
    #[error("mutation probability must be in (0.0, 1.0], got {0}")]
    MutationProbabilityOutOfRange(f64),
    #[error("max_variables must be at least {min}, got {got}")]
    MaxVariablesTooSmall { got: usize, min: usize },
}

/// Mutation strategy: generates fresh requirements and perturbs existing
/// ones.
///
/// Both operations sample a bounded random subset of the model variables and
/// re-roll assignments over that same subset until the result carries at
/// least two assignments.
///
/// A no-preference probability of 1.0 and a mutation probability of 0.0 are
/// rejected at construction: either would leave the regeneration loop unable
/// to ever reach two assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    no_preference_probability: f64,
    mutation_probability: f64,
    max_variables: usize,
}

impl Mutation {
    /// Creates a mutation strategy.
    ///
    /// * `no_preference_probability` — chance of leaving a sampled variable
    ///   unassigned when generating from scratch; must be in `[0.0, 1.0)`.
    /// * `mutation_probability` — chance of changing a sampled variable when
    ///   perturbing; must be in `(0.0, 1.0]`.
    /// * `max_variables` — upper bound on the number of variables sampled per
    ///   requirement; must be at least 2.
    pub fn new(
        no_preference_probability: f64,
        mutation_probability: f64,
        max_variables: usize,
    ) -> Result<Self, MutationError> {
        if !(0.0..1.0).contains(&no_preference_probability) {
            return Err(MutationError::NoPreferenceProbabilityOutOfRange(
                no_preference_probability,
            ));
        }
        if !(mutation_probability > 0.0 && mutation_probability <= 1.0) {
            return Err(MutationError::MutationProbabilityOutOfRange(
                mutation_probability,
            ));
        }
        if max_variables < MIN_ASSIGNMENTS {
            return Err(MutationError::MaxVariablesTooSmall {
                got: max_variables,
                min: MIN_ASSIGNMENTS,
            });
        }

        Ok(Self {
            no_preference_probability,
            mutation_probability,
            max_variables,
        })
    }

    /// Generates a fresh requirement over a random variable subset.
    #[instrument(level = "debug", skip(self, rng, variables), fields(num_variables = variables.len()))]
    pub(crate) fn generate<R: Rng>(&self, rng: &mut R, variables: &[Variable]) -> Requirement {
        debug_assert!(variables.len() >= MIN_ASSIGNMENTS);
        let indexes = select_indexes(rng, self.max_variables, variables.len(), true);

        loop {
            let mut assignments = Vec::with_capacity(indexes.len());
            for &index in &indexes {
                let variable = &variables[index];
                if rng.random_bool(1.0 - self.no_preference_probability) {
                    assignments.push(random_assignment(rng, variable));
                }
            }

            if assignments.len() >= MIN_ASSIGNMENTS {
                return Requirement::new(assignments);
            }
        }
    }

    /// Perturbs an existing requirement over a random variable subset:
    /// absent values are added with the mutation probability, present values
    /// are kept with its complement and replaced by a different domain value
    /// otherwise.
    #[instrument(level = "debug", skip(self, rng, individual, variables), fields(num_assignments = individual.len()))]
    pub(crate) fn perturb<R: Rng>(
        &self,
        rng: &mut R,
        individual: &Requirement,
        variables: &[Variable],
    ) -> Requirement {
        let indexes = select_indexes(rng, self.max_variables, variables.len(), true);

        loop {
            let mut assignments = Vec::with_capacity(indexes.len());
            for &index in &indexes {
                let variable = &variables[index];
                match individual.value_of(&variable.name) {
                    None => {
                        if rng.random_bool(self.mutation_probability) {
                            assignments.push(random_assignment(rng, variable));
                        }
                    }
                    Some(value) => {
                        if rng.random_bool(1.0 - self.mutation_probability) {
                            assignments.push(Assignment::new(&variable.name, value));
                        } else {
                            assignments.push(replacement_assignment(rng, variable, value));
                        }
                    }
                }
            }

            if assignments.len() >= MIN_ASSIGNMENTS {
                return Requirement::new(assignments);
            }
        }
    }

    /// Perturbs every member of the population independently; order and size
    /// are preserved.
    #[instrument(level = "debug", skip(self, rng, population, variables), fields(population_size = population.len()))]
    pub(crate) fn apply<R: Rng>(
        &self,
        rng: &mut R,
        population: &Population,
        variables: &[Variable],
    ) -> Population {
        population
            .iter()
            .map(|individual| self.perturb(rng, individual, variables))
            .collect()
    }
}

fn random_assignment<R: Rng>(rng: &mut R, variable: &Variable) -> Assignment {
    let value = &variable.domain[rng.random_range(0..variable.domain.len())];
    Assignment::new(&variable.name, value)
}

/// A uniformly random domain value different from `current`. Falls back to
/// the current value when the domain offers no alternative.
fn replacement_assignment<R: Rng>(rng: &mut R, variable: &Variable, current: &str) -> Assignment {
    if variable.domain.iter().all(|value| value == current) {
        return Assignment::new(&variable.name, current);
    }

    loop {
        let value = &variable.domain[rng.random_range(0..variable.domain.len())];
        if value != current {
            return Assignment::new(&variable.name, value);
        }
    }
}
