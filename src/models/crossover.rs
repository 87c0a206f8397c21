use super::{Assignment, ConflictSet, Population, Requirement, Resolve, ResolvedIds, Variable};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const BASE_PROBABILITY: f64 = 0.5;

/// Probability of inheriting a contested variable from the father, biased
/// towards the parent with the higher resolution weight.
///
/// Grows with the weight difference along an arctan curve; `crossover_factor`
/// flattens the curve as it increases. Equal weights fall back to an even
/// split, and the lighter parent receives the complement.
fn mixing_probability(weight: u32, comparative_weight: u32, crossover_factor: f64) -> f64 {
    let weight_delta = weight.abs_diff(comparative_weight);
    let mut probability = BASE_PROBABILITY;

    if weight_delta > 0 {
        probability = (weight_delta as f64 / std::f64::consts::PI.powf(crossover_factor)).atan()
            * 0.3
            + BASE_PROBABILITY;
    }

    if weight >= comparative_weight {
        probability
    } else {
        1.0 - probability
    }
}

/// Offspring generation strategy.
///
/// Crossover combines two parents variable-by-variable over the full model
/// variable order: for each variable one parent is chosen as the source, and
/// an assignment materializes only when that parent actually has one. The
/// population-level operation keeps breeding until the output reaches the
/// configured population size, immediately resolving offspring that
/// reproduce an already-known conflict instead of inserting them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Crossover {
    /// Uniform parent choice (p = 0.5), uniform parent-pair selection.
    Plain,
    /// Crossover informed by resolution metadata.
    Weighted {
        /// Duplicate each parent `1 + weight` times in the selection pool,
        /// biasing how often conflict-rich parents breed.
        weighted_pool: bool,
        /// Never pair two parents that were resolved from the same ancestor
        /// in the same resolution step.
        avoid_same_origin: bool,
        /// Bias the per-variable source choice towards the heavier parent.
        weighted_mixing: bool,
        /// Flattening factor of the mixing-probability curve.
        crossover_factor: f64,
    },
}

/// Error returned when building a weighted crossover with an unusable
/// flattening factor.
#[derive(Debug, thiserror::Error)]
#[error("crossover factor must be finite and non-negative, got {0}")]
pub struct CrossoverFactorOutOfRange(f64);

impl Crossover {
    pub fn plain() -> Self {
        Self::Plain
    }

    /// Creates a weighted crossover strategy.
    pub fn weighted(
        weighted_pool: bool,
        avoid_same_origin: bool,
        weighted_mixing: bool,
        crossover_factor: f64,
    ) -> Result<Self, CrossoverFactorOutOfRange> {
        if !crossover_factor.is_finite() || crossover_factor < 0.0 {
            return Err(CrossoverFactorOutOfRange(crossover_factor));
        }

        Ok(Self::Weighted {
            weighted_pool,
            avoid_same_origin,
            weighted_mixing,
            crossover_factor,
        })
    }

    /// Breeds a new population of exactly `population_size` offspring from
    /// `parents`.
    ///
    /// With one parent or fewer there is nothing to combine and the parents
    /// are returned unchanged. Offspring containing one of `known_conflicts`
    /// are handed to the resolve strategy and replaced by their resolutions
    /// (or dropped when no resolve strategy is available).
    #[instrument(level = "debug", skip_all, fields(strategy = ?self, num_parents = parents.len(), population_size = population_size, known_conflicts = known_conflicts.len()))]
    pub(crate) fn breed<R: Rng>(
        &self,
        rng: &mut R,
        parents: &Population,
        variables: &[Variable],
        population_size: usize,
        known_conflicts: &[ConflictSet],
        resolve: Option<&Resolve>,
        ids: &mut ResolvedIds,
    ) -> Population {
        if parents.len() <= 1 {
            return parents.clone();
        }

        let pool = self.parent_pool(parents);
        let mut population = Population::with_capacity(population_size);

        while population.len() < population_size {
            let (father, mother) = self.select_parents(rng, &pool);
            let offspring = self.combine(rng, father, mother, variables);

            if !known_conflicts.is_empty() && offspring.has_known_conflict(known_conflicts) {
                tracing::debug!(offspring = %offspring, "offspring reproduces a known conflict, resolving");
                if let Some(resolve) = resolve {
                    for resolved in resolve.resolve(&offspring, known_conflicts, ids) {
                        population.push(resolved);
                    }
                }
            } else {
                population.push(offspring);
            }
        }

        // Resolution can overshoot the target size
        population.trim(population_size);
        population
    }

    /// Combines two parents into one offspring, variable by variable.
    pub(crate) fn combine<R: Rng>(
        &self,
        rng: &mut R,
        father: &Requirement,
        mother: &Requirement,
        variables: &[Variable],
    ) -> Requirement {
        let father_probability = match self {
            Crossover::Weighted {
                weighted_mixing: true,
                crossover_factor,
                ..
            } => mixing_probability(father.weight(), mother.weight(), *crossover_factor),
            _ => BASE_PROBABILITY,
        };

        let mut assignments = Vec::new();
        for variable in variables {
            let source = if rng.random_bool(father_probability) {
                father.value_of(&variable.name)
            } else {
                mother.value_of(&variable.name)
            };

            if let Some(value) = source {
                assignments.push(Assignment::new(&variable.name, value));
            }
        }

        Requirement::new(assignments)
    }

    /// The selection pool: every parent once, plus `weight` duplicates each
    /// when pool weighting is enabled.
    fn parent_pool<'a>(&self, parents: &'a Population) -> Vec<&'a Requirement> {
        let weighted = matches!(
            self,
            Crossover::Weighted {
                weighted_pool: true,
                ..
            }
        );

        let mut pool = Vec::with_capacity(parents.len());
        for individual in parents {
            pool.push(individual);
            if weighted {
                for _ in 0..individual.weight() {
                    pool.push(individual);
                }
            }
        }
        pool
    }

    /// Draws two parents at distinct pool indices. When same-origin
    /// avoidance is on and an alternative exists, the second parent is
    /// redrawn until it does not share the father's resolution id.
    fn select_parents<'a, R: Rng>(
        &self,
        rng: &mut R,
        pool: &[&'a Requirement],
    ) -> (&'a Requirement, &'a Requirement) {
        let first = rng.random_range(0..pool.len());
        let mut second = rng.random_range(0..pool.len());
        while second == first {
            second = rng.random_range(0..pool.len());
        }

        let father = pool[first];
        let mut mother = pool[second];

        let avoid_same_origin = matches!(
            self,
            Crossover::Weighted {
                avoid_same_origin: true,
                ..
            }
        );
        if avoid_same_origin
            && father.resolved_id() != 0
            && pool
                .iter()
                .any(|candidate| candidate.resolved_id() != father.resolved_id())
        {
            while mother.resolved_id() == father.resolved_id() {
                mother = pool[rng.random_range(0..pool.len())];
            }
        }

        (father, mother)
    }
}
