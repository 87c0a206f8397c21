use super::{Mutation, Requirement, Variable};
use rand::Rng;
use tracing::instrument;

/// An ordered collection of candidate requirements, bounded by the engine's
/// population size.
///
/// Populations are replaced wholesale each generation; no individual identity
/// survives replacement except through explicit cloning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    individuals: Vec<Requirement>,
}

impl Population {
    pub fn new() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(capacity),
        }
    }

    /// Seeds a fresh population of `size` individuals generated from scratch
    /// by the mutation strategy.
    #[instrument(level = "debug", skip(mutation, variables, rng), fields(size = size, num_variables = variables.len()))]
    pub fn generate<R: Rng>(
        size: usize,
        mutation: &Mutation,
        variables: &[Variable],
        rng: &mut R,
    ) -> Self {
        let mut population = Self::with_capacity(size);
        for _ in 0..size {
            population.push(mutation.generate(rng, variables));
        }
        population
    }

    pub fn push(&mut self, individual: Requirement) {
        self.individuals.push(individual);
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Requirement> {
        self.individuals.get(index)
    }

    /// A uniformly random member, or `None` when empty.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<&Requirement> {
        if self.individuals.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.individuals.len());
        Some(&self.individuals[index])
    }

    /// Truncates the population to at most `len` individuals, dropping the
    /// most recently added ones first.
    pub fn trim(&mut self, len: usize) {
        self.individuals.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.individuals.iter()
    }
}

impl FromIterator<Requirement> for Population {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        Self {
            individuals: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, MIN_ASSIGNMENTS};
    use rand::{rngs::StdRng, SeedableRng};

    fn individual(name: &str) -> Requirement {
        Requirement::new(vec![
            Assignment::new(name, "true"),
            Assignment::new("Other", "false"),
        ])
    }

    fn bool_variables(names: &[&str]) -> Vec<Variable> {
        names
            .iter()
            .map(|name| Variable::new(name, vec!["true".to_string(), "false".to_string()]))
            .collect()
    }

    #[test]
    fn it_trims_to_the_requested_length() {
        let mut population: Population =
            ["A", "B", "C", "D"].iter().map(|n| individual(n)).collect();

        population.trim(2);

        assert_eq!(population.len(), 2);
        assert_eq!(population.get(0), Some(&individual("A")));
        assert_eq!(population.get(1), Some(&individual("B")));

        // Trimming beyond the current size is a no-op
        population.trim(10);
        assert_eq!(population.len(), 2);
    }

    #[test]
    fn it_selects_random_members() {
        let mut rng = StdRng::seed_from_u64(42);
        let population: Population = ["A", "B", "C"].iter().map(|n| individual(n)).collect();

        for _ in 0..20 {
            assert!(population.random(&mut rng).is_some());
        }

        assert!(Population::new().random(&mut rng).is_none());
    }

    #[test]
    fn it_generates_seeded_populations() {
        let mut rng = StdRng::seed_from_u64(42);
        let variables = bool_variables(&["A", "B", "C", "D"]);
        let mutation = Mutation::new(0.3, 0.1, 4).unwrap();

        let population = Population::generate(10, &mutation, &variables, &mut rng);

        assert_eq!(population.len(), 10);
        for individual in &population {
            assert!(individual.len() >= MIN_ASSIGNMENTS);
        }
    }
}
