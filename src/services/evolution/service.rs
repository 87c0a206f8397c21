use super::{Error, IterationContext, IterationListener};
use crate::models::{
    ConflictSet, Crossover, Mutation, Population, Resolve, ResolvedIds, Variable,
};
use crate::oracle::{ConflictOracle, ModelFactory};
use crate::registry::ConflictSetRegistry;
use crate::repositories::{conflicts, statistics};
use rand::{rngs::StdRng, SeedableRng};
use tracing::instrument;
use uuid::Uuid;

/// Why an evolution run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    /// The requested number of generations ran to completion.
    IterationBudgetReached,
    /// Too many consecutive generations without a new global conflict.
    NoConflictStreakExceeded,
    /// The population went extinct as often as the run allows.
    ExtinctionBudgetExhausted,
}

/// The evolution engine.
///
/// Drives the generation loop over a population of candidate requirements:
/// each generation assesses every individual against the conflict oracle,
/// accumulates newly discovered minimal conflict sets in the global
/// registries, replaces conflicting individuals with resolved variants,
/// regrows the population by crossover, diversifies it by mutation, and
/// tracks the no-conflict streak that drives extinction and termination.
///
/// All randomness flows through one seeded generator owned by the engine,
/// so a run is reproducible from its seed.
pub struct Service<F, O>
where
    F: ModelFactory,
    O: ConflictOracle<F::Model>,
{
    factory: F,
    oracle: O,
    variables: Vec<Variable>,
    population: Population,
    population_size: usize,
    num_max_conflicts: usize,
    stop_after_no_conflict: u32,
    extinct_after_no_conflict: u32,
    stop_after_extinctions: u32,
    mutation: Option<Mutation>,
    crossover: Option<Crossover>,
    resolve: Option<Resolve>,
    resolved_ids: ResolvedIds,
    all_conflict_sets: ConflictSetRegistry,
    all_conflict_sets_without_core: ConflictSetRegistry,
    statistics: Option<statistics::Writer>,
    listeners: Vec<Box<dyn IterationListener>>,
    rng: StdRng,
    run_id: Uuid,
    current_iteration: u32,
    current_generation: u32,
    current_epoch: u32,
    no_conflict_streak: u32,
    terminated: bool,
    conclusion: Option<Conclusion>,
}

/// Assembles an evolution [`Service`].
///
/// The factory, oracle, variable list, starting population and RNG seed are
/// required; strategies, termination thresholds, persistence writers and
/// listeners are optional. The starting population's size becomes the
/// population size the engine maintains.
pub struct ServiceBuilder<F, O>
where
    F: ModelFactory,
    O: ConflictOracle<F::Model>,
{
    factory: F,
    oracle: O,
    variables: Vec<Variable>,
    population: Population,
    seed: u64,
    num_max_conflicts: usize,
    stop_after_no_conflict: u32,
    extinct_after_no_conflict: u32,
    stop_after_extinctions: u32,
    mutation: Option<Mutation>,
    crossover: Option<Crossover>,
    resolve: Option<Resolve>,
    known_conflicts: Vec<ConflictSet>,
    known_conflicts_without_core: Vec<ConflictSet>,
    conflicts_writer: Option<conflicts::Writer>,
    conflicts_without_core_writer: Option<conflicts::Writer>,
    statistics: Option<statistics::Writer>,
    listeners: Vec<Box<dyn IterationListener>>,
}

impl<F, O> ServiceBuilder<F, O>
where
    F: ModelFactory,
    O: ConflictOracle<F::Model>,
{
    /// Caps how many conflict sets the oracle may report per individual;
    /// 0 means unbounded.
    pub fn num_max_conflicts(mut self, num_max_conflicts: usize) -> Self {
        self.num_max_conflicts = num_max_conflicts;
        self
    }

    /// Terminates the run once this many consecutive generations produced no
    /// new global conflict; 0 disables the threshold.
    pub fn stop_after_no_conflict(mut self, threshold: u32) -> Self {
        self.stop_after_no_conflict = threshold;
        self
    }

    /// Declares the population extinct once this many consecutive
    /// generations produced no new global conflict; 0 disables extinction.
    pub fn extinct_after_no_conflict(mut self, threshold: u32) -> Self {
        self.extinct_after_no_conflict = threshold;
        self
    }

    /// Terminates the run once this many extinctions have happened.
    pub fn stop_after_extinctions(mut self, budget: u32) -> Self {
        self.stop_after_extinctions = budget;
        self
    }

    pub fn mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = Some(crossover);
        self
    }

    pub fn resolve(mut self, resolve: Resolve) -> Self {
        self.resolve = Some(resolve);
        self
    }

    /// Seeds the raw conflict registry with already-known conflict sets,
    /// e.g. loaded from a previous run's conflict file.
    pub fn known_conflicts(mut self, sets: Vec<ConflictSet>) -> Self {
        self.known_conflicts = sets;
        self
    }

    /// Seeds the core-filtered conflict registry with already-known sets.
    pub fn known_conflicts_without_core(mut self, sets: Vec<ConflictSet>) -> Self {
        self.known_conflicts_without_core = sets;
        self
    }

    /// Persists newly discovered conflict sets to a file as they register.
    pub fn conflicts_writer(mut self, writer: conflicts::Writer) -> Self {
        self.conflicts_writer = Some(writer);
        self
    }

    /// Persists newly discovered core-filtered conflict sets.
    pub fn conflicts_without_core_writer(mut self, writer: conflicts::Writer) -> Self {
        self.conflicts_without_core_writer = Some(writer);
        self
    }

    /// Records per-generation statistics and the run summary.
    pub fn statistics(mut self, writer: statistics::Writer) -> Self {
        self.statistics = Some(writer);
        self
    }

    pub fn listener(mut self, listener: Box<dyn IterationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[instrument(level = "debug", skip(self), fields(population_size = self.population.len(), num_variables = self.variables.len()))]
    pub fn build(self) -> Service<F, O> {
        let mut all_conflict_sets = ConflictSetRegistry::new();
        if let Some(writer) = self.conflicts_writer {
            all_conflict_sets.attach_writer(writer);
        }
        all_conflict_sets.preload(self.known_conflicts);

        let mut all_conflict_sets_without_core = ConflictSetRegistry::new();
        if let Some(writer) = self.conflicts_without_core_writer {
            all_conflict_sets_without_core.attach_writer(writer);
        }
        all_conflict_sets_without_core.preload(self.known_conflicts_without_core);

        let population_size = self.population.len();

        Service {
            factory: self.factory,
            oracle: self.oracle,
            variables: self.variables,
            population: self.population,
            population_size,
            num_max_conflicts: self.num_max_conflicts,
            stop_after_no_conflict: self.stop_after_no_conflict,
            extinct_after_no_conflict: self.extinct_after_no_conflict,
            stop_after_extinctions: self.stop_after_extinctions,
            mutation: self.mutation,
            crossover: self.crossover,
            resolve: self.resolve,
            resolved_ids: ResolvedIds::new(),
            all_conflict_sets,
            all_conflict_sets_without_core,
            statistics: self.statistics,
            listeners: self.listeners,
            rng: StdRng::seed_from_u64(self.seed),
            run_id: Uuid::now_v7(),
            current_iteration: 0,
            current_generation: 0,
            current_epoch: 0,
            no_conflict_streak: 0,
            terminated: false,
            conclusion: None,
        }
    }
}

impl<F, O> Service<F, O>
where
    F: ModelFactory,
    O: ConflictOracle<F::Model>,
{
    pub fn builder(
        factory: F,
        oracle: O,
        variables: Vec<Variable>,
        population: Population,
        seed: u64,
    ) -> ServiceBuilder<F, O> {
        ServiceBuilder {
            factory,
            oracle,
            variables,
            population,
            seed,
            num_max_conflicts: 0,
            stop_after_no_conflict: 0,
            extinct_after_no_conflict: 0,
            stop_after_extinctions: 0,
            mutation: None,
            crossover: None,
            resolve: None,
            known_conflicts: Vec::new(),
            known_conflicts_without_core: Vec::new(),
            conflicts_writer: None,
            conflicts_without_core_writer: None,
            statistics: None,
            listeners: Vec::new(),
        }
    }

    /// Runs generations until a termination condition fires or
    /// `max_iterations` generations have run, then closes the statistics
    /// writer regardless of how the run ended.
    #[instrument(level = "info", skip(self), fields(run_id = %self.run_id, max_iterations = max_iterations))]
    pub fn evolve_for(&mut self, max_iterations: u32) -> Result<Conclusion, Error> {
        self.terminated = false;
        self.conclusion = None;
        self.current_iteration = 0;
        self.no_conflict_streak = 0;

        let result = self.run_generations(max_iterations);

        if let Some(statistics) = self.statistics.take() {
            if let Err(error) = statistics.close() {
                tracing::warn!(%error, "failed to close the statistics writer");
            }
        }

        result
    }

    fn run_generations(&mut self, max_iterations: u32) -> Result<Conclusion, Error> {
        while self.current_iteration < max_iterations && !self.terminated {
            self.evolve()?;
        }

        Ok(self.conclusion.unwrap_or(Conclusion::IterationBudgetReached))
    }

    /// Executes exactly one generation.
    #[instrument(level = "info", skip(self), fields(run_id = %self.run_id, iteration = self.current_iteration, epoch = self.current_epoch, generation = self.current_generation))]
    pub fn evolve(&mut self) -> Result<(), Error> {
        tracing::info!(
            population_size = self.population.len(),
            "checking all individuals for conflicts"
        );

        // Assess every individual; conflicting ones are replaced by their
        // resolutions, consistent ones survive as clones.
        let mut generation_conflicts: Vec<ConflictSet> = Vec::new();
        let mut generation_conflicts_without_core: Vec<ConflictSet> = Vec::new();
        let mut parents = Population::with_capacity(self.population_size);

        let population = std::mem::take(&mut self.population);
        for individual in &population {
            self.factory.set_requirement(individual);
            let model = self.factory.create_model().map_err(Error::Model)?;
            let conflicts = self
                .oracle
                .find_conflicts(&model, self.num_max_conflicts)
                .map_err(Error::Oracle)?;

            if conflicts.is_empty() {
                tracing::debug!(individual = %individual, "consistent");
                parents.push(individual.clone());
                continue;
            }

            tracing::debug!(
                individual = %individual,
                num_conflicts = conflicts.len(),
                "inconsistent"
            );
            for conflict in conflicts {
                if let Some(filtered) = conflict.without_core_constraints() {
                    if !generation_conflicts_without_core.contains(&filtered) {
                        generation_conflicts_without_core.push(filtered);
                    }
                }
                if !generation_conflicts.contains(&conflict) {
                    generation_conflicts.push(conflict);
                }
            }

            if let Some(resolve) = &self.resolve {
                for resolved in resolve.resolve(
                    individual,
                    &generation_conflicts_without_core,
                    &mut self.resolved_ids,
                ) {
                    parents.push(resolved);
                }
            }
        }

        // Merge the generation buffers into the global registries.
        let known_before = self.all_conflict_sets.len();
        for conflict in &generation_conflicts {
            self.all_conflict_sets.register(conflict.clone());
        }
        for conflict in &generation_conflicts_without_core {
            self.all_conflict_sets_without_core.register(conflict.clone());
        }
        let new_min_conflicts = self.all_conflict_sets.len() - known_before;

        tracing::info!(
            generated = generation_conflicts.len(),
            new = new_min_conflicts,
            total = self.all_conflict_sets.len(),
            "minimal conflict sets found in this generation"
        );

        if let Some(statistics) = &mut self.statistics {
            if let Err(error) = statistics.record(
                self.current_epoch,
                self.current_generation,
                generation_conflicts.len(),
                new_min_conflicts,
                self.all_conflict_sets.len(),
            ) {
                tracing::warn!(%error, "failed to record statistics, continuing");
            }
        }

        self.population = parents;

        if new_min_conflicts > 0 {
            self.notify_listeners();
        }

        if let Some(crossover) = self.crossover.clone() {
            tracing::info!(
                population_size = self.population_size,
                "breeding a new generation"
            );
            let bred = crossover.breed(
                &mut self.rng,
                &self.population,
                &self.variables,
                self.population_size,
                self.all_conflict_sets_without_core.sets(),
                self.resolve.as_ref(),
                &mut self.resolved_ids,
            );
            self.population = bred;
            self.notify_listeners();
        }

        if let Some(mutation) = self.mutation.clone() {
            if !self.population.is_empty() {
                tracing::info!("mutating the new generation");
                let mutated = mutation.apply(&mut self.rng, &self.population, &self.variables);
                self.population = mutated;
            } else {
                tracing::info!("population died out, reseeding from scratch");
                self.population = Population::generate(
                    self.population_size,
                    &mutation,
                    &self.variables,
                    &mut self.rng,
                );
            }
            self.notify_listeners();
        }

        self.update_termination_state(new_min_conflicts);

        self.current_generation += 1;
        self.current_iteration += 1;
        Ok(())
    }

    fn update_termination_state(&mut self, new_min_conflicts: usize) {
        if new_min_conflicts > 0 {
            self.no_conflict_streak = 0;
            return;
        }

        self.no_conflict_streak += 1;

        if self.extinct_after_no_conflict > 0
            && self.no_conflict_streak >= self.extinct_after_no_conflict
        {
            self.current_epoch += 1;
            self.current_generation = 0;

            if self.current_epoch >= self.stop_after_extinctions {
                tracing::info!(
                    epoch = self.current_epoch,
                    streak = self.no_conflict_streak,
                    "extinction budget exhausted, terminating"
                );
                self.terminated = true;
                self.conclusion = Some(Conclusion::ExtinctionBudgetExhausted);
            } else if let Some(mutation) = self.mutation.clone() {
                tracing::info!(
                    epoch = self.current_epoch,
                    streak = self.no_conflict_streak,
                    "population extinct, starting a fresh epoch"
                );
                self.population = Population::generate(
                    self.population_size,
                    &mutation,
                    &self.variables,
                    &mut self.rng,
                );
            } else {
                self.population = Population::new();
            }
        } else if self.stop_after_no_conflict > 0
            && self.no_conflict_streak >= self.stop_after_no_conflict
        {
            tracing::info!(
                streak = self.no_conflict_streak,
                "no new conflicts for too long, terminating"
            );
            self.terminated = true;
            self.conclusion = Some(Conclusion::NoConflictStreakExceeded);
        }
    }

    fn notify_listeners(&mut self) {
        let ctx = IterationContext {
            population: &self.population,
            epoch: self.current_epoch,
            generation: self.current_generation,
            iteration: self.current_iteration,
            known_conflicts: self.all_conflict_sets.len(),
        };
        for listener in self.listeners.iter_mut() {
            listener.update(&ctx);
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn IterationListener>) {
        self.listeners.push(listener);
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn all_conflict_sets(&self) -> &ConflictSetRegistry {
        &self.all_conflict_sets
    }

    pub fn all_conflict_sets_without_core(&self) -> &ConflictSetRegistry {
        &self.all_conflict_sets_without_core
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn current_generation(&self) -> u32 {
        self.current_generation
    }

    pub fn current_epoch(&self) -> u32 {
        self.current_epoch
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn conclusion(&self) -> Option<Conclusion> {
        self.conclusion
    }
}
