//! Interfaces to the external constraint-solving side of the system.
//!
//! The engine never decides satisfiability itself. It hands each candidate
//! requirement to a [`ModelFactory`], obtains a [`DiagnosisModel`], and asks a
//! [`ConflictOracle`] for the minimal conflict sets the requirement violates.
//! Implementations typically wrap a CSP solver and a minimal-conflict search
//! such as QuickXPlain; this crate only specifies the boundary.

use crate::models::{ConflictSet, Constraint, Requirement};

/// A diagnosis model built for one candidate requirement: the constraints
/// under suspicion and the background constraints assumed correct.
pub trait DiagnosisModel {
    /// Constraints a conflict may be built from, usually the requirement's
    /// own assignments plus possibly faulty knowledge-base constraints.
    fn possibly_faulty_constraints(&self) -> &[Constraint];

    /// Background constraints assumed correct; never part of a conflict.
    fn correct_constraints(&self) -> &[Constraint];
}

/// Builds a fresh diagnosis model per candidate requirement.
///
/// Consumed once per individual per generation: `set_requirement` installs
/// the candidate, `create_model` materializes the model the oracle runs on.
pub trait ModelFactory {
    type Model: DiagnosisModel;

    fn set_requirement(&mut self, requirement: &Requirement);

    fn create_model(&self) -> Result<Self::Model, anyhow::Error>;
}

/// Finds the minimal conflict sets a diagnosis model exhibits.
///
/// Returned conflict sets must be minimal (no proper subset is jointly
/// unsatisfiable) and deduplicated within one call. `max_conflicts` bounds
/// the search, with 0 meaning unbounded.
///
/// An error from the oracle is fatal to the whole run: silently skipping an
/// individual would desynchronize population size and conflict accounting.
pub trait ConflictOracle<M: DiagnosisModel> {
    fn find_conflicts(
        &mut self,
        model: &M,
        max_conflicts: usize,
    ) -> Result<Vec<ConflictSet>, anyhow::Error>;
}
