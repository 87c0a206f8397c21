use super::{ConflictSet, Requirement};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Source of the ids that link requirements resolved from the same ancestor
/// in the same resolution step.
///
/// Owned by the engine and handed to the resolve strategy by reference, so
/// runs stay independently reproducible. Id 0 is reserved for requirements
/// that were never resolved.
#[derive(Debug, Default)]
pub struct ResolvedIds {
    next: u64,
}

impl ResolvedIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Conflict elimination strategy: replaces a requirement known to reproduce
/// conflict sets with variants that no longer do.
///
/// Resolution expands combinatorially: each applicable conflict set, in
/// encounter order, replaces every requirement in the working set with one
/// variant per constraint of the set, where the variant drops the assignment
/// matching that constraint. N applicable conflicts of size k thus yield up
/// to `k^N` variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Resolve {
    /// Resolves without touching selection metadata.
    Plain,
    /// Additionally tags every variant with `weight = number of applicable
    /// conflicts` and one fresh shared resolution id, so crossover can favor
    /// conflict-rich ancestry and avoid pairing resolution siblings.
    Weighted,
}

impl Resolve {
    /// Resolves `individual` against the given conflict sets.
    ///
    /// Conflict sets not fully contained in the individual do not apply; when
    /// none apply the individual is returned unchanged as the only element.
    #[instrument(level = "debug", skip(self, individual, conflicts, ids), fields(strategy = ?self, num_conflicts = conflicts.len()))]
    pub(crate) fn resolve(
        &self,
        individual: &Requirement,
        conflicts: &[ConflictSet],
        ids: &mut ResolvedIds,
    ) -> Vec<Requirement> {
        let applicable: Vec<&ConflictSet> = conflicts
            .iter()
            .filter(|conflict| individual.contains_conflict(conflict))
            .collect();

        if applicable.is_empty() {
            return vec![individual.clone()];
        }

        let (weight, resolved_id) = match self {
            Resolve::Plain => (0, 0),
            Resolve::Weighted => (applicable.len() as u32, ids.next_id()),
        };

        let mut resolved = vec![individual.clone()];
        for conflict in applicable {
            let mut expanded = Vec::with_capacity(resolved.len() * conflict.len());
            for ancestor in &resolved {
                for constraint in conflict {
                    expanded.push(Requirement::resolved(
                        ancestor.assignments_without(constraint),
                        weight,
                        resolved_id,
                    ));
                }
            }
            resolved = expanded;
        }

        resolved
    }
}
