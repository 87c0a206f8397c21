use super::{Assignment, ConflictSet, Constraint};
use serde::{Deserialize, Serialize};

/// The smallest number of assignments a generated requirement must carry to
/// be worth checking against the knowledge base.
pub const MIN_ASSIGNMENTS: usize = 2;

/// A candidate user requirement: an ordered partial assignment of
/// knowledge-base variables.
///
/// Requirements are immutable once built. Strategies that "modify" a
/// requirement construct a replacement, so a requirement referenced from both
/// the outgoing and the incoming population can never be observed mid-change.
///
/// `weight` and `resolved_id` are only nonzero on requirements produced by
/// weighted conflict resolution: `weight` counts the conflicts the ancestor
/// violated, and all requirements resolved from the same ancestor in the same
/// resolution step share one `resolved_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    assignments: Vec<Assignment>,
    weight: u32,
    resolved_id: u64,
}

impl Requirement {
    pub fn new(assignments: Vec<Assignment>) -> Self {
        Self::resolved(assignments, 0, 0)
    }

    /// Builds a requirement produced by conflict resolution, carrying its
    /// selection weight and the id shared with its resolution siblings.
    pub fn resolved(assignments: Vec<Assignment>, weight: u32, resolved_id: u64) -> Self {
        debug_assert!(
            has_unique_variables(&assignments),
            "requirement carries duplicate variable assignments"
        );

        Self {
            assignments,
            weight,
            resolved_id,
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn resolved_id(&self) -> u64 {
        self.resolved_id
    }

    /// The value this requirement assigns to `variable`, if any.
    pub fn value_of(&self, variable: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.variable() == variable)
            .map(|a| a.value())
    }

    /// Whether some assignment's canonical form equals the constraint.
    pub fn matches(&self, constraint: &Constraint) -> bool {
        self.assignments
            .iter()
            .any(|a| a.matches_str(constraint.as_str()))
    }

    /// Whether every constraint of the conflict set is matched by an
    /// assignment, i.e. the requirement reproduces the conflict.
    pub fn contains_conflict(&self, conflict: &ConflictSet) -> bool {
        conflict.iter().all(|c| self.matches(c))
    }

    /// Whether any of the given conflict sets is contained in this
    /// requirement.
    pub fn has_known_conflict(&self, conflicts: &[ConflictSet]) -> bool {
        conflicts.iter().any(|c| self.contains_conflict(c))
    }

    /// The assignments minus the one matching `constraint`, if present.
    pub(crate) fn assignments_without(&self, constraint: &Constraint) -> Vec<Assignment> {
        self.assignments
            .iter()
            .filter(|a| !a.matches_str(constraint.as_str()))
            .cloned()
            .collect()
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, assignment) in self.assignments.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{assignment}")?;
        }
        Ok(())
    }
}

fn has_unique_variables(assignments: &[Assignment]) -> bool {
    assignments
        .iter()
        .enumerate()
        .all(|(index, a)| !assignments[..index].iter().any(|b| b.variable == a.variable))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(pairs: &[(&str, &str)]) -> Requirement {
        Requirement::new(
            pairs
                .iter()
                .map(|(variable, value)| Assignment::new(variable, value))
                .collect(),
        )
    }

    fn conflict(constraints: &[&str]) -> ConflictSet {
        ConflictSet::from_constraints(constraints.iter().map(|c| Constraint::new(c)))
    }

    #[test]
    fn it_looks_up_values_by_variable() {
        let ur = requirement(&[("A", "true"), ("B", "false")]);

        assert_eq!(ur.value_of("A"), Some("true"));
        assert_eq!(ur.value_of("B"), Some("false"));
        assert_eq!(ur.value_of("C"), None);
    }

    #[test]
    fn it_detects_contained_conflicts() {
        let ur = requirement(&[("A", "true"), ("B", "true"), ("C", "false")]);

        assert!(ur.contains_conflict(&conflict(&["A=true", "B=true"])));
        assert!(!ur.contains_conflict(&conflict(&["A=true", "B=false"])));
        assert!(!ur.contains_conflict(&conflict(&["A=true", "D=true"])));
    }

    #[test]
    fn it_detects_any_known_conflict() {
        let ur = requirement(&[("A", "true"), ("B", "true")]);
        let known = vec![conflict(&["C=true", "D=true"]), conflict(&["A=true", "B=true"])];

        assert!(ur.has_known_conflict(&known));
        assert!(!ur.has_known_conflict(&known[..1]));
    }

    #[test]
    fn it_removes_the_matching_assignment() {
        let ur = requirement(&[("A", "true"), ("B", "true")]);

        let remaining = ur.assignments_without(&Constraint::new("A=true"));
        assert_eq!(remaining, vec![Assignment::new("B", "true")]);

        // A constraint matching nothing leaves the assignments untouched
        let remaining = ur.assignments_without(&Constraint::new("C=true"));
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn display_joins_assignments() {
        let ur = requirement(&[("A", "true"), ("B", "false")]);
        assert_eq!(ur.to_string(), "A=true, B=false");
    }

    #[test]
    #[should_panic(expected = "duplicate variable")]
    fn it_rejects_duplicate_variables_in_debug_builds() {
        requirement(&[("A", "true"), ("A", "false")]);
    }
}
