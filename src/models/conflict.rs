use serde::{Deserialize, Serialize};

/// An opaque constraint reference, identified by its canonical string form.
///
/// The engine never interprets constraints beyond string identity, with one
/// exception: the core filter keeps only constraints whose canonical form is a
/// single `variable=value` equality (see [`Constraint::is_simple_equality`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint(String);

impl Constraint {
    pub fn new(canonical: &str) -> Self {
        Self(canonical.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the canonical form decomposes into exactly one
    /// `variable=value` token. Compound or model-internal constraints
    /// (e.g. `requires(A, B)` or chained equalities) do not qualify.
    pub fn is_simple_equality(&self) -> bool {
        self.0.split('=').count() == 2
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A minimal set of jointly unsatisfiable constraints, as reported by the
/// conflict oracle for one requirement.
///
/// Constraints keep their insertion order (resolution expands them in that
/// order), but equality is order-independent set equality.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ConflictSet {
    constraints: Vec<Constraint>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Builds a conflict set from constraints in encounter order,
    /// collapsing duplicates.
    pub fn from_constraints(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        let mut set = Self::new();
        for constraint in constraints {
            set.insert(constraint);
        }
        set
    }

    /// Inserts a constraint unless an equal one is already present.
    /// Returns whether the constraint was new.
    pub fn insert(&mut self, constraint: Constraint) -> bool {
        if self.constraints.contains(&constraint) {
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.constraints.contains(constraint)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }

    /// The subset of constraints that survive the core filter: simple
    /// `variable=value` equalities only. Returns `None` when nothing
    /// survives, so callers do not register empty conflict sets.
    pub fn without_core_constraints(&self) -> Option<ConflictSet> {
        let filtered = ConflictSet::from_constraints(
            self.constraints
                .iter()
                .filter(|c| c.is_simple_equality())
                .cloned(),
        );

        if filtered.is_empty() {
            None
        } else {
            Some(filtered)
        }
    }
}

impl Default for ConflictSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ConflictSet {
    fn eq(&self, other: &Self) -> bool {
        self.constraints.len() == other.constraints.len()
            && self.constraints.iter().all(|c| other.contains(c))
    }
}

impl<'a> IntoIterator for &'a ConflictSet {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(constraints: &[&str]) -> ConflictSet {
        ConflictSet::from_constraints(constraints.iter().map(|c| Constraint::new(c)))
    }

    #[test]
    fn it_recognizes_simple_equalities() {
        assert!(Constraint::new("A=true").is_simple_equality());
        assert!(Constraint::new("Memory Card=SD").is_simple_equality());
        assert!(!Constraint::new("requires(A, B)").is_simple_equality());
        assert!(!Constraint::new("A=B=C").is_simple_equality());
    }

    #[test]
    fn it_collapses_duplicate_constraints() {
        let mut set = ConflictSet::new();

        assert!(set.insert(Constraint::new("A=true")));
        assert!(!set.insert(Constraint::new("A=true")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn equality_is_order_independent() {
        let lhs = conflict(&["A=true", "B=true"]);
        let rhs = conflict(&["B=true", "A=true"]);

        assert_eq!(lhs, rhs);
        assert_ne!(lhs, conflict(&["A=true"]));
        assert_ne!(lhs, conflict(&["A=true", "B=false"]));
    }

    #[test]
    fn it_filters_core_constraints() {
        let set = conflict(&["A=true", "requires(A, B)", "B=false"]);

        let filtered = set.without_core_constraints().unwrap();
        assert_eq!(filtered, conflict(&["A=true", "B=false"]));
    }

    #[test]
    fn it_drops_conflicts_with_only_core_constraints() {
        let set = conflict(&["requires(A, B)", "excludes(C, D)"]);

        assert!(set.without_core_constraints().is_none());
    }
}
