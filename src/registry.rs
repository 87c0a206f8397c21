use crate::models::ConflictSet;
use crate::repositories::conflicts;
use tracing::instrument;

/// Deduplicated, insertion-ordered accumulation of the conflict sets
/// discovered across a whole run.
///
/// The registry only ever grows; membership is structural conflict-set
/// equality. When a persistence writer is attached, every newly registered
/// set is appended to the conflict file — a failed append is logged and the
/// run continues, since losing one persisted line must not abort the search.
#[derive(Debug, Default)]
pub struct ConflictSetRegistry {
    sets: Vec<ConflictSet>,
    writer: Option<conflicts::Writer>,
}

impl ConflictSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the file writer that newly registered sets are appended to.
    pub fn attach_writer(&mut self, writer: conflicts::Writer) {
        self.writer = Some(writer);
    }

    /// Seeds the registry with already-known conflict sets, e.g. loaded from
    /// a previous run's conflict file. Duplicates are dropped; nothing is
    /// echoed back to the writer. Returns how many sets were actually added.
    pub fn preload(&mut self, sets: impl IntoIterator<Item = ConflictSet>) -> usize {
        let mut added = 0;
        for set in sets {
            if !self.contains(&set) {
                self.sets.push(set);
                added += 1;
            }
        }
        added
    }

    /// Registers a conflict set unless a structurally equal one is already
    /// known. Returns whether the set was new.
    #[instrument(level = "debug", skip(self, set), fields(known = self.sets.len()))]
    pub fn register(&mut self, set: ConflictSet) -> bool {
        if self.contains(&set) {
            tracing::debug!(conflict_set = ?set, "conflict set already known");
            return false;
        }

        if let Some(writer) = &mut self.writer {
            if let Err(error) = writer.append(&set) {
                tracing::warn!(%error, "failed to persist conflict set, continuing");
            }
        }

        self.sets.push(set);
        true
    }

    pub fn contains(&self, set: &ConflictSet) -> bool {
        self.sets.contains(set)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn sets(&self) -> &[ConflictSet] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Constraint;

    fn conflict(constraints: &[&str]) -> ConflictSet {
        ConflictSet::from_constraints(constraints.iter().map(|c| Constraint::new(c)))
    }

    #[test]
    fn it_registers_new_sets_in_insertion_order() {
        let mut registry = ConflictSetRegistry::new();

        assert!(registry.register(conflict(&["A=true", "B=true"])));
        assert!(registry.register(conflict(&["C=true"])));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.sets()[0], conflict(&["A=true", "B=true"]));
        assert_eq!(registry.sets()[1], conflict(&["C=true"]));
    }

    #[test]
    fn registering_a_known_set_is_idempotent() {
        let mut registry = ConflictSetRegistry::new();

        assert!(registry.register(conflict(&["A=true", "B=true"])));
        // Same set, different constraint order
        assert!(!registry.register(conflict(&["B=true", "A=true"])));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn preloading_deduplicates_against_itself_and_the_registry() {
        let mut registry = ConflictSetRegistry::new();
        registry.register(conflict(&["A=true"]));

        let added = registry.preload(vec![
            conflict(&["A=true"]),
            conflict(&["B=true"]),
            conflict(&["B=true"]),
        ]);

        assert_eq!(added, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn newly_registered_sets_are_appended_to_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflicts.da");

        let mut registry = ConflictSetRegistry::new();
        registry.attach_writer(conflicts::Writer::create(&path).unwrap());

        registry.register(conflict(&["A=true", "B=true"]));
        registry.register(conflict(&["A=true", "B=true"])); // duplicate, not written
        registry.register(conflict(&["C=false"]));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "A=true --- B=true\nC=false\n");
    }
}
