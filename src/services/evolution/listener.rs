use crate::models::Population;

/// Engine state handed to iteration listeners.
#[derive(Debug)]
pub struct IterationContext<'a> {
    pub population: &'a Population,
    pub epoch: u32,
    pub generation: u32,
    pub iteration: u32,
    pub known_conflicts: usize,
}

/// Callback notified as a generation progresses: after resolution produced
/// new conflicts, after crossover, and after mutation — up to three times
/// per generation.
pub trait IterationListener {
    fn update(&mut self, ctx: &IterationContext<'_>);
}
