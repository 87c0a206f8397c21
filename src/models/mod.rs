mod assignment;
mod conflict;
mod crossover;
mod mutation;
mod population;
mod requirement;
mod resolve;
mod sampling;

pub use assignment::{Assignment, Variable};
pub use conflict::{ConflictSet, Constraint};
pub use crossover::{Crossover, CrossoverFactorOutOfRange};
pub use mutation::{Mutation, MutationError};
pub use population::Population;
pub use requirement::{Requirement, MIN_ASSIGNMENTS};
pub use resolve::{Resolve, ResolvedIds};
pub use sampling::select_indexes;
