/// Errors that abort an evolution run.
///
/// Both variants wrap failures of the external constraint-solving side.
/// They are fatal by design: skipping the affected individual would leave
/// the population size and the conflict accounting out of sync.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ModelError: {0}")]
    Model(#[source] anyhow::Error),
    #[error("OracleError: {0}")]
    Oracle(#[source] anyhow::Error),
}
