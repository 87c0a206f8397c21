//! File persistence for conflict sets.
//!
//! One conflict set per line, constraints joined by the literal ` --- `
//! separator. [`read`] reverses the format exactly: one line becomes one
//! conflict set, preserving line order and per-line constraint order.

use crate::models::{ConflictSet, Constraint};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write as _};
use std::path::Path;
use tracing::instrument;

const SEPARATOR: &str = " --- ";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

/// Appends conflict sets to a file as they are discovered.
///
/// Every appended record is flushed immediately so a crashed run never
/// leaves a half-written conflict file behind.
#[derive(Debug)]
pub struct Writer {
    inner: BufWriter<File>,
}

impl Writer {
    /// Creates (or truncates) the conflict file, creating missing parent
    /// directories first.
    #[instrument(level = "debug", fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Ok(Self {
            inner: BufWriter::new(file),
        })
    }

    /// Writes one conflict set as a single line and flushes.
    pub fn append(&mut self, set: &ConflictSet) -> Result<(), Error> {
        let line = set
            .iter()
            .map(Constraint::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        writeln!(self.inner, "{line}")?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Loads previously persisted conflict sets, one per line. Blank lines are
/// skipped; duplicate constraints within a line collapse into one.
#[instrument(level = "debug", fields(path = %path.as_ref().display()))]
pub fn read(path: impl AsRef<Path>) -> Result<Vec<ConflictSet>, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut sets = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        sets.push(ConflictSet::from_constraints(
            line.split(SEPARATOR).map(Constraint::new),
        ));
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(constraints: &[&str]) -> ConflictSet {
        ConflictSet::from_constraints(constraints.iter().map(|c| Constraint::new(c)))
    }

    #[test]
    fn it_writes_one_set_per_line_with_the_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("conflicts.da");

        let mut writer = Writer::create(&path).unwrap();
        writer.append(&conflict(&["B+ Tree=false", "Unindexed=false"])).unwrap();
        writer.append(&conflict(&["A=true"])).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "B+ Tree=false --- Unindexed=false\nA=true\n");
    }

    #[test]
    fn it_reads_back_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflicts.da");

        let sets = vec![
            conflict(&["A=true", "B=true"]),
            conflict(&["Memory Card=SD", "Battery=long"]),
        ];

        let mut writer = Writer::create(&path).unwrap();
        for set in &sets {
            writer.append(set).unwrap();
        }

        let loaded = read(&path).unwrap();
        assert_eq!(loaded, sets);
    }

    #[test]
    fn reading_a_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(dir.path().join("absent.da")).is_err());
    }
}
