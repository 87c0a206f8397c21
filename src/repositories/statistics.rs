//! Per-generation run statistics.
//!
//! One CSV row per generation, flushed per record, plus an optional run
//! summary appended to a separate file when the run concludes. The summary
//! file accumulates one row per run, so repeated experiments against the
//! same summary path build up a comparison table.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::instrument;

const HEADER: &str = "epoch,generation,total_conflicts,generated_conflicts,new_conflicts";
const SUMMARY_HEADER: &str = "total_epochs,total_generations,total_conflicts,runtime_ms";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

/// Records one statistics row per generation and a summary on close.
#[derive(Debug)]
pub struct Writer {
    log: BufWriter<File>,
    summary_path: Option<PathBuf>,
    total_conflicts: usize,
    epochs: u32,
    generations: u32,
    started: Instant,
}

impl Writer {
    /// Creates (or truncates) the statistics file and writes the header.
    ///
    /// Failing here is fatal to the embedder: without a statistics
    /// destination the whole run would go unrecorded.
    #[instrument(level = "debug", fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut log = BufWriter::new(File::create(path)?);
        writeln!(log, "{HEADER}")?;
        log.flush()?;

        Ok(Self {
            log,
            summary_path: None,
            total_conflicts: 0,
            epochs: 0,
            generations: 0,
            started: Instant::now(),
        })
    }

    /// Configures the file the run summary is appended to on [`close`].
    ///
    /// [`close`]: Writer::close
    pub fn with_summary(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }

    /// Records one generation: the epoch and generation counters, how many
    /// conflict sets this generation produced, how many of those were new
    /// globally, and the global total after registration.
    pub fn record(
        &mut self,
        epoch: u32,
        generation: u32,
        generated_conflicts: usize,
        new_conflicts: usize,
        total_conflicts: usize,
    ) -> Result<(), Error> {
        debug_assert_eq!(
            self.total_conflicts + new_conflicts,
            total_conflicts,
            "conflict totals drifted out of sync with the registry"
        );
        self.total_conflicts = total_conflicts;
        self.epochs = epoch + 1;
        self.generations += 1;

        writeln!(
            self.log,
            "{epoch},{generation},{total_conflicts},{generated_conflicts},{new_conflicts}"
        )?;
        self.log.flush()?;
        Ok(())
    }

    /// Flushes the statistics log and, when a summary destination was
    /// configured, appends the run summary.
    #[instrument(level = "debug", skip(self), fields(epochs = self.epochs, generations = self.generations, total_conflicts = self.total_conflicts))]
    pub fn close(mut self) -> Result<(), Error> {
        self.log.flush()?;

        if let Some(path) = &self.summary_path {
            let write_header = !path.exists();
            let mut summary = OpenOptions::new().create(true).append(true).open(path)?;

            if write_header {
                writeln!(summary, "{SUMMARY_HEADER}")?;
            }
            writeln!(
                summary,
                "{},{},{},{}",
                self.epochs,
                self.generations,
                self.total_conflicts,
                self.started.elapsed().as_millis()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_writes_the_header_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.csv");

        let _writer = Writer::create(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{HEADER}\n"));
    }

    #[test]
    fn records_are_flushed_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.csv");

        let mut writer = Writer::create(&path).unwrap();
        writer.record(0, 0, 3, 2, 2).unwrap();
        writer.record(0, 1, 1, 0, 2).unwrap();

        // Readable before close: every record is flushed on write
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{HEADER}\n0,0,2,3,2\n0,1,2,1,0\n"));
    }

    #[test]
    fn the_summary_accumulates_one_row_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let statistics = dir.path().join("statistics.csv");
        let summary = dir.path().join("summary.csv");

        let mut writer = Writer::create(&statistics)
            .unwrap()
            .with_summary(&summary);
        writer.record(0, 0, 1, 1, 1).unwrap();
        writer.record(1, 0, 0, 0, 1).unwrap();
        writer.close().unwrap();

        // A second run appends below the existing header
        let mut writer = Writer::create(&statistics)
            .unwrap()
            .with_summary(&summary);
        writer.record(0, 0, 2, 2, 2).unwrap();
        writer.close().unwrap();

        let contents = std::fs::read_to_string(&summary).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SUMMARY_HEADER);
        assert!(lines[1].starts_with("2,2,1,"));
        assert!(lines[2].starts_with("1,1,2,"));
    }

    #[test]
    fn closing_without_a_summary_path_writes_no_summary() {
        let dir = tempfile::tempdir().unwrap();
        let statistics = dir.path().join("statistics.csv");

        let mut writer = Writer::create(&statistics).unwrap();
        writer.record(0, 0, 0, 0, 0).unwrap();
        writer.close().unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
