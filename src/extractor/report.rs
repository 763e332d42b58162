use crate::extractor::ExtractionOutcome;
use crate::parser::LogDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub bundle_path: PathBuf,
    pub output_directory: PathBuf,
    /// `None` when the graph file was removed after the run.
    pub graph_path: Option<PathBuf>,
    pub logs: Vec<LogDescriptor>,
    pub files: Vec<PathBuf>,
    pub merge_failures: Vec<String>,
    /// Problems after a successful export, such as a graph file that could not be removed.
    pub warnings: Vec<String>,
    pub extraction_time: DateTime<Utc>,
    pub extraction_duration: Duration,
}

impl ExtractionReport {
    pub fn from_outcome(
        bundle_path: PathBuf,
        outcome: ExtractionOutcome,
        graph_kept: bool,
        extraction_duration: Duration,
    ) -> Self {
        Self {
            bundle_path,
            output_directory: outcome.output_directory,
            graph_path: graph_kept.then(|| outcome.graph.path().to_path_buf()),
            logs: outcome.logs,
            files: outcome.export.files,
            merge_failures: outcome.export.merge_failures,
            warnings: Vec::new(),
            extraction_time: Utc::now(),
            extraction_duration,
        }
    }

    /// Sum of the sizes the graph reported; logs without a size count as zero.
    pub fn reported_bytes(&self) -> u64 {
        self.logs.iter().filter_map(|l| l.size).sum()
    }

    pub fn has_warnings(&self) -> bool {
        !self.merge_failures.is_empty() || !self.warnings.is_empty()
    }
}
