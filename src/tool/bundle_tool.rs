use crate::error::Result;
use crate::parser::LogDescriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Location of a graph the bundle tool wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphHandle {
    path: PathBuf,
}

impl GraphHandle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportResult {
    /// Files now present in the export directory.
    pub files: Vec<PathBuf>,
    /// Files that could not be merged (best-effort merge mode only).
    pub merge_failures: Vec<String>,
}

/// Bridge to the external tool that understands result bundle internals.
///
/// Both calls block until the tool finishes and are never retried.
pub trait BundleTool {
    fn extract_graph(&self, bundle_path: &Path, output_directory: &Path) -> Result<GraphHandle>;

    fn export(
        &self,
        logs: &[LogDescriptor],
        bundle_path: &Path,
        to_directory: &Path,
    ) -> Result<ExportResult>;
}
