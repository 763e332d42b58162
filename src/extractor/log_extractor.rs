use crate::error::{ExtractorError, Result};
use crate::files::FileHandler;
use crate::parser::{GraphParser, LogDescriptor};
use crate::tool::{BundleTool, ExportResult, GraphHandle};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Pipeline position; each run moves strictly forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStage {
    Start,
    OutputResolved,
    GraphGenerated,
    LogsParsed,
    Exported,
}

/// Receives progress messages from the pipeline.
pub trait LogSink {
    fn log(&self, message: &str);

    fn stage(&self, _stage: ExtractionStage) {}
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub output_directory: PathBuf,
    pub graph: GraphHandle,
    pub logs: Vec<LogDescriptor>,
    pub export: ExportResult,
    pub stage: ExtractionStage,
}

/// Runs one extraction: resolve output, generate graph, parse, export.
///
/// Nothing is rolled back on failure. Directories and graph files created
/// before the failing step stay on disk.
pub struct LogExtractor<'a> {
    tool: &'a dyn BundleTool,
    parser: &'a dyn GraphParser,
    files: &'a dyn FileHandler,
    sink: &'a dyn LogSink,
    directory_mode: Option<u32>,
}

impl<'a> LogExtractor<'a> {
    pub fn new(
        tool: &'a dyn BundleTool,
        parser: &'a dyn GraphParser,
        files: &'a dyn FileHandler,
        sink: &'a dyn LogSink,
    ) -> Self {
        Self {
            tool,
            parser,
            files,
            sink,
            directory_mode: None,
        }
    }

    pub fn with_directory_mode(mut self, mode: Option<u32>) -> Self {
        self.directory_mode = mode;
        self
    }

    pub fn extract_logs(
        &self,
        xcresult_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<ExtractionOutcome> {
        self.sink.stage(ExtractionStage::Start);
        self.sink.log("Generating .xcresult graph...");

        let output_directory = self.resolve_output_directory(xcresult_path, output_path)?;
        self.sink.stage(ExtractionStage::OutputResolved);

        let graph = self.tool.extract_graph(xcresult_path, &output_directory)?;
        self.sink.stage(ExtractionStage::GraphGenerated);

        self.sink.log("Parsing graph...");
        let logs = self.parser.parse_logs(&graph)?;
        self.sink.log(&format!("Found {} log(s)", logs.len()));
        self.sink.stage(ExtractionStage::LogsParsed);

        let export = self.tool.export(&logs, xcresult_path, &output_directory)?;
        self.sink.stage(ExtractionStage::Exported);

        Ok(ExtractionOutcome {
            output_directory,
            graph,
            logs,
            export,
            stage: ExtractionStage::Exported,
        })
    }

    fn resolve_output_directory(
        &self,
        xcresult_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<PathBuf> {
        match output_path {
            Some(path) => {
                self.files
                    .create_directory(path, true, self.directory_mode)
                    .map_err(|e| ExtractorError::CreateOutputDirectoryFailed {
                        path: path.to_path_buf(),
                        source: Box::new(e),
                    })?;
                Ok(path.to_path_buf())
            }
            None => bundle_parent(xcresult_path),
        }
    }
}

/// Directory holding the bundle; `.` for a bare relative bundle name.
pub fn bundle_parent(xcresult_path: &Path) -> Result<PathBuf> {
    match xcresult_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(ExtractorError::InvalidPath {
            path: format!("{} has no parent directory", xcresult_path.display()),
        }),
    }
}
