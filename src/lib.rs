pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod files;
pub mod parser;
pub mod tool;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, ParserConfig, ToolConfig};
pub use error::{ExtractorError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    ExtractionOutcome, ExtractionReport, ExtractionStage, LogExtractor, LogSink,
};
pub use files::{FileHandler, FileOperations, MergeMode, MoveSummary, TextEncoding};
pub use parser::{GraphParser, LogDescriptor, TextGraphParser};
pub use tool::{BundleTool, ExportResult, GraphHandle, XcResultTool};
pub use ui::{OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main library interface: wires the real tool, parser and file handler
/// to the extraction pipeline.
pub struct XcResultLogs {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

/// What a run would do, without running anything.
#[derive(Debug, Clone)]
pub struct DryRunPlan {
    pub bundle_path: PathBuf,
    pub bundle_exists: bool,
    pub output_directory: PathBuf,
    pub graph_path: PathBuf,
    pub graph_command: String,
    pub export_command: String,
}

impl XcResultLogs {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            crate::cli::OutputFormat::Human => OutputMode::Human,
            crate::cli::OutputFormat::Json => OutputMode::Json,
            crate::cli::OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Extract every log in `xcresult_path` into `output_path`, or next to
    /// the bundle when no output path is given.
    pub fn extract_logs(
        &self,
        xcresult_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<ExtractionReport> {
        if !xcresult_path.exists() {
            return Err(ExtractorError::BundleNotFound {
                path: xcresult_path.to_path_buf(),
            });
        }

        let start_time = Instant::now();

        let files = FileOperations::new().with_merge_mode(self.config.output.merge_mode);
        let tool = XcResultTool::new(&self.config.tool, &files);
        let parser = TextGraphParser::new(&self.config.parser)?;

        self.output_formatter.debug(&format!(
            "Graph command: {}",
            tool.command_line(&tool.graph_args(xcresult_path))
        ));

        let sink = ProgressAwareOutput::new(&self.output_formatter, &self.progress_manager);
        let extractor = LogExtractor::new(&tool, &parser, &files, &sink)
            .with_directory_mode(self.config.output.directory_mode);

        let result = extractor.extract_logs(xcresult_path, output_path);
        sink.finish();
        let outcome = result?;

        // Logs are already in place; a graph that cannot be removed is a warning
        let mut warnings = Vec::new();
        let mut graph_kept = self.config.output.keep_graph;
        if !graph_kept {
            match files.remove(outcome.graph.path()) {
                Ok(()) => self.output_formatter.debug(&format!(
                    "Removed {}",
                    outcome.graph.path().display()
                )),
                Err(e) => {
                    graph_kept = outcome.graph.path().exists();
                    warnings.push(e.to_string());
                }
            }
        }

        let mut report = ExtractionReport::from_outcome(
            xcresult_path.to_path_buf(),
            outcome,
            graph_kept,
            start_time.elapsed(),
        );
        report.warnings = warnings;

        for warning in report.merge_failures.iter().chain(&report.warnings) {
            self.output_formatter.warning(warning);
        }
        self.output_formatter.success(&format!(
            "Exported {} log(s) to {}",
            report.files.len(),
            report.output_directory.display()
        ));

        Ok(report)
    }

    pub fn plan(&self, xcresult_path: &Path, output_path: Option<&Path>) -> Result<DryRunPlan> {
        let files = FileOperations::new();
        let xcresult_tool = XcResultTool::new(&self.config.tool, &files);

        let output_directory = match output_path {
            Some(path) => path.to_path_buf(),
            None => extractor::bundle_parent(xcresult_path)?,
        };
        let staging = output_directory.join(tool::STAGING_DIR_NAME);

        Ok(DryRunPlan {
            bundle_path: xcresult_path.to_path_buf(),
            bundle_exists: xcresult_path.exists(),
            graph_path: output_directory.join(&self.config.tool.graph_file_name),
            graph_command: xcresult_tool.command_line(&xcresult_tool.graph_args(xcresult_path)),
            export_command: xcresult_tool.command_line(&xcresult_tool.export_args(
                xcresult_path,
                "<id>",
                &staging.join("<file name>"),
            )),
            output_directory,
        })
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ExtractorError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
