use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::files::MergeMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xcresult-logs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract build and test logs from Xcode result bundles")]
#[command(
    long_about = "xcresult-logs asks xcresulttool for the object graph of an .xcresult bundle, \
                  finds the log entries in it and exports each one as a file."
)]
#[command(after_help = "EXAMPLES:\n  \
    xcresult-logs Build.xcresult\n  \
    xcresult-logs ~/ci/Test.xcresult --output logs --verbose\n  \
    xcresult-logs Test.xcresult --best-effort --keep-graph false\n  \
    xcresult-logs Test.xcresult --config ci.toml --output-format json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Path to the .xcresult bundle
    #[arg(
        value_parser = validate_xcresult_path,
        required_unless_present = "generate_config"
    )]
    pub xcresult_path: Option<PathBuf>,

    /// Output directory (defaults to the directory containing the bundle)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Keep the generated graph file next to the exported logs
    #[arg(long, help = "Keep graph.txt after a successful run (true/false)")]
    pub keep_graph: Option<bool>,

    /// Keep merging when a single exported file cannot be moved
    #[arg(long, help = "Report per-file move failures instead of aborting")]
    pub best_effort: bool,

    /// Program used in place of xcrun
    #[arg(long, value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Print the tool commands without running them")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_program(self.tool.clone())
            .with_keep_graph(self.keep_graph)
            .with_merge_mode(self.best_effort.then_some(MergeMode::BestEffort))
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn validate_xcresult_path(s: &str) -> std::result::Result<PathBuf, String> {
    if s.trim().is_empty() {
        return Err("Bundle path must not be empty".to_string());
    }

    let path = PathBuf::from(s.trim_end_matches('/'));
    let is_bundle = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xcresult"));

    if !is_bundle {
        return Err("Expected a path ending in .xcresult".to_string());
    }

    Ok(path)
}
