use crate::error::{ExtractorError, Result};
use crate::files::MergeMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub tool: ToolConfig,
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: String,
    pub prefix_args: Vec<String>,
    pub legacy: bool,
    pub graph_file_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    pub log_kinds: Vec<String>,
    pub name_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub keep_graph: bool,
    pub merge_mode: MergeMode,
    /// Permission bits for created output directories, e.g. `0o755`.
    pub directory_mode: Option<u32>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "xcrun".to_string(),
            prefix_args: vec!["xcresulttool".to_string()],
            legacy: true, // Xcode 16 deprecated the old graph/export commands
            graph_file_name: "graph.txt".to_string(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            log_kinds: vec!["ActivityLogSection".to_string(), "ActionLog".to_string()],
            name_patterns: vec![
                r"^StandardOutputAndStandardError.*\.txt$".to_string(),
                r"(?i)\.log$".to_string(),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            keep_graph: true,
            merge_mode: MergeMode::Strict,
            directory_mode: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExtractorError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExtractorError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ExtractorError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["xcresult-logs.toml", ".xcresult-logs.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref program) = cli_args.program {
            self.tool.program = program.clone();
        }

        if let Some(keep_graph) = cli_args.keep_graph {
            self.output.keep_graph = keep_graph;
        }

        if let Some(merge_mode) = cli_args.merge_mode {
            self.output.merge_mode = merge_mode;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool.program.trim().is_empty() {
            return Err(ExtractorError::Config {
                message: "Tool program must not be empty".to_string(),
            });
        }

        let graph_file_name = self.tool.graph_file_name.trim();
        if graph_file_name.is_empty()
            || graph_file_name == "."
            || graph_file_name == ".."
            || graph_file_name.contains(['/', '\\'])
        {
            return Err(ExtractorError::Config {
                message: format!(
                    "Graph file name must be a plain file name: {:?}",
                    self.tool.graph_file_name
                ),
            });
        }

        for pattern in &self.parser.name_patterns {
            regex::Regex::new(pattern)?;
        }

        if let Some(mode) = self.output.directory_mode {
            if mode > 0o7777 {
                return Err(ExtractorError::Config {
                    message: format!("Invalid directory mode: {:o}", mode),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub program: Option<String>,
    pub keep_graph: Option<bool>,
    pub merge_mode: Option<MergeMode>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: Option<String>) -> Self {
        self.program = program;
        self
    }

    pub fn with_keep_graph(mut self, keep_graph: Option<bool>) -> Self {
        self.keep_graph = keep_graph;
        self
    }

    pub fn with_merge_mode(mut self, merge_mode: Option<MergeMode>) -> Self {
        self.merge_mode = merge_mode;
        self
    }
}
