use crate::config::ToolConfig;
use crate::error::{ExtractorError, Result};
use crate::files::{FileHandler, TextEncoding};
use crate::parser::LogDescriptor;
use crate::tool::{BundleTool, ExportResult, GraphHandle};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

pub const STAGING_DIR_NAME: &str = ".xcresult-logs-staging";

struct ToolFailure {
    message: String,
    diagnostics: String,
}

/// Runs `xcrun xcresulttool` (or a configured stand-in) as a child process.
pub struct XcResultTool<'a> {
    program: String,
    prefix_args: Vec<String>,
    legacy: bool,
    graph_file_name: String,
    files: &'a dyn FileHandler,
}

impl<'a> XcResultTool<'a> {
    pub fn new(config: &ToolConfig, files: &'a dyn FileHandler) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.prefix_args.clone(),
            legacy: config.legacy,
            graph_file_name: config.graph_file_name.clone(),
            files,
        }
    }

    pub fn graph_args(&self, bundle_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["graph".into()];
        if self.legacy {
            args.push("--legacy".into());
        }
        args.push("--path".into());
        args.push(bundle_path.into());
        args
    }

    pub fn export_args(&self, bundle_path: &Path, id: &str, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["export".into()];
        if self.legacy {
            args.push("--legacy".into());
        }
        args.extend([
            OsString::from("--type"),
            OsString::from("file"),
            OsString::from("--path"),
            OsString::from(bundle_path),
            OsString::from("--id"),
            OsString::from(id),
            OsString::from("--output-path"),
            OsString::from(output_path),
        ]);
        args
    }

    /// Human-readable command line, as used for dry runs.
    pub fn command_line(&self, args: &[OsString]) -> String {
        std::iter::once(self.program.clone())
            .chain(self.prefix_args.iter().cloned())
            .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn invoke(&self, args: &[OsString]) -> std::result::Result<Vec<u8>, ToolFailure> {
        let output = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ToolFailure {
                message: format!("failed to start {}: {}", self.program, e),
                diagnostics: String::new(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostics = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            let status = match output.status.code() {
                Some(code) => format!("status {}", code),
                None => "a signal".to_string(),
            };

            return Err(ToolFailure {
                message: format!("{} exited with {}", self.program, status),
                diagnostics,
            });
        }

        Ok(output.stdout)
    }
}

impl BundleTool for XcResultTool<'_> {
    fn extract_graph(&self, bundle_path: &Path, output_directory: &Path) -> Result<GraphHandle> {
        let stdout = self
            .invoke(&self.graph_args(bundle_path))
            .map_err(|f| ExtractorError::GraphExtraction {
                message: f.message,
                diagnostics: f.diagnostics,
            })?;

        let text = String::from_utf8(stdout).map_err(|e| ExtractorError::GraphExtraction {
            message: format!("graph output is not valid UTF-8: {}", e),
            diagnostics: String::new(),
        })?;

        let graph_path = output_directory.join(&self.graph_file_name);
        self.files
            .write_text(&text, &graph_path, true, TextEncoding::Utf8)?;

        Ok(GraphHandle::new(graph_path))
    }

    fn export(
        &self,
        logs: &[LogDescriptor],
        bundle_path: &Path,
        to_directory: &Path,
    ) -> Result<ExportResult> {
        if logs.is_empty() {
            return Ok(ExportResult::default());
        }

        // Leftovers from an earlier failed run
        let staging = to_directory.join(STAGING_DIR_NAME);
        if staging.symlink_metadata().is_ok() {
            self.files.remove(&staging)?;
        }
        self.files.create_directory(&staging, true, None)?;

        let names = staging_names(logs, &self.graph_file_name);
        for (log, name) in logs.iter().zip(&names) {
            let target = staging.join(name);

            self.invoke(&self.export_args(bundle_path, &log.id, &target))
                .map_err(|f| ExtractorError::Export {
                    message: format!("{} while exporting {}", f.message, log.id),
                    diagnostics: f.diagnostics,
                })?;
        }

        let summary = self.files.move_all(&staging, to_directory)?;

        // Unmerged files stay in staging for inspection
        if summary.is_complete() {
            self.files.remove(&staging)?;
        }

        Ok(ExportResult {
            files: summary.moved,
            merge_failures: summary.failures,
        })
    }
}

/// One distinct file name per log, in order. Repeated names get a numeric
/// suffix before the extension (`a.txt`, `a-1.txt`). The graph file name is
/// never handed out. Names compare case-insensitively.
fn staging_names(logs: &[LogDescriptor], graph_file_name: &str) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    taken.insert(graph_file_name.to_lowercase());

    logs.iter()
        .map(|log| {
            let base = log.file_name();
            let mut candidate = base.clone();
            let mut counter = 1;
            while !taken.insert(candidate.to_lowercase()) {
                candidate = with_suffix(&base, counter);
                counter += 1;
            }
            candidate
        })
        .collect()
}

fn with_suffix(name: &str, counter: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, counter, ext),
        _ => format!("{}-{}", name, counter),
    }
}
