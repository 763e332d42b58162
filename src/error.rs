use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {}", path.display())]
    CreateOutputDirectoryFailed {
        path: PathBuf,
        #[source]
        source: Box<ExtractorError>,
    },

    #[error("Graph extraction failed: {message}")]
    GraphExtraction { message: String, diagnostics: String },

    #[error("Failed to parse graph: {message}")]
    Parse { message: String },

    #[error("Log export failed: {message}")]
    Export { message: String, diagnostics: String },

    #[error("Failed to enumerate directory {}: {message}", path.display())]
    Enumeration { path: PathBuf, message: String },

    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}: {source}", path.display())]
    Removal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Result bundle not found: {}", path.display())]
    BundleNotFound { path: PathBuf },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ExtractorError {
    fn user_message(&self) -> String {
        match self {
            ExtractorError::CreateOutputDirectoryFailed { path, source } => {
                format!(
                    "Could not prepare output directory {}: {}",
                    path.display(),
                    source.user_message()
                )
            }
            ExtractorError::GraphExtraction {
                message,
                diagnostics,
            } => with_diagnostics(format!("Graph extraction failed: {}", message), diagnostics),
            ExtractorError::Export {
                message,
                diagnostics,
            } => with_diagnostics(format!("Log export failed: {}", message), diagnostics),
            ExtractorError::Parse { message } => {
                format!("The result bundle graph could not be parsed: {}", message)
            }
            ExtractorError::BundleNotFound { path } => {
                format!("No result bundle at {}", path.display())
            }
            ExtractorError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ExtractorError::CreateOutputDirectoryFailed { .. } => Some(
                "Check that the output path is not an existing file and that you have write permission for its parent directory.".to_string()
            ),
            ExtractorError::GraphExtraction { .. } => Some(
                "Make sure Xcode command line tools are installed (`xcode-select --install`) and that the bundle was produced by a compatible Xcode version.".to_string()
            ),
            ExtractorError::Export { .. } => Some(
                "Re-run with -vv to see each export command. Older Xcode versions may need `legacy = false` in the [tool] section.".to_string()
            ),
            ExtractorError::Parse { .. } => Some(
                "Keep the generated graph file (--keep-graph true) and inspect it for unexpected output from the bundle tool.".to_string()
            ),
            ExtractorError::BundleNotFound { .. } => Some(
                "Pass the path of an existing .xcresult bundle.".to_string()
            ),
            ExtractorError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            ExtractorError::Removal { .. } | ExtractorError::Move { .. } => Some(
                "Another extraction may be writing to the same output directory. Run extractions one at a time per directory.".to_string()
            ),
            _ => None,
        }
    }
}

fn with_diagnostics(message: String, diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        message
    } else {
        format!("{}\n{}", message, diagnostics)
    }
}

impl From<toml::de::Error> for ExtractorError {
    fn from(error: toml::de::Error) -> Self {
        ExtractorError::Config {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for ExtractorError {
    fn from(error: regex::Error) -> Self {
        ExtractorError::Config {
            message: format!("Invalid log name pattern: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
