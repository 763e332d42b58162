pub mod bundle_tool;
pub mod xcresult_tool;

pub use bundle_tool::{BundleTool, ExportResult, GraphHandle};
pub use xcresult_tool::{XcResultTool, STAGING_DIR_NAME};
