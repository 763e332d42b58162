pub mod log_extractor;
pub mod report;

pub use log_extractor::{
    bundle_parent, ExtractionOutcome, ExtractionStage, LogExtractor, LogSink,
};
pub use report::ExtractionReport;
