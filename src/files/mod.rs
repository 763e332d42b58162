pub mod file_handler;

pub use file_handler::{FileHandler, FileOperations, MergeMode, MoveSummary, TextEncoding};
