use crate::error::{ExtractorError, UserFriendlyError};
use crate::extractor::{ExtractionReport, ExtractionStage, LogSink};
use crate::ui::ProgressManager;
use console::{style, Emoji, Term};
use indicatif::ProgressBar;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ARROW: Emoji = Emoji("➜  ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    /// Pipeline progress; shown unless quiet.
    pub fn step(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ARROW, style(message).bold());
                    } else {
                        println!("> {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("progress", message),
                OutputMode::Plain => println!("PROGRESS: {}", message),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ExtractorError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_report(&self, report: &ExtractionReport) {
        self.print_header("Extraction Report");

        println!("Bundle:    {}", report.bundle_path.display());
        println!("Output:    {}", report.output_directory.display());
        if let Some(ref graph_path) = report.graph_path {
            println!("Graph:     {}", graph_path.display());
        }
        println!(
            "Logs:      {}",
            if self.use_colors {
                style(report.files.len()).cyan().bold().to_string()
            } else {
                report.files.len().to_string()
            }
        );
        if report.reported_bytes() > 0 {
            println!("Size:      {}", format_bytes(report.reported_bytes()));
        }
        println!("Time:      {}", format_duration(report.extraction_duration));
        println!(
            "Extracted: {}",
            report.extraction_time.format("%Y-%m-%d %H:%M UTC")
        );

        if !report.files.is_empty() {
            println!();
            for file in &report.files {
                println!("  {}", file.display());
            }
        }

        if !report.merge_failures.is_empty() {
            println!();
            println!("Files left in staging:");
            for failure in &report.merge_failures {
                println!("  - {}", failure);
            }
        }

        for warning in &report.warnings {
            println!("Warning: {}", warning);
        }

        self.print_separator();
    }

    fn print_plain_report(&self, report: &ExtractionReport) {
        println!("REPORT: Extraction completed");
        println!("Bundle: {}", report.bundle_path.display());
        println!("Output: {}", report.output_directory.display());
        println!("Logs: {}", report.files.len());
        println!("Duration: {:?}", report.extraction_duration);
        for file in &report.files {
            println!("FILE: {}", file.display());
        }
        for failure in &report.merge_failures {
            println!("MERGE FAILURE: {}", failure);
        }
        for warning in &report.warnings {
            println!("WARNING: {}", warning);
        }
    }
}

impl LogSink for OutputFormatter {
    fn log(&self, message: &str) {
        self.step(message);
    }

    fn stage(&self, stage: ExtractionStage) {
        self.debug(&format!("Stage: {:?}", stage));
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Sink that keeps a spinner running while the bundle tool blocks, and
/// prints progress messages above it.
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: &'a ProgressManager,
    spinner: ProgressBar,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(formatter: &'a OutputFormatter, progress_manager: &'a ProgressManager) -> Self {
        // Interleaved spinner frames would corrupt JSON lines
        let spinner = if formatter.mode() == OutputMode::Human {
            progress_manager.create_spinner("Starting")
        } else {
            ProgressBar::hidden()
        };

        Self {
            formatter,
            progress_manager,
            spinner,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl LogSink for ProgressAwareOutput<'_> {
    fn log(&self, message: &str) {
        self.progress_manager.suspend(|| self.formatter.log(message));
    }

    fn stage(&self, stage: ExtractionStage) {
        self.spinner.set_message(stage_message(stage));
        self.progress_manager
            .suspend(|| LogSink::stage(self.formatter, stage));
    }
}

fn stage_message(stage: ExtractionStage) -> &'static str {
    match stage {
        ExtractionStage::Start => "Starting",
        ExtractionStage::OutputResolved => "Running xcresulttool graph",
        ExtractionStage::GraphGenerated => "Parsing graph",
        ExtractionStage::LogsParsed => "Exporting logs",
        ExtractionStage::Exported => "Done",
    }
}
