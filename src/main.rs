use clap::Parser;
use std::process;
use xcresult_logs::{
    Cli, ExtractorError, OutputFormatter, OutputMode, UserFriendlyError, XcResultLogs,
};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match XcResultLogs::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return exit_code(&e);
        }
    };

    let Some(ref xcresult_path) = cli.xcresult_path else {
        app.output_formatter().error("No .xcresult bundle given");
        return 2;
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &app);
    }

    match app.extract_logs(xcresult_path, cli.output.as_deref()) {
        Ok(report) => {
            app.output_formatter().print_extraction_report(&report);

            if report.has_warnings() {
                8 // Exported, with warnings
            } else {
                0
            }
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code(&e)
        }
    }
}

fn exit_code(error: &ExtractorError) -> i32 {
    match error {
        ExtractorError::InvalidPath { .. }
        | ExtractorError::BundleNotFound { .. }
        | ExtractorError::Config { .. } => 2,
        ExtractorError::CreateOutputDirectoryFailed { .. } => 3,
        ExtractorError::GraphExtraction { .. } => 4,
        ExtractorError::Parse { .. } => 5,
        ExtractorError::Export { .. } => 6,
        ExtractorError::DirectoryCreation { .. }
        | ExtractorError::Enumeration { .. }
        | ExtractorError::Move { .. }
        | ExtractorError::Removal { .. }
        | ExtractorError::Write { .. } => 7,
        ExtractorError::Io(_) => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "xcresult-logs.toml".to_string());

    match XcResultLogs::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  xcresult-logs <bundle.xcresult> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, app: &XcResultLogs) -> i32 {
    let formatter = app.output_formatter();

    let Some(ref xcresult_path) = cli.xcresult_path else {
        formatter.error("No .xcresult bundle given");
        return 2;
    };

    formatter.info("DRY RUN MODE - No commands will be run");
    formatter.print_separator();

    let plan = match app.plan(xcresult_path, cli.output.as_deref()) {
        Ok(plan) => plan,
        Err(e) => {
            app.handle_error(&e);
            return exit_code(&e);
        }
    };

    if !plan.bundle_exists {
        formatter.warning(&format!(
            "Bundle does not exist: {}",
            plan.bundle_path.display()
        ));
    }

    let config = app.config();
    println!("Bundle:           {}", plan.bundle_path.display());
    println!("Output directory: {}", plan.output_directory.display());
    println!("Graph file:       {}", plan.graph_path.display());
    println!("Keep graph:       {}", config.output.keep_graph);
    println!("Merge mode:       {:?}", config.output.merge_mode);
    println!("Graph command:    {}", plan.graph_command);
    println!("Export command:   {}", plan.export_command);

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform actual extraction");

    0
}

fn print_startup_error(error: &ExtractorError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
