use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use openapi_merge_core::{
    ConfigLayer, EXIT_SUCCESS, MergeConfig, MergeError, RunSummary, TracingObserver, run_merge,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "merge-openapi")]
#[command(about = "Merge per-service OpenAPI documents into one unified document")]
#[command(version)]
struct Cli {
    /// Directory containing the per-service OpenAPI files (*.yml, *.yaml, *.json).
    #[arg(long)]
    input_directory: Option<PathBuf>,
    /// Path to the output file for the unified specification [default: mock_server_openapi.yml].
    #[arg(long)]
    output_file: Option<PathBuf>,
    /// Validate the final OpenAPI document before writing it (default).
    #[arg(long, overrides_with = "no_validate")]
    validate: bool,
    /// Write the final OpenAPI document without validating it.
    #[arg(long, overrides_with = "validate")]
    no_validate: bool,
    /// Verbose output, reporting every step of the merge.
    #[arg(long, overrides_with = "no_verbose")]
    verbose: bool,
    /// Report only warnings and errors, even if the config file enables verbose output.
    #[arg(long, overrides_with = "verbose")]
    no_verbose: bool,
    /// YAML config file supplying defaults for the options above.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            input_directory: self.input_directory.clone(),
            output_file: self.output_file.clone(),
            validate: switch(self.validate, self.no_validate),
            verbose: switch(self.verbose, self.no_verbose),
        }
    }
}

/// Folds a `--flag`/`--no-flag` pair into an optional override.
fn switch(on: bool, off: bool) -> Option<bool> {
    if off {
        Some(false)
    } else if on {
        Some(true)
    } else {
        None
    }
}

fn main() {
    let cli = Cli::parse();

    let result = resolve_config(&cli).and_then(|config| {
        init_logging(config.verbose);
        run(&config)
    });

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<MergeConfig, MergeError> {
    let file_layer = match &cli.config {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::default(),
    };
    Ok(file_layer.overlay(cli.flag_layer()).resolve()?)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run(config: &MergeConfig) -> Result<(), MergeError> {
    tracing::debug!(
        input = %config.input_directory.display(),
        output = %config.output_file.display(),
        validate = config.validate,
        "starting merge"
    );
    let summary = run_merge(config, &mut TracingObserver)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let components: usize = summary.components.iter().map(|(_, count)| count).sum();
    println!(
        "Merged {} service document(s) into {}: {} path(s), {} component(s), {} tag(s).",
        summary.stats.services,
        summary.output_file.display(),
        summary.paths,
        components,
        summary.tags
    );
    let skipped = summary.stats.paths_skipped + summary.stats.components_skipped;
    if summary.stats.components_aliased > 0 || skipped > 0 {
        println!(
            "{} component(s) aliased, {} entries skipped due to name collisions.",
            summary.stats.components_aliased, skipped
        );
    }
    if !summary.validated {
        println!("Validation was disabled; the output was not checked.");
    }
}
