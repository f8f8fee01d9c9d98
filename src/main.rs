use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

mod analysis;
mod artifact;
mod classfile;
mod config;
mod discovery;
mod error;
mod exclusion;
mod report;
mod usage;
mod webapp;

use analysis::ProjectDependencyAnalyzer;
use config::Config;
use exclusion::ExclusionPatterns;
use report::Reporter;

/// depscan - Find unused, undeclared and mis-scoped JVM dependencies
#[derive(Parser, Debug)]
#[command(name = "depscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compiled main classes directory (overrides config)
    #[arg(long, value_name = "DIR")]
    classes_dir: Option<PathBuf>,

    /// Compiled test classes directory (overrides config)
    #[arg(long, value_name = "DIR")]
    test_classes_dir: Option<PathBuf>,

    /// Class name patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// group:artifact ids to force from unused into used (can be specified multiple times)
    #[arg(long, value_name = "ID")]
    force_used: Vec<String>,

    /// Only report compile-scoped dependencies as unused
    #[arg(long)]
    ignore_non_compile: bool,

    /// Exit non-zero when any warning section is non-empty
    #[arg(long)]
    fail_on_warning: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show usage detail for used declared dependencies
    #[arg(long)]
    show_usages: bool,

    /// Usage pairs shown per artifact before eliding
    #[arg(long, default_value = "5")]
    max_usages: usize,

    /// Scan class files in parallel (enabled by default)
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completions
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("depscan v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    // Run analysis
    run_analysis(&config, &cli)?;

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        Config::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if let Some(dir) = &cli.classes_dir {
        config.project.classes_dir = dir.clone();
    }
    if let Some(dir) = &cli.test_classes_dir {
        config.project.test_classes_dir = dir.clone();
    }
    if !cli.exclude.is_empty() {
        config.analysis.exclude_classes.extend(cli.exclude.clone());
    }
    if !cli.force_used.is_empty() {
        config.analysis.force_used.extend(cli.force_used.clone());
    }
    if cli.ignore_non_compile {
        config.analysis.ignore_non_compile = true;
    }
    if cli.fail_on_warning {
        config.analysis.fail_on_warning = true;
    }

    Ok(config)
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::{Duration, Instant};

    let start_time = Instant::now();

    // Step 1: Resolve the project model
    let model = config.resolve(&cli.path);
    info!(
        "Analyzing {} project at {}",
        model.packaging,
        cli.path.display()
    );
    info!("Classpath has {} artifacts", model.dependencies.len());

    // Step 2: Compile exclusion patterns
    let exclusions = ExclusionPatterns::compile(&config.analysis.exclude_classes)
        .map_err(|e| miette::miette!("invalid exclusion pattern: {e}"))?;

    // Step 3: Scan bytecode and classify dependencies
    let spinner = if cli.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning bytecode...");
        Some(pb)
    };

    let analyzer = ProjectDependencyAnalyzer::new()
        .with_exclusions(exclusions)
        .with_parallel(cli.parallel);
    let outcome = analyzer.analyze(&model);

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let mut analysis = outcome?;

    // Step 4: Apply result transforms
    if config.analysis.ignore_non_compile {
        analysis = analysis.ignore_non_compile();
    }
    if !config.analysis.force_used.is_empty() {
        analysis = analysis.force_declared_dependencies_usage(&config.analysis.force_used)?;
    }

    // Step 5: Report results
    let format = match cli.format {
        OutputFormat::Terminal => report::ReportFormat::Terminal,
        OutputFormat::Json => report::ReportFormat::Json,
    };
    let options = report::ReportOptions {
        output_path: cli.output.clone(),
        show_usages: cli.show_usages,
        max_usages: cli.max_usages,
    };
    let reporter = Reporter::with_options(format, options);
    reporter.report(&analysis)?;

    if let Some(path) = &cli.output {
        if !cli.quiet {
            println!(
                "{}",
                format!("Report written to {}", path.display()).green()
            );
        }
    }

    // Print timing
    let elapsed = start_time.elapsed();
    if !cli.quiet {
        println!(
            "{}",
            format!("⏱  Analysis finished in {:.2}s", elapsed.as_secs_f64()).dimmed()
        );
    }

    // Step 6: Gate the exit code on warnings
    if config.analysis.fail_on_warning && analysis.has_warnings() {
        println!(
            "{}",
            format!("✖ {} dependency warnings", analysis.warning_count())
                .red()
                .bold()
        );
        std::process::exit(1);
    }

    Ok(())
}
