//! meshachvetz: command-line interface for the student-to-classroom scoring
//! and optimization engine.
//!
//! # Commands
//!
//! - `score`: score a roster CSV against a configuration, without changing it.
//! - `validate`: load and validate a roster CSV, reporting any imputation.
//! - `optimize`: search for a better assignment with one of three strategies.
//! - `config show|status|reset`: inspect or (re)write the effective configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use meshachvetz_core::config::{Algorithm, Config};
use meshachvetz_core::data::load_csv;
use meshachvetz_core::reports::{json, text, ReportKind};
use meshachvetz_core::{optimizer, scorer};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "meshachvetz.toml";

#[derive(Parser)]
#[command(name = "meshachvetz")]
#[command(author = "Meshachvetz")]
#[command(version = "0.1.0")]
#[command(about = "Student-to-classroom assignment scoring and optimization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a roster CSV against a configuration.
    Score {
        /// Path to the roster CSV.
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Path to a JSON/YAML/TOML config file. Defaults built in if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Which report to print: summary, student, class, school, or all.
        #[arg(short, long, default_value = "summary")]
        report: String,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a roster CSV without scoring it.
    Validate {
        /// Path to the roster CSV.
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Search for a better assignment.
    Optimize {
        /// Path to the roster CSV.
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Which strategy to run: local-search, genetic, or or-tools.
        #[arg(short, long, default_value = "local-search")]
        algorithm: String,

        /// Path to a JSON/YAML/TOML config file. Defaults built in if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overrides `optimizer.seed`.
        #[arg(long)]
        seed: Option<u64>,

        /// Overrides `optimizer.max_iterations`.
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Overrides `optimizer.time_limit_seconds`.
        #[arg(long)]
        time_limit: Option<u64>,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or (re)write the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (the file at the conventional path,
    /// or the built-in defaults if none exists).
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Report whether a config file is present at the conventional path and
    /// whether it parses and validates.
    Status,
    /// Write the default configuration to the conventional path.
    Reset,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            csv,
            config,
            report,
            format,
            output,
        } => cmd_score(&csv, config.as_deref(), &report, &format, output.as_deref()),

        Commands::Validate { csv } => cmd_validate(&csv),

        Commands::Optimize {
            csv,
            algorithm,
            config,
            seed,
            max_iterations,
            time_limit,
            format,
            output,
        } => cmd_optimize(
            &csv,
            config.as_deref(),
            &algorithm,
            seed,
            max_iterations,
            time_limit,
            &format,
            output.as_deref(),
        ),

        Commands::Config { action } => match action {
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
            ConfigAction::Status => cmd_config_status(),
            ConfigAction::Reset => cmd_config_reset(),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            log::debug!("loading config from {path:?}");
            Config::from_file(path).with_context(|| format!("failed to load config from {path:?}"))
        }
        None => {
            log::debug!("no config path given, using built-in defaults");
            Ok(Config::default())
        }
    }
}

fn cmd_score(
    csv: &Path,
    config_path: Option<&Path>,
    report: &str,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let loaded = load_csv(csv).with_context(|| format!("failed to load roster from {csv:?}"))?;
    let result = scorer::score(&loaded.school, &config);
    let kind: ReportKind = report.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let rendered = match format {
        "text" => render_score_text(kind, &loaded.school, &result, &config),
        "json" => render_score_json(kind, &loaded.school, &result, &config)?,
        other => anyhow::bail!("unknown format '{other}', expected text or json"),
    };

    emit(&rendered, output)
}

fn render_score_text(
    kind: ReportKind,
    school: &meshachvetz_core::domain::SchoolData,
    result: &meshachvetz_core::scorer::ScoringResult,
    config: &Config,
) -> String {
    match kind {
        ReportKind::Summary => text::summary_text(school, result),
        ReportKind::Student => text::student_text(school, result),
        ReportKind::Class => text::class_text(school, result),
        ReportKind::School => text::school_text(result),
        ReportKind::Config => text::config_text(config),
        ReportKind::All => text::all_text(school, result, config),
    }
}

fn render_score_json(
    kind: ReportKind,
    school: &meshachvetz_core::domain::SchoolData,
    result: &meshachvetz_core::scorer::ScoringResult,
    config: &Config,
) -> Result<String> {
    Ok(match kind {
        ReportKind::Summary => json::summary_json(school, result)?,
        ReportKind::Student => json::student_json(school, result)?,
        ReportKind::Class => json::class_json(school, result)?,
        ReportKind::School => json::school_json(result)?,
        ReportKind::Config => json::config_json(config)?,
        ReportKind::All => json::all_json(school, result, config)?,
    })
}

fn cmd_validate(csv: &Path) -> Result<()> {
    let loaded = load_csv(csv).with_context(|| format!("failed to load roster from {csv:?}"))?;
    let summary = &loaded.summary;
    println!("{}", "roster is valid".green().bold());
    println!("  students:                    {}", loaded.school.total_students());
    println!("  classes:                     {}", loaded.school.total_classes());
    println!(
        "  academic_score imputed:      {}{}",
        summary.academic_score_imputed,
        summary
            .academic_score_imputed_value
            .map(|v| format!(" (mean={v:.2})"))
            .unwrap_or_default()
    );
    println!(
        "  behavior_rank imputed:       {}{}",
        summary.behavior_rank_imputed,
        summary
            .behavior_rank_imputed_value
            .map(|v| format!(" (mode={v:?})"))
            .unwrap_or_default()
    );
    println!(
        "  studentiality_rank imputed:  {}{}",
        summary.studentiality_rank_imputed,
        summary
            .studentiality_rank_imputed_value
            .map(|v| format!(" (mode={v:?})"))
            .unwrap_or_default()
    );
    println!("  dangling references dropped: {}", summary.dangling_references_dropped);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_optimize(
    csv: &Path,
    config_path: Option<&Path>,
    algorithm: &str,
    seed: Option<u64>,
    max_iterations: Option<u64>,
    time_limit: Option<u64>,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.optimizer.algorithm = algorithm
        .parse::<Algorithm>()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    if let Some(seed) = seed {
        config.optimizer.seed = seed;
    }
    if let Some(max_iterations) = max_iterations {
        config.optimizer.max_iterations = max_iterations;
    }
    if let Some(time_limit) = time_limit {
        config.optimizer.time_limit_seconds = time_limit;
    }
    config.validate().context("invalid configuration")?;

    let loaded = load_csv(csv).with_context(|| format!("failed to load roster from {csv:?}"))?;
    eprintln!("Running {algorithm}...");
    let result = optimizer::optimize(&loaded.school, &config).context("optimization failed")?;

    let rendered = match format {
        "text" => text::optimization_text(&result),
        "json" => json::optimization_json(&result)?,
        other => anyhow::bail!("unknown format '{other}', expected text or json"),
    };

    emit(&rendered, output)
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            meshachvetz_core::reports::write_to_file(path, rendered)
                .with_context(|| format!("failed to write report to {path:?}"))?;
            eprintln!("Report written to {path:?}");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let config = if path.exists() {
        Config::from_file(path).with_context(|| format!("failed to load config from {path:?}"))?
    } else {
        Config::default()
    };
    println!("{}", text::config_text(&config));
    Ok(())
}

fn cmd_config_status() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_PATH);
    if !path.exists() {
        println!("{}", "no config file present, using built-in defaults".yellow());
        return Ok(());
    }
    match Config::from_file(path) {
        Ok(_) => println!("{} {path:?}", "config is valid:".green().bold()),
        Err(e) => println!("{} {path:?}: {e}", "config is invalid:".red().bold()),
    }
    Ok(())
}

fn cmd_config_reset() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_PATH);
    let toml = toml::to_string_pretty(&Config::default()).context("failed to serialize default config")?;
    std::fs::write(path, toml).with_context(|| format!("failed to write {path:?}"))?;
    println!("{} {path:?}", "wrote default configuration to".green().bold());
    Ok(())
}
