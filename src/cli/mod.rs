//! Command-line interface for pokecoach.
//!
//! Provides commands for generating post-game reports, running the
//! release KPI gate, and inspecting resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config;
use crate::core::{detect_language, evaluate_release_kpis, Coach, DEFAULT_LOG_PATTERN};
use crate::domain::{
    MISTAKES_MAX_ITEMS, MISTAKES_MIN_ITEMS, TURNING_POINTS_MAX_ITEMS, TURNING_POINTS_MIN_ITEMS,
};

pub mod render;

pub use render::{render, render_json, render_markdown, OutputFormat};

/// pokecoach - Evidence-backed post-game reports for Pokemon TCG Live battle logs
#[derive(Parser, Debug)]
#[command(name = "pokecoach")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a post-game report from a battle log
    Report {
        /// Path to the battle log file
        log: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bypass LLM guidance and keep deterministic fallback behavior only
        #[arg(long)]
        deterministic_only: bool,

        /// Run the coach/auditor review and embed its telemetry in the report
        #[arg(long)]
        agentic_telemetry: bool,
    },

    /// Evaluate release KPIs over a directory of logs (exit 1 unless all checks pass)
    Kpis {
        /// Directory containing battle logs
        #[arg(long, default_value = "tests/fixtures")]
        logs_dir: PathBuf,

        /// Golden minimums JSON file
        #[arg(long, default_value = "tests/fixtures/expected_minimums.json")]
        expected: PathBuf,

        /// Glob pattern for log files inside the logs directory
        #[arg(long, default_value = DEFAULT_LOG_PATTERN)]
        pattern: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Report {
                log,
                format,
                output,
                deterministic_only,
                agentic_telemetry,
            } => {
                run_report(&log, format, output, deterministic_only, agentic_telemetry).await
            }
            Commands::Kpis {
                logs_dir,
                expected,
                pattern,
            } => run_kpis(&logs_dir, &expected, &pattern),
            Commands::Config => show_config(),
        }
    }
}

/// Read a log file, failing clearly when it does not exist
pub fn read_log_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        anyhow::bail!("Log file not found: {}", path.display());
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))
}

/// Write rendered output to a file (creating parent directories) or stdout
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        print!("{}", content);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

async fn run_report(
    log: &Path,
    format: OutputFormat,
    output: Option<PathBuf>,
    deterministic_only: bool,
    agentic_telemetry: bool,
) -> Result<()> {
    let log_text = read_log_text(log)?;

    let mut settings = config::config()?.clone();
    if deterministic_only {
        settings = settings.deterministic();
    }
    let coach = Coach::from_config(&settings)?.with_agentic_telemetry(agentic_telemetry);

    let report = coach
        .generate_report(&log_text)
        .await
        .context("Failed to generate report")?;
    let language = detect_language(coach.lexicon(), &log_text);
    let rendered = render(&report, format, language)?;
    write_output(&rendered, output.as_deref())?;

    if let Some(path) = output {
        info!(path = %path.display(), "Report written");
    }
    Ok(())
}

fn run_kpis(logs_dir: &Path, expected: &Path, pattern: &str) -> Result<()> {
    let settings = config::config()?.clone().deterministic();
    let coach = Coach::from_config(&settings)?;

    let result = evaluate_release_kpis(&coach, logs_dir, expected, pattern)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize KPI result")?
    );

    if !result.checks.all_pass() {
        std::process::exit(1);
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("PokeCoach Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Extraction:");
    println!("  KO lookback window: {} lines", cfg.ko_lookback_window);
    println!();
    println!("Guardrails:");
    println!("  Min confidence:   {:.2}", cfg.guardrails.floor());
    println!(
        "  Turning points:   {}..={}",
        TURNING_POINTS_MIN_ITEMS, TURNING_POINTS_MAX_ITEMS
    );
    println!(
        "  Mistakes:         {}..={}",
        MISTAKES_MIN_ITEMS, MISTAKES_MAX_ITEMS
    );
    println!();
    println!("LLM guidance:");
    println!(
        "  Mode:     {}",
        if cfg.llm.live_mode_enabled() {
            "live"
        } else {
            "deterministic (no OPENROUTER_API_KEY)"
        }
    );
    println!("  Base URL: {}", cfg.llm.base_url);
    println!("  Model:    {}", cfg.llm.model);
    println!("  Timeout:  {}s", cfg.llm.timeout_seconds);
    println!(
        "  Retries:  {} attempts, {}ms initial delay",
        cfg.llm.retry_policy.max_attempts, cfg.llm.retry_policy.initial_delay_ms
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::try_parse_from([
            "pokecoach",
            "report",
            "game.txt",
            "--format",
            "md",
            "--deterministic-only",
        ])
        .unwrap();

        match cli.command {
            Commands::Report {
                log,
                format,
                output,
                deterministic_only,
                agentic_telemetry,
            } => {
                assert_eq!(log, PathBuf::from("game.txt"));
                assert_eq!(format, OutputFormat::Md);
                assert!(output.is_none());
                assert!(deterministic_only);
                assert!(!agentic_telemetry);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_kpis_defaults() {
        let cli = Cli::try_parse_from(["pokecoach", "kpis"]).unwrap();

        match cli.command {
            Commands::Kpis { pattern, logs_dir, .. } => {
                assert_eq!(pattern, DEFAULT_LOG_PATTERN);
                assert_eq!(logs_dir, PathBuf::from("tests/fixtures"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["pokecoach", "report", "game.txt", "--format", "html"]).is_err());
    }

    #[test]
    fn test_missing_log_file() {
        let err = read_log_text(Path::new("/nonexistent/battle.txt")).unwrap_err();
        assert!(err.to_string().contains("Log file not found"));
    }

    #[test]
    fn test_write_output_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.md");

        write_output("# Post-Game Report\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Post-Game Report\n");
    }
}
