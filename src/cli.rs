use crate::{
    batch::{self, BatchDriver, Scan},
    config::Config,
    converter::SofficeConverter,
    locator::Locator,
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "doc2pdf")]
#[command(about = "Batch-convert .doc/.docx files to PDF with headless LibreOffice")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Path to config TOML. If omitted, uses ./doc2pdf.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Command {
    /// Convert every .doc/.docx in the input directory (default).
    Run,
    /// Report which soffice would be used and its version.
    Doctor,
    /// List the conversions a run would attempt, without running them.
    Plan,
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;

    match args.cmd.unwrap_or(Command::Run) {
        Command::Run => run(&cfg),
        Command::Doctor => doctor(&cfg),
        Command::Plan => plan(&cfg),
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("doc2pdf.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the per-file status lines; diagnostics go to stderr.
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.output_dir).join("doc2pdf.log"))
}

fn run(cfg: &Config) -> Result<()> {
    let driver = BatchDriver::new(cfg, Locator::from_config(cfg), SofficeConverter::new(cfg));
    let mut stdout = std::io::stdout().lock();
    let report = driver.run(&mut stdout)?;
    info!(
        "batch {:?}: {} attempted, {} failed",
        report.outcome,
        report.files.len(),
        report.files.iter().filter(|f| !f.ok).count()
    );
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&doctor_report(cfg))?);
    Ok(())
}

/// Which soffice a run would use, and what it reports as its version.
pub fn doctor_report(cfg: &Config) -> serde_json::Value {
    let locator = Locator::from_config(cfg);
    let exe = locator.locate();
    let version = match exe.as_deref() {
        Some(exe) => SofficeConverter::version(exe).unwrap_or_else(|err| {
            warn!("version probe failed: {err:#}");
            None
        }),
        None => None,
    };
    serde_json::json!({
        "found": exe.is_some(),
        "executable": exe.map(|p| p.display().to_string()),
        "version": version,
        "candidates": locator.describe(),
    })
}

fn plan(cfg: &Config) -> Result<()> {
    println!("{}", plan_report(cfg)?);
    Ok(())
}

/// The conversions a run would attempt, as pretty JSON, or the abort message.
/// Neither creates the output directory nor starts a converter.
pub fn plan_report(cfg: &Config) -> Result<String> {
    let input_dir = PathBuf::from(&cfg.paths.input_dir);
    let output_dir = PathBuf::from(&cfg.paths.output_dir);
    let report = match batch::scan(&input_dir, &output_dir)? {
        Scan::MissingInputDirectory => {
            format!("Input directory {} does not exist.", input_dir.display())
        }
        Scan::NoEligibleFiles => {
            format!("No .doc or .docx files found in {}.", input_dir.display())
        }
        Scan::Jobs(jobs) => {
            let jobs: Vec<_> = jobs
                .iter()
                .map(|j| {
                    serde_json::json!({
                        "input": j.input.display().to_string(),
                        "output": j.output.display().to_string(),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&jobs)?
        }
    };
    Ok(report)
}
