use crate::{
    config::Config,
    converter::{ConvertError, Converter},
    job::{ConversionJob, is_eligible},
    locator::Locator,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    MissingInputDirectory,
    NoEligibleFiles,
    ExecutableNotFound,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub input: String,
    pub output: String,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started: String,
    pub finished: String,
    pub executable: Option<String>,
    pub outcome: BatchOutcome,
    pub files: Vec<FileReport>,
}

/// Result of looking at the input directory, before anything is converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    MissingInputDirectory,
    NoEligibleFiles,
    Jobs(Vec<ConversionJob>),
}

/// Eligible file names directly inside `input_dir`, in NFC lexicographic order.
pub fn eligible_files(input_dir: &Path) -> Result<Vec<OsString>> {
    let entries = std::fs::read_dir(input_dir)
        .with_context(|| format!("read_dir {}", input_dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read_dir entry in {}", input_dir.display()))?;
        let name = entry.file_name();
        if is_eligible(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    // Raw bytes break ties between names that only differ in undecodable bytes.
    names.sort_by_cached_key(|n| (n.to_string_lossy().nfc().collect::<String>(), n.clone()));
    Ok(names)
}

pub fn scan(input_dir: &Path, output_dir: &Path) -> Result<Scan> {
    if !input_dir.is_dir() {
        return Ok(Scan::MissingInputDirectory);
    }
    let names = eligible_files(input_dir)?;
    if names.is_empty() {
        return Ok(Scan::NoEligibleFiles);
    }
    Ok(Scan::Jobs(
        names
            .iter()
            .map(|n| ConversionJob::new(input_dir, output_dir, n))
            .collect(),
    ))
}

pub struct BatchDriver<C: Converter> {
    cfg: Config,
    locator: Locator,
    converter: C,
}

impl<C: Converter> BatchDriver<C> {
    pub fn new(cfg: &Config, locator: Locator, converter: C) -> Self {
        Self {
            cfg: cfg.clone(),
            locator,
            converter,
        }
    }

    fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.paths.input_dir)
    }

    fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.paths.output_dir)
    }

    /// Runs the whole batch, writing status lines to `out`.
    ///
    /// Per-file failures end up in the report; only setup faults (output
    /// directory, unreadable input listing, a broken `out`) return `Err`.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<BatchReport> {
        let started = now_rfc3339();
        let input_dir = self.input_dir();
        let output_dir = self.output_dir();

        ensure_dir(&output_dir)?;

        let mut report = BatchReport {
            started,
            finished: String::new(),
            executable: None,
            outcome: BatchOutcome::Completed,
            files: Vec::new(),
        };

        let jobs = match scan(&input_dir, &output_dir)? {
            Scan::MissingInputDirectory => {
                writeln!(out, "Input directory {} does not exist.", input_dir.display())?;
                return self.finish(report, BatchOutcome::MissingInputDirectory);
            }
            Scan::NoEligibleFiles => {
                writeln!(out, "No .doc or .docx files found in {}.", input_dir.display())?;
                return self.finish(report, BatchOutcome::NoEligibleFiles);
            }
            Scan::Jobs(jobs) => jobs,
        };
        info!("{} file(s) queued from {}", jobs.len(), input_dir.display());

        let Some(exe) = self.locator.locate() else {
            warn!("no soffice among {:?}", self.locator.describe());
            writeln!(out, "LibreOffice not found. Ensure LibreOffice is installed.")?;
            return self.finish(report, BatchOutcome::ExecutableNotFound);
        };
        info!("using {}", exe.display());
        report.executable = Some(exe.display().to_string());

        for job in &jobs {
            let name = job
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(out, "Processing {name}...")?;

            let file = match self.converter.convert(&exe, job) {
                Ok(inv) => {
                    info!("converted {} -> {}", job.input.display(), job.output.display());
                    if !inv.stdout.trim().is_empty() {
                        debug!("soffice stdout: {}", inv.stdout.trim());
                    }
                    writeln!(
                        out,
                        "Successfully converted {} to {}",
                        job.input.display(),
                        job.output.display()
                    )?;
                    FileReport {
                        input: job.input.display().to_string(),
                        output: job.output.display().to_string(),
                        ok: true,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!("conversion failed for {}: {}", job.input.display(), err);
                    if let ConvertError::ProcessFailed { stdout, .. } = &err {
                        if !stdout.trim().is_empty() {
                            debug!("soffice stdout: {}", stdout.trim());
                        }
                    }
                    writeln!(out, "{}", err.status_line(job))?;
                    FileReport {
                        input: job.input.display().to_string(),
                        output: job.output.display().to_string(),
                        ok: false,
                        error: Some(match err.stderr() {
                            Some(stderr) if !stderr.trim().is_empty() => {
                                format!("{err}: {}", stderr.trim())
                            }
                            _ => err.to_string(),
                        }),
                    }
                }
            };
            report.files.push(file);
        }

        self.finish(report, BatchOutcome::Completed)
    }

    fn finish(&self, mut report: BatchReport, outcome: BatchOutcome) -> Result<BatchReport> {
        report.outcome = outcome;
        report.finished = now_rfc3339();

        if self.cfg.output.write_report_json {
            let path = self.output_dir().join(&self.cfg.output.report_filename);
            std::fs::write(&path, serde_json::to_string_pretty(&report)?)
                .with_context(|| format!("writing report: {}", path.display()))?;
        }
        Ok(report)
    }
}
