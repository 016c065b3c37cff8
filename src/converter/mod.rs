pub mod soffice;

use crate::job::ConversionJob;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use soffice::SofficeConverter;

/// Captured streams of a conversion that exited cleanly.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub stdout: String,
    pub stderr: String,
}

/// Per-file failure classes. None of these stop a batch.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("command exited with {}", exit_label(*code))]
    ProcessFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("LibreOffice executable not found at {}.", exe.display())]
    NotInvocable {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command exceeded timeout of {secs}s")]
    TimedOut { secs: u64, stderr: String },

    #[error("{0:#}")]
    Unclassified(anyhow::Error),
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("non-zero exit status {c}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

impl ConvertError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ConvertError::ProcessFailed { stderr, .. } | ConvertError::TimedOut { stderr, .. } => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }

    /// Human-readable status line for a failed job.
    pub fn status_line(&self, job: &ConversionJob) -> String {
        let input = job.input.display();
        match self {
            ConvertError::NotInvocable { .. } => self.to_string(),
            ConvertError::Unclassified(_) => {
                format!("Unexpected error during conversion of {input}: {self}")
            }
            ConvertError::ProcessFailed { stderr, .. } | ConvertError::TimedOut { stderr, .. } => {
                format!("Error during conversion of {input}: {self}\n{}", stderr.trim_end())
            }
        }
    }
}

pub trait Converter {
    fn convert(&self, exe: &Path, job: &ConversionJob) -> Result<Invocation, ConvertError>;
}
