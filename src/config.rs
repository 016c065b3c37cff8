use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub locator: Locator,
    #[serde(default)]
    pub converter: Converter,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub input_dir: String,
    pub output_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            input_dir: "INPUT".into(),
            output_dir: "OUTPUT".into(),
        }
    }
}

/// Ordered install locations probed for the soffice executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Locator {
    pub candidates: Vec<String>,
}
impl Default for Locator {
    fn default() -> Self {
        Self {
            candidates: vec![
                r"C:\Program Files\LibreOffice\program\soffice.exe".into(),
                r"C:\Program Files (x86)\LibreOffice\program\soffice.exe".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Converter {
    /// 0 waits for the child indefinitely.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_report_json: bool,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_report_json: false,
            report_filename: "doc2pdf-report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
