use crate::config::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One way of finding the converter executable.
pub trait Probe {
    fn probe(&self) -> Option<PathBuf>;
    fn describe(&self) -> String;
}

/// A single well-known install location, checked with a stat.
#[derive(Debug, Clone)]
pub struct FixedPath(pub PathBuf);

impl Probe for FixedPath {
    fn probe(&self) -> Option<PathBuf> {
        is_regular_file(&self.0).then(|| self.0.clone())
    }

    fn describe(&self) -> String {
        self.0.display().to_string()
    }
}

fn is_regular_file(p: &Path) -> bool {
    std::fs::metadata(p).map(|m| m.is_file()).unwrap_or(false)
}

#[derive(Default)]
pub struct Locator {
    probes: Vec<Box<dyn Probe>>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &Config) -> Self {
        cfg.locator
            .candidates
            .iter()
            .fold(Self::new(), |loc, c| loc.with(FixedPath(PathBuf::from(c))))
    }

    pub fn with(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// First probe that finds something wins; `None` when nothing matches.
    pub fn locate(&self) -> Option<PathBuf> {
        for probe in &self.probes {
            match probe.probe() {
                Some(found) => {
                    debug!("locator hit {}", found.display());
                    return Some(found);
                }
                None => debug!("locator miss {}", probe.describe()),
            }
        }
        None
    }

    pub fn describe(&self) -> Vec<String> {
        self.probes.iter().map(|p| p.describe()).collect()
    }
}
