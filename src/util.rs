use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Absolute, symlink-resolved form of `p`.
///
/// On Windows `canonicalize` yields `\\?\C:\...` verbatim paths, which soffice
/// does not accept as a document URL, so the prefix is dropped for plain drive
/// paths.
pub fn resolve_absolute(p: &Path) -> Result<PathBuf> {
    let canon = p
        .canonicalize()
        .with_context(|| format!("canonicalize {}", p.display()))?;
    Ok(strip_verbatim(canon))
}

fn strip_verbatim(p: PathBuf) -> PathBuf {
    let stripped = p
        .to_str()
        .and_then(|s| s.strip_prefix(r"\\?\"))
        .filter(|rest| rest.as_bytes().get(1) == Some(&b':'))
        .map(PathBuf::from);
    stripped.unwrap_or(p)
}
