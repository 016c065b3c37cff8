use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["doc", "docx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    pub fn new(input_dir: &Path, output_dir: &Path, file_name: impl AsRef<OsStr>) -> Self {
        let file_name = file_name.as_ref();
        Self {
            input: input_dir.join(file_name),
            output: output_dir.join(pdf_file_name(file_name)),
        }
    }

    /// Directory handed to the converter as `--outdir`.
    pub fn output_dir(&self) -> &Path {
        self.output.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Case-insensitive `.doc` / `.docx` suffix check. Works on names that are not
/// valid UTF-8, and accepts bare `.doc` / `.docx`.
pub fn is_eligible(file_name: impl AsRef<OsStr>) -> bool {
    let bytes = file_name.as_ref().as_encoded_bytes();
    SUPPORTED_EXTENSIONS.iter().any(|ext| {
        let n = ext.len() + 1;
        bytes.len() >= n
            && bytes[bytes.len() - n] == b'.'
            && bytes[bytes.len() - ext.len()..].eq_ignore_ascii_case(ext.as_bytes())
    })
}

/// `report.DOCX` -> `report.pdf`; the stem keeps its case. A name that is all
/// leading dots before its extension (`.docx`) has no extension to drop and
/// becomes `.docx.pdf`.
pub fn pdf_file_name(file_name: impl AsRef<OsStr>) -> OsString {
    let file_name = file_name.as_ref();
    let path = Path::new(file_name);
    let stem = match (path.extension(), path.file_stem()) {
        (Some(_), Some(stem)) if stem.as_encoded_bytes().iter().any(|b| *b != b'.') => stem,
        _ => file_name,
    };
    let mut out = stem.to_os_string();
    out.push(".pdf");
    out
}
