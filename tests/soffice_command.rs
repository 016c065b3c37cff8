use doc2pdf::{
    converter::{ConvertError, Converter, SofficeConverter, soffice::parse_version},
    job::ConversionJob,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[test]
fn command_line_matches_headless_convention() {
    let args = SofficeConverter::build_args(Path::new("OUTPUT"), Path::new("/data/INPUT/report.DOCX"));
    let expected: Vec<OsString> = [
        "--headless",
        "--convert-to",
        "pdf",
        "--outdir",
        "OUTPUT",
        "/data/INPUT/report.DOCX",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn version_banner_parsing() {
    assert_eq!(
        parse_version("LibreOffice 7.6.4.1 e19e193f88cd6c0525a17fb7a176ed8e6a3e2aa1\n").as_deref(),
        Some("7.6.4.1")
    );
    assert_eq!(
        parse_version("LibreOfficeDev 24.8.0.0.alpha0 abc\n").as_deref(),
        Some("24.8.0.0")
    );
    assert_eq!(parse_version("\n  Collabora Office 23.05\n").as_deref(), Some("Collabora Office 23.05"));
    assert_eq!(parse_version(""), None);
}

#[test]
fn status_lines_carry_captured_stderr() {
    let job = ConversionJob::new(Path::new("INPUT"), Path::new("OUTPUT"), "a.doc");
    let err = ConvertError::ProcessFailed {
        code: Some(81),
        stdout: String::new(),
        stderr: "Error: source file could not be loaded\n".into(),
    };
    let line = err.status_line(&job);
    assert!(line.starts_with("Error during conversion of INPUT"));
    assert!(line.contains("non-zero exit status 81"));
    assert!(line.ends_with("Error: source file could not be loaded"));

    let err = ConvertError::NotInvocable {
        exe: PathBuf::from("/opt/soffice"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    assert_eq!(err.status_line(&job), "LibreOffice executable not found at /opt/soffice.");
    assert!(err.stderr().is_none());
}

fn scratch_job() -> (tempfile::TempDir, ConversionJob) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("INPUT");
    let output = dir.path().join("OUTPUT");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(input.join("a.doc"), b"doc").unwrap();
    let job = ConversionJob::new(&input, &output, "a.doc");
    (dir, job)
}

#[test]
fn unspawnable_executable_is_not_invocable() {
    let (dir, job) = scratch_job();
    let exe = dir.path().join("no-such-soffice");
    let err = SofficeConverter::default().convert(&exe, &job).unwrap_err();
    assert!(matches!(err, ConvertError::NotInvocable { .. }), "{err:?}");
}

#[test]
fn vanished_input_is_unclassified() {
    let (dir, job) = scratch_job();
    std::fs::remove_file(&job.input).unwrap();
    let exe = dir.path().join("no-such-soffice");
    let err = SofficeConverter::default().convert(&exe, &job).unwrap_err();
    assert!(matches!(err, ConvertError::Unclassified(_)), "{err:?}");
    assert!(err.status_line(&job).starts_with("Unexpected error during conversion of"));
}

#[cfg(unix)]
fn system_tool(name: &str) -> PathBuf {
    use doc2pdf::locator::{FixedPath, Locator};
    Locator::new()
        .with(FixedPath(Path::new("/bin").join(name)))
        .with(FixedPath(Path::new("/usr/bin").join(name)))
        .locate()
        .unwrap_or_else(|| panic!("{name} not found"))
}

#[cfg(unix)]
#[test]
fn zero_exit_is_success() {
    let (_dir, job) = scratch_job();
    SofficeConverter::default()
        .convert(&system_tool("true"), &job)
        .unwrap();
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_process_failure() {
    let (_dir, job) = scratch_job();
    let err = SofficeConverter::default()
        .convert(&system_tool("false"), &job)
        .unwrap_err();
    match err {
        ConvertError::ProcessFailed { code, .. } => assert_eq!(code, Some(1)),
        other => panic!("unexpected: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn bounded_wait_still_reports_exit_status() {
    let (_dir, job) = scratch_job();
    let conv = SofficeConverter::with_timeout(Some(std::time::Duration::from_secs(30)));
    conv.convert(&system_tool("true"), &job).unwrap();
    let err = conv.convert(&system_tool("false"), &job).unwrap_err();
    assert!(matches!(err, ConvertError::ProcessFailed { code: Some(1), .. }), "{err:?}");
}
