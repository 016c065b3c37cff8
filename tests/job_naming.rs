use doc2pdf::job::{ConversionJob, is_eligible, pdf_file_name};
use std::path::Path;

#[test]
fn eligible_suffixes_ignore_case() {
    for name in ["a.doc", "a.docx", "report.DOCX", "notes.Doc", "archive.tar.doc", ".doc", ".DOCX"] {
        assert!(is_eligible(name), "{name}");
    }
    for name in ["image.png", "a.docm", "a.pdf", "doc", "adocx", "a.doc.bak", "docx"] {
        assert!(!is_eligible(name), "{name}");
    }
}

#[test]
fn pdf_name_keeps_stem_case() {
    assert_eq!(pdf_file_name("report.DOCX"), "report.pdf");
    assert_eq!(pdf_file_name("Notes.doc"), "Notes.pdf");
    assert_eq!(pdf_file_name("my.final.report.docx"), "my.final.report.pdf");
    assert_eq!(pdf_file_name("Отчёт.docx"), "Отчёт.pdf");
}

#[test]
fn dot_only_stems_keep_their_suffix() {
    assert_eq!(pdf_file_name(".docx"), ".docx.pdf");
    assert_eq!(pdf_file_name(".doc"), ".doc.pdf");
    assert_eq!(pdf_file_name("..doc"), "..doc.pdf");
}

#[cfg(unix)]
#[test]
fn undecodable_names_are_handled_as_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let name = OsStr::from_bytes(b"caf\xe9.DOC");
    assert!(is_eligible(name));
    assert_eq!(pdf_file_name(name).as_bytes(), b"caf\xe9.pdf");
    assert!(!is_eligible(OsStr::from_bytes(b"caf\xe9.txt")));
}

#[test]
fn output_lands_in_output_dir_regardless_of_input_depth() {
    let job = ConversionJob::new(Path::new("deep/nested/INPUT"), Path::new("OUTPUT"), "a.doc");
    assert_eq!(job.input, Path::new("deep/nested/INPUT/a.doc"));
    assert_eq!(job.output, Path::new("OUTPUT/a.pdf"));
    assert_eq!(job.output_dir(), Path::new("OUTPUT"));
}
