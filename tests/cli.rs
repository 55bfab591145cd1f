//! Command-line contract of `pdf2xlsx` and `pdf2docx`.
//!
//! None of these cases reach pdfium, so they run without libpdfium.

mod common;

use std::path::Path;
use std::process::{Command, Output};

const BINS: [&str; 2] = [env!("CARGO_BIN_EXE_pdf2xlsx"), env!("CARGO_BIN_EXE_pdf2docx")];

fn run(bin: &str, args: &[&Path]) -> Output {
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn binary")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn no_arguments_is_missing_arguments() {
    for bin in BINS {
        let out = run(bin, &[]);
        assert_eq!(out.status.code(), Some(1), "{bin}");
        assert_eq!(stdout(&out), "ERROR: Missing arguments\n");
    }
}

#[test]
fn one_argument_is_missing_arguments() {
    for bin in BINS {
        let out = run(bin, &[Path::new("only.pdf")]);
        assert_eq!(out.status.code(), Some(1));
        assert_eq!(stdout(&out), "ERROR: Missing arguments\n");
    }
}

#[test]
fn missing_input_reports_absolute_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.pdf");
    let output = dir.path().join("out.xlsx");
    for bin in BINS {
        let out = run(bin, &[&input, &output]);
        assert_eq!(out.status.code(), Some(1));
        let text = stdout(&out);
        assert!(text.contains("File not found"), "{text}");
        assert!(text.contains(&input.display().to_string()), "{text}");
        assert!(!text.contains("Processing:"), "{text}");
        assert!(!output.exists());
    }
}

#[test]
fn non_pdf_input_fails_after_processing_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = common::write_fixture(dir.path(), "notes.pdf", b"just some text");
    let output = dir.path().join("out.docx");
    for bin in BINS {
        let out = run(bin, &[&input, &output]);
        assert_eq!(out.status.code(), Some(1));
        let text = stdout(&out);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(format!("Processing: {}", input.display()).as_str())
        );
        assert!(lines.next().unwrap_or_default().starts_with("ERROR: "));
        assert!(!output.exists());
    }
}

#[test]
fn flag_like_arguments_follow_the_status_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.xlsx");
    for bin in BINS {
        for first in ["-scan.pdf", "--foo"] {
            let out = Command::new(bin)
                .arg(first)
                .arg(&output)
                .env_remove("RUST_LOG")
                .output()
                .unwrap();
            assert_eq!(out.status.code(), Some(1), "{bin} {first}");
            let text = stdout(&out);
            assert!(text.starts_with("ERROR: "), "{text}");
            assert_eq!(text.lines().count(), 1, "{text}");
            assert!(!output.exists());
        }
    }
}

#[test]
fn help_exits_cleanly() {
    for bin in BINS {
        let out = Command::new(bin).arg("--help").output().unwrap();
        assert!(out.status.success());
        assert!(stdout(&out).contains("PDFIUM_LIB_PATH"));
    }
}
