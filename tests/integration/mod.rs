// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture helper for creating temporary directories with input documents
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Create an input document with given content
    pub fn create_document<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test document");
        file_path
    }

    /// Write precomputed annotations next to a document for the sidecar engine
    pub fn create_sidecar<P: AsRef<Path>>(&self, document: P, json: &str) -> PathBuf {
        let path = stannie::engine::sidecar_path(document.as_ref());
        fs::write(&path, json).expect("Failed to write sidecar annotations");
        path
    }

    /// Directory receiving annotated outputs
    pub fn output_dir(&self) -> PathBuf {
        self.root_path.join("out")
    }

    /// Path of the highlighted output for the input at 1-based `index`
    pub fn html_output(&self, index: usize) -> PathBuf {
        self.output_dir().join(format!("annotated_{index}.html"))
    }

    /// Path of the XML output for the input at 1-based `index`
    pub fn xml_output(&self, index: usize) -> PathBuf {
        self.output_dir().join(format!("annotated_{index}.xml"))
    }

    /// Read the highlighted output for the input at 1-based `index`
    pub fn read_html_output(&self, index: usize) -> String {
        fs::read_to_string(self.html_output(index)).expect("Failed to read highlighted output")
    }
}

/// Remove every highlight span, leaving all other text untouched
pub fn strip_highlights(marked: &str) -> String {
    const OPEN: &str = "<span id=\"";
    const OPEN_END: &str = "\" style=\"highlight\">";
    const CLOSE: &str = "</span>";

    let mut out = String::with_capacity(marked.len());
    let mut rest = marked;
    let mut open_spans = 0usize;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(OPEN) {
            let end = tail.find(OPEN_END).expect("Unterminated highlight tag") + OPEN_END.len();
            open_spans += 1;
            rest = &tail[end..];
        } else if open_spans > 0 && tail.starts_with(CLOSE) {
            open_spans -= 1;
            rest = &tail[CLOSE.len()..];
        } else {
            out.push('<');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Compare two strings line by line, providing detailed diff on mismatch
pub fn assert_golden_file(actual: &str, expected: &str, context: &str) {
    let actual_lines: Vec<&str> = actual.lines().collect();
    let expected_lines: Vec<&str> = expected.lines().collect();

    if actual_lines.len() != expected_lines.len() {
        panic!(
            "{}: Line count mismatch. Expected {} lines, got {} lines",
            context,
            expected_lines.len(),
            actual_lines.len()
        );
    }

    for (i, (actual_line, expected_line)) in actual_lines.iter().zip(expected_lines.iter()).enumerate() {
        if actual_line != expected_line {
            panic!(
                "{}: Line {} mismatch\nExpected: {}\nActual:   {}",
                context,
                i + 1,
                expected_line,
                actual_line
            );
        }
    }
}
