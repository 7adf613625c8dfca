// Output file naming and writing.
//
// Each input gets `annotated_<n>.html` (and `annotated_<n>.xml` unless XML is
// disabled) in the output directory, where `n` is the input's 1-based position
// on the command line. Files are written through a temporary file in the same
// directory and renamed into place, so a failed write never leaves a partial
// output behind.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Highlighted-HTML output path for the input at 1-based `index`
pub fn output_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("annotated_{index}.html"))
}

/// XML output path for the input at 1-based `index`
pub fn xml_output_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("annotated_{index}.xml"))
}

/// Write `content` to `path` atomically
pub async fn write_atomic(path: &Path, content: String) -> Result<()> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, content.as_bytes()))
        .await
        .context("Output writer task panicked")??;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_atomic_blocking(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to move output into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_names() {
        let dir = Path::new("out");
        assert_eq!(output_path(dir, 1), PathBuf::from("out/annotated_1.html"));
        assert_eq!(xml_output_path(dir, 12), PathBuf::from("out/annotated_12.xml"));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = output_path(temp_dir.path(), 1);

        write_atomic(&path, "first".to_string()).await.unwrap();
        write_atomic(&path, "second".to_string()).await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
        // Only the output itself remains, no temporary files
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_without_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = output_path(&temp_dir.path().join("missing"), 1);

        assert!(write_atomic(&path, "content".to_string()).await.is_err());
        assert!(!path.exists());
    }
}
