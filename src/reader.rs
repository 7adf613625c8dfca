use crate::document::DocumentLocator;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info};

/// Configuration for document reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Buffer size for async file reading (default: 8KB)
    pub buffer_size: usize,
    /// Timeout for fetching remote documents
    pub request_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8192,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Statistics for one read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub locator: String,
    pub bytes_read: u64,
    pub duration_ms: u64,
}

/// Reads document content from local files or over HTTP.
///
/// Content must be valid UTF-8; anything else is an error for that document.
pub struct DocumentReader {
    config: ReaderConfig,
    client: reqwest::Client,
}

impl DocumentReader {
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Read the whole document behind `locator`
    pub async fn read(&self, locator: &DocumentLocator) -> Result<(String, ReadStats)> {
        let start_time = std::time::Instant::now();
        debug!("Starting read of {}", locator);

        let bytes = match locator {
            DocumentLocator::Path(path) => self.read_file(path).await?,
            DocumentLocator::Remote(url) => self.fetch(url).await?,
        };
        let bytes_read = bytes.len() as u64;

        let content = String::from_utf8(bytes)
            .map_err(|e| anyhow::anyhow!("UTF-8 decoding error in {} at byte {}", locator, e.utf8_error().valid_up_to()))?;

        let stats = ReadStats {
            locator: locator.to_string(),
            bytes_read,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Successfully read {}: {} bytes in {}ms ({:.2} MB/s)",
            locator,
            bytes_read,
            stats.duration_ms,
            if stats.duration_ms > 0 {
                (bytes_read as f64 / 1_000_000.0) / (stats.duration_ms as f64 / 1000.0)
            } else {
                0.0
            }
        );

        Ok((content, stats))
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open file {}", path.display()))?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .await
            .with_context(|| format!("Failed to read file {}", path.display()))?;
        Ok(bytes)
    }

    async fn fetch(&self, url: &url::Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Server rejected request for {url}"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        Ok(bytes.to_vec())
    }
}

/// Convenience function for reading a single local file with default configuration
pub async fn read_file_async<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let reader = DocumentReader::new(ReaderConfig::default())?;
    let locator = DocumentLocator::Path(file_path.as_ref().to_path_buf());
    let (content, _stats) = reader.read(&locator).await?;
    Ok(content)
}
