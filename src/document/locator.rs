// Parsing of the document locators given on the command line.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocator {
    /// Local file, given as a path or a `file://` URL
    Path(PathBuf),
    /// `http` or `https` URL
    Remote(Url),
}

impl DocumentLocator {
    /// Parse a locator. Plain strings without a scheme are taken as paths.
    ///
    /// Fails for empty input, URLs that do not parse, `file://` URLs that do
    /// not name a local path, and schemes other than `file`, `http`, `https`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            anyhow::bail!("Empty document locator");
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map(DocumentLocator::Path)
                    .map_err(|_| anyhow::anyhow!("Malformed file URL: {raw}")),
                "http" | "https" => Ok(DocumentLocator::Remote(url)),
                // Windows drive letters parse as one-letter schemes
                scheme if scheme.len() == 1 => Ok(DocumentLocator::Path(PathBuf::from(raw))),
                scheme => anyhow::bail!("Unsupported scheme '{scheme}' in document locator: {raw}"),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(DocumentLocator::Path(PathBuf::from(raw))),
            Err(e) => anyhow::bail!("Malformed document locator '{raw}': {e}"),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            DocumentLocator::Path(path) => Some(path),
            DocumentLocator::Remote(_) => None,
        }
    }

    /// Lower-cased extension of the locator's last path segment, if any
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            DocumentLocator::Path(path) => path.file_name()?.to_str()?.to_string(),
            DocumentLocator::Remote(url) => url.path_segments()?.last()?.to_string(),
        };
        let (_, extension) = name.rsplit_once('.')?;
        Some(extension.to_ascii_lowercase())
    }

    /// Whether the locator names an HTML or XML document
    pub fn looks_like_markup(&self) -> bool {
        matches!(self.extension().as_deref(), Some("html" | "htm" | "xhtml" | "xml"))
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLocator::Path(path) => write!(f, "{}", path.display()),
            DocumentLocator::Remote(url) => write!(f, "{url}"),
        }
    }
}
