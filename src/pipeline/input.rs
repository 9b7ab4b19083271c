//! Input resolution: turn the user's path or URL into a local PDF file.
//!
//! pdfium opens files by path, so URL inputs are downloaded into a
//! [`TempDir`] that lives as long as the returned [`ResolvedInput`]. Both
//! branches check the `%PDF` magic before handing the path on, so a wrong
//! file is reported as such rather than as a pdfium parse failure.

use crate::error::Pdf2PodError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on the local file system, possibly backed by a temp directory.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The temp directory is removed when this value is dropped.
    Downloaded { path: PathBuf, _dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Whether the input should be fetched over HTTP.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local, magic-checked PDF path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2PodError> {
    if input.trim().is_empty() {
        return Err(Pdf2PodError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download(input, timeout_secs).await
    } else {
        open_local(Path::new(input)).map(ResolvedInput::Local)
    }
}

fn open_local(path: &Path) -> Result<PathBuf, Pdf2PodError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2PodError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2PodError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => check_magic(path, &magic)?,
        // Shorter than four bytes: certainly not a PDF.
        Err(_) => {
            return Err(Pdf2PodError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            })
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

fn check_magic(path: &Path, head: &[u8]) -> Result<(), Pdf2PodError> {
    if head.len() >= 4 && &head[..4] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(Pdf2PodError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

async fn download(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2PodError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| Pdf2PodError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2PodError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let dir = TempDir::new().map_err(|e| Pdf2PodError::Internal(format!("tempdir: {e}")))?;
    let path = dir.path().join(file_name_from_url(url));
    check_magic(&path, &bytes)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2PodError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Downloaded { path, _dir: dir })
}

/// Last path segment of the URL if it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
