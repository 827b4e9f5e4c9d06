//! Media storage boundary.
//!
//! Article images and audio files are owned by an external object store:
//! upload returns a public URL plus whatever metadata the store extracted
//! (duration for audio), delete removes by URL. `LocalMediaStore` is the
//! bundled implementation — it writes under a local media root that the
//! router serves via tower-http's `ServeDir` — and a hosted store can be
//! swapped in behind the same trait.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;

#[derive(Debug)]
pub enum MediaError {
    Io(String),
    InvalidUrl(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Io(msg) => write!(f, "media io: {}", msg),
            MediaError::InvalidUrl(url) => write!(f, "not a managed media url: {}", url),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Folder name inside the media root, mirrored in public URLs.
    fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "articles",
            MediaKind::Audio => "audios",
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub url: String,
    /// Duration in seconds, when the store can extract it (audio only).
    pub duration_secs: Option<f64>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        kind: MediaKind,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<MediaUpload, MediaError>;

    async fn delete(&self, url: &str, kind: MediaKind) -> Result<(), MediaError>;
}

/// Disk-backed store serving files from `<media_root>/<folder>/<file>` at
/// `<public_base_url>/media/<folder>/<file>`.
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Timestamped unique name; whitespace in the original name collapses
    /// to underscores so URLs stay unescaped.
    fn unique_name(original_name: &str) -> String {
        let sanitized: String = original_name
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect();
        format!("{}_{}", Utc::now().timestamp_millis(), sanitized)
    }

    fn file_name_from_url<'a>(&self, url: &'a str) -> Result<&'a str, MediaError> {
        url.rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        kind: MediaKind,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<MediaUpload, MediaError> {
        let dir = self.root.join(kind.folder());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        let file_name = Self::unique_name(original_name);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(path = %path.display(), "stored media file");

        Ok(MediaUpload {
            url: format!(
                "{}/media/{}/{}",
                self.public_base_url,
                kind.folder(),
                file_name
            ),
            // A local store has no probe; callers fall back to
            // client-supplied duration metadata.
            duration_secs: None,
        })
    }

    async fn delete(&self, url: &str, kind: MediaKind) -> Result<(), MediaError> {
        let file_name = self.file_name_from_url(url)?;
        let path = self.root.join(kind.folder()).join(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone is fine; the row is the thing being deleted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}
