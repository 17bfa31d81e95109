use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;

/// Where the floorplan raster comes from. Two references are the same
/// floorplan when they compare equal; an equal reference is never decoded
/// twice in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum FloorplanReference {
    Path(PathBuf),
    Url(String),
    /// Encoded image bytes (PNG, JPEG, ...) already in memory.
    Encoded(Arc<[u8]>),
    /// An already decoded bitmap.
    Bitmap(Arc<RgbaImage>),
}

impl FloorplanReference {
    /// `http(s)://` strings become URLs, everything else a filesystem path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Encoded(bytes) => format!("<{} encoded bytes>", bytes.len()),
            Self::Bitmap(image) => format!("<{}x{} bitmap>", image.width(), image.height()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("floorplan read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("floorplan fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("floorplan decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("floorplan decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Resolves a reference to a decoded RGBA bitmap.
#[async_trait]
pub trait FloorplanLoader: Send + Sync + 'static {
    async fn load(&self, reference: &FloorplanReference) -> Result<RgbaImage, LoadError>;
}

/// Reads files with `tokio::fs`, fetches URLs with `reqwest` and decodes on
/// the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    client: reqwest::Client,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FloorplanLoader for ImageLoader {
    async fn load(&self, reference: &FloorplanReference) -> Result<RgbaImage, LoadError> {
        let bytes: Arc<[u8]> = match reference {
            FloorplanReference::Bitmap(image) => return Ok(image.as_ref().clone()),
            FloorplanReference::Encoded(bytes) => Arc::clone(bytes),
            FloorplanReference::Path(path) => tokio::fs::read(path).await?.into(),
            FloorplanReference::Url(url) => self.fetch(url).await?.into(),
        };
        decode(bytes).await
    }
}

async fn decode(bytes: Arc<[u8]>) -> Result<RgbaImage, LoadError> {
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
    Ok(decoded.to_rgba8())
}
