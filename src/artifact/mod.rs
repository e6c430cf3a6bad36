use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use thiserror::Error;

use crate::geometry::ImageBounds;

const DOWNLOAD_PREFIX: &str = "edited-";
const FALLBACK_EXTENSION: &str = "png";

static NEXT_ARTIFACT_ID: AtomicU64 = AtomicU64::new(1);

pub type DecodingResult<T> = std::result::Result<T, DecodingError>;

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("invalid data URL")]
    InvalidDataUrl,
    #[error("could not parse MIME type from data URL")]
    MimeParse,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(u64);

impl ArtifactId {
    fn next() -> Self {
        Self(NEXT_ARTIFACT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact-{}", self.0)
    }
}

/// An encoded image blob. Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct Artifact {
    id: ArtifactId,
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: ArtifactId::next(),
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Wraps a generated payload, naming it `<stem>-<millis>.<ext>`.
    pub fn from_image_data(stem: &str, data: ImageData) -> Self {
        let name = format!("{stem}-{}.{}", timestamp_millis(), data.extension());
        Self::new(name, data.mime, data.bytes)
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn decode(&self) -> DecodingResult<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }

    pub fn dimensions(&self) -> DecodingResult<ImageBounds> {
        let image = self.decode()?;
        Ok(ImageBounds::new(image.width(), image.height()))
    }

    pub fn download_name(&self) -> String {
        format!("{DOWNLOAD_PREFIX}{}", self.name)
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Artifact {}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A self-describing encoded image returned by the generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> DecodingResult<Self> {
        let (header, payload) = url.split_once(',').ok_or(DecodingError::InvalidDataUrl)?;
        let mime = header
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .ok_or(DecodingError::MimeParse)?;
        let bytes = BASE64.decode(payload.trim())?;
        Ok(Self::new(mime, bytes))
    }

    pub fn extension(&self) -> &'static str {
        image::ImageFormat::from_mime_type(&self.mime)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or(FALLBACK_EXTENSION)
    }
}

pub(crate) fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}
