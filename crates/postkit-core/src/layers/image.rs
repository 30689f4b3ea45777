//! Image layer.

use crate::resources::ResourceHandle;
use serde::{Deserialize, Serialize};

/// Remote picture used when an image layer is added without user bytes.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.pexels.com/photos/1640777/pexels-photo-1640777.jpeg";

/// Where an image layer's pixels come from.
///
/// Local handles are session-only: they serialize as `null` and reload as
/// [`ImageSource::Unset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ImageSource {
    /// A remote URL the layer does not own.
    Remote(String),
    /// A locally-held resource. `owned` layers must release the handle.
    Local { handle: ResourceHandle, owned: bool },
    /// No source (e.g. a local resource that did not survive a reload).
    Unset,
}

impl ImageSource {
    /// The handle this source is responsible for releasing, if any.
    pub fn owned_handle(&self) -> Option<ResourceHandle> {
        match self {
            ImageSource::Local { handle, owned: true } => Some(*handle),
            _ => None,
        }
    }

    pub fn local_handle(&self) -> Option<ResourceHandle> {
        match self {
            ImageSource::Local { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

impl From<Option<String>> for ImageSource {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(url) if !url.is_empty() => ImageSource::Remote(url),
            _ => ImageSource::Unset,
        }
    }
}

impl From<ImageSource> for Option<String> {
    fn from(value: ImageSource) -> Self {
        match value {
            ImageSource::Remote(url) => Some(url),
            ImageSource::Local { .. } | ImageSource::Unset => None,
        }
    }
}

/// A raster picture placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    #[serde(rename = "src")]
    pub source: ImageSource,
    pub width: f64,
    pub height: f64,
}

impl ImageLayer {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            width: 260.0,
            height: 160.0,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(ImageSource::Remote(PLACEHOLDER_IMAGE_URL.to_string()))
    }

    pub fn owned(handle: ResourceHandle) -> Self {
        Self::new(ImageSource::Local { handle, owned: true })
    }
}
