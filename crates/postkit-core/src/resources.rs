//! Locally-held binary image resources.
//!
//! A resource is registered when the user supplies image bytes and is
//! referenced by exactly one image layer through a [`ResourceHandle`]. The
//! owning layer is responsible for releasing it on deletion or when its
//! source is replaced; the pool enforces that a handle is released at most
//! once.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Opaque handle to a locally-held image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle(Uuid);

impl ResourceHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local:{}", self.0)
    }
}

/// Image format of a resource, detected from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Bytes of a user-supplied image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    pub bytes: Vec<u8>,
    pub format: Option<ImageFormat>,
}

impl ImageResource {
    pub fn new(bytes: Vec<u8>) -> Self {
        let format = ImageFormat::from_magic_bytes(&bytes);
        Self { bytes, format }
    }
}

/// Registry of live resources.
#[derive(Debug, Default)]
pub struct ResourcePool {
    live: HashMap<ResourceHandle, ImageResource>,
    releases: u64,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return a fresh handle.
    pub fn register(&mut self, resource: ImageResource) -> ResourceHandle {
        let handle = ResourceHandle::new();
        log::debug!("Registered image resource {} ({} bytes)", handle, resource.bytes.len());
        self.live.insert(handle, resource);
        handle
    }

    /// Copy a live resource under a new handle.
    pub fn duplicate(&mut self, handle: ResourceHandle) -> Option<ResourceHandle> {
        let copy = self.live.get(&handle)?.clone();
        Some(self.register(copy))
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&ImageResource> {
        self.live.get(&handle)
    }

    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Release a handle. Returns false if it was already released or unknown.
    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        if self.live.remove(&handle).is_some() {
            self.releases += 1;
            log::debug!("Released image resource {}", handle);
            true
        } else {
            log::warn!("Ignoring release of unknown or already released resource {}", handle);
            false
        }
    }

    /// Release every outstanding resource (editor teardown).
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.releases += count as u64;
        self.live.clear();
        if count > 0 {
            log::debug!("Released {} outstanding image resources", count);
        }
        count
    }

    /// Release every live handle not in `keep`. Returns how many were
    /// released.
    pub fn release_unreferenced(&mut self, keep: &HashSet<ResourceHandle>) -> usize {
        let stale: Vec<ResourceHandle> = self
            .live
            .keys()
            .filter(|handle| !keep.contains(handle))
            .copied()
            .collect();
        for handle in &stale {
            self.release(*handle);
        }
        stale.len()
    }

    /// Number of resources still held.
    pub fn outstanding(&self) -> usize {
        self.live.len()
    }

    /// Total number of successful releases over the pool's lifetime.
    pub fn release_count(&self) -> u64 {
        self.releases
    }
}
