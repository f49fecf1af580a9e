//! Texture store backing brush handles
//!
//! A brush never owns its pixels directly: it owns a [`TextureHandle`] into
//! this store, and the pixels behind it are released when the brush is
//! disposed or dropped.
//!
//! ## Storage
//! - Pixels are kept as RGBA8, LZ4 compressed with prepended size unless
//!   compression is switched off in [`StoreSettings`]
//! - Every texture records a SHA-256 content hash for diagnostics

use image::RgbaImage;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::core::errors::BrushError;
use crate::core::settings::StoreSettings;

/// Opaque handle to a stored texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TextureEntry {
    data: Vec<u8>,
    compressed: bool,
    width: u32,
    height: u32,
    content_hash: String,
}

/// Metadata of a stored texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub content_hash: String,
    /// Bytes held by the store (after compression)
    pub stored_bytes: usize,
    pub compressed: bool,
}

/// Global texture store (parking_lot::RwLock doesn't poison)
static TEXTURE_STORE: RwLock<Option<TextureStore>> = RwLock::new(None);

/// Handle table of texture pixel data
#[derive(Debug, Default)]
pub struct TextureStore {
    settings: StoreSettings,
    next_id: u64,
    textures: HashMap<u64, TextureEntry>,
}

impl TextureStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            next_id: 1,
            textures: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Store a copy of `image` and return its handle
    pub fn allocate(&mut self, image: &RgbaImage) -> Result<TextureHandle, BrushError> {
        let entry = encode_entry(image, &self.settings)?;
        Ok(self.insert(entry))
    }

    fn insert(&mut self, entry: TextureEntry) -> TextureHandle {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.textures.insert(id, entry);
        TextureHandle(id)
    }

    /// Copy an existing texture under a new handle
    pub fn duplicate(&mut self, handle: TextureHandle) -> Result<TextureHandle, BrushError> {
        let entry = self
            .textures
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| unknown_handle(handle))?;
        Ok(self.insert(entry))
    }

    /// Release a texture. Returns false if the handle was not live.
    pub fn release(&mut self, handle: TextureHandle) -> bool {
        self.textures.remove(&handle.0).is_some()
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle.0)
    }

    /// Decode a fresh image from the stored pixels
    pub fn read(&self, handle: TextureHandle) -> Result<RgbaImage, BrushError> {
        let entry = self
            .textures
            .get(&handle.0)
            .ok_or_else(|| unknown_handle(handle))?;

        let raw = if entry.compressed {
            decompress_size_prepended(&entry.data)
                .map_err(|e| BrushError::Texture(format!("decompress failed: {}", e)))?
        } else {
            entry.data.clone()
        };

        RgbaImage::from_raw(entry.width, entry.height, raw).ok_or_else(|| {
            BrushError::Texture(format!(
                "pixel buffer does not match {}x{}",
                entry.width, entry.height
            ))
        })
    }

    pub fn info(&self, handle: TextureHandle) -> Option<TextureInfo> {
        self.textures.get(&handle.0).map(|entry| TextureInfo {
            width: entry.width,
            height: entry.height,
            content_hash: entry.content_hash.clone(),
            stored_bytes: entry.data.len(),
            compressed: entry.compressed,
        })
    }

    /// Get number of live textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Get total stored size
    pub fn total_size(&self) -> usize {
        self.textures.values().map(|t| t.data.len()).sum()
    }
}

fn unknown_handle(handle: TextureHandle) -> BrushError {
    BrushError::Texture(format!("unknown texture handle {}", handle.0))
}

/// Reject textures the store cannot hold under `settings`
pub fn check_dimensions(
    width: u32,
    height: u32,
    settings: &StoreSettings,
) -> Result<(), BrushError> {
    if width == 0 || height == 0 {
        return Err(BrushError::Allocation(format!(
            "empty texture {}x{}",
            width, height
        )));
    }
    let max = settings.max_dimension;
    if width > max || height > max {
        return Err(BrushError::Allocation(format!(
            "texture {}x{} exceeds {} pixels",
            width, height, max
        )));
    }
    Ok(())
}

/// Hash and compress pixels into a store entry. Needs no store lock.
fn encode_entry(
    image: &RgbaImage,
    settings: &StoreSettings,
) -> Result<TextureEntry, BrushError> {
    let (width, height) = image.dimensions();
    check_dimensions(width, height, settings)?;

    let raw = image.as_raw();
    let content_hash = hex::encode(Sha256::digest(raw));
    let (data, compressed) = if settings.compress {
        (compress_prepend_size(raw), true)
    } else {
        (raw.clone(), false)
    };

    tracing::debug!(
        "Texture {}x{}: {} -> {} bytes ({:.1}% of original)",
        width,
        height,
        raw.len(),
        data.len(),
        data.len() as f64 / raw.len().max(1) as f64 * 100.0
    );

    Ok(TextureEntry {
        data,
        compressed,
        width,
        height,
        content_hash,
    })
}

// === Global store operations ===

fn with_store<R>(f: impl FnOnce(&mut TextureStore) -> R) -> R {
    let mut guard = TEXTURE_STORE.write();
    let store = guard.get_or_insert_with(|| {
        let settings = StoreSettings::from_env();
        tracing::debug!("Texture store initialized: {:?}", settings);
        TextureStore::new(settings)
    });
    f(store)
}

fn with_store_read<R>(f: impl FnOnce(Option<&TextureStore>) -> R) -> R {
    let guard = TEXTURE_STORE.read();
    f(guard.as_ref())
}

/// Replace the settings of the global store. Live textures are kept.
pub fn configure(settings: StoreSettings) {
    with_store(|store| {
        tracing::debug!("Texture store reconfigured: {:?}", settings);
        store.settings = settings;
    });
}

/// Current settings of the global store
pub fn settings() -> StoreSettings {
    if let Some(settings) = with_store_read(|store| store.map(|s| s.settings().clone())) {
        return settings;
    }
    with_store(|store| store.settings().clone())
}

/// Encode outside the lock; the write lock is held only for the insert.
pub fn allocate_texture(image: &RgbaImage) -> Result<TextureHandle, BrushError> {
    let entry = encode_entry(image, &settings())?;
    Ok(with_store(|store| store.insert(entry)))
}

pub fn duplicate_texture(handle: TextureHandle) -> Result<TextureHandle, BrushError> {
    let entry = with_store_read(|store| {
        store
            .and_then(|s| s.textures.get(&handle.0).cloned())
            .ok_or_else(|| unknown_handle(handle))
    })?;
    Ok(with_store(|store| store.insert(entry)))
}

pub fn release_texture(handle: TextureHandle) -> bool {
    let released = with_store(|store| store.release(handle));
    if !released {
        tracing::warn!("Release of unknown texture handle {}", handle.0);
    }
    released
}

pub fn read_texture(handle: TextureHandle) -> Result<RgbaImage, BrushError> {
    with_store_read(|store| {
        store
            .ok_or_else(|| unknown_handle(handle))
            .and_then(|s| s.read(handle))
    })
}

pub fn texture_info(handle: TextureHandle) -> Option<TextureInfo> {
    with_store_read(|store| store.and_then(|s| s.info(handle)))
}

pub fn is_live(handle: TextureHandle) -> bool {
    with_store_read(|store| store.is_some_and(|s| s.contains(handle)))
}

/// Get store statistics: (live textures, stored bytes)
pub fn texture_stats() -> (usize, usize) {
    with_store_read(|store| {
        store
            .map(|s| (s.len(), s.total_size()))
            .unwrap_or((0, 0))
    })
}
