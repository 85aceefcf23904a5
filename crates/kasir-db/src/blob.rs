//! # Image Store
//!
//! Product photos live as plain files under one root directory, next to the
//! database. The database only keeps the object reference.
//!
//! ```text
//! <images root>/
//! └── products/
//!     ├── kopi-susu.jpg      ◄── reference "products/kopi-susu.jpg"
//!     └── roti-tawar.png
//! ```
//!
//! A reference is always relative and never contains `..`, so a stored value
//! cannot point outside the root.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Folder for product photos inside the store.
pub const PRODUCTS_PREFIX: &str = "products";

/// Largest accepted upload (2 MiB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Filesystem-backed store for product images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ImageStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores a product photo and returns its reference.
    ///
    /// Uploading again for the same product replaces the old file, also when
    /// the format changed.
    ///
    /// ## Errors
    /// - `UnsupportedMedia` for anything but jpeg/png/webp, or files over
    ///   [`MAX_IMAGE_BYTES`]
    /// - `InvalidReference` if the product id has no usable characters
    pub async fn upload_product_image(
        &self,
        product_id: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> DbResult<String> {
        let ext = extension_for(content_type)?;
        if bytes.is_empty() {
            return Err(DbError::UnsupportedMedia("empty file".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DbError::UnsupportedMedia(format!(
                "image is {} bytes, limit is {MAX_IMAGE_BYTES}",
                bytes.len()
            )));
        }

        let stem = sanitize_id(product_id)?;
        self.delete_product_image(product_id).await?;

        let reference = format!("{PRODUCTS_PREFIX}/{stem}.{ext}");
        let path = self.resolve(&reference)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        info!(product_id = %product_id, reference = %reference, size = bytes.len(), "Product image stored");
        Ok(reference)
    }

    /// Reads an object by reference.
    pub async fn read(&self, reference: &str) -> DbResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DbError::not_found("Image", reference))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, reference: &str) -> DbResult<bool> {
        let path = self.resolve(reference)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Removes every stored photo for a product. Returns whether anything was
    /// deleted.
    pub async fn delete_product_image(&self, product_id: &str) -> DbResult<bool> {
        let stem = sanitize_id(product_id)?;
        let mut removed = false;

        for ext in ["jpg", "png", "webp"] {
            let path = self.resolve(&format!("{PRODUCTS_PREFIX}/{stem}.{ext}"))?;
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed product image");
                    removed = true;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }

    /// References of all objects directly under `prefix`, sorted.
    ///
    /// A missing folder lists as empty.
    pub async fn list(&self, prefix: &str) -> DbResult<Vec<String>> {
        let prefix = prefix.trim_matches('/');
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.resolve(prefix)?
        };

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut references = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            references.push(if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            });
        }
        references.sort();

        Ok(references)
    }

    fn resolve(&self, reference: &str) -> DbResult<PathBuf> {
        let relative = Path::new(reference);
        let clean = !reference.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(DbError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn extension_for(content_type: &str) -> DbResult<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        other => Err(DbError::UnsupportedMedia(other.to_string())),
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing everything else with `_`.
fn sanitize_id(product_id: &str) -> DbResult<String> {
    let cleaned: String = product_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '_') {
        return Err(DbError::InvalidReference(product_id.to_string()));
    }
    Ok(cleaned)
}

// =============================================================================
// Tests
// =============================================================================
