//! Gallery data sources.
//!
//! A gallery is an ordered list of `{ imageUrl, id }` entries. It can come from:
//!
//! - **A JSON file**: `[{ "imageUrl": "https://…/a.jpg", "id": 1001 }, …]`
//! - **A directory**: every image file under it, sorted by path, with ids
//!   numbered from 1. Natural sizes are read from the file headers so the CLI
//!   can fit them without a browser.
//!
//! The core only ever reads the resulting [`GalleryItem`]s.

use crate::controller::GalleryItem;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("duplicate gallery id {0}")]
    DuplicateId(i64),
}

/// One entry of a gallery JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub id: i64,
}

/// A loaded gallery: items plus any natural sizes known up front.
#[derive(Debug, Clone, Default)]
pub struct GallerySource {
    pub items: Vec<GalleryItem>,
    /// Per ordinal; `None` when the size is only known after loading.
    pub natural_sizes: Vec<Option<(u32, u32)>>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"];

/// Load a gallery from a JSON file or an image directory.
pub fn load_gallery(path: &Path) -> Result<GallerySource, SourceError> {
    if path.is_dir() {
        scan_directory(path)
    } else {
        let content = fs::read_to_string(path)?;
        parse_json(&content)
    }
}

/// Parse the `[{ imageUrl, id }]` JSON shape. Ids must be unique.
pub fn parse_json(content: &str) -> Result<GallerySource, SourceError> {
    let entries: Vec<SourceEntry> = serde_json::from_str(content)?;
    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.id) {
            return Err(SourceError::DuplicateId(entry.id));
        }
    }
    let natural_sizes = vec![None; entries.len()];
    let items = GalleryItem::from_pairs(entries.into_iter().map(|e| (e.image_url, e.id)));
    Ok(GallerySource {
        items,
        natural_sizes,
    })
}

/// Collect every image under `root`, sorted by path.
pub fn scan_directory(root: &Path) -> Result<GallerySource, SourceError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let natural_sizes = files
        .iter()
        .map(|path| match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read image size");
                None
            }
        })
        .collect();

    let items = GalleryItem::from_pairs(files.iter().enumerate().map(|(i, path)| {
        let rel = path.strip_prefix(root).unwrap_or(path);
        (url_path(rel), i as i64 + 1)
    }));
    tracing::debug!(count = items.len(), root = %root.display(), "scanned gallery directory");
    Ok(GallerySource {
        items,
        natural_sizes,
    })
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Relative path with `/` separators, usable as an `img` source.
fn url_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_image_url_entries() {
        let json = r#"[
            { "imageUrl": "https://example.com/a.jpg", "id": 1001 },
            { "imageUrl": "https://example.com/b.jpg", "id": 1002 }
        ]"#;
        let source = parse_json(json).unwrap();
        assert_eq!(source.items.len(), 2);
        assert_eq!(source.items[1].source_url, "https://example.com/b.jpg");
        assert_eq!(source.items[1].identity, 1002);
        assert_eq!(source.items[1].ordinal, 1);
        assert_eq!(source.natural_sizes, vec![None, None]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[{ "imageUrl": "a", "id": 1 }, { "imageUrl": "b", "id": 1 }]"#;
        assert!(matches!(parse_json(json), Err(SourceError::DuplicateId(1))));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(parse_json("[{]"), Err(SourceError::Json(_))));
    }

    #[test]
    fn scans_images_sorted_with_sizes() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("b-set");
        fs::create_dir_all(&nested).unwrap();
        image::RgbImage::new(40, 30)
            .save(nested.join("002.png"))
            .unwrap();
        image::RgbImage::new(8, 16)
            .save(tmp.path().join("001.png"))
            .unwrap();
        fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();

        let source = load_gallery(tmp.path()).unwrap();
        let urls: Vec<&str> = source.items.iter().map(|i| i.source_url.as_str()).collect();
        assert_eq!(urls, vec!["001.png", "b-set/002.png"]);
        assert_eq!(source.items[0].identity, 1);
        assert_eq!(source.natural_sizes, vec![Some((8, 16)), Some((40, 30))]);
    }

    #[test]
    fn unreadable_image_has_unknown_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.jpg"), b"not really a jpeg").unwrap();
        let source = scan_directory(tmp.path()).unwrap();
        assert_eq!(source.items.len(), 1);
        assert_eq!(source.natural_sizes, vec![None]);
    }

    #[test]
    fn loads_json_file_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.json");
        fs::write(&path, r#"[{ "imageUrl": "x.jpg", "id": 7 }]"#).unwrap();
        let source = load_gallery(&path).unwrap();
        assert_eq!(source.items[0].identity, 7);
    }
}
