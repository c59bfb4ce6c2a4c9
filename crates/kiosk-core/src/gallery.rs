//! Authorized-face gallery, built once at startup from a directory of images.

use crate::card::CardReader;
use crate::ocr::is_numeric_id;
use crate::pipeline::FaceEncoder;
use crate::types::GalleryEntry;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("cannot read authorized faces directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered name→embedding pairs; order is the match priority.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn push(&mut self, entry: GalleryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scan `dir` for face images in file-name order.
    ///
    /// Unreadable images, encoder failures and images without a face are
    /// logged and skipped.
    /// Numeric file names get their display name from the ID card in the
    /// same image.
    pub fn load_dir(
        dir: &Path,
        encoder: &mut dyn FaceEncoder,
        reader: &dyn CardReader,
    ) -> Result<Self, GalleryError> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| GalleryError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        paths.sort();

        let mut gallery = Gallery::default();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let image = match image::open(&path) {
                Ok(img) => img.to_rgb8(),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "cannot read authorized face image, skipping");
                    continue;
                }
            };

            let faces = match encoder.encode(&image) {
                Ok(faces) => faces,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "face encoding failed, skipping");
                    continue;
                }
            };

            let Some(face) = faces.into_iter().next() else {
                tracing::warn!(file = %path.display(), "no face found in authorized image, skipping");
                continue;
            };

            let (name, person_id) = resolve_name(&stem, &image, reader);
            tracing::info!(file = %path.display(), name = %name, person_id = %person_id, "authorized face loaded");

            gallery.push(GalleryEntry {
                name,
                person_id,
                embedding: face.embedding,
            });
        }

        tracing::info!(count = gallery.len(), dir = %dir.display(), "gallery ready");
        Ok(gallery)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// (display name, person id) for an authorized image.
///
/// The person id is always the file stem. A numeric stem takes its display
/// name from OCR when the card yields text; otherwise the stem is the name.
pub fn resolve_name(stem: &str, image: &RgbImage, reader: &dyn CardReader) -> (String, String) {
    if is_numeric_id(stem) {
        let text = reader.read_name(image);
        if !text.is_empty() {
            return (text, stem.to_string());
        }
        tracing::info!(stem, "no card text found, using file name");
    }
    (stem.to_string(), stem.to_string())
}
