// SPDX-License-Identifier: MPL-2.0

//! Directory-backed gallery and media library
//!
//! The gallery picks the newest image of a directory (an empty directory
//! behaves like a cancelled picker). The library copies photos into
//! `~/Pictures/<folder>`.

use super::{BackendError, BackendResult, GalleryBackend, MediaLibraryBackend};
use crate::app::{PickOptions, PickOutcome};
use crate::constants::storage;
use crate::storage::{encode_jpeg, file_uri, latest_image, path_from_uri, timestamped_file_name};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Map a filesystem probe to a permission answer: access refusal is a denial,
/// anything else unexpected is an error.
fn permission_from_io(result: std::io::Result<()>) -> BackendResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Gallery reading images from a directory
pub struct DirectoryGallery {
    source_dir: PathBuf,
    /// Where re-encoded picks are written
    cache_dir: PathBuf,
}

impl DirectoryGallery {
    pub fn new(source_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            source_dir,
            cache_dir,
        }
    }
}

impl GalleryBackend for DirectoryGallery {
    fn request_read_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let dir = self.source_dir.clone();
        async move {
            let probe = tokio::fs::read_dir(&dir).await.map(|_| ());
            match probe {
                // A missing gallery is an empty gallery
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
                other => permission_from_io(other),
            }
        }
        .boxed()
    }

    fn pick_image(&self, options: PickOptions) -> BoxFuture<'static, BackendResult<PickOutcome>> {
        let source_dir = self.source_dir.clone();
        let cache_dir = self.cache_dir.clone();

        async move {
            if options.allow_editing {
                debug!("Directory gallery has no edit step, returning the image as is");
            }

            let Some(path) = latest_image(source_dir).await else {
                info!("Gallery is empty, nothing picked");
                return Ok(PickOutcome::Cancelled);
            };

            if options.quality >= 1.0 {
                info!(path = %path.display(), "Picked gallery image");
                return Ok(PickOutcome::Picked(file_uri(&path)));
            }

            let quality = options.quality;
            let data = tokio::task::spawn_blocking(move || {
                let image = image::open(&path)?.to_rgb8();
                encode_jpeg(&image, quality)
            })
            .await??;

            tokio::fs::create_dir_all(&cache_dir).await?;
            let output = cache_dir.join(timestamped_file_name(storage::PICK_PREFIX, "jpg"));
            tokio::fs::write(&output, &data).await?;

            info!(path = %output.display(), quality, "Picked gallery image re-encoded");
            Ok::<_, BackendError>(PickOutcome::Picked(file_uri(&output)))
        }
        .boxed()
    }
}

/// Media library writing into a directory
pub struct DirectoryLibrary {
    library_dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(library_dir: PathBuf) -> Self {
        Self { library_dir }
    }

    pub fn library_dir(&self) -> &PathBuf {
        &self.library_dir
    }
}

impl MediaLibraryBackend for DirectoryLibrary {
    fn request_write_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let dir = self.library_dir.clone();
        async move { permission_from_io(tokio::fs::create_dir_all(&dir).await) }.boxed()
    }

    fn save_to_library(&self, uri: String) -> BoxFuture<'static, BackendResult<()>> {
        let dir = self.library_dir.clone();
        async move {
            let source = path_from_uri(&uri).ok_or_else(|| BackendError::InvalidUri(uri.clone()))?;
            let extension = source
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("jpg")
                .to_lowercase();

            tokio::fs::create_dir_all(&dir).await?;
            let target = dir.join(timestamped_file_name(storage::LIBRARY_PREFIX, &extension));
            tokio::fs::copy(&source, &target).await?;

            info!(from = %source.display(), to = %target.display(), "Photo copied to library");
            Ok::<_, BackendError>(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn options(quality: f32) -> PickOptions {
        PickOptions {
            allow_editing: true,
            quality,
        }
    }

    #[tokio::test]
    async fn test_empty_gallery_is_cancelled() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let gallery = DirectoryGallery::new(source.path().into(), cache.path().into());

        assert_eq!(gallery.request_read_permission().await, Ok(true));
        assert_eq!(gallery.pick_image(options(0.8)).await, Ok(PickOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_pick_reencodes_below_full_quality() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]))
            .save(source.path().join("beach.png"))
            .unwrap();
        let gallery = DirectoryGallery::new(source.path().into(), cache.path().into());

        let PickOutcome::Picked(uri) = gallery.pick_image(options(0.5)).await.unwrap() else {
            panic!("expected a picked image");
        };
        let path = path_from_uri(&uri).unwrap();
        assert!(path.starts_with(cache.path()));

        let PickOutcome::Picked(uri) = gallery.pick_image(options(1.0)).await.unwrap() else {
            panic!("expected a picked image");
        };
        assert_eq!(path_from_uri(&uri).unwrap(), source.path().join("beach.png"));
    }

    #[tokio::test]
    async fn test_library_copies_file() {
        let library_dir = tempfile::tempdir().unwrap();
        let source = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        std::fs::write(source.path(), b"jpeg bytes").unwrap();

        let library = DirectoryLibrary::new(library_dir.path().join("Polaroid"));
        assert_eq!(library.request_write_permission().await, Ok(true));
        library
            .save_to_library(file_uri(source.path()))
            .await
            .unwrap();

        let saved: Vec<_> = std::fs::read_dir(library.library_dir())
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read(saved[0].path()).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_library_rejects_foreign_uri() {
        let library_dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(library_dir.path().into());
        let result = library.save_to_library("content://media/1".into()).await;
        assert!(matches!(result, Err(BackendError::InvalidUri(_))));
    }
}
