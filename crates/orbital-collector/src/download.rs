//! Cache-aware band download.
//!
//! The filesystem is the cache: `<cache_root>/<scene_id>/<band>.tif`. A band
//! file is only ever published by renaming a fully written temp file, so a
//! non-empty file at the published path is trusted as complete. Temp files
//! delete themselves when dropped, including when a deadline cancels the
//! download midway.

use futures::future::join_all;
use orbital_core::error::{BandFailure, OrbitalError, PartialDownload, Result};
use orbital_core::models::{CatalogScene, LocalImageSet, TRUE_COLOR_BAND};
use orbital_core::ports::{HttpTransport, TransportError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::signing::AssetResolver;

#[derive(Debug, Error)]
enum BandError {
    #[error("{0}")]
    Resolve(#[from] OrbitalError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("filesystem: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty response body")]
    Empty,

    #[error("band name is not a plain file name")]
    UnsafeName,
}

enum BandOutcome {
    Absent,
    Cached(PathBuf),
    Downloaded { path: PathBuf, bytes: u64 },
    Failed(BandError),
}

/// Materializes scene bands under a cache root
pub struct CacheDownloader<T: HttpTransport> {
    resolver: AssetResolver<T>,
    transport: T,
}

impl<T: HttpTransport> CacheDownloader<T> {
    pub fn new(resolver: AssetResolver<T>, transport: T) -> Self {
        Self { resolver, transport }
    }

    /// Download the requested bands of a scene, skipping those already cached
    ///
    /// An empty `bands` slice means the true-color band. Bands the scene does not
    /// carry are skipped. All bands are fetched concurrently.
    ///
    /// # Errors
    /// * `CatalogResponse` - the scene id is not a plain directory name
    /// * `Io` - the scene directory could not be created
    /// * `PartialDownload` - at least one band failed; the error carries the
    ///   image set of the bands that made it to disk
    pub async fn download(
        &self,
        scene: &CatalogScene,
        bands: &[String],
        cache_root: &Path,
    ) -> Result<LocalImageSet> {
        if !LocalImageSet::is_cache_name(&scene.id) {
            return Err(OrbitalError::CatalogResponse {
                reason: format!("scene id {:?} is not a plain directory name", scene.id),
            });
        }
        let directory = cache_root.join(&scene.id);
        tokio::fs::create_dir_all(&directory).await?;

        let requested: BTreeSet<&str> = if bands.is_empty() {
            BTreeSet::from([TRUE_COLOR_BAND])
        } else {
            bands.iter().map(String::as_str).collect()
        };

        let dir = directory.as_path();
        let outcomes = join_all(
            requested
                .iter()
                .map(|&band| async move { (band, self.fetch_band(scene, band, dir).await) }),
        )
        .await;

        let mut image_set = LocalImageSet::new(&scene.id, &directory);
        let mut failed = Vec::new();

        for (band, outcome) in outcomes {
            match outcome {
                BandOutcome::Absent => {
                    debug!(scene = %scene.id, band, "Band not offered by scene, skipping");
                }
                BandOutcome::Cached(path) => {
                    debug!(scene = %scene.id, band, "Cache hit");
                    image_set.bands.insert(band.to_string(), path);
                }
                BandOutcome::Downloaded { path, bytes } => {
                    info!(scene = %scene.id, band, bytes, "Band downloaded");
                    image_set.bands.insert(band.to_string(), path);
                }
                BandOutcome::Failed(err) => {
                    warn!(scene = %scene.id, band, error = %err, "Band download failed");
                    failed.push(BandFailure { band: band.to_string(), reason: err.to_string() });
                }
            }
        }

        if failed.is_empty() {
            return Ok(image_set);
        }

        Err(OrbitalError::PartialDownload(Box::new(PartialDownload {
            scene_id: scene.id.clone(),
            succeeded: image_set.bands.keys().cloned().collect(),
            failed,
            image_set,
        })))
    }

    async fn fetch_band(&self, scene: &CatalogScene, band: &str, directory: &Path) -> BandOutcome {
        if !LocalImageSet::is_cache_name(band) {
            return BandOutcome::Failed(BandError::UnsafeName);
        }
        let Some(asset) = scene.asset(band) else {
            return BandOutcome::Absent;
        };

        let target = LocalImageSet::band_path_in(directory, band);
        if is_published(&target).await {
            return BandOutcome::Cached(target);
        }

        match self.publish(band, &asset.href, &target).await {
            Ok(bytes) => BandOutcome::Downloaded { path: target, bytes },
            Err(err) => BandOutcome::Failed(err),
        }
    }

    /// Resolve, stream into a unique temp file, then rename into place
    ///
    /// Every early return drops the temp file, which removes it.
    async fn publish(
        &self,
        band: &str,
        href: &str,
        target: &Path,
    ) -> std::result::Result<u64, BandError> {
        let resolved = self.resolver.resolve(band, href).await?;
        let (file, temp) = temp_file_for(target)?.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let written = self.transport.download(&resolved.url, &mut file).await?;
        if written == 0 {
            return Err(BandError::Empty);
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        temp.persist(target).map_err(|e| e.error)?;
        Ok(written)
    }
}

/// Fresh `<band>.tif.<uuid>.part` next to the published file
fn temp_file_for(target: &Path) -> std::io::Result<NamedTempFile> {
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let prefix = format!("{}.{}", name, Uuid::new_v4());
    let directory = target.parent().unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new().prefix(&prefix).suffix(".part").rand_bytes(0).tempfile_in(directory)
}

async fn is_published(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_is_unique_sibling() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("visual.tif");
        let a = temp_file_for(&target).unwrap();
        let b = temp_file_for(&target).unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().parent(), target.parent());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("visual.tif."));
        assert!(name.ends_with(".part"));
    }

    #[test]
    fn test_dropped_temp_file_is_removed() {
        let dir = tempfile::TempDir::new().unwrap();
        let temp = temp_file_for(&dir.path().join("B08.tif")).unwrap();
        let path = temp.path().to_path_buf();
        assert!(path.exists());

        drop(temp);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_file_is_not_published() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("visual.tif");
        assert!(!is_published(&path).await);

        tokio::fs::write(&path, b"").await.unwrap();
        assert!(!is_published(&path).await);

        tokio::fs::write(&path, b"II*\0").await.unwrap();
        assert!(is_published(&path).await);
    }
}
