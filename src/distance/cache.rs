//! On-disk cache for provider responses.

use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fxhash::FxHasher64;
use tracing::{debug, info, warn};

use super::matrix::CostMatrix;
use super::provider::{CostMatrixProvider, MatrixRequest, ProviderError};
use crate::models::{Coordinates, SiteCatalog};

fn hash_coordinates<H: Hasher>(coordinates: Option<&Coordinates>, hasher: &mut H) {
    match coordinates {
        Some(c) => {
            hasher.write_u8(1);
            hasher.write_u64(c.latitude.to_bits());
            hasher.write_u64(c.longitude.to_bits());
        }
        None => hasher.write_u8(0),
    }
}

/// File name of the cache entry for a provider, catalog and request.
fn cache_key(provider_id: u64, catalog: &SiteCatalog, request: &MatrixRequest) -> String {
    let mut hasher = FxHasher64::default();
    hasher.write_u64(provider_id);
    request.hash(&mut hasher);
    hash_coordinates(catalog.home().coordinates.as_ref(), &mut hasher);
    catalog.len().hash(&mut hasher);
    for site in catalog.sites() {
        site.id().hash(&mut hasher);
        hash_coordinates(site.coordinates(), &mut hasher);
    }
    format!("{:016x}.json", hasher.finish())
}

/// Wraps a provider and stores its matrices as JSON files.
///
/// Entries are keyed by the inner provider's [`cache_id`](CostMatrixProvider::cache_id),
/// the request, and every location's identifier and coordinates, so
/// providers with different settings can share a directory. With `disable_cache` set, existing entries are ignored and
/// overwritten by fresh results.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::{
///     CachedProvider, CostMatrixProvider, CrowFliesProvider, MatrixRequest, TravelCost,
/// };
/// use site_schedule::models::{HomeBase, Site, SiteCatalog};
///
/// let dir = std::env::temp_dir().join("site-schedule-doc-cache");
/// let provider = CachedProvider::new(CrowFliesProvider::default(), &dir);
/// let catalog = SiteCatalog::new(
///     HomeBase::new("camp").with_coordinates(0.0, 0.0),
///     vec![Site::new("A").with_coordinates(0.0, 0.5)],
/// ).unwrap();
/// let first = provider.fetch(&catalog, &MatrixRequest::default()).unwrap();
/// let second = provider.fetch(&catalog, &MatrixRequest::default()).unwrap();
/// assert!((first.home_to(0) - second.home_to(0)).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct CachedProvider<P> {
    inner: P,
    cache_dir: PathBuf,
    disable_cache: bool,
}

impl<P: CostMatrixProvider> CachedProvider<P> {
    pub fn new(inner: P, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.as_ref().to_path_buf(),
            disable_cache: false,
        }
    }

    /// Skips reading cached entries.
    pub fn with_disable_cache(mut self, disable: bool) -> Self {
        self.disable_cache = disable;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache entry for a catalog and request.
    pub fn entry_path(&self, catalog: &SiteCatalog, request: &MatrixRequest) -> PathBuf {
        self.cache_dir
            .join(cache_key(self.inner.cache_id(), catalog, request))
    }

    fn read_entry(&self, path: &Path) -> Result<Option<CostMatrix>, ProviderError> {
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write_entry(&self, path: &Path, matrix: &CostMatrix) -> Result<(), ProviderError> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, matrix)?;
        writer.flush()?;
        Ok(())
    }
}

impl<P: CostMatrixProvider> CostMatrixProvider for CachedProvider<P> {
    fn fetch(
        &self,
        catalog: &SiteCatalog,
        request: &MatrixRequest,
    ) -> Result<CostMatrix, ProviderError> {
        let path = self.entry_path(catalog, request);

        if !self.disable_cache {
            match self.read_entry(&path) {
                Ok(Some(matrix)) if matrix.num_sites() == catalog.len() => {
                    info!(path = %path.display(), "cost matrix read from cache");
                    return Ok(matrix);
                }
                Ok(Some(_)) => warn!(path = %path.display(), "cached matrix has wrong size"),
                Ok(None) => debug!(path = %path.display(), "cache miss"),
                Err(err) => warn!(path = %path.display(), %err, "unreadable cache entry"),
            }
        }

        let matrix = self.inner.fetch(catalog, request)?;
        if let Err(err) = self.write_entry(&path, &matrix) {
            warn!(path = %path.display(), %err, "failed to write cache entry");
        }
        Ok(matrix)
    }

    fn cache_id(&self) -> u64 {
        self.inner.cache_id()
    }
}
