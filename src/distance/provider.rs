//! Cost matrix providers.
//!
//! The optimizer never talks to a mapping service itself. Callers obtain a
//! [`CostMatrix`] from something implementing [`CostMatrixProvider`]: a
//! precomputed table, the built-in great-circle estimate, a live API client
//! of their own, or any of these behind a [`CachedProvider`](super::CachedProvider).

use std::hash::{Hash, Hasher};

use fxhash::FxHasher64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::matrix::{CostMatrix, CostMatrixBuilder};
use crate::error::ScheduleError;
use crate::models::{Coordinates, SiteCatalog};

/// How the field team travels between sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
}

/// Which quantity the matrix measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    /// Kilometres.
    Distance,
    /// Minutes.
    #[default]
    Time,
}

/// Parameters of a matrix request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MatrixRequest {
    pub travel_mode: TravelMode,
    pub cost_type: CostType,
}

impl MatrixRequest {
    pub fn new(travel_mode: TravelMode, cost_type: CostType) -> Self {
        Self {
            travel_mode,
            cost_type,
        }
    }
}

/// Failures of a cost matrix provider.
///
/// Kept apart from [`ScheduleError`] so callers can tell a provider outage
/// from a bad configuration.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("location `{0}` has no coordinates")]
    MissingCoordinates(String),

    #[error("provider returned a matrix for {actual} sites, catalog has {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("provider returned an invalid matrix: {0}")]
    InvalidMatrix(#[from] ScheduleError),

    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("provider request failed: {0}")]
    Request(String),
}

/// Source of travel costs for a catalog.
pub trait CostMatrixProvider {
    /// Produces a complete matrix for every site in `catalog` plus its home base.
    fn fetch(
        &self,
        catalog: &SiteCatalog,
        request: &MatrixRequest,
    ) -> Result<CostMatrix, ProviderError>;

    /// Identity of this provider and its settings, mixed into cache keys.
    ///
    /// Two providers that can return different matrices for the same
    /// request must return different ids. The default hashes the type name,
    /// so providers with settings should override it.
    fn cache_id(&self) -> u64 {
        let mut hasher = FxHasher64::default();
        std::any::type_name::<Self>().hash(&mut hasher);
        hasher.finish()
    }
}

impl<P: CostMatrixProvider + ?Sized> CostMatrixProvider for &P {
    fn fetch(
        &self,
        catalog: &SiteCatalog,
        request: &MatrixRequest,
    ) -> Result<CostMatrix, ProviderError> {
        (**self).fetch(catalog, request)
    }

    fn cache_id(&self) -> u64 {
        (**self).cache_id()
    }
}

/// Serves a matrix that was loaded or computed ahead of time.
///
/// The request is ignored; only the size is checked against the catalog.
#[derive(Debug, Clone)]
pub struct PrecomputedProvider {
    matrix: CostMatrix,
}

impl PrecomputedProvider {
    pub fn new(matrix: CostMatrix) -> Self {
        Self { matrix }
    }
}

impl CostMatrixProvider for PrecomputedProvider {
    fn fetch(
        &self,
        catalog: &SiteCatalog,
        _request: &MatrixRequest,
    ) -> Result<CostMatrix, ProviderError> {
        if self.matrix.num_sites() != catalog.len() {
            return Err(ProviderError::SizeMismatch {
                expected: catalog.len(),
                actual: self.matrix.num_sites(),
            });
        }
        Ok(self.matrix.clone())
    }

    fn cache_id(&self) -> u64 {
        let mut hasher = FxHasher64::default();
        "precomputed".hash(&mut hasher);
        self.matrix.hash_costs(&mut hasher);
        hasher.finish()
    }
}

/// Straight-line estimate from site coordinates.
///
/// Distances are great-circle kilometres. Times are minutes at the
/// configured speed for the requested travel mode.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::{CostMatrixProvider, CrowFliesProvider, MatrixRequest, TravelCost};
/// use site_schedule::models::{HomeBase, Site, SiteCatalog};
///
/// let catalog = SiteCatalog::new(
///     HomeBase::new("camp").with_coordinates(0.0, 0.0),
///     vec![Site::new("A").with_coordinates(0.0, 1.0)],
/// ).unwrap();
/// let m = CrowFliesProvider::default()
///     .fetch(&catalog, &MatrixRequest::default())
///     .unwrap();
/// // ~111 km at 50 km/h
/// assert!((m.home_to(0) - 133.4).abs() < 0.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CrowFliesProvider {
    driving_kmh: f64,
    walking_kmh: f64,
}

impl Default for CrowFliesProvider {
    fn default() -> Self {
        Self {
            driving_kmh: 50.0,
            walking_kmh: 5.0,
        }
    }
}

impl CrowFliesProvider {
    pub fn with_driving_speed(mut self, kmh: f64) -> Self {
        self.driving_kmh = kmh;
        self
    }

    pub fn with_walking_speed(mut self, kmh: f64) -> Self {
        self.walking_kmh = kmh;
        self
    }

    fn leg_cost(&self, a: &Coordinates, b: &Coordinates, request: &MatrixRequest) -> f64 {
        let km = a.haversine_km(b);
        match request.cost_type {
            CostType::Distance => km,
            CostType::Time => {
                let speed = match request.travel_mode {
                    TravelMode::Driving => self.driving_kmh,
                    TravelMode::Walking => self.walking_kmh,
                };
                km / speed * 60.0
            }
        }
    }
}

impl CostMatrixProvider for CrowFliesProvider {
    fn fetch(
        &self,
        catalog: &SiteCatalog,
        request: &MatrixRequest,
    ) -> Result<CostMatrix, ProviderError> {
        let home = catalog
            .home()
            .coordinates
            .ok_or_else(|| ProviderError::MissingCoordinates(catalog.home().label.clone()))?;
        let points = catalog
            .sites()
            .iter()
            .map(|s| {
                s.coordinates()
                    .copied()
                    .ok_or_else(|| ProviderError::MissingCoordinates(s.id().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(sites = points.len(), ?request, "computing crow-flies matrix");

        let mut builder = CostMatrixBuilder::new(points.len());
        for (i, p) in points.iter().enumerate() {
            builder.set_home(i, self.leg_cost(&home, p, request));
            for (j, q) in points.iter().enumerate().skip(i + 1) {
                builder.set_travel(i, j, self.leg_cost(p, q, request));
            }
        }
        Ok(builder.build()?)
    }

    fn cache_id(&self) -> u64 {
        let mut hasher = FxHasher64::default();
        "crow_flies".hash(&mut hasher);
        hasher.write_u64(self.driving_kmh.to_bits());
        hasher.write_u64(self.walking_kmh.to_bits());
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::TravelCost;
    use crate::models::{HomeBase, Site};

    fn catalog() -> SiteCatalog {
        SiteCatalog::new(
            HomeBase::new("camp").with_coordinates(41.0, -81.0),
            vec![
                Site::new("A").with_coordinates(41.1, -81.0),
                Site::new("B").with_coordinates(41.0, -81.2),
            ],
        )
        .expect("valid")
    }

    #[test]
    fn test_precomputed_size_check() {
        let m = CostMatrix::from_dense(&[vec![0.0, 1.0], vec![1.0, 0.0]]).expect("valid");
        let provider = PrecomputedProvider::new(m);
        let err = provider
            .fetch(&catalog(), &MatrixRequest::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::SizeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_crow_flies_distance_vs_time() {
        let provider = CrowFliesProvider::default();
        let cat = catalog();
        let dist = provider
            .fetch(&cat, &MatrixRequest::new(TravelMode::Driving, CostType::Distance))
            .expect("coords present");
        let drive = provider
            .fetch(&cat, &MatrixRequest::new(TravelMode::Driving, CostType::Time))
            .expect("coords present");
        let walk = provider
            .fetch(&cat, &MatrixRequest::new(TravelMode::Walking, CostType::Time))
            .expect("coords present");

        // 0.1 degree of latitude is ~11.1 km
        assert!((dist.home_to(0) - 11.12).abs() < 0.05);
        assert!((drive.home_to(0) - dist.home_to(0) / 50.0 * 60.0).abs() < 1e-9);
        assert!((walk.home_to(0) - drive.home_to(0) * 10.0).abs() < 1e-6);
        assert!((dist.travel(0, 1) - dist.travel(1, 0)).abs() < 1e-12);
    }

    #[test]
    fn test_crow_flies_missing_coordinates() {
        let cat = SiteCatalog::new(
            HomeBase::new("camp").with_coordinates(41.0, -81.0),
            vec![Site::new("A")],
        )
        .expect("valid");
        let err = CrowFliesProvider::default()
            .fetch(&cat, &MatrixRequest::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCoordinates(id) if id == "A"));
    }

    #[test]
    fn test_cache_id_reflects_settings() {
        let base = CrowFliesProvider::default();
        assert_eq!(base.cache_id(), CrowFliesProvider::default().cache_id());
        assert_ne!(base.cache_id(), base.with_driving_speed(100.0).cache_id());
        assert_ne!(base.cache_id(), base.with_walking_speed(4.0).cache_id());

        let a = CostMatrix::from_dense(&[vec![0.0, 1.0], vec![1.0, 0.0]]).expect("valid");
        let b = CostMatrix::from_dense(&[vec![0.0, 2.0], vec![2.0, 0.0]]).expect("valid");
        assert_ne!(
            PrecomputedProvider::new(a).cache_id(),
            PrecomputedProvider::new(b).cache_id()
        );
        assert_eq!(base.cache_id(), (&base).cache_id());
    }

    #[test]
    fn test_request_serde_names() {
        let json = serde_json::to_string(&MatrixRequest::new(TravelMode::Walking, CostType::Distance))
            .expect("serialize");
        assert_eq!(json, r#"{"travel_mode":"walking","cost_type":"distance"}"#);
    }
}
