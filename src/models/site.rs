//! Sites, home base, and the site catalog.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A geographic position in decimal degrees.
///
/// # Examples
///
/// ```
/// use site_schedule::models::Coordinates;
///
/// let a = Coordinates::new(0.0, 0.0);
/// let b = Coordinates::new(0.0, 1.0);
/// assert!((a.haversine_km(&b) - 111.19).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another position, in kilometres.
    pub fn haversine_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().clamp(0.0, 1.0).asin()
    }
}

/// The fixed start and end point of every day's route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HomeBase {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl HomeBase {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }
}

/// A location to be visited exactly once.
///
/// The node cost is a fixed cost paid whenever the site is visited (setup
/// time, for instance), independent of how the site is reached.
///
/// # Examples
///
/// ```
/// use site_schedule::models::Site;
///
/// let site = Site::new("well-7").with_node_cost(15.0);
/// assert_eq!(site.id(), "well-7");
/// assert_eq!(site.node_cost(), 15.0);
/// assert!(site.coordinates().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    #[serde(default)]
    node_cost: f64,
}

impl Site {
    /// Creates a site with no coordinates and zero node cost.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            coordinates: None,
            node_cost: 0.0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }

    pub fn with_node_cost(mut self, cost: f64) -> Self {
        self.node_cost = cost;
        self
    }

    /// Unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label, falling back to the identifier.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn coordinates(&self) -> Option<&Coordinates> {
        self.coordinates.as_ref()
    }

    /// Intrinsic cost of visiting this site.
    pub fn node_cost(&self) -> f64 {
        self.node_cost
    }
}

/// The immutable set of sites for one run, plus the home base.
///
/// Sites are addressed by their index in the catalog everywhere in the
/// optimizer; identifiers are only used at the edges.
///
/// # Examples
///
/// ```
/// use site_schedule::models::{HomeBase, Site, SiteCatalog};
///
/// let catalog = SiteCatalog::new(
///     HomeBase::new("camp"),
///     vec![Site::new("A"), Site::new("B")],
/// ).unwrap();
/// assert_eq!(catalog.len(), 2);
/// assert_eq!(catalog.index_of("B"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct SiteCatalog {
    home: HomeBase,
    sites: Vec<Site>,
    index: FxHashMap<String, usize>,
}

impl SiteCatalog {
    /// Builds a catalog, rejecting duplicate identifiers and invalid node costs.
    pub fn new(home: HomeBase, sites: Vec<Site>) -> Result<Self, ScheduleError> {
        let mut index = FxHashMap::default();
        for (i, site) in sites.iter().enumerate() {
            if !site.node_cost.is_finite() || site.node_cost < 0.0 {
                return Err(ScheduleError::InvalidCost {
                    what: format!("node cost of site `{}`", site.id),
                    value: site.node_cost,
                });
            }
            if index.insert(site.id.clone(), i).is_some() {
                return Err(ScheduleError::DuplicateSite(site.id.clone()));
            }
        }
        Ok(Self { home, sites, index })
    }

    pub fn home(&self) -> &HomeBase {
        &self.home
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: usize) -> &Site {
        &self.sites[index]
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Catalog index of the site with the given identifier.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node_cost(&self, index: usize) -> f64 {
        self.sites[index].node_cost
    }

    /// Node costs of all sites, in catalog order.
    pub fn node_costs(&self) -> Vec<f64> {
        self.sites.iter().map(|s| s.node_cost).collect()
    }
}
