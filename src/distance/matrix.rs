//! Dense symmetric travel-cost matrix.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::models::SiteCatalog;

/// Travel-cost lookup the optimizer runs against.
///
/// Sites are addressed by catalog index. Implementations must be total over
/// `0..num_sites()` and symmetric: `travel(a, b) == travel(b, a)`.
pub trait TravelCost {
    /// Number of sites covered (the home base excluded).
    fn num_sites(&self) -> usize;

    /// Cost of travelling between two sites.
    fn travel(&self, a: usize, b: usize) -> f64;

    /// Cost of travelling between the home base and a site.
    fn home_to(&self, site: usize) -> f64;
}

impl<T: TravelCost + ?Sized> TravelCost for &T {
    fn num_sites(&self) -> usize {
        (**self).num_sites()
    }

    fn travel(&self, a: usize, b: usize) -> f64 {
        (**self).travel(a, b)
    }

    fn home_to(&self, site: usize) -> f64 {
        (**self).home_to(site)
    }
}

/// Relative tolerance used when checking symmetry of supplied tables.
const SYMMETRY_TOL: f64 = 1e-9;

/// A dense `(n+1)×(n+1)` cost matrix stored in row-major order.
///
/// Location 0 is the home base and location `i + 1` is site `i`. Every
/// constructor validates that the table is complete, finite, non-negative
/// and symmetric, so lookups never need a fallback.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::{CostMatrix, TravelCost};
///
/// // home, A, B
/// let m = CostMatrix::from_dense(&[
///     vec![0.0, 4.0, 6.0],
///     vec![4.0, 0.0, 3.0],
///     vec![6.0, 3.0, 0.0],
/// ]).unwrap();
/// assert_eq!(m.num_sites(), 2);
/// assert_eq!(m.home_to(1), 6.0);
/// assert_eq!(m.travel(0, 1), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixData", into = "MatrixData")]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
}

/// Serialized form; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct MatrixData {
    num_sites: usize,
    costs: Vec<f64>,
}

impl TryFrom<MatrixData> for CostMatrix {
    type Error = ScheduleError;

    fn try_from(raw: MatrixData) -> Result<Self, Self::Error> {
        CostMatrix::from_flat(raw.num_sites, raw.costs)
    }
}

impl From<CostMatrix> for MatrixData {
    fn from(m: CostMatrix) -> Self {
        MatrixData {
            num_sites: m.size - 1,
            costs: m.data,
        }
    }
}

impl CostMatrix {
    /// Builds a matrix from a flat row-major `(n+1)×(n+1)` table with the
    /// home base at location 0.
    pub fn from_flat(num_sites: usize, mut data: Vec<f64>) -> Result<Self, ScheduleError> {
        let cells = num_sites
            .checked_add(1)
            .and_then(|size| size.checked_mul(size));
        let Some(cells) = cells.filter(|&c| c == data.len()) else {
            return Err(ScheduleError::DimensionMismatch {
                expected: cells.unwrap_or(usize::MAX),
                actual: data.len(),
            });
        };
        let size = num_sites + 1;

        for i in 0..size {
            data[i * size + i] = 0.0;
            for j in (i + 1)..size {
                let forward = data[i * size + j];
                let backward = data[j * size + i];
                for value in [forward, backward] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(ScheduleError::InvalidCost {
                            what: format!("leg ({i}, {j})"),
                            value,
                        });
                    }
                }
                let scale = forward.abs().max(backward.abs()).max(1.0);
                if (forward - backward).abs() > SYMMETRY_TOL * scale {
                    return Err(ScheduleError::AsymmetricCost {
                        from: i,
                        to: j,
                        forward,
                        backward,
                    });
                }
            }
        }

        Ok(Self { data, size })
    }

    /// Builds a matrix from square rows with the home base at row/column 0.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, ScheduleError> {
        let size = rows.len();
        if size == 0 {
            return Err(ScheduleError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != size) {
            return Err(ScheduleError::DimensionMismatch {
                expected: size,
                actual: bad.len(),
            });
        }
        Self::from_flat(size - 1, rows.iter().flatten().copied().collect())
    }

    /// Builds a matrix from identifier-keyed entries, as read from a
    /// user-supplied cost file.
    ///
    /// Every site pair and every home leg must be covered by at least one
    /// entry; either direction is accepted.
    pub fn from_entries(
        catalog: &SiteCatalog,
        entries: &[CostEntry],
    ) -> Result<Self, ScheduleError> {
        let mut builder = CostMatrixBuilder::new(catalog.len());
        let resolve = |e: &Endpoint| -> Result<Option<usize>, ScheduleError> {
            match e {
                Endpoint::Home => Ok(None),
                Endpoint::Site(id) => catalog
                    .index_of(id)
                    .map(Some)
                    .ok_or_else(|| ScheduleError::UnknownSite(id.clone())),
            }
        };

        for entry in entries {
            match (resolve(&entry.from)?, resolve(&entry.to)?) {
                (Some(a), Some(b)) => {
                    builder.set_travel(a, b, entry.cost);
                }
                (None, Some(s)) | (Some(s), None) => {
                    builder.set_home(s, entry.cost);
                }
                (None, None) => {}
            }
        }

        builder.build()
    }

    /// Number of sites (home base excluded).
    pub fn num_sites(&self) -> usize {
        self.size - 1
    }

    /// Raw lookup by location index (0 = home).
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Feeds the size and every cost into `state`.
    pub(crate) fn hash_costs<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.size);
        for cost in &self.data {
            state.write_u64(cost.to_bits());
        }
    }
}

impl TravelCost for CostMatrix {
    fn num_sites(&self) -> usize {
        self.size - 1
    }

    fn travel(&self, a: usize, b: usize) -> f64 {
        self.get(a + 1, b + 1)
    }

    fn home_to(&self, site: usize) -> f64 {
        self.get(0, site + 1)
    }
}

/// One end of a cost entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Home,
    Site(String),
}

/// A single travel cost keyed by site identifiers.
///
/// ```
/// use site_schedule::distance::{CostEntry, Endpoint};
///
/// let e: CostEntry = serde_json::from_str(
///     r#"{"from": "home", "to": {"site": "A"}, "cost": 12.5}"#,
/// ).unwrap();
/// assert_eq!(e.from, Endpoint::Home);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub from: Endpoint,
    pub to: Endpoint,
    pub cost: f64,
}

/// Incrementally assembles a [`CostMatrix`], refusing to build while any
/// leg is missing.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::{CostMatrixBuilder, TravelCost};
///
/// let mut b = CostMatrixBuilder::new(2);
/// b.set_home(0, 5.0).set_home(1, 7.0);
/// assert!(b.build().is_err()); // pair (0, 1) missing
///
/// b.set_travel(0, 1, 2.0);
/// let m = b.build().unwrap();
/// assert_eq!(m.travel(1, 0), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct CostMatrixBuilder {
    num_sites: usize,
    travel: Vec<Option<f64>>,
    home: Vec<Option<f64>>,
}

impl CostMatrixBuilder {
    pub fn new(num_sites: usize) -> Self {
        Self {
            num_sites,
            travel: vec![None; num_sites * num_sites],
            home: vec![None; num_sites],
        }
    }

    /// Sets the cost between two sites, in both directions.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn set_travel(&mut self, a: usize, b: usize, cost: f64) -> &mut Self {
        self.travel[a * self.num_sites + b] = Some(cost);
        self.travel[b * self.num_sites + a] = Some(cost);
        self
    }

    /// Sets the cost between the home base and a site.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_home(&mut self, site: usize, cost: f64) -> &mut Self {
        self.home[site] = Some(cost);
        self
    }

    /// Validates completeness and produces the matrix.
    pub fn build(&self) -> Result<CostMatrix, ScheduleError> {
        let n = self.num_sites;
        let size = n + 1;
        let mut data = vec![0.0; size * size];

        for s in 0..n {
            let cost = self.home[s].ok_or(ScheduleError::MissingHomeCost { site: s })?;
            data[s + 1] = cost;
            data[(s + 1) * size] = cost;
        }

        for a in 0..n {
            for b in (a + 1)..n {
                let cost =
                    self.travel[a * n + b].ok_or(ScheduleError::MissingTravelCost { a, b })?;
                data[(a + 1) * size + (b + 1)] = cost;
                data[(b + 1) * size + (a + 1)] = cost;
            }
        }

        CostMatrix::from_flat(n, data)
    }
}
