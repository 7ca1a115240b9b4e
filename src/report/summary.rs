//! Per-day schedule summary.

use serde::Serialize;

use crate::distance::TravelCost;
use crate::error::ScheduleError;
use crate::models::{Schedule, SiteCatalog};

/// One non-empty day of a finished schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    /// 1-based day number after dropping empty days.
    pub day: usize,

    /// Site identifiers in visiting order.
    pub site_ids: Vec<String>,

    /// Travel cost of each leg: home to the first site, between consecutive
    /// sites, and back home from the last. One longer than `site_ids`.
    pub legs: Vec<f64>,

    /// Node cost charged at each stop; zeros when node costs are excluded.
    pub service: Vec<f64>,

    /// Total cost of the day.
    pub cost: f64,
}

/// One row per site: where it landed in the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteAssignment {
    pub site_id: String,
    /// 1-based day number.
    pub day: usize,
    /// 1-based position within the day.
    pub stop: usize,
}

/// Human-oriented view of a schedule.
///
/// Empty days are dropped and the remaining days renumbered from 1.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::models::{HomeBase, Schedule, Site, SiteCatalog};
/// use site_schedule::report::ScheduleReport;
///
/// let catalog = SiteCatalog::new(
///     HomeBase::new("office"),
///     vec![Site::new("north"), Site::new("south")],
/// ).unwrap();
/// let matrix = CostMatrix::from_dense(&[
///     vec![0.0, 4.0, 6.0],
///     vec![4.0, 0.0, 9.0],
///     vec![6.0, 9.0, 0.0],
/// ]).unwrap();
/// let schedule = Schedule::from_days(&[vec![], vec![1], vec![0]], 1, 2).unwrap();
///
/// let report = ScheduleReport::new(&schedule, &catalog, &matrix, true).unwrap();
/// assert_eq!(report.days.len(), 2);
/// assert_eq!(report.days[0].site_ids, vec!["south"]);
/// assert_eq!(report.total_cost, 20.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub home: String,
    pub days: Vec<DayReport>,
    pub total_cost: f64,
}

impl ScheduleReport {
    /// Builds a report, checking that `schedule` covers `catalog` and that
    /// `matrix` is sized for it.
    pub fn new<M: TravelCost>(
        schedule: &Schedule,
        catalog: &SiteCatalog,
        matrix: &M,
        include_node_cost: bool,
    ) -> Result<Self, ScheduleError> {
        if matrix.num_sites() != catalog.len() {
            return Err(ScheduleError::DimensionMismatch {
                expected: catalog.len(),
                actual: matrix.num_sites(),
            });
        }
        schedule.check(catalog.len())?;

        let days: Vec<DayReport> = schedule
            .active_days()
            .into_iter()
            .enumerate()
            .map(|(i, route)| {
                let mut legs = Vec::with_capacity(route.len() + 1);
                let mut prev: Option<usize> = None;
                for &site in &route {
                    legs.push(match prev {
                        None => matrix.home_to(site),
                        Some(p) => matrix.travel(p, site),
                    });
                    prev = Some(site);
                }
                if let Some(last) = prev {
                    legs.push(matrix.home_to(last));
                }
                let service: Vec<f64> = route
                    .iter()
                    .map(|&s| if include_node_cost { catalog.node_cost(s) } else { 0.0 })
                    .collect();
                let cost = legs.iter().sum::<f64>() + service.iter().sum::<f64>();

                DayReport {
                    day: i + 1,
                    site_ids: route
                        .iter()
                        .map(|&s| catalog.site(s).id().to_string())
                        .collect(),
                    legs,
                    service,
                    cost,
                }
            })
            .collect();
        let total_cost = days.iter().map(|d| d.cost).sum();

        Ok(Self {
            home: catalog.home().label.clone(),
            days,
            total_cost,
        })
    }

    pub fn num_days(&self) -> usize {
        self.days.len()
    }

    /// Flat `(site, day, stop)` table in day order.
    pub fn assignments(&self) -> Vec<SiteAssignment> {
        self.days
            .iter()
            .flat_map(|d| {
                d.site_ids
                    .iter()
                    .enumerate()
                    .map(move |(i, id)| SiteAssignment {
                        site_id: id.clone(),
                        day: d.day,
                        stop: i + 1,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{HomeBase, Site};

    fn setup() -> (SiteCatalog, CostMatrix) {
        let catalog = SiteCatalog::new(
            HomeBase::new("home"),
            vec![
                Site::new("A").with_node_cost(2.0),
                Site::new("B"),
                Site::new("C").with_node_cost(1.0),
            ],
        )
        .expect("valid");
        let matrix = CostMatrix::from_dense(&[
            vec![0.0, 3.0, 4.0, 5.0],
            vec![3.0, 0.0, 1.0, 7.0],
            vec![4.0, 1.0, 0.0, 6.0],
            vec![5.0, 7.0, 6.0, 0.0],
        ])
        .expect("valid");
        (catalog, matrix)
    }

    #[test]
    fn test_days_renumbered_and_costed() {
        let (catalog, matrix) = setup();
        let schedule =
            Schedule::from_days(&[vec![2], vec![], vec![0, 1]], 2, 3).expect("valid");
        let report = ScheduleReport::new(&schedule, &catalog, &matrix, true).expect("valid");

        assert_eq!(report.home, "home");
        assert_eq!(report.num_days(), 2);
        assert_eq!(report.days[0].day, 1);
        assert_eq!(report.days[0].site_ids, vec!["C"]);
        assert_eq!(report.days[0].legs, vec![5.0, 5.0]);
        assert_eq!(report.days[0].cost, 11.0);
        assert_eq!(report.days[1].day, 2);
        assert_eq!(report.days[1].site_ids, vec!["A", "B"]);
        assert_eq!(report.days[1].legs, vec![3.0, 1.0, 4.0]);
        assert_eq!(report.days[1].service, vec![2.0, 0.0]);
        assert_eq!(report.days[1].cost, 10.0);
        assert_eq!(report.total_cost, 21.0);
    }

    #[test]
    fn test_node_cost_excluded() {
        let (catalog, matrix) = setup();
        let schedule = Schedule::from_days(&[vec![0, 1, 2]], 3, 3).expect("valid");
        let report = ScheduleReport::new(&schedule, &catalog, &matrix, false).expect("valid");
        assert_eq!(report.days[0].service, vec![0.0, 0.0, 0.0]);
        assert_eq!(report.total_cost, 3.0 + 1.0 + 6.0 + 5.0);
    }

    #[test]
    fn test_assignments() {
        let (catalog, matrix) = setup();
        let schedule = Schedule::from_days(&[vec![1, 0], vec![2]], 2, 3).expect("valid");
        let report = ScheduleReport::new(&schedule, &catalog, &matrix, true).expect("valid");
        let rows: Vec<(String, usize, usize)> = report
            .assignments()
            .into_iter()
            .map(|a| (a.site_id, a.day, a.stop))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("B".to_string(), 1, 1),
                ("A".to_string(), 1, 2),
                ("C".to_string(), 2, 1),
            ]
        );
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let (catalog, matrix) = setup();
        let partial = Schedule::from_days(&[vec![0, 1]], 2, 2).expect("valid");
        assert!(matches!(
            ScheduleReport::new(&partial, &catalog, &matrix, true),
            Err(ScheduleError::InvalidSchedule(_))
        ));

        let small = CostMatrix::from_dense(&[vec![0.0, 1.0], vec![1.0, 0.0]]).expect("valid");
        let full = Schedule::from_days(&[vec![0, 1, 2]], 3, 3).expect("valid");
        assert!(matches!(
            ScheduleReport::new(&full, &catalog, &small, true),
            Err(ScheduleError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_serializes_to_json() {
        let (catalog, matrix) = setup();
        let schedule = Schedule::from_days(&[vec![0, 1, 2]], 3, 3).expect("valid");
        let report = ScheduleReport::new(&schedule, &catalog, &matrix, true).expect("valid");
        let json = serde_json::to_value(&report).expect("serializable");
        assert_eq!(json["days"][0]["site_ids"][2], "C");
        assert_eq!(json["home"], "home");
    }
}
