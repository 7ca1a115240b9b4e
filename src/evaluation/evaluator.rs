//! Day and schedule cost evaluation.

use crate::distance::TravelCost;
use crate::models::{Schedule, SiteCatalog};

/// Computes route, day and schedule costs against a travel-cost matrix.
///
/// A day `[s1, ..., sk]` costs `home_to(s1) + Σ travel(si, si+1) + home_to(sk)`,
/// plus the node cost of every visited site when node costs are included.
/// Empty days cost nothing.
///
/// Because a slot swap touches at most two days, [`swap_delta`](Self::swap_delta)
/// only re-walks those days, O(k) for `k = max_stops_per_day`.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::evaluation::CostEvaluator;
/// use site_schedule::models::Schedule;
///
/// // home, A, B
/// let m = CostMatrix::from_dense(&[
///     vec![0.0, 4.0, 6.0],
///     vec![4.0, 0.0, 3.0],
///     vec![6.0, 3.0, 0.0],
/// ]).unwrap();
/// let schedule = Schedule::from_days(&[vec![0, 1]], 2, 2).unwrap();
///
/// let eval = CostEvaluator::new(&m);
/// assert_eq!(eval.total_cost(&schedule), 13.0); // 4 + 3 + 6
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator<'a, M: TravelCost> {
    matrix: &'a M,
    node_costs: Option<&'a [f64]>,
}

impl<'a, M: TravelCost> CostEvaluator<'a, M> {
    /// Evaluator for travel cost only.
    pub fn new(matrix: &'a M) -> Self {
        Self {
            matrix,
            node_costs: None,
        }
    }

    /// Adds per-site node costs (indexed like the catalog) to every visit.
    pub fn with_node_costs(mut self, node_costs: &'a [f64]) -> Self {
        self.node_costs = Some(node_costs);
        self
    }

    pub fn matrix(&self) -> &'a M {
        self.matrix
    }

    #[inline]
    fn node_cost(&self, site: usize) -> f64 {
        self.node_costs.map_or(0.0, |c| c[site])
    }

    /// Cost of visiting `route` in order, starting and ending at home.
    pub fn route_cost<I: IntoIterator<Item = usize>>(&self, route: I) -> f64 {
        let mut iter = route.into_iter();
        let Some(first) = iter.next() else {
            return 0.0;
        };

        let mut cost = self.matrix.home_to(first) + self.node_cost(first);
        let mut prev = first;
        for site in iter {
            cost += self.matrix.travel(prev, site) + self.node_cost(site);
            prev = site;
        }
        cost + self.matrix.home_to(prev)
    }

    /// Cost of one day of the schedule.
    pub fn day_cost(&self, schedule: &Schedule, day: usize) -> f64 {
        self.route_cost(schedule.day(day))
    }

    /// Cost of every day, empty days included.
    pub fn day_costs(&self, schedule: &Schedule) -> Vec<f64> {
        (0..schedule.num_days())
            .map(|d| self.day_cost(schedule, d))
            .collect()
    }

    /// Total cost of the schedule.
    pub fn total_cost(&self, schedule: &Schedule) -> f64 {
        (0..schedule.num_days())
            .map(|d| self.day_cost(schedule, d))
            .sum()
    }

    /// Cost of `day` as it would be after exchanging slots `a` and `b`.
    pub fn day_cost_swapped(&self, schedule: &Schedule, day: usize, a: usize, b: usize) -> f64 {
        let k = schedule.max_stops_per_day();
        let start = day * k;
        self.route_cost((start..start + k).filter_map(|slot| {
            let source = if slot == a {
                b
            } else if slot == b {
                a
            } else {
                slot
            };
            schedule.slot(source)
        }))
    }

    /// Change in total cost if slots `a` and `b` were exchanged.
    ///
    /// The schedule is not modified.
    pub fn swap_delta(&self, schedule: &Schedule, a: usize, b: usize) -> f64 {
        let da = schedule.day_of_slot(a);
        let db = schedule.day_of_slot(b);

        if da == db {
            self.day_cost_swapped(schedule, da, a, b) - self.day_cost(schedule, da)
        } else {
            let before = self.day_cost(schedule, da) + self.day_cost(schedule, db);
            let after = self.day_cost_swapped(schedule, da, a, b)
                + self.day_cost_swapped(schedule, db, a, b);
            after - before
        }
    }
}

/// Total cost of a schedule, with node costs taken from the catalog when
/// `include_node_cost` is set.
pub fn total_cost<M: TravelCost>(
    schedule: &Schedule,
    matrix: &M,
    catalog: &SiteCatalog,
    include_node_cost: bool,
) -> f64 {
    let node_costs = catalog.node_costs();
    let evaluator = CostEvaluator::new(matrix);
    if include_node_cost {
        evaluator.with_node_costs(&node_costs).total_cost(schedule)
    } else {
        evaluator.total_cost(schedule)
    }
}
