//! Annealing run loop.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, trace};
use u_numflow::random::create_rng;

use super::annealer::{Annealer, EpochStats};
use super::config::AnnealingParameters;
use crate::constructive::{nearest_neighbor, random_assignment, InitialAssignment};
use crate::distance::TravelCost;
use crate::error::ScheduleError;
use crate::evaluation::CostEvaluator;
use crate::models::{Schedule, SiteCatalog};

/// Result of an annealing run.
#[derive(Debug, Clone)]
pub struct AnnealingResult {
    /// The last committed schedule.
    pub schedule: Schedule,

    /// Cost of `schedule`.
    pub cost: f64,

    /// Cost of the starting schedule.
    pub initial_cost: f64,

    /// Total cost after every epoch.
    pub cost_history: Vec<f64>,

    /// Number of epochs run.
    pub epochs: usize,

    pub initial_temperature: f64,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    pub attempted_moves: usize,
    pub accepted_moves: usize,
    pub improving_moves: usize,
    pub skipped_moves: usize,

    /// Whether the run was stopped by the cancel flag or the observer.
    pub cancelled: bool,
}

impl AnnealingResult {
    fn empty(temperature: f64) -> Self {
        Self {
            schedule: Schedule::empty(0, 1),
            cost: 0.0,
            initial_cost: 0.0,
            cost_history: Vec::new(),
            epochs: 0,
            initial_temperature: temperature,
            final_temperature: temperature,
            attempted_moves: 0,
            accepted_moves: 0,
            improving_moves: 0,
            skipped_moves: 0,
            cancelled: false,
        }
    }
}

/// Executes the annealing schedule optimizer.
///
/// # Examples
///
/// ```
/// use site_schedule::annealing::{AnnealingParameters, AnnealingRunner};
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::models::{HomeBase, Site, SiteCatalog};
///
/// let catalog = SiteCatalog::new(
///     HomeBase::new("camp"),
///     vec![Site::new("A"), Site::new("B"), Site::new("C")],
/// ).unwrap();
/// let matrix = CostMatrix::from_dense(&[
///     vec![0.0, 2.0, 2.0, 2.0],
///     vec![2.0, 0.0, 1.0, 1.0],
///     vec![2.0, 1.0, 0.0, 1.0],
///     vec![2.0, 1.0, 1.0, 0.0],
/// ]).unwrap();
/// let params = AnnealingParameters::default()
///     .with_max_stops_per_day(3)
///     .with_annealing_iters(100)
///     .with_seed(42);
///
/// let result = AnnealingRunner::run(&catalog, &matrix, &params).unwrap();
/// assert_eq!(result.schedule.num_active_days(), 1);
/// assert!((result.cost - 6.0).abs() < 1e-9);
/// ```
pub struct AnnealingRunner;

impl AnnealingRunner {
    /// Runs with an RNG created from `params.seed` (or a random seed).
    pub fn run<M: TravelCost>(
        catalog: &SiteCatalog,
        matrix: &M,
        params: &AnnealingParameters,
    ) -> Result<AnnealingResult, ScheduleError> {
        let mut rng = match params.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        Self::run_with_rng(catalog, matrix, params, &mut rng)
    }

    /// Runs with a caller-supplied RNG. `params.seed` is ignored.
    pub fn run_with_rng<M: TravelCost, R: Rng>(
        catalog: &SiteCatalog,
        matrix: &M,
        params: &AnnealingParameters,
        rng: &mut R,
    ) -> Result<AnnealingResult, ScheduleError> {
        Self::run_with_observer(catalog, matrix, params, rng, None, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Runs with an optional cancellation flag and a per-epoch observer.
    ///
    /// Both are consulted only between epochs, so the returned schedule is
    /// never caught mid-swap. The observer can stop the run by returning
    /// `ControlFlow::Break(())`.
    pub fn run_with_observer<M, R, F>(
        catalog: &SiteCatalog,
        matrix: &M,
        params: &AnnealingParameters,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
        mut observer: F,
    ) -> Result<AnnealingResult, ScheduleError>
    where
        M: TravelCost,
        R: Rng,
        F: FnMut(&EpochStats) -> ControlFlow<()>,
    {
        params.validate()?;

        let num_sites = catalog.len();
        if matrix.num_sites() != num_sites {
            return Err(ScheduleError::DimensionMismatch {
                expected: num_sites,
                actual: matrix.num_sites(),
            });
        }

        let num_days = params.plan_days(num_sites)?;
        if num_sites == 0 {
            info!("no sites to schedule");
            return Ok(AnnealingResult::empty(params.initial_temperature));
        }

        let node_costs = catalog.node_costs();
        let mut evaluator = CostEvaluator::new(matrix);
        if params.include_node_cost {
            evaluator = evaluator.with_node_costs(&node_costs);
        }

        let initial = match params.initial_assignment {
            InitialAssignment::Random => {
                random_assignment(num_sites, num_days, params.max_stops_per_day, rng)?
            }
            InitialAssignment::NearestNeighbor => {
                nearest_neighbor(matrix, num_days, params.max_stops_per_day)?
            }
        };
        let initial_cost = evaluator.total_cost(&initial);

        let mut temperature = params.initial_temperature;
        if params.scale_temperature_by_initial_cost && initial_cost > 0.0 {
            temperature *= initial_cost;
        }

        info!(
            sites = num_sites,
            days = num_days,
            max_stops_per_day = params.max_stops_per_day,
            epochs = params.annealing_iters,
            initial_cost,
            temperature,
            "starting annealing"
        );

        let mut annealer = Annealer::new(evaluator, initial, temperature, params.effective_decay());
        let mut cost_history = Vec::with_capacity(params.annealing_iters);
        let mut totals = EpochStats::default();
        let mut cancelled = false;
        let report_interval = (params.annealing_iters / 10).max(1);

        for _ in 0..params.annealing_iters {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(floor) = params.min_temperature {
                if annealer.temperature() < floor {
                    debug!(temperature = annealer.temperature(), "temperature floor reached");
                    break;
                }
            }

            let stats = annealer.run_epoch(rng);
            cost_history.push(stats.cost);
            totals.attempted += stats.attempted;
            totals.accepted += stats.accepted;
            totals.improving += stats.improving;
            totals.skipped += stats.skipped;

            trace!(
                epoch = stats.epoch,
                temperature = stats.temperature,
                cost = stats.cost,
                accepted = stats.accepted,
                "epoch"
            );

            if stats.epoch % report_interval == report_interval - 1 {
                let window = &cost_history[cost_history.len() - report_interval..];
                let mean_cost = window.iter().sum::<f64>() / window.len() as f64;
                debug!(
                    step = stats.epoch + 1,
                    temperature = stats.temperature,
                    mean_cost,
                    "annealing progress"
                );
            }

            if observer(&stats).is_break() {
                cancelled = true;
                break;
            }
        }

        let cost = annealer.cost();
        let final_temperature = annealer.temperature();
        let epochs = annealer.epochs();
        let schedule = annealer.into_schedule();
        debug_assert!(schedule.check(num_sites).is_ok());

        info!(
            epochs,
            cost,
            days = schedule.num_active_days(),
            final_temperature,
            cancelled,
            "annealing finished"
        );

        Ok(AnnealingResult {
            schedule,
            cost,
            initial_cost,
            cost_history,
            epochs,
            initial_temperature: temperature,
            final_temperature,
            attempted_moves: totals.attempted,
            accepted_moves: totals.accepted,
            improving_moves: totals.improving,
            skipped_moves: totals.skipped,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::evaluation::total_cost;
    use crate::models::{HomeBase, Site};

    fn catalog(n: usize) -> SiteCatalog {
        let sites = (0..n).map(|i| Site::new(format!("S{i}"))).collect();
        SiteCatalog::new(HomeBase::new("home"), sites).expect("valid")
    }

    /// Sites scattered on a pseudo-random grid, Euclidean costs.
    fn scattered(n: usize) -> CostMatrix {
        let mut pts = vec![(0.0_f64, 0.0_f64)];
        for i in 0..n {
            let x = ((i * 37 + 11) % 23) as f64;
            let y = ((i * 53 + 7) % 19) as f64;
            pts.push((x, y));
        }
        let rows: Vec<Vec<f64>> = pts
            .iter()
            .map(|a| {
                pts.iter()
                    .map(|b| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt())
                    .collect()
            })
            .collect();
        CostMatrix::from_dense(&rows).expect("valid")
    }

    /// home, A, B, C, D: A-B and C-D cheap, cross pairs expensive.
    fn paired() -> CostMatrix {
        CostMatrix::from_dense(&[
            vec![0.0, 10.0, 10.0, 10.0, 10.0],
            vec![10.0, 0.0, 1.0, 50.0, 50.0],
            vec![10.0, 1.0, 0.0, 50.0, 50.0],
            vec![10.0, 50.0, 50.0, 0.0, 1.0],
            vec![10.0, 50.0, 50.0, 1.0, 0.0],
        ])
        .expect("valid")
    }

    fn sorted_days(schedule: &Schedule) -> Vec<Vec<usize>> {
        let mut days: Vec<Vec<usize>> = schedule
            .active_days()
            .into_iter()
            .map(|mut d| {
                d.sort_unstable();
                d
            })
            .collect();
        days.sort();
        days
    }

    #[test]
    fn test_paired_sites_grouped() {
        let cat = catalog(4);
        let m = paired();
        for seed in 0..10 {
            let params = AnnealingParameters::default()
                .with_max_stops_per_day(2)
                .with_annealing_iters(300)
                .with_cooling_halvings(20.0)
                .with_seed(seed);
            let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
            assert_eq!(
                sorted_days(&result.schedule),
                vec![vec![0, 1], vec![2, 3]],
                "seed {seed}"
            );
            assert!((result.cost - 42.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let cat = catalog(15);
        let m = scattered(15);
        let params = AnnealingParameters::default()
            .with_max_stops_per_day(4)
            .with_annealing_iters(200)
            .with_cooling_halvings(12.0)
            .with_spare_days(1)
            .with_seed(1234);
        let a = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        let b = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        assert_eq!(a.schedule, b.schedule);
        assert_eq!(a.cost.to_bits(), b.cost.to_bits());
        assert_eq!(a.cost_history, b.cost_history);
    }

    #[test]
    fn test_conservation_cap_and_cost_consistency() {
        let cat = catalog(13);
        let m = scattered(13);
        let params = AnnealingParameters::default()
            .with_max_stops_per_day(3)
            .with_annealing_iters(150)
            .with_cooling_halvings(10.0)
            .with_spare_days(2)
            .with_seed(9);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");

        assert!(result.schedule.check(13).is_ok());
        assert_eq!(result.schedule.num_days(), 7);
        for day in result.schedule.days() {
            assert!(day.len() <= 3);
        }
        let full = total_cost(&result.schedule, &m, &cat, true);
        assert!((result.cost - full).abs() < 1e-9);
        assert!(result.cost >= 0.0);
        assert_eq!(result.cost_history.len(), 150);
        assert_eq!(result.attempted_moves, 150 * 21);
    }

    #[test]
    fn test_convergence_trend() {
        let cat = catalog(20);
        let m = scattered(20);
        let params = AnnealingParameters::default()
            .with_max_stops_per_day(5)
            .with_annealing_iters(400)
            .with_cooling_halvings(16.0)
            .with_seed(77);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");

        let tenth = result.cost_history.len() / 10;
        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
        let first = mean(&result.cost_history[..tenth]);
        let last = mean(&result.cost_history[result.cost_history.len() - tenth..]);
        assert!(last <= first, "last {last} > first {first}");
    }

    #[test]
    fn test_one_stop_per_day() {
        let cat = catalog(6);
        let m = scattered(6);
        let params = AnnealingParameters::default()
            .with_max_stops_per_day(1)
            .with_annealing_iters(20)
            .with_seed(3);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        let expected: f64 = (0..6).map(|s| 2.0 * m.home_to(s)).sum();
        assert_eq!(result.schedule.num_active_days(), 6);
        assert!((result.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_day_tsp() {
        // home at 0, sites at 1..=5 on a line: best tour is out and back, 10.
        let cat = catalog(5);
        let pos: Vec<f64> = (0..=5).map(|i| i as f64).collect();
        let rows: Vec<Vec<f64>> = pos
            .iter()
            .map(|a| pos.iter().map(|b| (a - b).abs()).collect())
            .collect();
        let m = CostMatrix::from_dense(&rows).expect("valid");
        let params = AnnealingParameters::default()
            .with_max_stops_per_day(5)
            .with_annealing_iters(500)
            .with_cooling_halvings(20.0)
            .with_seed(21);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        assert_eq!(result.schedule.num_days(), 1);
        assert!((result.cost - 10.0).abs() < 1e-9, "cost {}", result.cost);
    }

    #[test]
    fn test_zero_sites() {
        let cat = catalog(0);
        let m = CostMatrix::from_dense(&[vec![0.0]]).expect("valid");
        let params = AnnealingParameters::default().with_seed(1);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("trivial");
        assert_eq!(result.epochs, 0);
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.schedule.num_sites(), 0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let cat = catalog(4);
        let m = paired();
        let bad = AnnealingParameters::default().with_decay_factor(1.5);
        assert!(matches!(
            AnnealingRunner::run(&cat, &m, &bad),
            Err(ScheduleError::InvalidParameter { name: "decay_factor", .. })
        ));

        let capped = AnnealingParameters::default()
            .with_max_stops_per_day(1)
            .with_max_days(3);
        assert!(matches!(
            AnnealingRunner::run(&cat, &m, &capped),
            Err(ScheduleError::InfeasibleCapacity { sites: 4, .. })
        ));

        assert!(matches!(
            AnnealingRunner::run(&catalog(3), &m, &AnnealingParameters::default()),
            Err(ScheduleError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cancel_flag_checked_before_first_epoch() {
        let cat = catalog(4);
        let m = paired();
        let params = AnnealingParameters::default().with_seed(1);
        let cancel = Arc::new(AtomicBool::new(true));
        let mut rng = create_rng(1);
        let result = AnnealingRunner::run_with_observer(
            &cat,
            &m,
            &params,
            &mut rng,
            Some(cancel),
            |_| ControlFlow::Continue(()),
        )
        .expect("feasible");
        assert!(result.cancelled);
        assert_eq!(result.epochs, 0);
        assert!(result.schedule.check(4).is_ok());
    }

    #[test]
    fn test_observer_can_stop() {
        let cat = catalog(4);
        let m = paired();
        let params = AnnealingParameters::default().with_seed(1);
        let mut rng = create_rng(1);
        let mut seen = 0;
        let result = AnnealingRunner::run_with_observer(&cat, &m, &params, &mut rng, None, |s| {
            seen += 1;
            if s.epoch == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .expect("feasible");
        assert!(result.cancelled);
        assert_eq!(result.epochs, 5);
        assert_eq!(seen, 5);
        assert_eq!(result.cost_history.len(), 5);
    }

    #[test]
    fn test_min_temperature_floor() {
        let cat = catalog(4);
        let m = paired();
        let params = AnnealingParameters::default()
            .with_absolute_temperature(1.0)
            .with_decay_factor(0.5)
            .with_min_temperature(0.1)
            .with_annealing_iters(1000)
            .with_seed(2);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        // 1, 0.5, 0.25, 0.125 run; 0.0625 is below the floor
        assert_eq!(result.epochs, 4);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_scaled_temperature() {
        let cat = catalog(4);
        let m = paired();
        let params = AnnealingParameters::default()
            .with_initial_temperature(0.5)
            .with_initial_assignment(InitialAssignment::NearestNeighbor)
            .with_annealing_iters(1);
        let result = AnnealingRunner::run(&cat, &m, &params).expect("feasible");
        assert!((result.initial_temperature - 0.5 * result.initial_cost).abs() < 1e-9);
    }

    #[test]
    fn test_node_cost_flag() {
        let sites = vec![
            Site::new("A").with_node_cost(5.0),
            Site::new("B").with_node_cost(5.0),
            Site::new("C").with_node_cost(5.0),
            Site::new("D").with_node_cost(5.0),
        ];
        let cat = SiteCatalog::new(HomeBase::new("home"), sites).expect("valid");
        let m = paired();
        let base = AnnealingParameters::default()
            .with_max_stops_per_day(2)
            .with_annealing_iters(300)
            .with_cooling_halvings(20.0)
            .with_seed(4);
        let with = AnnealingRunner::run(&cat, &m, &base).expect("feasible");
        let without =
            AnnealingRunner::run(&cat, &m, &base.with_include_node_cost(false)).expect("feasible");
        assert!((with.cost - 62.0).abs() < 1e-9);
        assert!((without.cost - 42.0).abs() < 1e-9);
    }
}
