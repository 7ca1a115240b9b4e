//! [`SaProblem`] adapter for the generic annealing runner.
//!
//! Exposes the schedule problem to [`u_metaheur::sa::SaRunner`]. The generic
//! runner clones and fully re-prices a schedule per move and keeps the best
//! schedule seen, so it is slower than [`AnnealingRunner`](super::AnnealingRunner)
//! but useful for comparing cooling schedules.

use rand::Rng;
use u_metaheur::sa::{CoolingSchedule, SaConfig, SaProblem};

use super::config::AnnealingParameters;
use crate::constructive::{nearest_neighbor, scatter, InitialAssignment};
use crate::distance::TravelCost;
use crate::error::ScheduleError;
use crate::evaluation::CostEvaluator;
use crate::models::{Schedule, SiteCatalog};

/// Slot-swap scheduling problem for [`u_metaheur::sa::SaRunner`].
///
/// # Examples
///
/// ```
/// use site_schedule::annealing::{AnnealingParameters, ScheduleSaProblem};
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::models::{HomeBase, Site, SiteCatalog};
/// use u_metaheur::sa::SaRunner;
///
/// let catalog = SiteCatalog::new(
///     HomeBase::new("depot"),
///     vec![Site::new("A"), Site::new("B")],
/// ).unwrap();
/// let matrix = CostMatrix::from_dense(&[
///     vec![0.0, 3.0, 3.0],
///     vec![3.0, 0.0, 1.0],
///     vec![3.0, 1.0, 0.0],
/// ]).unwrap();
/// let params = AnnealingParameters::default()
///     .with_max_stops_per_day(2)
///     .with_spare_days(1)
///     .with_annealing_iters(200)
///     .with_seed(5);
///
/// let problem = ScheduleSaProblem::new(&catalog, &matrix, &params).unwrap();
/// let result = SaRunner::run(&problem, &problem.sa_config());
/// assert!((result.best_cost - 7.0).abs() < 1e-9);
/// ```
pub struct ScheduleSaProblem<'a, M: TravelCost> {
    matrix: &'a M,
    node_costs: Option<Vec<f64>>,
    num_sites: usize,
    num_days: usize,
    max_stops_per_day: usize,
    params: AnnealingParameters,
}

impl<'a, M: TravelCost> ScheduleSaProblem<'a, M> {
    /// Validates `params` and sizes the slot grid for `catalog`.
    pub fn new(
        catalog: &SiteCatalog,
        matrix: &'a M,
        params: &AnnealingParameters,
    ) -> Result<Self, ScheduleError> {
        params.validate()?;
        let num_sites = catalog.len();
        if matrix.num_sites() != num_sites {
            return Err(ScheduleError::DimensionMismatch {
                expected: num_sites,
                actual: matrix.num_sites(),
            });
        }
        let num_days = params.plan_days(num_sites)?;

        Ok(Self {
            matrix,
            node_costs: params.include_node_cost.then(|| catalog.node_costs()),
            num_sites,
            num_days,
            max_stops_per_day: params.max_stops_per_day,
            params: params.clone(),
        })
    }

    pub fn num_days(&self) -> usize {
        self.num_days
    }

    fn evaluator(&self) -> CostEvaluator<'_, M> {
        let evaluator = CostEvaluator::new(self.matrix);
        match &self.node_costs {
            Some(costs) => evaluator.with_node_costs(costs),
            None => evaluator,
        }
    }

    /// Equivalent [`SaConfig`]: one temperature step per epoch, one move per
    /// slot per step, geometric cooling by the effective decay.
    ///
    /// When the temperature is scaled by the initial cost, the nearest
    /// neighbor schedule serves as the reference since the generic runner
    /// draws its own starting point.
    ///
    /// Without `min_temperature` the floor is the temperature reached after
    /// `annealing_iters` epochs. `SaConfig` requires the floor to sit below
    /// the starting temperature, so any floor at or above `t0 / 2` is
    /// lowered to `t0 / 2`.
    pub fn sa_config(&self) -> SaConfig {
        let mut t0 = self.params.initial_temperature;
        if self.params.scale_temperature_by_initial_cost {
            let reference = nearest_neighbor(self.matrix, self.num_days, self.max_stops_per_day)
                .map(|s| self.evaluator().total_cost(&s))
                .unwrap_or(0.0);
            if reference > 0.0 {
                t0 *= reference;
            }
        }
        let iters = self.params.annealing_iters;
        let decay = self.params.effective_decay();
        let floor = self.params.min_temperature.unwrap_or_else(|| {
            (t0 * decay.powf(iters as f64)).max(f64::MIN_POSITIVE)
        });
        let slots = (self.num_days * self.max_stops_per_day).max(1);

        let mut config = SaConfig::default()
            .with_initial_temperature(t0)
            .with_min_temperature(floor.min(t0 * 0.5))
            .with_cooling(CoolingSchedule::Geometric { alpha: decay })
            .with_iterations_per_temperature(slots)
            .with_max_iterations(iters * slots);
        if let Some(seed) = self.params.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

impl<M: TravelCost + Sync> SaProblem for ScheduleSaProblem<'_, M> {
    type Solution = Schedule;

    /// Follows `initial_assignment`. Nearest neighbor ignores `rng`, so
    /// every run of the generic runner then starts from the same schedule.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Schedule {
        match self.params.initial_assignment {
            InitialAssignment::NearestNeighbor => {
                match nearest_neighbor(self.matrix, self.num_days, self.max_stops_per_day) {
                    Ok(schedule) => schedule,
                    Err(_) => scatter(self.num_sites, self.num_days, self.max_stops_per_day, rng),
                }
            }
            InitialAssignment::Random => {
                scatter(self.num_sites, self.num_days, self.max_stops_per_day, rng)
            }
        }
    }

    fn cost(&self, schedule: &Schedule) -> f64 {
        self.evaluator().total_cost(schedule)
    }

    fn neighbor<R: Rng>(&self, schedule: &Schedule, rng: &mut R) -> Schedule {
        let mut next = schedule.clone();
        let n = next.num_slots();
        if n > 1 {
            let a = rng.random_range(0..n);
            let b = rng.random_range(0..n);
            next.swap(a, b);
        }
        next
    }
}
