//! Annealing parameters.

use serde::{Deserialize, Serialize};

use crate::constructive::{min_days, InitialAssignment};
use crate::error::ScheduleError;

/// Temperature halvings over a full default run.
const DEFAULT_HALVINGS: f64 = 20.0;
const DEFAULT_EPOCHS: usize = 20_000;

/// Configuration of one scheduling run.
///
/// Immutable once the run starts. The temperature is multiplied by
/// [`effective_decay`](Self::effective_decay) after every epoch.
///
/// By default the starting temperature is `initial_temperature` times the
/// cost of the initial schedule, so typical early deltas are small relative
/// to the temperature and nearly every move is accepted.
///
/// # Examples
///
/// ```
/// use site_schedule::annealing::AnnealingParameters;
///
/// let params = AnnealingParameters::default()
///     .with_max_stops_per_day(4)
///     .with_annealing_iters(500)
///     .with_cooling_halvings(15.0)
///     .with_seed(7);
/// assert!(params.validate().is_ok());
/// assert!((params.effective_decay().powi(500) - 0.5_f64.powi(15)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingParameters {
    /// Maximum number of sites visited in one day.
    pub max_stops_per_day: usize,

    /// Number of epochs. Each epoch attempts one swap per slot.
    pub annealing_iters: usize,

    /// Starting temperature, or its multiplier when
    /// `scale_temperature_by_initial_cost` is set.
    pub initial_temperature: f64,

    /// Multiply `initial_temperature` by the initial schedule cost.
    pub scale_temperature_by_initial_cost: bool,

    /// Per-epoch cooling factor in (0, 1).
    pub decay_factor: f64,

    /// Temperature halvings over the whole run. When set, it takes the
    /// place of `decay_factor`, resolved against the final `annealing_iters`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_halvings: Option<f64>,

    /// Stop once the temperature drops below this floor.
    pub min_temperature: Option<f64>,

    /// Random seed. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Include site node costs in the objective.
    pub include_node_cost: bool,

    /// Days allocated beyond the minimum that can hold all sites.
    pub spare_days: usize,

    /// Upper bound on the number of days.
    pub max_days: Option<usize>,

    /// Starting schedule strategy.
    pub initial_assignment: InitialAssignment,
}

impl Default for AnnealingParameters {
    fn default() -> Self {
        Self {
            max_stops_per_day: 5,
            annealing_iters: DEFAULT_EPOCHS,
            initial_temperature: 1.0,
            scale_temperature_by_initial_cost: true,
            decay_factor: 0.5_f64.powf(DEFAULT_HALVINGS / DEFAULT_EPOCHS as f64),
            cooling_halvings: None,
            min_temperature: None,
            seed: None,
            include_node_cost: true,
            spare_days: 0,
            max_days: None,
            initial_assignment: InitialAssignment::Random,
        }
    }
}

impl AnnealingParameters {
    pub fn with_max_stops_per_day(mut self, n: usize) -> Self {
        self.max_stops_per_day = n;
        self
    }

    pub fn with_annealing_iters(mut self, n: usize) -> Self {
        self.annealing_iters = n;
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Uses `initial_temperature` as an absolute temperature.
    pub fn with_absolute_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self.scale_temperature_by_initial_cost = false;
        self
    }

    /// Sets a fixed per-epoch decay, clearing any `cooling_halvings`.
    pub fn with_decay_factor(mut self, decay: f64) -> Self {
        self.decay_factor = decay;
        self.cooling_halvings = None;
        self
    }

    /// Cools so the temperature halves `halvings` times over the run,
    /// whatever `annealing_iters` ends up being.
    pub fn with_cooling_halvings(mut self, halvings: f64) -> Self {
        self.cooling_halvings = Some(halvings);
        self
    }

    /// Per-epoch decay actually applied.
    pub fn effective_decay(&self) -> f64 {
        match self.cooling_halvings {
            Some(h) => 0.5_f64.powf(h / self.annealing_iters.max(1) as f64),
            None => self.decay_factor,
        }
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = Some(t);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_include_node_cost(mut self, include: bool) -> Self {
        self.include_node_cost = include;
        self
    }

    pub fn with_spare_days(mut self, n: usize) -> Self {
        self.spare_days = n;
        self
    }

    pub fn with_max_days(mut self, n: usize) -> Self {
        self.max_days = Some(n);
        self
    }

    pub fn with_initial_assignment(mut self, strategy: InitialAssignment) -> Self {
        self.initial_assignment = strategy;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.max_stops_per_day == 0 {
            return Err(ScheduleError::invalid_parameter(
                "max_stops_per_day",
                "must be at least 1",
            ));
        }
        if self.annealing_iters == 0 {
            return Err(ScheduleError::invalid_parameter(
                "annealing_iters",
                "must be at least 1",
            ));
        }
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(ScheduleError::invalid_parameter(
                "initial_temperature",
                format!("must be positive, got {}", self.initial_temperature),
            ));
        }
        if let Some(h) = self.cooling_halvings {
            if !h.is_finite() || h <= 0.0 {
                return Err(ScheduleError::invalid_parameter(
                    "cooling_halvings",
                    format!("must be positive, got {h}"),
                ));
            }
        }
        let decay = self.effective_decay();
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ScheduleError::invalid_parameter(
                "decay_factor",
                format!("must be in (0, 1), got {decay}"),
            ));
        }
        if let Some(t) = self.min_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(ScheduleError::invalid_parameter(
                    "min_temperature",
                    format!("must be positive, got {t}"),
                ));
            }
        }
        Ok(())
    }

    /// Number of days to allocate for `num_sites` sites.
    ///
    /// The minimum day count plus `spare_days`, capped by `max_days`. Fails
    /// if even the minimum exceeds `max_days`.
    pub fn plan_days(&self, num_sites: usize) -> Result<usize, ScheduleError> {
        if num_sites == 0 {
            return Ok(0);
        }
        let needed = min_days(num_sites, self.max_stops_per_day);
        let wanted = needed + self.spare_days;
        match self.max_days {
            Some(max) if needed > max => Err(ScheduleError::InfeasibleCapacity {
                sites: num_sites,
                max_stops_per_day: self.max_stops_per_day,
                max_days: max,
            }),
            Some(max) => Ok(wanted.min(max)),
            None => Ok(wanted),
        }
    }
}
