//! Epoch-level annealing state machine.

use rand::Rng;
use u_numflow::random::shuffle;

use crate::distance::TravelCost;
use crate::evaluation::CostEvaluator;
use crate::models::Schedule;

/// Metropolis acceptance criterion.
///
/// Downhill and neutral moves (`delta <= 0`) are always accepted and draw
/// no random number. Uphill moves are accepted with probability
/// `exp(-delta / temperature)`.
pub fn metropolis_accept<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let probability = (-delta / temperature).exp();
    rng.random_range(0.0..1.0) < probability
}

/// Outcome of one attempted slot swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapOutcome {
    /// Same slot twice, or two empty slots.
    Skipped,
    Accepted { delta: f64 },
    Rejected { delta: f64 },
}

/// Counters for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Temperature the epoch ran at.
    pub temperature: f64,
    /// Total cost after the epoch.
    pub cost: f64,
    pub attempted: usize,
    pub accepted: usize,
    /// Accepted moves with `delta < 0`.
    pub improving: usize,
    pub skipped: usize,
}

/// The annealing state `(schedule, temperature, epoch)`.
///
/// Keeps a per-day cost cache so that each swap is priced by re-walking
/// only the one or two days it touches. The RNG is supplied by the caller
/// on every call, so the draw order is fully determined by the caller's
/// handle.
///
/// # Examples
///
/// ```
/// use site_schedule::annealing::Annealer;
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::evaluation::CostEvaluator;
/// use site_schedule::models::Schedule;
///
/// let m = CostMatrix::from_dense(&[
///     vec![0.0, 5.0, 5.0],
///     vec![5.0, 0.0, 1.0],
///     vec![5.0, 1.0, 0.0],
/// ]).unwrap();
/// let start = Schedule::from_days(&[vec![0], vec![1]], 2, 2).unwrap();
/// let mut annealer = Annealer::new(CostEvaluator::new(&m), start, 1.0, 0.9);
/// assert_eq!(annealer.cost(), 20.0);
///
/// let mut rng = u_numflow::random::create_rng(3);
/// for _ in 0..50 {
///     annealer.run_epoch(&mut rng);
/// }
/// assert_eq!(annealer.cost(), 11.0);
/// ```
#[derive(Debug, Clone)]
pub struct Annealer<'a, M: TravelCost> {
    evaluator: CostEvaluator<'a, M>,
    schedule: Schedule,
    day_costs: Vec<f64>,
    cost: f64,
    temperature: f64,
    decay_factor: f64,
    epoch: usize,
    order: Vec<usize>,
}

impl<'a, M: TravelCost> Annealer<'a, M> {
    pub fn new(
        evaluator: CostEvaluator<'a, M>,
        schedule: Schedule,
        temperature: f64,
        decay_factor: f64,
    ) -> Self {
        let day_costs = evaluator.day_costs(&schedule);
        let cost = day_costs.iter().sum();
        let order = (0..schedule.num_slots()).collect();
        Self {
            evaluator,
            schedule,
            day_costs,
            cost,
            temperature,
            decay_factor,
            epoch: 0,
            order,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }

    /// Running total cost of the current schedule.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn day_costs(&self) -> &[f64] {
        &self.day_costs
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Number of completed epochs.
    pub fn epochs(&self) -> usize {
        self.epoch
    }

    /// Attempts to exchange slots `a` and `b`, committing only if accepted.
    pub fn try_swap<R: Rng>(&mut self, a: usize, b: usize, rng: &mut R) -> SwapOutcome {
        if a == b || (self.schedule.slot(a).is_none() && self.schedule.slot(b).is_none()) {
            return SwapOutcome::Skipped;
        }

        let da = self.schedule.day_of_slot(a);
        let db = self.schedule.day_of_slot(b);
        let after_a = self.evaluator.day_cost_swapped(&self.schedule, da, a, b);
        let (before, after_b) = if da == db {
            (self.day_costs[da], 0.0)
        } else {
            (
                self.day_costs[da] + self.day_costs[db],
                self.evaluator.day_cost_swapped(&self.schedule, db, a, b),
            )
        };
        let delta = after_a + after_b - before;

        if !metropolis_accept(delta, self.temperature, rng) {
            return SwapOutcome::Rejected { delta };
        }

        self.schedule.swap(a, b);
        self.day_costs[da] = after_a;
        if da != db {
            self.day_costs[db] = after_b;
        }
        self.cost += delta;
        SwapOutcome::Accepted { delta }
    }

    /// Runs one epoch: every slot, in a freshly shuffled order, attempts a
    /// swap with a uniformly drawn partner slot. Cools afterwards.
    pub fn run_epoch<R: Rng>(&mut self, rng: &mut R) -> EpochStats {
        let mut stats = EpochStats {
            epoch: self.epoch,
            temperature: self.temperature,
            ..EpochStats::default()
        };

        let n = self.order.len();
        if n > 0 {
            shuffle(&mut self.order, rng);
            for i in 0..n {
                let a = self.order[i];
                let b = rng.random_range(0..n);
                stats.attempted += 1;
                match self.try_swap(a, b, rng) {
                    SwapOutcome::Skipped => stats.skipped += 1,
                    SwapOutcome::Accepted { delta } => {
                        stats.accepted += 1;
                        if delta < 0.0 {
                            stats.improving += 1;
                        }
                    }
                    SwapOutcome::Rejected { .. } => {}
                }
            }
        }

        // Resync the running total with the day cache to shed rounding drift.
        self.cost = self.day_costs.iter().sum();
        self.temperature *= self.decay_factor;
        self.epoch += 1;

        stats.cost = self.cost;
        stats
    }

    /// Full recomputation of the current cost, bypassing the caches.
    pub fn recompute_cost(&self) -> f64 {
        self.evaluator.total_cost(&self.schedule)
    }
}
