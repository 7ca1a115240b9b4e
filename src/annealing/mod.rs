//! Simulated annealing over the slot grid.
//!
//! Moves are exchanges of two slots (Kawasaki dynamics): sites trade places,
//! or a site moves into an empty slot. Every move keeps the per-day cap, so
//! the search never leaves the feasible region. One epoch attempts one swap
//! per slot, in shuffled order, and then cools the temperature geometrically.
//!
//! - [`AnnealingRunner`]: incremental runner with per-day cost caching
//! - [`Annealer`]: the epoch-level state machine it drives
//! - [`ScheduleSaProblem`]: adapter for [`u_metaheur::sa::SaRunner`]
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Kawasaki (1966), "Diffusion Constants near the Critical Point for
//!   Time-Dependent Ising Models"

mod annealer;
mod bridge;
mod config;
mod runner;

pub use annealer::{metropolis_accept, Annealer, EpochStats, SwapOutcome};
pub use bridge::ScheduleSaProblem;
pub use config::AnnealingParameters;
pub use runner::{AnnealingResult, AnnealingRunner};
