//! # site-schedule
//!
//! Multi-day visit scheduling by simulated annealing. A set of sites must
//! each be visited once, in round trips from a home base, with at most a
//! fixed number of stops per day. The optimizer decides which day each site
//! falls on and the visiting order within the day, minimizing total travel
//! plus per-site node cost.
//!
//! ## Modules
//!
//! - [`models`]: sites, home base, and the slot-grid [`Schedule`](models::Schedule)
//! - [`distance`]: symmetric cost matrix, matrix providers and on-disk cache
//! - [`evaluation`]: day and schedule cost, incremental swap pricing
//! - [`constructive`]: starting schedules (random scatter, nearest neighbor)
//! - [`annealing`]: slot-swap simulated annealing and a `u-metaheur` bridge
//! - [`report`]: per-day summaries and timestamped itineraries

pub mod annealing;
pub mod constructive;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod report;

pub use error::ScheduleError;
