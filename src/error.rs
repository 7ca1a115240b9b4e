//! Error types for schedule construction and configuration.

use thiserror::Error;

/// Errors raised while building the inputs of a scheduling run.
///
/// All of these are detected before the first annealing epoch. The
/// annealing loop itself cannot fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(
        "{sites} sites do not fit into {max_days} days of {max_stops_per_day} stops; \
         increase max_stops_per_day or max_days"
    )]
    InfeasibleCapacity {
        sites: usize,
        max_stops_per_day: usize,
        max_days: usize,
    },

    #[error("no travel cost between sites {a} and {b}")]
    MissingTravelCost { a: usize, b: usize },

    #[error("no travel cost between home and site {site}")]
    MissingHomeCost { site: usize },

    #[error("invalid cost {value} for {what}: costs must be finite and non-negative")]
    InvalidCost { what: String, value: f64 },

    #[error("cost matrix is not symmetric at ({from}, {to}): {forward} != {backward}")]
    AsymmetricCost {
        from: usize,
        to: usize,
        forward: f64,
        backward: f64,
    },

    #[error("cost matrix has {actual} entries, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("duplicate site identifier `{0}`")]
    DuplicateSite(String),

    #[error("unknown site identifier `{0}`")]
    UnknownSite(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("timestamp out of range: {0}")]
    Timestamp(String),
}

impl ScheduleError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<jiff::Error> for ScheduleError {
    fn from(err: jiff::Error) -> Self {
        ScheduleError::Timestamp(err.to_string())
    }
}
