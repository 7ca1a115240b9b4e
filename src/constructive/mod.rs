//! Initial schedule construction.
//!
//! - [`random_assignment`]: seeded uniform scatter over all slots
//! - [`nearest_neighbor`]: greedy nearest-neighbor day filling, O(n²)

mod nearest_neighbor;
mod random;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

pub use nearest_neighbor::nearest_neighbor;
pub use random::random_assignment;
pub(crate) use random::scatter;

/// Strategy for the starting schedule of an annealing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialAssignment {
    /// [`random_assignment`] driven by the run's RNG.
    #[default]
    Random,
    /// [`nearest_neighbor`]; consumes no randomness.
    NearestNeighbor,
}

/// Smallest number of days that can hold `num_sites`.
pub fn min_days(num_sites: usize, max_stops_per_day: usize) -> usize {
    num_sites.div_ceil(max_stops_per_day.max(1))
}

pub(crate) fn check_capacity(
    num_sites: usize,
    num_days: usize,
    max_stops_per_day: usize,
) -> Result<(), ScheduleError> {
    if max_stops_per_day == 0 {
        return Err(ScheduleError::invalid_parameter(
            "max_stops_per_day",
            "must be at least 1",
        ));
    }
    if num_days * max_stops_per_day < num_sites {
        return Err(ScheduleError::InfeasibleCapacity {
            sites: num_sites,
            max_stops_per_day,
            max_days: num_days,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_days() {
        assert_eq!(min_days(0, 5), 0);
        assert_eq!(min_days(5, 5), 1);
        assert_eq!(min_days(6, 5), 2);
        assert_eq!(min_days(4, 1), 4);
    }

    #[test]
    fn test_check_capacity() {
        assert!(check_capacity(6, 2, 3).is_ok());
        assert!(check_capacity(7, 2, 3).is_err());
        assert!(check_capacity(1, 1, 0).is_err());
    }
}
