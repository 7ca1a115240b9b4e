//! Nearest-neighbor day filling.
//!
//! Builds days greedily: starting from home, always visit the nearest
//! unvisited site. When the day is full, start the next day from home.
//!
//! # Complexity
//!
//! O(n²) where n = number of sites.

use crate::distance::TravelCost;
use crate::error::ScheduleError;
use crate::models::Schedule;

use super::check_capacity;

/// Constructs a schedule using the nearest-neighbor heuristic.
///
/// Days are filled in order, each up to `max_stops_per_day` sites. Ties go
/// to the lowest site index, so the result is deterministic. Days left over
/// once every site is placed stay empty.
///
/// # Examples
///
/// ```
/// use site_schedule::distance::CostMatrix;
/// use site_schedule::constructive::nearest_neighbor;
///
/// // home, A, B, C on a line at 0, 1, 2, 3
/// let pos = [0.0_f64, 1.0, 2.0, 3.0];
/// let rows: Vec<Vec<f64>> = pos.iter()
///     .map(|a| pos.iter().map(|b| (a - b).abs()).collect())
///     .collect();
/// let m = CostMatrix::from_dense(&rows).unwrap();
///
/// let schedule = nearest_neighbor(&m, 2, 2).unwrap();
/// assert_eq!(schedule.days(), vec![vec![0, 1], vec![2]]);
/// ```
pub fn nearest_neighbor<M: TravelCost>(
    matrix: &M,
    num_days: usize,
    max_stops_per_day: usize,
) -> Result<Schedule, ScheduleError> {
    let n = matrix.num_sites();
    check_capacity(n, num_days, max_stops_per_day)?;

    let mut slots = vec![None; num_days * max_stops_per_day];
    let mut visited = vec![false; n];
    let mut remaining = n;

    for day in 0..num_days {
        if remaining == 0 {
            break;
        }
        let mut current: Option<usize> = None;

        for pos in 0..max_stops_per_day {
            let mut best: Option<(usize, f64)> = None;
            for site in (0..n).filter(|&s| !visited[s]) {
                let d = match current {
                    Some(c) => matrix.travel(c, site),
                    None => matrix.home_to(site),
                };
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((site, d));
                }
            }

            match best {
                Some((next, _)) => {
                    visited[next] = true;
                    remaining -= 1;
                    slots[day * max_stops_per_day + pos] = Some(next);
                    current = Some(next);
                }
                None => break,
            }
        }
    }

    Ok(Schedule::from_slots(slots, max_stops_per_day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;

    fn line(n: usize) -> CostMatrix {
        let pos: Vec<f64> = (0..=n).map(|i| i as f64).collect();
        let rows: Vec<Vec<f64>> = pos
            .iter()
            .map(|a| pos.iter().map(|b| (a - b).abs()).collect())
            .collect();
        CostMatrix::from_dense(&rows).expect("valid")
    }

    #[test]
    fn test_nn_single_day() {
        let m = line(3);
        let s = nearest_neighbor(&m, 1, 3).expect("fits");
        assert_eq!(s.days(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_nn_splits_days() {
        let m = line(5);
        let s = nearest_neighbor(&m, 3, 2).expect("fits");
        assert_eq!(s.days(), vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert!(s.check(5).is_ok());
    }

    #[test]
    fn test_nn_spare_days_stay_empty() {
        let m = line(2);
        let s = nearest_neighbor(&m, 3, 2).expect("fits");
        assert_eq!(s.num_days(), 3);
        assert_eq!(s.num_active_days(), 1);
    }

    #[test]
    fn test_nn_chooses_nearest() {
        // home, A (far), B (near)
        let m = CostMatrix::from_dense(&[
            vec![0.0, 10.0, 1.0],
            vec![10.0, 0.0, 9.0],
            vec![1.0, 9.0, 0.0],
        ])
        .expect("valid");
        let s = nearest_neighbor(&m, 1, 2).expect("fits");
        assert_eq!(s.days(), vec![vec![1, 0]]);
    }

    #[test]
    fn test_nn_insufficient_capacity() {
        let m = line(5);
        assert!(matches!(
            nearest_neighbor(&m, 2, 2),
            Err(ScheduleError::InfeasibleCapacity { sites: 5, .. })
        ));
    }

    #[test]
    fn test_nn_empty() {
        let m = line(0);
        let s = nearest_neighbor(&m, 0, 3).expect("trivial");
        assert_eq!(s.num_slots(), 0);
    }
}
