//! Seeded random slot assignment.

use rand::Rng;
use u_numflow::random::shuffle;

use crate::error::ScheduleError;
use crate::models::Schedule;

use super::check_capacity;

/// Scatters sites uniformly over all slots.
///
/// Sites `0..num_sites` fill the first slots in order, then the whole slot
/// grid is shuffled, so both the day of each site and the position of the
/// gaps are random. The result depends only on the RNG state.
///
/// # Examples
///
/// ```
/// use site_schedule::constructive::random_assignment;
///
/// let mut rng = u_numflow::random::create_rng(7);
/// let schedule = random_assignment(5, 3, 2, &mut rng).unwrap();
/// assert_eq!(schedule.num_days(), 3);
/// assert!(schedule.check(5).is_ok());
/// ```
pub fn random_assignment<R: Rng>(
    num_sites: usize,
    num_days: usize,
    max_stops_per_day: usize,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    check_capacity(num_sites, num_days, max_stops_per_day)?;
    Ok(scatter(num_sites, num_days, max_stops_per_day, rng))
}

/// Infallible core of [`random_assignment`]; capacity must already be checked.
pub(crate) fn scatter<R: Rng>(
    num_sites: usize,
    num_days: usize,
    max_stops_per_day: usize,
    rng: &mut R,
) -> Schedule {
    let num_slots = num_days * max_stops_per_day;
    let mut slots: Vec<Option<usize>> = (0..num_slots)
        .map(|i| (i < num_sites).then_some(i))
        .collect();
    shuffle(&mut slots, rng);

    Schedule::from_slots(slots, max_stops_per_day)
}
