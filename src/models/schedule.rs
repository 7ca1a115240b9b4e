//! Slot-based schedule representation.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Assignment of sites to days, with visiting order within each day.
///
/// The schedule is a day-major grid of `num_days × max_stops_per_day`
/// slots. Each slot holds a site index or is empty. A day's route is its
/// occupied slots in slot order, so empty slots are gaps that cost nothing.
/// Since every day owns a fixed number of slots, exchanging the contents of
/// two slots can never push a day over the per-day cap.
///
/// # Examples
///
/// ```
/// use site_schedule::models::Schedule;
///
/// let mut schedule = Schedule::from_days(&[vec![0, 1], vec![2]], 2, 3).unwrap();
/// assert_eq!(schedule.num_slots(), 4);
/// assert_eq!(schedule.day(1).collect::<Vec<_>>(), vec![2]);
///
/// // Move site 1 into the empty slot of day 1.
/// schedule.swap(1, 3);
/// assert_eq!(schedule.days(), vec![vec![0], vec![2, 1]]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleData", into = "ScheduleData")]
pub struct Schedule {
    max_stops_per_day: usize,
    slots: Vec<Option<usize>>,
}

/// Serialized form; the grid shape is checked on the way back in.
#[derive(Serialize, Deserialize)]
struct ScheduleData {
    max_stops_per_day: usize,
    slots: Vec<Option<usize>>,
}

impl TryFrom<ScheduleData> for Schedule {
    type Error = ScheduleError;

    fn try_from(raw: ScheduleData) -> Result<Self, Self::Error> {
        let schedule = Schedule {
            max_stops_per_day: raw.max_stops_per_day,
            slots: raw.slots,
        };
        schedule.check_shape()?;
        Ok(schedule)
    }
}

impl From<Schedule> for ScheduleData {
    fn from(s: Schedule) -> Self {
        ScheduleData {
            max_stops_per_day: s.max_stops_per_day,
            slots: s.slots,
        }
    }
}

impl Schedule {
    /// Creates a schedule with all slots empty.
    pub fn empty(num_days: usize, max_stops_per_day: usize) -> Self {
        Self {
            max_stops_per_day,
            slots: vec![None; num_days * max_stops_per_day],
        }
    }

    /// Builds a schedule from explicit day routes.
    ///
    /// Fails if a day exceeds `max_stops_per_day` or if the routes do not
    /// contain every site in `0..num_sites` exactly once.
    pub fn from_days(
        days: &[Vec<usize>],
        max_stops_per_day: usize,
        num_sites: usize,
    ) -> Result<Self, ScheduleError> {
        if max_stops_per_day == 0 {
            return Err(ScheduleError::invalid_parameter(
                "max_stops_per_day",
                "must be at least 1",
            ));
        }

        let mut schedule = Self::empty(days.len(), max_stops_per_day);
        for (d, route) in days.iter().enumerate() {
            if route.len() > max_stops_per_day {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "day {} has {} stops, more than the maximum of {}",
                    d,
                    route.len(),
                    max_stops_per_day
                )));
            }
            for (pos, &site) in route.iter().enumerate() {
                schedule.slots[d * max_stops_per_day + pos] = Some(site);
            }
        }

        schedule.check(num_sites)?;
        Ok(schedule)
    }

    /// Builds a schedule from a raw slot grid.
    pub(crate) fn from_slots(slots: Vec<Option<usize>>, max_stops_per_day: usize) -> Self {
        debug_assert!(max_stops_per_day > 0 && slots.len() % max_stops_per_day == 0);
        Self {
            max_stops_per_day,
            slots,
        }
    }

    pub fn max_stops_per_day(&self) -> usize {
        self.max_stops_per_day
    }

    /// Number of days, including empty ones.
    pub fn num_days(&self) -> usize {
        self.slots
            .len()
            .checked_div(self.max_stops_per_day)
            .unwrap_or(0)
    }

    /// Total number of slots (the degrees of freedom of the search).
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of sites currently placed.
    pub fn num_sites(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Content of a slot.
    pub fn slot(&self, slot: usize) -> Option<usize> {
        self.slots[slot]
    }

    /// Day that owns a slot.
    pub fn day_of_slot(&self, slot: usize) -> usize {
        slot / self.max_stops_per_day
    }

    /// Raw slots of one day, gaps included.
    pub fn day_slots(&self, day: usize) -> &[Option<usize>] {
        let start = day * self.max_stops_per_day;
        &self.slots[start..start + self.max_stops_per_day]
    }

    /// Sites visited on a day, in visiting order.
    pub fn day(&self, day: usize) -> impl Iterator<Item = usize> + '_ {
        self.day_slots(day).iter().filter_map(|s| *s)
    }

    /// Number of sites visited on a day.
    pub fn day_len(&self, day: usize) -> usize {
        self.day(day).count()
    }

    /// All day routes, empty days included.
    pub fn days(&self) -> Vec<Vec<usize>> {
        (0..self.num_days()).map(|d| self.day(d).collect()).collect()
    }

    /// Day routes with empty days dropped.
    pub fn active_days(&self) -> Vec<Vec<usize>> {
        self.days().into_iter().filter(|d| !d.is_empty()).collect()
    }

    /// Number of days with at least one site.
    pub fn num_active_days(&self) -> usize {
        (0..self.num_days()).filter(|&d| self.day_len(d) > 0).count()
    }

    /// Exchanges the contents of two slots.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
    }

    /// Finds `(day, stop)` of a site, where `stop` is its 0-based position
    /// in the day's route.
    pub fn locate(&self, site: usize) -> Option<(usize, usize)> {
        let slot = self.slots.iter().position(|s| *s == Some(site))?;
        let day = self.day_of_slot(slot);
        let stop = self.slots[day * self.max_stops_per_day..slot]
            .iter()
            .filter(|s| s.is_some())
            .count();
        Some((day, stop))
    }

    /// Verifies the grid is whole days of `max_stops_per_day >= 1` slots.
    fn check_shape(&self) -> Result<(), ScheduleError> {
        if self.max_stops_per_day == 0 {
            return Err(ScheduleError::invalid_parameter(
                "max_stops_per_day",
                "must be at least 1",
            ));
        }
        if self.slots.len() % self.max_stops_per_day != 0 {
            return Err(ScheduleError::InvalidSchedule(format!(
                "{} slots do not form whole days of {}",
                self.slots.len(),
                self.max_stops_per_day
            )));
        }
        Ok(())
    }

    /// Verifies the grid shape and that every site in `0..num_sites`
    /// occupies exactly one slot.
    pub fn check(&self, num_sites: usize) -> Result<(), ScheduleError> {
        self.check_shape()?;
        let mut seen = vec![false; num_sites];
        for &site in self.slots.iter().flatten() {
            if site >= num_sites {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "site index {site} is out of range for {num_sites} sites"
                )));
            }
            if seen[site] {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "site {site} is scheduled more than once"
                )));
            }
            seen[site] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(ScheduleError::InvalidSchedule(format!(
                "site {missing} is not scheduled"
            )));
        }
        Ok(())
    }
}
