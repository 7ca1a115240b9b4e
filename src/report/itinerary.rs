//! Timestamped itinerary.

use jiff::civil::DateTime;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::summary::{DayReport, ScheduleReport};
use crate::error::ScheduleError;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// How cost values translate to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostUnit {
    #[default]
    Minutes,
    Seconds,
}

impl CostUnit {
    fn seconds_per_unit(self) -> f64 {
        match self {
            CostUnit::Minutes => 60.0,
            CostUnit::Seconds => 1.0,
        }
    }

    /// Converts a cost to a duration, rounded to the nearest second.
    pub fn duration(self, cost: f64) -> SignedDuration {
        SignedDuration::from_secs((cost * self.seconds_per_unit()).round() as i64)
    }
}

/// One stop of a day's itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub site_id: String,
    /// 1-based position within the day.
    pub stop: usize,
    pub arrival: DateTime,
    /// Arrival plus the site's node cost.
    pub departure: DateTime,
}

/// One day's timed route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayItinerary {
    /// 1-based day number.
    pub day: usize,
    pub leave_home: DateTime,
    pub visits: Vec<Visit>,
    pub return_home: DateTime,
}

impl ScheduleReport {
    /// Lays the schedule out in time. Day `d` (1-based) leaves home at
    /// `start + (d - 1)` days; each leg and node cost advances the clock.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::civil::date;
    /// use site_schedule::distance::CostMatrix;
    /// use site_schedule::models::{HomeBase, Schedule, Site, SiteCatalog};
    /// use site_schedule::report::{CostUnit, ScheduleReport};
    ///
    /// let catalog = SiteCatalog::new(HomeBase::new("base"), vec![Site::new("X")]).unwrap();
    /// let matrix = CostMatrix::from_dense(&[vec![0.0, 45.0], vec![45.0, 0.0]]).unwrap();
    /// let schedule = Schedule::from_days(&[vec![0]], 1, 1).unwrap();
    /// let report = ScheduleReport::new(&schedule, &catalog, &matrix, true).unwrap();
    ///
    /// let plan = report.itinerary(date(2024, 5, 6).at(9, 0, 0, 0), CostUnit::Minutes).unwrap();
    /// assert_eq!(plan[0].visits[0].arrival, date(2024, 5, 6).at(9, 45, 0, 0));
    /// assert_eq!(plan[0].return_home, date(2024, 5, 6).at(10, 30, 0, 0));
    /// ```
    pub fn itinerary(
        &self,
        start: DateTime,
        unit: CostUnit,
    ) -> Result<Vec<DayItinerary>, ScheduleError> {
        self.days
            .iter()
            .map(|day| day_itinerary(day, start, unit))
            .collect()
    }
}

fn day_itinerary(
    day: &DayReport,
    start: DateTime,
    unit: CostUnit,
) -> Result<DayItinerary, ScheduleError> {
    if day.legs.len() != day.site_ids.len() + 1 || day.service.len() != day.site_ids.len() {
        return Err(ScheduleError::InvalidSchedule(format!(
            "day {} has {} sites but {} legs and {} service costs",
            day.day,
            day.site_ids.len(),
            day.legs.len(),
            day.service.len()
        )));
    }
    let offset_secs = i64::try_from(day.day)
        .ok()
        .and_then(|d| d.checked_sub(1))
        .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
        .ok_or_else(|| ScheduleError::Timestamp(format!("day {} is out of range", day.day)))?;
    let leave_home = start.checked_add(SignedDuration::from_secs(offset_secs))?;

    let mut clock = leave_home;
    let mut visits = Vec::with_capacity(day.site_ids.len());
    let stops = day.site_ids.iter().zip(&day.legs).zip(&day.service);
    for (i, ((site_id, &leg), &service)) in stops.enumerate() {
        let arrival = clock.checked_add(unit.duration(leg))?;
        let departure = arrival.checked_add(unit.duration(service))?;
        visits.push(Visit {
            site_id: site_id.clone(),
            stop: i + 1,
            arrival,
            departure,
        });
        clock = departure;
    }
    let last_leg = day.legs[day.site_ids.len()];
    let return_home = clock.checked_add(unit.duration(last_leg))?;

    Ok(DayItinerary {
        day: day.day,
        leave_home,
        visits,
        return_home,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::{HomeBase, Schedule, Site, SiteCatalog};
    use jiff::civil::date;

    fn report() -> ScheduleReport {
        let catalog = SiteCatalog::new(
            HomeBase::new("home"),
            vec![
                Site::new("A").with_node_cost(15.0),
                Site::new("B"),
                Site::new("C").with_node_cost(30.0),
            ],
        )
        .expect("valid");
        let matrix = CostMatrix::from_dense(&[
            vec![0.0, 30.0, 40.0, 60.0],
            vec![30.0, 0.0, 10.0, 70.0],
            vec![40.0, 10.0, 0.0, 80.0],
            vec![60.0, 70.0, 80.0, 0.0],
        ])
        .expect("valid");
        let schedule =
            Schedule::from_days(&[vec![0, 1], vec![], vec![2]], 2, 3).expect("valid");
        ScheduleReport::new(&schedule, &catalog, &matrix, true).expect("valid")
    }

    #[test]
    fn test_minutes_itinerary() {
        let start = date(2024, 3, 1).at(8, 0, 0, 0);
        let plan = report().itinerary(start, CostUnit::Minutes).expect("in range");
        assert_eq!(plan.len(), 2);

        let first = &plan[0];
        assert_eq!(first.leave_home, start);
        assert_eq!(first.visits[0].site_id, "A");
        assert_eq!(first.visits[0].arrival, date(2024, 3, 1).at(8, 30, 0, 0));
        assert_eq!(first.visits[0].departure, date(2024, 3, 1).at(8, 45, 0, 0));
        assert_eq!(first.visits[1].stop, 2);
        assert_eq!(first.visits[1].arrival, date(2024, 3, 1).at(8, 55, 0, 0));
        assert_eq!(first.visits[1].departure, date(2024, 3, 1).at(8, 55, 0, 0));
        assert_eq!(first.return_home, date(2024, 3, 1).at(9, 35, 0, 0));

        // the empty day is dropped, so C lands on the next calendar day
        let second = &plan[1];
        assert_eq!(second.day, 2);
        assert_eq!(second.leave_home, date(2024, 3, 2).at(8, 0, 0, 0));
        assert_eq!(second.visits[0].arrival, date(2024, 3, 2).at(9, 0, 0, 0));
        assert_eq!(second.return_home, date(2024, 3, 2).at(10, 30, 0, 0));
    }

    #[test]
    fn test_seconds_itinerary() {
        let start = date(2024, 3, 1).at(8, 0, 0, 0);
        let plan = report().itinerary(start, CostUnit::Seconds).expect("in range");
        assert_eq!(plan[0].visits[0].arrival, date(2024, 3, 1).at(8, 0, 30, 0));
        assert_eq!(plan[0].return_home, date(2024, 3, 1).at(8, 1, 35, 0));
    }

    #[test]
    fn test_duration_rounds_to_seconds() {
        assert_eq!(CostUnit::Minutes.duration(1.5), SignedDuration::from_secs(90));
        assert_eq!(CostUnit::Seconds.duration(2.6), SignedDuration::from_secs(3));
    }

    #[test]
    fn test_overflow_is_reported() {
        let start = date(9999, 12, 31).at(23, 0, 0, 0);
        assert!(matches!(
            report().itinerary(start, CostUnit::Minutes),
            Err(ScheduleError::Timestamp(_))
        ));
    }

    #[test]
    fn test_inconsistent_day_is_rejected() {
        let short = ScheduleReport {
            home: "home".into(),
            days: vec![DayReport {
                day: 1,
                site_ids: vec!["A".into(), "B".into()],
                legs: vec![10.0],
                service: vec![],
                cost: 10.0,
            }],
            total_cost: 10.0,
        };
        let start = date(2024, 3, 1).at(8, 0, 0, 0);
        assert!(matches!(
            short.itinerary(start, CostUnit::Minutes),
            Err(ScheduleError::InvalidSchedule(_))
        ));
    }
}
