//! Reporting of finished schedules.
//!
//! - [`ScheduleReport`]: per-day site lists and costs, empty days dropped
//! - [`ScheduleReport::itinerary`]: clock times from a start date-time

mod itinerary;
mod summary;

pub use itinerary::{CostUnit, DayItinerary, Visit};
pub use summary::{DayReport, ScheduleReport, SiteAssignment};
