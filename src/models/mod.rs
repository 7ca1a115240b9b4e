//! Domain model types for site scheduling.
//!
//! Provides the site catalog (sites, their node costs, and the home base)
//! and the slot-based [`Schedule`] that the optimizer mutates.

mod schedule;
mod site;

pub use schedule::Schedule;
pub use site::{Coordinates, HomeBase, Site, SiteCatalog};
