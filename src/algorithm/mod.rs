//! The search itself: a plain recursive backtracker (§4.8), resumption from
//! a saved [`crate::history::PlacementHistory`] (§4.9), and a parallel
//! coordinator running many of the former concurrently (§4.10).

pub mod driver;
pub mod parallel;
pub mod resume;
