//! Placement and removal of dinosaurs.
//!
//! All writes touching a cage's occupancy or status are serialized per cage
//! through [`CageLocks`], and every write carries the occupancy count that was
//! observed under the lock so the store can reject it if another process got
//! there first.

mod engine;
mod locks;

pub use engine::OccupancyEngine;
pub use locks::{CageGuard, CageLocks};
