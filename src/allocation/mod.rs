//! Allocation engine: map compilation and live allocation state

pub mod current;
pub mod map;

pub use current::{replay, AllocationContext, CurrentTree};
pub use map::{compile_allocation_map, PathOverlay, PotentialAllocationMap, TraversalRules};
