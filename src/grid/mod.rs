//! Grid cells and the directional paths between them

pub mod cells;
pub mod direction;
pub mod travel_node;

pub use cells::{Cell, CellMap, GridShape};
pub use direction::Direction;
pub use travel_node::{Strength, TravelNode, VARIANT_COUNT};
