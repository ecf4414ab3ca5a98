//! Ability Forge - ability tree editor and allocation engine

pub mod ability;
pub mod allocation;
pub mod core;
pub mod grid;
pub mod preset;
pub mod tree;
