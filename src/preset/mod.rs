//! Shareable preset trees: catalog, cache and fetching

pub mod cache;
pub mod catalog;
pub mod client;

pub use cache::PresetCache;
pub use catalog::{PresetCatalog, PresetInfo, ALL_CLASSES};
pub use client::{random_ability_of_kind, PresetClient};
