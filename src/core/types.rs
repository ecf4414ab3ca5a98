//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cells in every grid row
pub const COLUMNS: u32 = 9;

/// 1-based cell key, numbered left to right, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(pub u32);

impl CellKey {
    pub fn new(key: u32) -> Self {
        Self(key)
    }

    /// Column position within its row, in `1..=COLUMNS`
    pub fn column(&self) -> u32 {
        (self.0.saturating_sub(1) % COLUMNS) + 1
    }

    /// 0-based row index
    pub fn row(&self) -> u32 {
        self.0.saturating_sub(1) / COLUMNS
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an ability, the key in the ability book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u32);

impl AbilityId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
