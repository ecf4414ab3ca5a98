//! Preset catalog listing and search

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Catalog entry describing one shareable tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetInfo {
    pub credit: String,
    pub title: String,
    pub description: String,
    /// Class the tree is for, or `custom`
    pub class: String,
    /// Class whose icons the tree uses
    pub baseclass: String,
    /// How finished the tree is
    pub completeness: f64,
    /// File stem under the custom preset directory
    pub filename: String,
}

/// Class filter value that matches every preset
pub const ALL_CLASSES: &str = "all";

/// Most complete first, then by title
fn preset_order(a: &PresetInfo, b: &PresetInfo) -> Ordering {
    b.completeness
        .partial_cmp(&a.completeness)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: Vec<PresetInfo>,
}

impl PresetCatalog {
    pub fn new(mut presets: Vec<PresetInfo>) -> Self {
        presets.sort_by(preset_order);
        Self { presets }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let presets: Vec<PresetInfo> = serde_json::from_str(text)?;
        Ok(Self::new(presets))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresetInfo> {
        self.presets.iter()
    }

    pub fn find(&self, filename: &str) -> Option<&PresetInfo> {
        self.presets.iter().find(|p| p.filename == filename)
    }

    /// Presets of `class` (or every class for `all`) whose credit or title
    /// contains `query`, ignoring case. Catalog order is kept.
    pub fn search(&self, class: &str, query: &str) -> Vec<&PresetInfo> {
        let query = query.to_lowercase();
        self.presets
            .iter()
            .filter(|p| class == ALL_CLASSES || p.class == class)
            .filter(|p| {
                query.is_empty()
                    || p.credit.to_lowercase().contains(&query)
                    || p.title.to_lowercase().contains(&query)
            })
            .collect()
    }
}
