//! Named allocation trees
//!
//! Each named tree is an ordered commit log of allocated ability ids. Trees
//! keep insertion order, and exactly one of them is selected for allocation.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::types::AbilityId;

pub const DEFAULT_TREE_NAME: &str = "Default";

/// Suffix attempts before a colliding rename gives up
const MAX_NAME_SUFFIX: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbilityTrees {
    trees: Vec<(String, Vec<AbilityId>)>,
    selected: String,
}

impl AbilityTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from loaded data; duplicate names keep the first list
    pub fn from_parts(trees: Vec<(String, Vec<AbilityId>)>, selected: String) -> Self {
        let mut result = Self { trees: Vec::with_capacity(trees.len()), selected };
        for (name, list) in trees {
            if !result.contains(&name) {
                result.trees.push((name, list));
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trees.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&[AbilityId]> {
        self.position(name).map(|i| self.trees[i].1.as_slice())
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Commit log of the selected tree; empty if the selection dangles
    pub fn selected_list(&self) -> &[AbilityId] {
        self.get(&self.selected).unwrap_or(&[])
    }

    pub fn set_selected_list(&mut self, list: Vec<AbilityId>) {
        if let Some(i) = self.position(&self.selected) {
            self.trees[i].1 = list;
        }
    }

    pub fn push_to_selected(&mut self, id: AbilityId) {
        if let Some(i) = self.position(&self.selected) {
            self.trees[i].1.push(id);
        }
    }

    pub fn remove_from_selected(&mut self, id: AbilityId) -> bool {
        let Some(i) = self.position(&self.selected) else {
            return false;
        };
        let list = &mut self.trees[i].1;
        match list.iter().position(|&x| x == id) {
            Some(at) => {
                list.remove(at);
                true
            }
            None => false,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.trees.iter().position(|(n, _)| n == name)
    }

    /// Resolve a requested name against existing trees: a taken name other
    /// than `old` gets the smallest free `(n)` suffix
    fn free_name(&self, requested: &str, old: &str) -> Option<String> {
        if !self.contains(requested) || requested == old {
            return Some(requested.to_string());
        }
        (1..=MAX_NAME_SUFFIX)
            .map(|i| format!("{requested}({i})"))
            .find(|candidate| !self.contains(candidate))
    }

    /// Add an empty tree; returns the name actually used
    pub fn add(&mut self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        let name = self.free_name(name, "")?;
        self.trees.push((name.clone(), Vec::new()));
        Some(name)
    }

    /// Rename in place, keeping position and selection; returns the name used
    pub fn rename(&mut self, old: &str, new: &str) -> Option<String> {
        if new.is_empty() {
            return None;
        }
        let i = self.position(old)?;
        let name = self.free_name(new, old)?;
        self.trees[i].0 = name.clone();
        if self.selected == old {
            self.selected = name.clone();
        }
        Some(name)
    }

    pub fn delete(&mut self, name: &str) -> bool {
        let Some(i) = self.position(name) else {
            return false;
        };
        self.trees.remove(i);
        self.ensure_selected();
        true
    }

    pub fn select(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        self.selected = name.to_string();
        true
    }

    /// Make sure some tree exists and the selection points at one.
    /// Returns true when the default tree had to be created.
    pub fn ensure_selected(&mut self) -> bool {
        let created = self.trees.is_empty();
        if created {
            self.trees.push((DEFAULT_TREE_NAME.to_string(), Vec::new()));
            self.selected = DEFAULT_TREE_NAME.to_string();
        }
        if !self.contains(&self.selected) {
            self.selected = self.trees[0].0.clone();
        }
        created
    }

    /// Remove an ability from every commit log
    pub fn strip_ability(&mut self, id: AbilityId) {
        for (_, list) in self.trees.iter_mut() {
            list.retain(|&x| x != id);
        }
    }

    /// Drop ids for which `keep` is false from every commit log
    pub fn retain_abilities(&mut self, keep: impl Fn(AbilityId) -> bool) {
        for (_, list) in self.trees.iter_mut() {
            list.retain(|&x| keep(x));
        }
    }
}

/// Serialized as a JSON object in insertion order
impl Serialize for AbilityTrees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.trees.len()))?;
        for (name, list) in &self.trees {
            map.serialize_entry(name, list)?;
        }
        map.end()
    }
}
