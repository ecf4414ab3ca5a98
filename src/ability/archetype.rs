//! Ordered list of archetype names

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Archetypes {
    names: Vec<String>,
}

impl Archetypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Append a new archetype; empty and duplicate names are refused
    pub fn add(&mut self, name: &str) -> bool {
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Rename in place, or append `new` if `old` is unknown
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if new.is_empty() || self.contains(new) {
            return false;
        }
        match self.names.iter_mut().find(|n| n.as_str() == old) {
            Some(slot) => *slot = new.to_string(),
            None => self.names.push(new.to_string()),
        }
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicates() {
        let mut archetypes = Archetypes::new();
        assert!(archetypes.add("Fire"));
        assert!(!archetypes.add("Fire"));
        assert!(!archetypes.add(""));
        assert_eq!(archetypes.len(), 1);
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut archetypes = Archetypes::new();
        archetypes.add("Fire");
        archetypes.add("Ice");
        assert!(archetypes.rename("Fire", "Flame"));
        assert_eq!(archetypes.iter().collect::<Vec<_>>(), vec!["Flame", "Ice"]);
    }

    #[test]
    fn test_rename_unknown_appends() {
        let mut archetypes = Archetypes::new();
        assert!(archetypes.rename("Ghost", "Wind"));
        assert!(archetypes.contains("Wind"));
    }

    #[test]
    fn test_rename_into_existing_refused() {
        let mut archetypes = Archetypes::new();
        archetypes.add("Fire");
        archetypes.add("Ice");
        assert!(!archetypes.rename("Fire", "Ice"));
    }

    #[test]
    fn test_remove() {
        let mut archetypes = Archetypes::new();
        archetypes.add("Fire");
        assert!(archetypes.remove("Fire"));
        assert!(!archetypes.remove("Fire"));
    }
}
