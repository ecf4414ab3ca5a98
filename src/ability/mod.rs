//! Ability records and the book that owns them
//!
//! An ability is a placeable node with a point cost, an optional single
//! prerequisite, an archetype tag and a set of abilities it blocks once
//! allocated. The book keys abilities by id and keeps references between
//! them consistent when abilities are deleted.

pub mod archetype;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::AbilityId;

pub use archetype::Archetypes;

/// Lowest allowed point cost
pub const POINTS_REQUIRED_MIN: i32 = -69;
/// Highest allowed point cost
pub const POINTS_REQUIRED_MAX: i32 = 69;
/// Highest allowed archetype gate
pub const ARCHETYPE_POINTS_MAX: u32 = 420;

/// Formatting code prefix used inside ability names
pub const FORMAT_DELIMITER: char = '§';

/// Visual kind of an ability, in display priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKind {
    #[default]
    Skill,
    Magenta,
    Red,
    Blue,
    Purple,
    Yellow,
    White,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 7] = [
        Self::Skill,
        Self::Magenta,
        Self::Red,
        Self::Blue,
        Self::Purple,
        Self::Yellow,
        Self::White,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skill" => Some(Self::Skill),
            "magenta" => Some(Self::Magenta),
            "red" => Some(Self::Red),
            "blue" => Some(Self::Blue),
            "purple" => Some(Self::Purple),
            "yellow" => Some(Self::Yellow),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Magenta => "magenta",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }
}

/// Ability name with `§x` formatting codes removed
pub fn plain_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_DELIMITER {
            chars.next();
        } else {
            result.push(c);
        }
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub name: String,
    pub description: String,
    /// Abilities that can no longer be allocated once this one is
    pub unlocking_will_block: Vec<AbilityId>,
    /// Empty means neutral
    pub archetype: String,
    pub points_required: i32,
    pub archetype_points_required: u32,
    #[serde(rename = "type")]
    pub kind: AbilityKind,
    #[serde(with = "requires_field")]
    pub requires: Option<AbilityId>,
}

impl Default for Ability {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            unlocking_will_block: Vec::new(),
            archetype: String::new(),
            points_required: POINTS_REQUIRED_MIN,
            archetype_points_required: 0,
            kind: AbilityKind::Skill,
            requires: None,
        }
    }
}

impl Ability {
    pub fn new(name: &str, points_required: i32) -> Self {
        Self {
            name: name.to_string(),
            points_required: points_required.clamp(POINTS_REQUIRED_MIN, POINTS_REQUIRED_MAX),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: AbilityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_archetype(mut self, archetype: &str, points_required: u32) -> Self {
        self.archetype = archetype.to_string();
        self.archetype_points_required = points_required.min(ARCHETYPE_POINTS_MAX);
        self
    }

    pub fn requiring(mut self, requires: AbilityId) -> Self {
        self.requires = Some(requires);
        self
    }

    pub fn blocking(mut self, blocked: impl IntoIterator<Item = AbilityId>) -> Self {
        self.unlocking_will_block.extend(blocked);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn plain_name(&self) -> String {
        plain_name(&self.name)
    }

    pub fn is_neutral(&self) -> bool {
        self.archetype.is_empty()
    }
}

/// `requires` is stored as `-1` when absent
mod requires_field {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::types::AbilityId;

    pub fn serialize<S: Serializer>(value: &Option<AbilityId>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_i64(i64::from(id.0)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AbilityId>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(u32::try_from(raw).ok().map(AbilityId))
    }
}

/// All abilities of a tree, keyed by id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityBook {
    abilities: BTreeMap<AbilityId, Ability>,
}

impl AbilityBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(&id)
    }

    pub fn contains(&self, id: AbilityId) -> bool {
        self.abilities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, &Ability)> {
        self.abilities.iter().map(|(&id, a)| (id, a))
    }

    pub fn ids(&self) -> impl Iterator<Item = AbilityId> + '_ {
        self.abilities.keys().copied()
    }

    pub fn first_id(&self) -> Option<AbilityId> {
        self.abilities.keys().next().copied()
    }

    /// Lowest positive id not in use
    pub fn next_free_id(&self) -> AbilityId {
        let mut candidate = 1;
        for id in self.abilities.range(AbilityId(1)..).map(|(id, _)| id) {
            if id.0 != candidate {
                break;
            }
            candidate += 1;
        }
        AbilityId(candidate)
    }

    /// Store under an explicit id, replacing whatever was there
    pub fn insert(&mut self, id: AbilityId, ability: Ability) {
        self.abilities.insert(id, ability);
    }

    pub fn add(&mut self, ability: Ability) -> AbilityId {
        let id = self.next_free_id();
        self.abilities.insert(id, ability);
        id
    }

    /// Replace an existing ability; returns the previous record
    pub fn edit(&mut self, id: AbilityId, ability: Ability) -> Option<Ability> {
        let slot = self.abilities.get_mut(&id)?;
        Some(std::mem::replace(slot, ability))
    }

    pub fn clone_ability(&mut self, id: AbilityId) -> Option<AbilityId> {
        let copy = self.abilities.get(&id)?.clone();
        Some(self.add(copy))
    }

    /// Delete an ability and every prerequisite/block pointing at it
    pub fn remove(&mut self, id: AbilityId) -> Option<Ability> {
        let removed = self.abilities.remove(&id)?;
        for ability in self.abilities.values_mut() {
            if ability.requires == Some(id) {
                ability.requires = None;
            }
            ability.unlocking_will_block.retain(|&b| b != id);
        }
        Some(removed)
    }

    /// Drop references to abilities that do not exist
    pub fn prune_dangling(&mut self) {
        let known: Vec<AbilityId> = self.abilities.keys().copied().collect();
        for ability in self.abilities.values_mut() {
            if ability.requires.is_some_and(|r| known.binary_search(&r).is_err()) {
                ability.requires = None;
            }
            ability
                .unlocking_will_block
                .retain(|b| known.binary_search(b).is_ok());
        }
    }

    /// Retag every ability of `old` with `new` (empty = neutral)
    pub fn retag_archetype(&mut self, old: &str, new: &str) -> usize {
        let mut changed = 0;
        for ability in self.abilities.values_mut() {
            if ability.archetype == old {
                ability.archetype = new.to_string();
                changed += 1;
            }
        }
        changed
    }

    pub fn count_in_archetype(&self, archetype: &str) -> usize {
        self.abilities
            .values()
            .filter(|a| a.archetype == archetype)
            .count()
    }

    /// Ids ordered by kind priority, then plain name
    pub fn sorted_ids(&self) -> Vec<AbilityId> {
        let mut ids: Vec<(AbilityKind, String, AbilityId)> = self
            .abilities
            .iter()
            .map(|(&id, a)| (a.kind, a.plain_name(), id))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, _, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_clamped() {
        assert_eq!(Ability::new("a", 500).points_required, POINTS_REQUIRED_MAX);
        assert_eq!(Ability::new("a", -500).points_required, POINTS_REQUIRED_MIN);
    }

    #[test]
    fn test_archetype_gate_clamped() {
        let ability = Ability::new("a", 1).with_archetype("Fire", 10_000);
        assert_eq!(ability.archetype_points_required, ARCHETYPE_POINTS_MAX);
    }

    #[test]
    fn test_plain_name_strips_codes() {
        assert_eq!(plain_name("§c§lArrow Storm"), "Arrow Storm");
        assert_eq!(plain_name("Plain"), "Plain");
        assert_eq!(plain_name("trailing§"), "trailing");
    }

    #[test]
    fn test_next_free_id_fills_gaps() {
        let mut book = AbilityBook::new();
        assert_eq!(book.add(Ability::new("a", 1)), AbilityId(1));
        assert_eq!(book.add(Ability::new("b", 1)), AbilityId(2));
        assert_eq!(book.add(Ability::new("c", 1)), AbilityId(3));
        book.remove(AbilityId(2));
        assert_eq!(book.next_free_id(), AbilityId(2));
    }

    #[test]
    fn test_remove_prunes_references() {
        let mut book = AbilityBook::new();
        let a = book.add(Ability::new("a", 1));
        let b = book.add(Ability::new("b", 1).requiring(a).blocking([a]));
        book.remove(a);
        let b = book.get(b).unwrap();
        assert_eq!(b.requires, None);
        assert!(b.unlocking_will_block.is_empty());
    }

    #[test]
    fn test_prune_dangling() {
        let mut book = AbilityBook::new();
        book.insert(AbilityId(1), Ability::new("a", 1).requiring(AbilityId(9)).blocking([AbilityId(9), AbilityId(1)]));
        book.prune_dangling();
        let a = book.get(AbilityId(1)).unwrap();
        assert_eq!(a.requires, None);
        assert_eq!(a.unlocking_will_block, vec![AbilityId(1)]);
    }

    #[test]
    fn test_next_free_id_ignores_zero() {
        let mut book = AbilityBook::new();
        book.insert(AbilityId(0), Ability::new("zero", 1));
        book.insert(AbilityId(1), Ability::new("one", 1));
        assert_eq!(book.next_free_id(), AbilityId(2));

        let added = book.add(Ability::new("new", 1));
        assert_eq!(added, AbilityId(2));
        assert_eq!(book.len(), 3);
        assert_eq!(book.get(AbilityId(1)).unwrap().name, "one");
        assert_eq!(book.clone_ability(AbilityId(0)), Some(AbilityId(3)));
    }

    #[test]
    fn test_clone_gets_new_id() {
        let mut book = AbilityBook::new();
        let a = book.add(Ability::new("a", 3));
        let copy = book.clone_ability(a).unwrap();
        assert_ne!(a, copy);
        assert_eq!(book.get(copy).unwrap().points_required, 3);
        assert_eq!(book.clone_ability(AbilityId(99)), None);
    }

    #[test]
    fn test_sorted_by_kind_then_name() {
        let mut book = AbilityBook::new();
        let red = book.add(Ability::new("Zeta", 1).with_kind(AbilityKind::Red));
        let skill_b = book.add(Ability::new("§aBeta", 1));
        let skill_a = book.add(Ability::new("Alpha", 1));
        assert_eq!(book.sorted_ids(), vec![skill_a, skill_b, red]);
    }

    #[test]
    fn test_requires_serializes_as_minus_one() {
        let json = serde_json::to_value(Ability::new("a", 1)).unwrap();
        assert_eq!(json["requires"], -1);
        assert_eq!(json["type"], "skill");
        assert_eq!(json["pointsRequired"], 1);
    }

    #[test]
    fn test_retag_archetype() {
        let mut book = AbilityBook::new();
        book.add(Ability::new("a", 1).with_archetype("Fire", 0));
        book.add(Ability::new("b", 1).with_archetype("Ice", 0));
        assert_eq!(book.retag_archetype("Fire", "Flame"), 1);
        assert_eq!(book.count_in_archetype("Flame"), 1);
        assert_eq!(book.count_in_archetype("Fire"), 0);
    }
}
