//! Serializable editor state
//!
//! Writing is plain serde. Reading goes through `serde_json::Value` one field
//! at a time so that a single bad field never rejects the whole document;
//! only text that is not JSON at all is an error.

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::Serialize;
use serde_json::Value;

use super::fields;
use super::named::AbilityTrees;
use super::properties::Properties;
use crate::ability::{
    Ability, AbilityBook, AbilityKind, Archetypes, ARCHETYPE_POINTS_MAX, POINTS_REQUIRED_MAX,
    POINTS_REQUIRED_MIN,
};
use crate::core::error::Result;
use crate::core::types::{AbilityId, CellKey};
use crate::grid::{Cell, CellMap, Strength, TravelNode, VARIANT_COUNT};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub properties: Properties,
    pub archetypes: Archetypes,
    pub abilities: AbilityBook,
    pub cell_map: CellMap,
    pub starting_ability: Option<AbilityId>,
    /// Named commit logs and the selected tree
    pub trees: AbilityTrees,
    pub edit_mode: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument<'a> {
    properties: &'a Properties,
    archetypes: &'a Archetypes,
    abilities: &'a AbilityBook,
    cell_map: &'a CellMap,
    #[serde(rename = "startingAbilityID")]
    starting_ability_id: Option<AbilityId>,
    selected_tree: &'a str,
    ability_trees: &'a AbilityTrees,
    #[serde(rename = "bEditMode")]
    edit_mode: bool,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        let document = SnapshotDocument {
            properties: &self.properties,
            archetypes: &self.archetypes,
            abilities: &self.abilities,
            cell_map: &self.cell_map,
            starting_ability_id: self.starting_ability,
            selected_tree: self.trees.selected(),
            ability_trees: &self.trees,
            edit_mode: self.edit_mode,
        };
        Ok(serde_json::to_string(&document)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build a snapshot from any JSON value, defaulting whatever is unusable
    pub fn from_value(value: &Value) -> Self {
        let properties = Properties::from_value(value.get("properties").unwrap_or(&Value::Null));

        let mut archetypes = Archetypes::new();
        if let Some(list) = value.get("archetypes").and_then(Value::as_array) {
            for name in list.iter().filter_map(Value::as_str) {
                archetypes.add(name);
            }
        }

        let mut abilities = AbilityBook::new();
        if let Some(map) = value.get("abilities").and_then(Value::as_object) {
            for (key, raw) in map {
                if let Some(id) = parse_id_key(key) {
                    abilities.insert(id, parse_ability(raw));
                }
            }
        }
        abilities.prune_dangling();

        let cell_map = parse_cells(value.get("cellMap"), &properties, &abilities);

        let starting_ability = value
            .get("startingAbilityID")
            .and_then(fields::id)
            .map(AbilityId)
            .filter(|&id| abilities.contains(id));

        let mut trees = Vec::new();
        if let Some(map) = value.get("abilityTrees").and_then(Value::as_object) {
            for (name, raw) in map {
                let Some(list) = raw.as_array() else {
                    continue;
                };
                let ids = list
                    .iter()
                    .filter_map(fields::id)
                    .map(AbilityId)
                    .filter(|&id| abilities.contains(id))
                    .collect();
                trees.push((name.clone(), ids));
            }
        }
        let trees = AbilityTrees::from_parts(trees, fields::text(value, "selectedTree", ""));

        // Only an explicit `false` leaves edit mode
        let edit_mode = !matches!(value.get("bEditMode"), Some(Value::Bool(false)));

        Self {
            properties,
            archetypes,
            abilities,
            cell_map,
            starting_ability,
            trees,
            edit_mode,
        }
    }
}

fn parse_id_key(key: &str) -> Option<AbilityId> {
    key.trim().parse::<u32>().ok().map(AbilityId)
}

pub fn parse_ability(value: &Value) -> Ability {
    let unlocking_will_block = value
        .get("unlockingWillBlock")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(fields::id).map(AbilityId).collect())
        .unwrap_or_default();

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(AbilityKind::parse)
        .unwrap_or_default();

    let requires = value
        .get("requires")
        .and_then(fields::id)
        .map(AbilityId);

    Ability {
        name: fields::text(value, "name", ""),
        description: fields::text(value, "description", ""),
        unlocking_will_block,
        archetype: fields::text(value, "archetype", ""),
        points_required: fields::clamped(
            value,
            "pointsRequired",
            i64::from(POINTS_REQUIRED_MIN),
            i64::from(POINTS_REQUIRED_MAX),
            i64::from(POINTS_REQUIRED_MIN),
        ) as i32,
        archetype_points_required: fields::clamped(
            value,
            "archetypePointsRequired",
            0,
            i64::from(ARCHETYPE_POINTS_MAX),
            0,
        ) as u32,
        kind,
        requires,
    }
}

pub fn parse_travel_node(value: &Value) -> TravelNode {
    let strength = |key: &str| Strength::from(fields::clamped(value, key, 0, 2, 0) as u8);
    TravelNode {
        up: strength("up"),
        down: strength("down"),
        left: strength("left"),
        right: strength("right"),
        variant: fields::clamped(value, "variant", 1, i64::from(VARIANT_COUNT), 1) as u8,
    }
}

/// Cells outside the grid or left empty are dropped, as are references to
/// unknown abilities. An ability placed twice keeps only its lowest cell.
fn parse_cells(value: Option<&Value>, properties: &Properties, abilities: &AbilityBook) -> CellMap {
    let mut cells = CellMap::new();
    let Some(map) = value.and_then(Value::as_object) else {
        return cells;
    };

    let shape = properties.shape();
    let ordered: BTreeMap<CellKey, &Value> = map
        .iter()
        .filter_map(|(key, raw)| key.trim().parse::<u32>().ok().map(|k| (CellKey(k), raw)))
        .filter(|(key, _)| shape.contains(*key))
        .collect();

    let mut placed: AHashSet<AbilityId> = AHashSet::new();
    for (key, raw) in ordered {
        let travel_node = raw
            .get("travelNode")
            .filter(|node| node.is_object())
            .map(parse_travel_node);

        let ability = raw
            .get("abilityID")
            .and_then(fields::id)
            .map(AbilityId)
            .filter(|&id| abilities.contains(id) && placed.insert(id));

        cells.insert(key, Cell { travel_node, ability });
    }

    cells
}
