//! Sparse cell map and grid connectivity
//!
//! Cells are keyed 1-based, left to right, top to bottom, `COLUMNS` to a row.
//! Only cells holding a travel node or an ability exist in the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::travel_node::{Strength, TravelNode, VARIANT_COUNT};
use crate::core::types::{AbilityId, CellKey, COLUMNS};

/// Geometry of the grid: how many rows exist and whether rows wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: u32,
    pub loop_tree: bool,
}

impl GridShape {
    pub fn new(rows: u32, loop_tree: bool) -> Self {
        Self { rows, loop_tree }
    }

    pub fn total_cells(&self) -> u32 {
        self.rows * COLUMNS
    }

    pub fn contains(&self, key: CellKey) -> bool {
        key.0 >= 1 && key.0 <= self.total_cells()
    }

    /// Neighbouring cell in `direction`, if the grid has one there
    pub fn adjacent(&self, key: CellKey, direction: Direction) -> Option<CellKey> {
        if !self.contains(key) {
            return None;
        }

        match direction {
            Direction::Up => (key.0 > COLUMNS).then(|| CellKey(key.0 - COLUMNS)),
            Direction::Down => {
                let down = key.0 + COLUMNS;
                (down <= self.total_cells()).then_some(CellKey(down))
            }
            Direction::Left => {
                if key.column() > 1 {
                    Some(CellKey(key.0 - 1))
                } else if self.loop_tree {
                    Some(CellKey(key.0 + COLUMNS - 1))
                } else {
                    None
                }
            }
            Direction::Right => {
                if key.column() < COLUMNS {
                    Some(CellKey(key.0 + 1))
                } else if self.loop_tree {
                    Some(CellKey(key.0 + 1 - COLUMNS))
                } else {
                    None
                }
            }
        }
    }

    /// All existing neighbours, in `Direction::ALL` order
    pub fn adjacent_cells(&self, key: CellKey) -> Vec<(Direction, CellKey)> {
        Direction::ALL
            .iter()
            .filter_map(|&d| self.adjacent(key, d).map(|n| (d, n)))
            .collect()
    }

    /// Direction leading from `from` to `to`, if they are adjacent
    pub fn direction_between(&self, from: CellKey, to: CellKey) -> Option<Direction> {
        Direction::ALL
            .iter()
            .copied()
            .find(|&d| self.adjacent(from, d) == Some(to))
    }
}

/// One occupied grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_node: Option<TravelNode>,
    #[serde(rename = "abilityID", skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityId>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.travel_node.is_none() && self.ability.is_none()
    }

    fn has_connections(&self) -> bool {
        self.travel_node.is_some_and(|n| n.has_connections())
    }
}

/// Rendering variant picked for freshly created travel nodes
fn variant_for(key: CellKey) -> u8 {
    (key.0 % u32::from(VARIANT_COUNT)) as u8 + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellMap {
    cells: BTreeMap<CellKey, Cell>,
}

impl CellMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellKey, &Cell)> {
        self.cells.iter().map(|(&k, c)| (k, c))
    }

    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cells.keys().copied()
    }

    pub fn travel_node(&self, key: CellKey) -> Option<&TravelNode> {
        self.cells.get(&key).and_then(|c| c.travel_node.as_ref())
    }

    pub fn ability_at(&self, key: CellKey) -> Option<AbilityId> {
        self.cells.get(&key).and_then(|c| c.ability)
    }

    /// Cell currently holding `ability`
    pub fn cell_of(&self, ability: AbilityId) -> Option<CellKey> {
        self.cells
            .iter()
            .find(|(_, c)| c.ability == Some(ability))
            .map(|(&k, _)| k)
    }

    /// Insert a loaded cell as-is; empty cells are dropped
    pub fn insert(&mut self, key: CellKey, cell: Cell) {
        if cell.is_empty() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(key, cell);
        }
    }

    /// Neighbours joined to `key` by a link that both sides report
    pub fn connected_neighbors(&self, shape: &GridShape, key: CellKey) -> Vec<(Direction, CellKey)> {
        let Some(node) = self.travel_node(key) else {
            return Vec::new();
        };

        shape
            .adjacent_cells(key)
            .into_iter()
            .filter(|&(direction, neighbor)| {
                let Some(other) = self.travel_node(neighbor) else {
                    return false;
                };
                node.get(direction).is_connected() && other.get(direction.reverse()).is_connected()
            })
            .collect()
    }

    fn node_entry(&mut self, key: CellKey) -> &mut TravelNode {
        self.cells
            .entry(key)
            .or_default()
            .travel_node
            .get_or_insert_with(|| TravelNode::new().with_variant(variant_for(key)))
    }

    /// Drop `key` if it no longer holds an ability or any connection
    fn collect_if_unused(&mut self, key: CellKey) {
        if let Some(cell) = self.cells.get(&key) {
            if cell.ability.is_none() && !cell.has_connections() {
                self.cells.remove(&key);
            }
        }
    }

    /// Connect two adjacent cells, or disconnect them when `toggle` is set and
    /// they are already connected. Returns false when the cells are not adjacent.
    pub fn connect_cells(&mut self, shape: &GridShape, a: CellKey, b: CellKey, toggle: bool) -> bool {
        let Some(direction) = shape.direction_between(a, b) else {
            return false;
        };
        let reverse = direction.reverse();

        let already = self.travel_node(a).is_some_and(|n| n.get(direction).is_connected())
            && self.travel_node(b).is_some_and(|n| n.get(reverse).is_connected());

        if toggle && already {
            self.node_entry(a).set(direction, Strength::Unconnected);
            self.node_entry(b).set(reverse, Strength::Unconnected);
            self.collect_if_unused(a);
            self.collect_if_unused(b);
        } else {
            self.node_entry(a).set(direction, Strength::Connected);
            self.node_entry(b).set(reverse, Strength::Connected);
        }
        true
    }

    /// Connect each consecutive pair of a drawn path; returns links made
    pub fn connect_path(&mut self, shape: &GridShape, path: &[CellKey]) -> usize {
        path.windows(2)
            .filter(|pair| self.connect_cells(shape, pair[0], pair[1], false))
            .count()
    }

    /// Add a travel node without connections to an empty position
    pub fn add_empty_node(&mut self, shape: &GridShape, key: CellKey) -> bool {
        if !shape.contains(key) || self.travel_node(key).is_some() {
            return false;
        }
        self.node_entry(key);
        true
    }

    /// Unlink a cell from every neighbour and delete it
    pub fn remove_cell(&mut self, shape: &GridShape, key: CellKey) -> bool {
        if !self.cells.contains_key(&key) {
            return false;
        }

        // One-sided links into the removed cell are cleared too
        for (direction, neighbor) in shape.adjacent_cells(key) {
            let Some(node) = self.cells.get_mut(&neighbor).and_then(|c| c.travel_node.as_mut()) else {
                continue;
            };
            if node.get(direction.reverse()).is_connected() {
                node.set(direction.reverse(), Strength::Unconnected);
                self.collect_if_unused(neighbor);
            }
        }

        self.cells.remove(&key);
        true
    }

    /// Put `ability` on `key`, taking it off any cell it occupied before
    pub fn place_ability(&mut self, shape: &GridShape, key: CellKey, ability: AbilityId) -> bool {
        if !shape.contains(key) {
            return false;
        }
        self.remove_ability(shape, ability);
        self.cells.entry(key).or_default().ability = Some(ability);
        true
    }

    /// Take `ability` off the grid; its cell survives only if paths still use it
    pub fn remove_ability(&mut self, shape: &GridShape, ability: AbilityId) -> bool {
        let Some(key) = self.cell_of(ability) else {
            return false;
        };

        if self.travel_node(key).is_none() || self.connected_neighbors(shape, key).is_empty() {
            self.cells.remove(&key);
        } else if let Some(cell) = self.cells.get_mut(&key) {
            cell.ability = None;
        }
        true
    }

    /// Remove every path; ability cells keep their ability
    pub fn clear_paths(&mut self) {
        self.cells.retain(|_, cell| {
            cell.travel_node = None;
            cell.ability.is_some()
        });
    }

    /// Remove every ability; path cells keep their travel node
    pub fn clear_abilities(&mut self) {
        self.cells.retain(|_, cell| {
            cell.ability = None;
            cell.travel_node.is_some()
        });
    }

    /// Zero the links that only existed because rows wrapped
    pub fn strip_wrap_links(&mut self) {
        for (key, cell) in self.cells.iter_mut() {
            let Some(node) = cell.travel_node.as_mut() else {
                continue;
            };
            if key.column() == 1 {
                node.left = Strength::Unconnected;
            }
            if key.column() == COLUMNS {
                node.right = Strength::Unconnected;
            }
        }
    }

    /// Delete cells past the end of a shrunken grid
    pub fn retain_within(&mut self, shape: &GridShape) {
        let outside: Vec<CellKey> = self.keys().filter(|&k| !shape.contains(k)).collect();
        for key in outside {
            if let Some(up) = key.0.checked_sub(COLUMNS).map(CellKey) {
                if let Some(node) = self.cells.get_mut(&up).and_then(|c| c.travel_node.as_mut()) {
                    node.down = Strength::Unconnected;
                }
            }
            self.cells.remove(&key);
        }
    }

    /// Forget any ability reference for which `keep` is false
    pub fn retain_abilities(&mut self, keep: impl Fn(AbilityId) -> bool) {
        self.cells.retain(|_, cell| {
            if cell.ability.is_some_and(|id| !keep(id)) {
                cell.ability = None;
            }
            !cell.is_empty()
        });
    }
}
