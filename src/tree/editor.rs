//! The editor engine
//!
//! `TreeEditor` owns the whole document plus everything derived from it: the
//! compiled allocation map, the live allocation state of the selected tree
//! and the undo history. Every mutation records a history entry and queues
//! `TreeEvent`s that a front end drains to decide what to redraw. Invalid
//! edits are ignored and reported through the return value only.

use crate::ability::{Ability, ARCHETYPE_POINTS_MAX, POINTS_REQUIRED_MAX, POINTS_REQUIRED_MIN};
use crate::allocation::{compile_allocation_map, replay, AllocationContext, CurrentTree, PotentialAllocationMap};
use crate::core::config::{config, EditorConfig};
use crate::core::error::Result;
use crate::core::types::{AbilityId, CellKey};
use crate::grid::GridShape;

use super::history::History;
use super::properties::Properties;
use super::snapshot::Snapshot;

/// Group tag shared by allocation changes so repeated clicks collapse
pub const ALLOCATION_GROUP: &str = "treeAllocation";

/// What changed, for whoever renders the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A whole document was loaded or restored from history
    Loaded,
    ModeChanged { edit_mode: bool },
    PropertiesChanged,
    ArchetypesChanged,
    AbilitiesChanged,
    GridChanged,
    AllocationChanged,
    TreesChanged,
    HistoryChanged,
}

pub struct TreeEditor {
    state: Snapshot,
    map: PotentialAllocationMap,
    current: CurrentTree,
    history: History,
    events: Vec<TreeEvent>,
}

impl Default for TreeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeEditor {
    /// Empty editor configured from the global config
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        let mut editor = Self {
            state: Snapshot::default(),
            map: PotentialAllocationMap::new(),
            current: CurrentTree::default(),
            history: History::new(config.max_history_states),
            events: Vec::new(),
        };
        editor.reset();
        editor
    }

    // === READ ACCESS ===

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn properties(&self) -> &Properties {
        &self.state.properties
    }

    pub fn allocation_map(&self) -> &PotentialAllocationMap {
        &self.map
    }

    pub fn current_tree(&self) -> &CurrentTree {
        &self.current
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_edit_mode(&self) -> bool {
        self.state.edit_mode
    }

    pub fn starting_ability(&self) -> Option<AbilityId> {
        self.state.starting_ability
    }

    pub fn selected_tree(&self) -> &str {
        self.state.trees.selected()
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    fn shape(&self) -> GridShape {
        self.state.properties.shape()
    }

    fn context(&self) -> AllocationContext<'_> {
        AllocationContext {
            abilities: &self.state.abilities,
            map: &self.map,
            archetypes: &self.state.archetypes,
            max_points: self.state.properties.max_ability_points,
        }
    }

    fn ability_name(&self, id: AbilityId) -> String {
        self.state
            .abilities
            .get(id)
            .map(Ability::plain_name)
            .unwrap_or_default()
    }

    fn page_of(&self, key: CellKey) -> u32 {
        key.row() / self.state.properties.rows_per_page.max(1) + 1
    }

    // === HISTORY ===

    fn save_state(&mut self, change: &str, group: &str, collapse: bool) {
        match self.state.to_json() {
            Ok(json) => {
                self.history.save(change, group, json, collapse);
                self.events.push(TreeEvent::HistoryChanged);
            }
            Err(e) => tracing::warn!("Could not record '{}': {}", change, e),
        }
    }

    /// Restore the snapshot at `index`; out-of-range indices are ignored
    pub fn load_state(&mut self, index: usize) -> bool {
        let Some(log) = self.history.move_to(index) else {
            return false;
        };
        let restored = match Snapshot::parse(&log.state) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("History entry {} is unreadable: {}", index, e);
                return false;
            }
        };

        self.state = restored;
        self.map = PotentialAllocationMap::new();
        self.current = CurrentTree::default();
        if !self.state.edit_mode {
            self.recompute_map();
            self.compile_current_tree();
        }
        self.events.push(TreeEvent::Loaded);
        self.events.push(TreeEvent::HistoryChanged);
        true
    }

    /// Move `step` entries through history: negative undoes, positive redoes
    pub fn load_state_relative(&mut self, step: isize) -> bool {
        match self.history.relative(step) {
            Some(index) if step != 0 => self.load_state(index),
            _ => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        self.load_state_relative(-1)
    }

    pub fn redo(&mut self) -> bool {
        self.load_state_relative(1)
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
        self.events.push(TreeEvent::HistoryChanged);
    }

    // === DOCUMENT ===

    /// Discard everything and start from an empty default document
    pub fn reset(&mut self) {
        self.state = Snapshot {
            edit_mode: true,
            ..Snapshot::default()
        };
        self.state.trees.ensure_selected();
        self.map = PotentialAllocationMap::new();
        self.current = CurrentTree::default();
        self.events.push(TreeEvent::Loaded);
        self.save_state("Reset tree and settings", "", false);
    }

    /// Replace the document with parsed JSON. On a parse failure the current
    /// document is left untouched. Allocation mode stored in the document is
    /// only honoured with `respect_edit_mode`.
    pub fn load_json(&mut self, text: &str, respect_edit_mode: bool) -> Result<()> {
        let snapshot = Snapshot::parse(text)?;
        self.load_document(snapshot, respect_edit_mode, "Loaded tree from JSON");
        Ok(())
    }

    /// Replace the document with a fetched preset, always in edit mode
    pub fn load_preset(&mut self, preset: Snapshot) {
        self.load_document(preset, false, "Loaded a custom tree");
    }

    fn load_document(&mut self, mut snapshot: Snapshot, respect_edit_mode: bool, change: &str) {
        if !respect_edit_mode {
            snapshot.edit_mode = true;
        }

        self.state = snapshot;
        self.map = PotentialAllocationMap::new();
        self.current = CurrentTree::default();
        self.ensure_starting_ability();
        self.state.trees.ensure_selected();

        if !self.state.edit_mode {
            self.recompute_map();
            self.compile_current_tree();
        }

        tracing::info!(
            "Loaded tree: {} abilities, {} cells, {} named trees",
            self.state.abilities.len(),
            self.state.cell_map.len(),
            self.state.trees.len()
        );

        self.events.push(TreeEvent::Loaded);
        self.save_state(change, "", false);
    }

    pub fn to_json(&self) -> Result<String> {
        self.state.to_json()
    }

    /// Apply new settings; grid data that no longer fits is cut away
    pub fn set_properties(&mut self, properties: Properties) {
        let properties = properties.clamped();
        let old = std::mem::replace(&mut self.state.properties, properties);

        if old.loop_tree != self.state.properties.loop_tree {
            self.state.cell_map.strip_wrap_links();
        }
        if self.state.properties.rows() < old.rows() {
            let shape = self.shape();
            self.state.cell_map.retain_within(&shape);
        }

        self.events.push(TreeEvent::PropertiesChanged);
        self.events.push(TreeEvent::GridChanged);
        self.refresh_allocation();
        self.save_state("Updated properties", "", false);
    }

    // === MODE & ALLOCATION ===

    /// Rebuild the potential allocation map from the grid
    pub fn recompute_map(&mut self) {
        let shape = self.shape();
        self.map = compile_allocation_map(
            &self.state.cell_map,
            &shape,
            self.state.properties.traversal_rules(),
        );
    }

    /// Switch between editing the grid and allocating abilities
    pub fn set_mode(&mut self, edit_mode: bool) {
        self.state.edit_mode = edit_mode;
        self.events.push(TreeEvent::ModeChanged { edit_mode });
        if !edit_mode {
            self.recompute_map();
            let selected = self.state.trees.selected().to_string();
            self.select_tree(&selected);
        }
    }

    /// Fall back to the lowest ability id when the starting ability is unset
    /// or no longer exists
    pub fn ensure_starting_ability(&mut self) {
        let valid = self
            .state
            .starting_ability
            .is_some_and(|id| self.state.abilities.contains(id));
        if !valid {
            self.state.starting_ability = self.state.abilities.first_id();
        }
    }

    /// Replay the selected tree's commit log into a fresh allocation state
    pub fn compile_current_tree(&mut self) {
        self.ensure_starting_ability();
        let (current, order) = replay(
            &self.context(),
            self.state.starting_ability,
            self.state.trees.selected_list(),
        );
        self.current = current;
        self.state.trees.set_selected_list(order);
        self.events.push(TreeEvent::AllocationChanged);
    }

    /// Recompile derived allocation state if it is being shown
    fn refresh_allocation(&mut self) {
        if !self.state.edit_mode {
            self.recompute_map();
            self.compile_current_tree();
        }
    }

    pub fn is_allocatable(&self, id: AbilityId) -> bool {
        self.current.is_allocatable(&self.context(), id)
    }

    pub fn allocatable_nodes(&self) -> Vec<AbilityId> {
        self.current.allocatable_nodes(&self.context())
    }

    /// Allocate a frontier ability; refused while editing the grid
    pub fn allocate_node(&mut self, id: AbilityId) -> bool {
        if self.state.edit_mode || !self.is_allocatable(id) {
            return false;
        }

        let ctx = AllocationContext {
            abilities: &self.state.abilities,
            map: &self.map,
            archetypes: &self.state.archetypes,
            max_points: self.state.properties.max_ability_points,
        };
        self.current.allocate(&ctx, id);
        self.state.trees.push_to_selected(id);

        self.events.push(TreeEvent::AllocationChanged);
        let change = format!("Reallocated nodes on '{}'", self.state.trees.selected());
        self.save_state(&change, ALLOCATION_GROUP, true);
        true
    }

    /// Remove an allocation by replaying the commit log without it
    pub fn deallocate_node(&mut self, id: AbilityId) -> bool {
        if self.state.edit_mode
            || !self.current.is_allocated(id)
            || !self.state.trees.remove_from_selected(id)
        {
            return false;
        }

        self.compile_current_tree();
        let change = format!("Reallocated nodes on '{}'", self.state.trees.selected());
        self.save_state(&change, ALLOCATION_GROUP, true);
        true
    }

    pub fn select_starting_ability(&mut self, id: AbilityId) -> bool {
        if !self.state.abilities.contains(id) {
            return false;
        }

        self.state.starting_ability = Some(id);
        self.compile_current_tree();
        let change = format!("Made {} the starting ability", self.ability_name(id));
        self.save_state(&change, "", false);
        true
    }

    // === NAMED TREES ===

    pub fn select_tree(&mut self, name: &str) -> bool {
        if !self.state.trees.select(name) {
            return false;
        }

        self.compile_current_tree();
        self.events.push(TreeEvent::TreesChanged);
        let change = format!("Selected '{}' tree for allocation", name);
        self.save_state(&change, name, true);
        true
    }

    /// Add an empty tree and select it; returns the name used
    pub fn add_tree(&mut self, name: &str) -> Option<String> {
        let name = self.state.trees.add(name)?;
        self.events.push(TreeEvent::TreesChanged);
        self.save_state(&format!("Added tree: {}", name), "", false);
        self.select_tree(&name);
        Some(name)
    }

    pub fn rename_tree(&mut self, old: &str, new: &str) -> Option<String> {
        let name = self.state.trees.rename(old, new)?;
        self.events.push(TreeEvent::TreesChanged);
        self.save_state(&format!("Renamed tree: {} -> {}", old, name), "", false);
        Some(name)
    }

    pub fn delete_tree(&mut self, name: &str) -> bool {
        let was_selected = self.state.trees.selected() == name;
        if !self.state.trees.delete(name) {
            return false;
        }

        if was_selected {
            self.compile_current_tree();
        }
        self.events.push(TreeEvent::TreesChanged);
        self.save_state(&format!("Deleted tree: {}", name), "", false);
        true
    }

    // === ARCHETYPES ===

    pub fn add_archetype(&mut self, name: &str) -> bool {
        if !self.state.archetypes.add(name) {
            return false;
        }
        self.events.push(TreeEvent::ArchetypesChanged);
        self.refresh_allocation();
        self.save_state(&format!("Added archetype: {}", name), "", false);
        true
    }

    /// Rename an archetype and retag every ability carrying it
    pub fn rename_archetype(&mut self, old: &str, new: &str) -> bool {
        if !self.state.archetypes.rename(old, new) {
            return false;
        }
        self.state.abilities.retag_archetype(old, new);

        self.events.push(TreeEvent::ArchetypesChanged);
        self.events.push(TreeEvent::AbilitiesChanged);
        self.refresh_allocation();
        self.save_state(&format!("Renamed archetype: {} -> {}", old, new), "", false);
        true
    }

    /// Delete an archetype; its abilities become neutral
    pub fn delete_archetype(&mut self, name: &str) -> bool {
        if !self.state.archetypes.remove(name) {
            return false;
        }
        self.state.abilities.retag_archetype(name, "");

        self.events.push(TreeEvent::ArchetypesChanged);
        self.events.push(TreeEvent::AbilitiesChanged);
        self.refresh_allocation();
        self.save_state(&format!("Deleted archetype: {}", name), "", false);
        true
    }

    // === ABILITIES ===

    fn normalized(mut ability: Ability) -> Ability {
        ability.points_required = ability
            .points_required
            .clamp(POINTS_REQUIRED_MIN, POINTS_REQUIRED_MAX);
        ability.archetype_points_required = ability.archetype_points_required.min(ARCHETYPE_POINTS_MAX);
        ability
    }

    pub fn add_ability(&mut self, ability: Ability) -> AbilityId {
        let id = self.state.abilities.add(Self::normalized(ability));
        self.state.abilities.prune_dangling();
        self.ensure_starting_ability();

        self.events.push(TreeEvent::AbilitiesChanged);
        self.refresh_allocation();
        let change = format!("Added ability: {}", self.ability_name(id));
        self.save_state(&change, "", false);
        id
    }

    pub fn edit_ability(&mut self, id: AbilityId, ability: Ability) -> bool {
        let Some(old) = self.state.abilities.edit(id, Self::normalized(ability)) else {
            return false;
        };
        self.state.abilities.prune_dangling();

        self.events.push(TreeEvent::AbilitiesChanged);
        self.refresh_allocation();
        let change = format!("Edited ability: {} -> {}", old.plain_name(), self.ability_name(id));
        self.save_state(&change, "", false);
        true
    }

    pub fn clone_ability(&mut self, id: AbilityId) -> Option<AbilityId> {
        let copy = self.state.abilities.clone_ability(id)?;
        self.events.push(TreeEvent::AbilitiesChanged);
        let change = format!("Copied ability: {}", self.ability_name(copy));
        self.save_state(&change, "", false);
        Some(copy)
    }

    /// Delete an ability along with its placement, commit-log entries and
    /// every reference to it
    pub fn delete_ability(&mut self, id: AbilityId) -> bool {
        let Some(removed) = self.state.abilities.remove(id) else {
            return false;
        };
        let shape = self.shape();
        self.state.cell_map.remove_ability(&shape, id);
        self.state.trees.strip_ability(id);
        self.ensure_starting_ability();

        self.events.push(TreeEvent::AbilitiesChanged);
        self.events.push(TreeEvent::GridChanged);
        self.refresh_allocation();
        self.save_state(&format!("Deleted ability: {}", removed.plain_name()), "", false);
        true
    }

    // === GRID ===

    fn grid_changed(&mut self, change: &str) {
        self.events.push(TreeEvent::GridChanged);
        self.refresh_allocation();
        self.save_state(change, "", false);
    }

    fn connection_change(count: usize) -> String {
        if count == 1 {
            "Changed 1 tree node connection".to_string()
        } else {
            format!("Changed {} tree node connections", count)
        }
    }

    /// Connect two adjacent cells, or disconnect them if already connected
    pub fn connect_cells(&mut self, a: CellKey, b: CellKey) -> bool {
        let shape = self.shape();
        if !shape.contains(a) || !shape.contains(b) {
            return false;
        }
        if !self.state.cell_map.connect_cells(&shape, a, b, true) {
            return false;
        }
        self.grid_changed(&Self::connection_change(1));
        true
    }

    /// Connect each consecutive pair along a drawn path
    pub fn connect_path(&mut self, path: &[CellKey]) -> usize {
        let shape = self.shape();
        if path.iter().any(|&key| !shape.contains(key)) {
            return 0;
        }
        let count = self.state.cell_map.connect_path(&shape, path);
        if count > 0 {
            self.grid_changed(&Self::connection_change(count));
        }
        count
    }

    pub fn add_empty_node(&mut self, key: CellKey) -> bool {
        let shape = self.shape();
        if self.state.cell_map.get(key).is_some() || !self.state.cell_map.add_empty_node(&shape, key) {
            return false;
        }
        let change = format!("Added empty tree node on page {}", self.page_of(key));
        self.grid_changed(&change);
        true
    }

    pub fn remove_cell(&mut self, key: CellKey) -> bool {
        let shape = self.shape();
        if !self.state.cell_map.remove_cell(&shape, key) {
            return false;
        }
        let change = format!("Removed 1 tree node on page {}", self.page_of(key));
        self.grid_changed(&change);
        true
    }

    pub fn place_ability(&mut self, key: CellKey, id: AbilityId) -> bool {
        if !self.state.abilities.contains(id) || self.state.cell_map.ability_at(key).is_some() {
            return false;
        }
        let shape = self.shape();
        if !self.state.cell_map.place_ability(&shape, key, id) {
            return false;
        }
        let change = format!("Positioned {} on tree", self.ability_name(id));
        self.grid_changed(&change);
        true
    }

    pub fn remove_ability_from_tree(&mut self, id: AbilityId) -> bool {
        let shape = self.shape();
        if !self.state.cell_map.remove_ability(&shape, id) {
            return false;
        }
        let change = format!("Removed {} from tree", self.ability_name(id));
        self.grid_changed(&change);
        true
    }

    pub fn clear_paths(&mut self) {
        self.state.cell_map.clear_paths();
        self.grid_changed("Removed all paths from the tree");
    }

    pub fn clear_abilities(&mut self) {
        self.state.cell_map.clear_abilities();
        self.grid_changed("Removed all abilities from the tree");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> TreeEditor {
        TreeEditor::with_config(&EditorConfig::default())
    }

    /// A at cell 1, B at cell 2 requiring A, linked left to right
    fn two_cell_editor() -> (TreeEditor, AbilityId, AbilityId) {
        let mut ed = editor();
        let a = ed.add_ability(Ability::new("A", 1));
        let b = ed.add_ability(Ability::new("B", 1).requiring(a));
        ed.place_ability(CellKey(1), a);
        ed.place_ability(CellKey(2), b);
        ed.connect_cells(CellKey(1), CellKey(2));
        (ed, a, b)
    }

    #[test]
    fn test_new_editor_has_default_tree() {
        let ed = editor();
        assert_eq!(ed.selected_tree(), "Default");
        assert!(ed.is_edit_mode());
        assert_eq!(ed.history().len(), 1);
        assert_eq!(ed.history().current().unwrap().change, "Reset tree and settings");
    }

    #[test]
    fn test_allocation_flow() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        assert_eq!(ed.starting_ability(), Some(a));
        assert!(ed.current_tree().is_connected(a));

        assert!(!ed.allocate_node(b));
        assert!(ed.allocate_node(a));
        assert!(ed.allocate_node(b));
        assert_eq!(ed.current_tree().ability_points(), 2);
        assert_eq!(ed.snapshot().trees.selected_list(), &[a, b]);

        assert!(ed.deallocate_node(b));
        assert_eq!(ed.current_tree().ability_points(), 1);
        assert_eq!(ed.snapshot().trees.selected_list(), &[a]);
    }

    #[test]
    fn test_allocations_collapse_in_history() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        let before = ed.history().len();
        ed.allocate_node(a);
        ed.allocate_node(b);
        ed.deallocate_node(b);
        assert_eq!(ed.history().len(), before + 1);
        assert_eq!(ed.history().current().unwrap().change, "Reallocated nodes on 'Default'");
    }

    #[test]
    fn test_deallocate_start_drops_dependents() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);
        ed.allocate_node(b);
        assert!(ed.deallocate_node(a));
        assert_eq!(ed.current_tree().allocated_count(), 0);
        assert!(ed.snapshot().trees.selected_list().is_empty());
    }

    #[test]
    fn test_undo_redo() {
        let mut ed = editor();
        ed.add_archetype("Fire");
        ed.add_archetype("Ice");
        assert!(ed.undo());
        assert!(!ed.snapshot().archetypes.contains("Ice"));
        assert!(ed.redo());
        assert!(ed.snapshot().archetypes.contains("Ice"));
        assert!(!ed.redo());
    }

    #[test]
    fn test_undo_into_allocation_mode_recompiles() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);
        ed.set_mode(true);
        ed.add_archetype("Fire");
        assert!(ed.undo());
        assert!(!ed.is_edit_mode());
        assert!(ed.current_tree().is_allocated(a));
        assert!(ed.is_allocatable(b));
    }

    #[test]
    fn test_allocation_refused_in_edit_mode() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        assert!(ed.allocate_node(a));
        ed.set_mode(true);
        assert!(ed.connect_cells(CellKey(1), CellKey(2)));
        let history_len = ed.history().len();

        assert!(!ed.allocate_node(b));
        assert!(!ed.deallocate_node(a));
        assert_eq!(ed.snapshot().trees.selected_list(), &[a]);
        assert_eq!(ed.history().len(), history_len);

        // Back in allocation mode the cut link is honoured
        ed.set_mode(false);
        assert!(ed.current_tree().is_allocated(a));
        assert!(!ed.is_allocatable(b));
    }

    #[test]
    fn test_undo_into_edit_mode_clears_allocation() {
        let (mut ed, a, _) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);
        assert!(ed.load_state(0));
        assert!(ed.is_edit_mode());
        assert_eq!(ed.current_tree().allocated_count(), 0);
        assert!(ed.current_tree().connected().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let (mut ed, _, _) = two_cell_editor();
        let before = ed.to_json().unwrap();
        assert!(ed.load_json("{{{", true).is_err());
        assert_eq!(ed.to_json().unwrap(), before);
    }

    #[test]
    fn test_load_round_trip() {
        let (mut ed, a, _) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);
        let json = ed.to_json().unwrap();

        let mut other = editor();
        other.load_json(&json, true).unwrap();
        assert!(!other.is_edit_mode());
        assert!(other.current_tree().is_allocated(a));

        let mut edit = editor();
        edit.load_json(&json, false).unwrap();
        assert!(edit.is_edit_mode());
    }

    #[test]
    fn test_rename_archetype_cascades() {
        let mut ed = editor();
        ed.add_archetype("Fire");
        let id = ed.add_ability(Ability::new("A", 1).with_archetype("Fire", 0));
        assert!(ed.rename_archetype("Fire", "Flame"));
        assert_eq!(ed.snapshot().abilities.get(id).unwrap().archetype, "Flame");
        assert!(ed.delete_archetype("Flame"));
        assert!(ed.snapshot().abilities.get(id).unwrap().is_neutral());
        assert_eq!(ed.history().current().unwrap().change, "Deleted archetype: Flame");
    }

    #[test]
    fn test_delete_ability_cleans_everywhere() {
        let (mut ed, a, b) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);
        assert!(ed.delete_ability(a));
        assert_eq!(ed.starting_ability(), Some(b));
        assert_eq!(ed.snapshot().cell_map.cell_of(a), None);
        assert!(ed.snapshot().trees.selected_list().is_empty());
        assert_eq!(ed.snapshot().abilities.get(b).unwrap().requires, None);
    }

    #[test]
    fn test_invalid_grid_edits_ignored() {
        let mut ed = editor();
        let before = ed.history().len();
        assert!(!ed.connect_cells(CellKey(1), CellKey(3)));
        assert!(!ed.place_ability(CellKey(1), AbilityId(42)));
        assert!(!ed.remove_cell(CellKey(5)));
        assert_eq!(ed.history().len(), before);
    }

    #[test]
    fn test_grid_history_messages() {
        let mut ed = editor();
        ed.connect_path(&[CellKey(1), CellKey(2), CellKey(3)]);
        assert_eq!(ed.history().current().unwrap().change, "Changed 2 tree node connections");
        ed.add_empty_node(CellKey(60));
        assert_eq!(ed.history().current().unwrap().change, "Added empty tree node on page 2");
    }

    #[test]
    fn test_shrinking_grid_drops_cells() {
        let mut ed = editor();
        ed.add_empty_node(CellKey(300));
        let props = Properties { pages: 1, ..ed.properties().clone() };
        ed.set_properties(props);
        assert!(ed.snapshot().cell_map.get(CellKey(300)).is_none());
        assert_eq!(ed.history().current().unwrap().change, "Updated properties");
    }

    #[test]
    fn test_tree_management() {
        let (mut ed, a, _) = two_cell_editor();
        ed.set_mode(false);
        ed.allocate_node(a);

        assert_eq!(ed.add_tree("Default").as_deref(), Some("Default(1)"));
        assert_eq!(ed.selected_tree(), "Default(1)");
        assert_eq!(ed.current_tree().allocated_count(), 0);

        assert!(ed.select_tree("Default"));
        assert!(ed.current_tree().is_allocated(a));

        assert_eq!(ed.rename_tree("Default", "Main").as_deref(), Some("Main"));
        assert_eq!(ed.selected_tree(), "Main");
        assert!(ed.delete_tree("Main"));
        assert_eq!(ed.selected_tree(), "Default(1)");
    }

    #[test]
    fn test_events_drained() {
        let mut ed = editor();
        ed.drain_events();
        ed.add_archetype("Fire");
        let events = ed.drain_events();
        assert!(events.contains(&TreeEvent::ArchetypesChanged));
        assert!(events.contains(&TreeEvent::HistoryChanged));
        assert!(ed.drain_events().is_empty());
    }
}
