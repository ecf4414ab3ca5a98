//! Live allocation state for one tree
//!
//! Abilities move from unvisited to the frontier when an allocated neighbour
//! exposes them, and from the frontier to allocated once their gates pass.
//! Blocking is one-way, so removing an allocation means replaying the
//! shortened commit log from scratch.

use std::collections::BTreeMap;

use ahash::AHashSet;

use super::map::PotentialAllocationMap;
use crate::ability::{AbilityBook, Archetypes};
use crate::core::types::{AbilityId, CellKey};
use crate::grid::TravelNode;

/// Read-only inputs the simulator consults
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    pub abilities: &'a AbilityBook,
    pub map: &'a PotentialAllocationMap,
    pub archetypes: &'a Archetypes,
    pub max_points: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentTree {
    allocated: AHashSet<AbilityId>,
    /// Frontier: unallocated ability → allocated abilities that expose it
    connected: BTreeMap<AbilityId, Vec<AbilityId>>,
    blocked: AHashSet<AbilityId>,
    archetypes: BTreeMap<String, u32>,
    ability_points: i32,
    /// Allocated path overlays, merged per cell
    travel_nodes: BTreeMap<CellKey, TravelNode>,
}

impl CurrentTree {
    /// Fresh state with only `start` on the frontier
    pub fn seeded(start: Option<AbilityId>, archetypes: &Archetypes) -> Self {
        let mut tree = Self {
            allocated: AHashSet::new(),
            connected: BTreeMap::new(),
            blocked: AHashSet::new(),
            archetypes: archetypes.iter().map(|name| (name.to_string(), 0)).collect(),
            ability_points: 0,
            travel_nodes: BTreeMap::new(),
        };
        if let Some(start) = start {
            tree.connected.insert(start, Vec::new());
        }
        tree
    }

    pub fn is_allocated(&self, id: AbilityId) -> bool {
        self.allocated.contains(&id)
    }

    pub fn is_blocked(&self, id: AbilityId) -> bool {
        self.blocked.contains(&id)
    }

    pub fn is_connected(&self, id: AbilityId) -> bool {
        self.connected.contains_key(&id)
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Allocated ids in ascending order
    pub fn allocated_ids(&self) -> Vec<AbilityId> {
        let mut ids: Vec<AbilityId> = self.allocated.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn blocked_ids(&self) -> Vec<AbilityId> {
        let mut ids: Vec<AbilityId> = self.blocked.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn connected(&self) -> &BTreeMap<AbilityId, Vec<AbilityId>> {
        &self.connected
    }

    pub fn ability_points(&self) -> i32 {
        self.ability_points
    }

    pub fn archetype_count(&self, archetype: &str) -> u32 {
        self.archetypes.get(archetype).copied().unwrap_or(0)
    }

    pub fn archetype_counts(&self) -> &BTreeMap<String, u32> {
        &self.archetypes
    }

    pub fn travel_nodes(&self) -> &BTreeMap<CellKey, TravelNode> {
        &self.travel_nodes
    }

    pub fn is_allocatable(&self, ctx: &AllocationContext<'_>, id: AbilityId) -> bool {
        let Some(ability) = ctx.abilities.get(id) else {
            return false;
        };

        if self.is_blocked(id) {
            return false;
        }
        if !ability.is_neutral()
            && self.archetype_count(&ability.archetype) < ability.archetype_points_required
        {
            return false;
        }
        if ability.requires.is_some_and(|r| !self.is_allocated(r)) {
            return false;
        }

        let remaining = ctx.max_points - self.ability_points;
        self.is_connected(id) && remaining >= ability.points_required
    }

    /// Frontier ids that pass every gate right now
    pub fn allocatable_nodes(&self, ctx: &AllocationContext<'_>) -> Vec<AbilityId> {
        self.connected
            .keys()
            .copied()
            .filter(|&id| self.is_allocatable(ctx, id))
            .collect()
    }

    /// Allocate without checking gates; callers check `is_allocatable` first
    pub fn allocate(&mut self, ctx: &AllocationContext<'_>, id: AbilityId) {
        let Some(ability) = ctx.abilities.get(id) else {
            return;
        };

        self.blocked.extend(ability.unlocking_will_block.iter().copied());
        if let Some(count) = self.archetypes.get_mut(&ability.archetype) {
            *count += 1;
        }
        self.ability_points += ability.points_required;
        self.allocated.insert(id);

        for parent in self.connected.remove(&id).unwrap_or_default() {
            self.merge_path(ctx.map, parent, id);
        }

        let children: Vec<AbilityId> = ctx.map.children(id).collect();
        for child in children {
            if self.is_allocated(child) {
                self.merge_path(ctx.map, id, child);
            } else {
                let parents = self.connected.entry(child).or_default();
                if !parents.contains(&id) {
                    parents.push(id);
                }
            }
        }
    }

    fn merge_path(&mut self, map: &PotentialAllocationMap, parent: AbilityId, child: AbilityId) {
        let Some(path) = map.path(parent, child) else {
            return;
        };
        for (&cell, node) in path {
            self.travel_nodes
                .entry(cell)
                .and_modify(|existing| existing.merge(node))
                .or_insert(*node);
        }
    }
}

/// Rebuild the state from `start` by allocating committed ids in passes until
/// a pass makes no progress. Returns the state and the ids actually reached,
/// in allocation order; committed ids that were never reached are dropped.
pub fn replay(
    ctx: &AllocationContext<'_>,
    start: Option<AbilityId>,
    committed: &[AbilityId],
) -> (CurrentTree, Vec<AbilityId>) {
    let mut tree = CurrentTree::seeded(start, ctx.archetypes);
    let mut pending: AHashSet<AbilityId> = committed.iter().copied().collect();
    let mut order = Vec::with_capacity(pending.len());

    let mut passes = 0;
    loop {
        passes += 1;
        let candidates: Vec<AbilityId> = tree
            .connected
            .keys()
            .copied()
            .filter(|id| pending.contains(id))
            .collect();

        let mut progressed = false;
        for id in candidates {
            if tree.is_allocatable(ctx, id) {
                tree.allocate(ctx, id);
                pending.remove(&id);
                order.push(id);
                progressed = true;
            }
        }

        if !progressed {
            break;
        }
    }

    tracing::debug!(
        "Replayed {} of {} committed abilities in {} passes",
        order.len(),
        committed.len(),
        passes
    );

    (tree, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;
    use crate::allocation::map::{compile_allocation_map, TraversalRules};
    use crate::grid::{CellMap, GridShape, Strength};

    const RULES: TraversalRules = TraversalRules { traversable_up: false, strict_allocation: true };

    struct Fixture {
        abilities: AbilityBook,
        archetypes: Archetypes,
        map: PotentialAllocationMap,
        cells: CellMap,
    }

    impl Fixture {
        /// Abilities in a row, each placed on cell `index + 1`, all linked
        fn row(abilities: Vec<Ability>) -> Self {
            let shape = GridShape::new(6, false);
            let mut book = AbilityBook::new();
            let mut cells = CellMap::new();
            let mut keys = Vec::new();
            for (i, ability) in abilities.into_iter().enumerate() {
                let id = book.add(ability);
                let key = CellKey(i as u32 + 1);
                cells.place_ability(&shape, key, id);
                keys.push(key);
            }
            cells.connect_path(&shape, &keys);
            let map = compile_allocation_map(&cells, &shape, RULES);
            Self { abilities: book, archetypes: Archetypes::new(), map, cells }
        }

        fn ctx(&self, max_points: i32) -> AllocationContext<'_> {
            AllocationContext {
                abilities: &self.abilities,
                map: &self.map,
                archetypes: &self.archetypes,
                max_points,
            }
        }
    }

    #[test]
    fn test_seeded_frontier_holds_start() {
        let tree = CurrentTree::seeded(Some(AbilityId(1)), &Archetypes::new());
        assert_eq!(tree.connected().get(&AbilityId(1)), Some(&Vec::new()));
        assert_eq!(tree.ability_points(), 0);
    }

    #[test]
    fn test_allocate_exposes_neighbors() {
        let fx = Fixture::row(vec![Ability::new("A", 1), Ability::new("B", 1).requiring(AbilityId(1))]);
        let ctx = fx.ctx(5);
        let (a, b) = (AbilityId(1), AbilityId(2));

        let mut tree = CurrentTree::seeded(Some(a), &fx.archetypes);
        assert!(!tree.is_allocatable(&ctx, b));
        assert!(tree.is_allocatable(&ctx, a));

        tree.allocate(&ctx, a);
        assert_eq!(tree.allocated_ids(), vec![a]);
        assert_eq!(tree.ability_points(), 1);
        assert_eq!(tree.connected().get(&b), Some(&vec![a]));
        assert!(tree.is_allocatable(&ctx, b));

        tree.allocate(&ctx, b);
        assert!(tree.is_allocated(b));
        assert!(tree.connected().is_empty());
        assert_eq!(tree.travel_nodes()[&CellKey(1)].right, Strength::Allocated);
        assert_eq!(tree.travel_nodes()[&CellKey(2)].left, Strength::Allocated);
    }

    #[test]
    fn test_budget_gate() {
        let fx = Fixture::row(vec![Ability::new("A", 3), Ability::new("B", 3)]);
        let ctx = fx.ctx(5);
        let mut tree = CurrentTree::seeded(Some(AbilityId(1)), &fx.archetypes);
        tree.allocate(&ctx, AbilityId(1));
        assert!(!tree.is_allocatable(&ctx, AbilityId(2)));
        assert!(tree.is_allocatable(&fx.ctx(6), AbilityId(2)));
    }

    #[test]
    fn test_blocking_is_permanent() {
        let fx = Fixture::row(vec![
            Ability::new("A", 1).blocking([AbilityId(3)]),
            Ability::new("B", 1),
            Ability::new("C", 1),
        ]);
        let ctx = fx.ctx(10);
        let mut tree = CurrentTree::seeded(Some(AbilityId(1)), &fx.archetypes);
        tree.allocate(&ctx, AbilityId(1));
        tree.allocate(&ctx, AbilityId(2));
        assert!(tree.is_connected(AbilityId(3)));
        assert!(tree.is_blocked(AbilityId(3)));
        assert!(!tree.is_allocatable(&ctx, AbilityId(3)));
    }

    #[test]
    fn test_blocking_self_has_no_effect_on_allocation() {
        let fx = Fixture::row(vec![Ability::new("A", 1).blocking([AbilityId(1)])]);
        let ctx = fx.ctx(10);
        let mut tree = CurrentTree::seeded(Some(AbilityId(1)), &fx.archetypes);
        tree.allocate(&ctx, AbilityId(1));
        assert!(tree.is_allocated(AbilityId(1)));
        assert!(tree.is_blocked(AbilityId(1)));
    }

    #[test]
    fn test_archetype_gate() {
        let mut fx = Fixture::row(vec![
            Ability::new("A", 1).with_archetype("Fire", 0),
            Ability::new("B", 1).with_archetype("Fire", 1),
            Ability::new("C", 1).with_archetype("Fire", 3),
        ]);
        fx.archetypes.add("Fire");
        let ctx = fx.ctx(10);

        let mut tree = CurrentTree::seeded(Some(AbilityId(1)), &fx.archetypes);
        tree.allocate(&ctx, AbilityId(1));
        assert_eq!(tree.archetype_count("Fire"), 1);
        assert!(tree.is_allocatable(&ctx, AbilityId(2)));
        tree.allocate(&ctx, AbilityId(2));
        assert!(!tree.is_allocatable(&ctx, AbilityId(3)));
    }

    #[test]
    fn test_unlisted_archetype_never_counts() {
        let fx = Fixture::row(vec![
            Ability::new("A", 1).with_archetype("Ghost", 0),
            Ability::new("B", 1).with_archetype("Ghost", 1),
        ]);
        let ctx = fx.ctx(10);
        let mut tree = CurrentTree::seeded(Some(AbilityId(1)), &fx.archetypes);
        tree.allocate(&ctx, AbilityId(1));
        assert_eq!(tree.archetype_count("Ghost"), 0);
        assert!(tree.archetype_counts().is_empty());
        assert!(!tree.is_allocatable(&ctx, AbilityId(2)));
    }

    #[test]
    fn test_replay_reaches_committed_in_order() {
        let fx = Fixture::row(vec![Ability::new("A", 1), Ability::new("B", 1), Ability::new("C", 1)]);
        let ctx = fx.ctx(10);
        // Committed out of reach order: C before B
        let (tree, order) = replay(&ctx, Some(AbilityId(1)), &[AbilityId(1), AbilityId(3), AbilityId(2)]);
        assert_eq!(order, vec![AbilityId(1), AbilityId(2), AbilityId(3)]);
        assert_eq!(tree.ability_points(), 3);
    }

    #[test]
    fn test_replay_drops_unreachable() {
        let fx = Fixture::row(vec![Ability::new("A", 1), Ability::new("B", 1)]);
        let ctx = fx.ctx(10);
        let (tree, order) = replay(&ctx, Some(AbilityId(1)), &[AbilityId(2), AbilityId(9)]);
        assert!(order.is_empty());
        assert_eq!(tree.allocated_count(), 0);
    }

    #[test]
    fn test_replay_rechecks_budget_within_pass() {
        // A exposes B and C at once; only one of them fits the budget
        let shape = GridShape::new(6, false);
        let mut book = AbilityBook::new();
        let a = book.add(Ability::new("A", 1));
        let b = book.add(Ability::new("B", 2));
        let c = book.add(Ability::new("C", 2));
        let mut cells = CellMap::new();
        cells.place_ability(&shape, CellKey(2), a);
        cells.place_ability(&shape, CellKey(1), b);
        cells.place_ability(&shape, CellKey(3), c);
        cells.connect_path(&shape, &[CellKey(1), CellKey(2), CellKey(3)]);
        let map = compile_allocation_map(&cells, &shape, RULES);
        let archetypes = Archetypes::new();
        let ctx = AllocationContext { abilities: &book, map: &map, archetypes: &archetypes, max_points: 3 };

        let (tree, order) = replay(&ctx, Some(a), &[a, b, c]);
        assert_eq!(order, vec![a, b]);
        assert_eq!(tree.ability_points(), 3);
    }

    #[test]
    fn test_overlay_does_not_touch_grid() {
        let fx = Fixture::row(vec![Ability::new("A", 1), Ability::new("B", 1)]);
        let ctx = fx.ctx(10);
        let (tree, _) = replay(&ctx, Some(AbilityId(1)), &[AbilityId(1), AbilityId(2)]);
        assert_eq!(tree.travel_nodes()[&CellKey(1)].right, Strength::Allocated);
        assert_eq!(fx.cells.travel_node(CellKey(1)).unwrap().right, Strength::Connected);
    }
}
