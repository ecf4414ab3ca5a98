//! Potential allocation map compilation
//!
//! A multi-source breadth-first search runs from every ability cell at once.
//! Each source spreads outwards through path cells one distance ring at a
//! time; the first arrival of a source at a cell fixes its distance there.
//! Whenever a source's frontier touches another ability, the path back to
//! the source is reconstructed from recorded parent links and stored as a
//! set of travel-node overlays with the traversed sides marked allocated.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::core::types::{AbilityId, CellKey};
use crate::grid::{CellMap, Direction, GridShape, Strength, TravelNode};

/// Per-cell overlays describing one path between two abilities
pub type PathOverlay = BTreeMap<CellKey, TravelNode>;

/// Traversal rules the compiler honours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalRules {
    /// Whether paths may leave a cell upwards
    pub traversable_up: bool,
    /// Whether a downward hop forbids a following sideways hop
    pub strict_allocation: bool,
}

/// parent ability → child ability → shortest path overlay
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PotentialAllocationMap {
    edges: BTreeMap<AbilityId, BTreeMap<AbilityId, PathOverlay>>,
}

impl PotentialAllocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of directed parent → child edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn contains(&self, parent: AbilityId, child: AbilityId) -> bool {
        self.path(parent, child).is_some()
    }

    pub fn path(&self, parent: AbilityId, child: AbilityId) -> Option<&PathOverlay> {
        self.edges.get(&parent).and_then(|children| children.get(&child))
    }

    /// Abilities reachable from `parent`, in id order
    pub fn children(&self, parent: AbilityId) -> impl Iterator<Item = AbilityId> + '_ {
        self.edges
            .get(&parent)
            .into_iter()
            .flat_map(|children| children.keys().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, AbilityId, &PathOverlay)> {
        self.edges.iter().flat_map(|(&parent, children)| {
            children.iter().map(move |(&child, path)| (parent, child, path))
        })
    }

    fn insert(&mut self, parent: AbilityId, child: AbilityId, path: PathOverlay) {
        self.edges.entry(parent).or_default().insert(child, path);
    }
}

/// BFS bookkeeping for one (cell, source ability) pair
#[derive(Debug, Clone, Copy)]
struct Visit {
    distance: u32,
    /// Set after a strict downward hop: no sideways hop may follow
    restrict_sides: bool,
    /// Cell this one was entered from, and the hop direction taken
    parent: Option<(CellKey, Direction)>,
}

type VisitKey = (CellKey, AbilityId);

/// Compile the shortest path between every pair of mutually reachable abilities
pub fn compile_allocation_map(
    cells: &CellMap,
    shape: &GridShape,
    rules: TraversalRules,
) -> PotentialAllocationMap {
    let mut map = PotentialAllocationMap::new();

    // Outgoing edges; without upward travel a cell can still be entered from
    // below through its neighbour's own downward edge.
    let outgoing: AHashMap<CellKey, Vec<(Direction, CellKey)>> = cells
        .keys()
        .map(|key| {
            let mut links = cells.connected_neighbors(shape, key);
            if !rules.traversable_up {
                links.retain(|&(d, _)| d != Direction::Up);
            }
            (key, links)
        })
        .collect();

    let mut visits: AHashMap<VisitKey, Visit> = AHashMap::new();
    let mut ring: Vec<VisitKey> = Vec::new();

    for (key, cell) in cells.iter() {
        if let Some(source) = cell.ability {
            visits.insert(
                (key, source),
                Visit { distance: 0, restrict_sides: false, parent: None },
            );
            ring.push((key, source));
        }
    }

    let mut rings = 0;
    while !ring.is_empty() {
        let mut next: Vec<VisitKey> = Vec::new();

        for &(key, source) in &ring {
            let visit = visits[&(key, source)];
            let Some(links) = outgoing.get(&key) else {
                continue;
            };

            for &(direction, neighbor) in links {
                if visit.restrict_sides && direction.is_lateral() {
                    continue;
                }

                match cells.ability_at(neighbor) {
                    None => {
                        visits.entry((neighbor, source)).or_insert_with(|| {
                            next.push((neighbor, source));
                            Visit {
                                distance: visit.distance + 1,
                                restrict_sides: direction == Direction::Down
                                    && rules.strict_allocation,
                                parent: Some((key, direction)),
                            }
                        });
                    }
                    Some(child) if child == source => {}
                    Some(child) => {
                        if !map.contains(source, child) {
                            let path = reconstruct_path(cells, &visits, source, key, direction, neighbor);
                            map.insert(source, child, path);
                        }
                    }
                }
            }
        }

        next.sort_unstable();
        ring = next;
        rings += 1;
    }

    tracing::debug!(
        "Compiled allocation map: {} edges from {} visits over {} rings",
        map.edge_count(),
        visits.len(),
        rings
    );

    map
}

/// Walk parent links from the cell that touched `target` back to the source
fn reconstruct_path(
    cells: &CellMap,
    visits: &AHashMap<VisitKey, Visit>,
    source: AbilityId,
    last: CellKey,
    final_hop: Direction,
    target: CellKey,
) -> PathOverlay {
    let mut path = PathOverlay::new();
    let base = |key: CellKey| cells.travel_node(key).copied().unwrap_or_default();

    let mut end = base(target);
    end.set(final_hop.reverse(), Strength::Allocated);
    path.insert(target, end);

    let mut key = last;
    let mut outgoing = final_hop;
    loop {
        let mut node = base(key);
        node.set(outgoing, Strength::Allocated);

        match visits.get(&(key, source)).and_then(|v| v.parent) {
            Some((parent, hop)) => {
                node.set(hop.reverse(), Strength::Allocated);
                path.insert(key, node);
                key = parent;
                outgoing = hop;
            }
            None => {
                path.insert(key, node);
                break;
            }
        }
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOSE: TraversalRules = TraversalRules { traversable_up: false, strict_allocation: false };
    const STRICT: TraversalRules = TraversalRules { traversable_up: false, strict_allocation: true };

    fn shape() -> GridShape {
        GridShape::new(6, false)
    }

    fn with_abilities(placements: &[(u32, u32)]) -> CellMap {
        let mut cells = CellMap::new();
        for &(key, id) in placements {
            cells.place_ability(&shape(), CellKey(key), AbilityId(id));
        }
        cells
    }

    fn path(cells: &mut CellMap, keys: &[u32]) {
        let keys: Vec<CellKey> = keys.iter().map(|&k| CellKey(k)).collect();
        cells.connect_path(&shape(), &keys);
    }

    #[test]
    fn test_adjacent_abilities_link_both_ways() {
        let mut cells = with_abilities(&[(1, 1), (2, 2)]);
        path(&mut cells, &[1, 2]);

        let map = compile_allocation_map(&cells, &shape(), LOOSE);
        assert!(map.contains(AbilityId(1), AbilityId(2)));
        assert!(map.contains(AbilityId(2), AbilityId(1)));

        let overlay = map.path(AbilityId(1), AbilityId(2)).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay[&CellKey(1)].right, Strength::Allocated);
        assert_eq!(overlay[&CellKey(2)].left, Strength::Allocated);
    }

    #[test]
    fn test_path_through_empty_cells_marked_allocated() {
        let mut cells = with_abilities(&[(1, 1), (19, 2)]);
        path(&mut cells, &[1, 10, 19]);

        let map = compile_allocation_map(&cells, &shape(), LOOSE);
        let overlay = map.path(AbilityId(1), AbilityId(2)).unwrap();
        assert_eq!(overlay.len(), 3);
        assert_eq!(overlay[&CellKey(1)].down, Strength::Allocated);
        assert_eq!(overlay[&CellKey(10)].up, Strength::Allocated);
        assert_eq!(overlay[&CellKey(10)].down, Strength::Allocated);
        assert_eq!(overlay[&CellKey(19)].up, Strength::Allocated);
    }

    #[test]
    fn test_upward_travel_disabled() {
        let mut cells = with_abilities(&[(1, 1), (19, 2)]);
        path(&mut cells, &[1, 10, 19]);

        let map = compile_allocation_map(&cells, &shape(), LOOSE);
        assert!(!map.contains(AbilityId(2), AbilityId(1)));

        let up = TraversalRules { traversable_up: true, strict_allocation: false };
        let map = compile_allocation_map(&cells, &shape(), up);
        assert!(map.contains(AbilityId(2), AbilityId(1)));
    }

    #[test]
    fn test_strict_allocation_forbids_down_then_side() {
        // 1 -> 10 (down) -> 11 (right) -> ability at 11
        let mut cells = with_abilities(&[(1, 1), (11, 2)]);
        path(&mut cells, &[1, 10, 11]);

        assert!(compile_allocation_map(&cells, &shape(), LOOSE).contains(AbilityId(1), AbilityId(2)));
        assert!(!compile_allocation_map(&cells, &shape(), STRICT).contains(AbilityId(1), AbilityId(2)));
    }

    #[test]
    fn test_strict_allows_side_then_down() {
        // 1 -> 2 (right) -> 11 (down)
        let mut cells = with_abilities(&[(1, 1), (11, 2)]);
        path(&mut cells, &[1, 2, 11]);
        assert!(compile_allocation_map(&cells, &shape(), STRICT).contains(AbilityId(1), AbilityId(2)));
    }

    #[test]
    fn test_abilities_stop_propagation() {
        let mut cells = with_abilities(&[(1, 1), (2, 2), (3, 3)]);
        path(&mut cells, &[1, 2, 3]);

        let map = compile_allocation_map(&cells, &shape(), LOOSE);
        assert!(map.contains(AbilityId(1), AbilityId(2)));
        assert!(map.contains(AbilityId(2), AbilityId(3)));
        assert!(!map.contains(AbilityId(1), AbilityId(3)));
    }

    #[test]
    fn test_shortest_of_two_routes() {
        // Long route 1-2-3-12-21-20-19, short route 1-10-19
        let mut cells = with_abilities(&[(1, 1), (19, 2)]);
        path(&mut cells, &[1, 2, 3, 12, 21, 20, 19]);
        path(&mut cells, &[1, 10, 19]);

        let map = compile_allocation_map(&cells, &shape(), LOOSE);
        let overlay = map.path(AbilityId(1), AbilityId(2)).unwrap();
        assert_eq!(overlay.len(), 3);
        assert!(overlay.contains_key(&CellKey(10)));
        // The untraversed side stays merely connected
        assert_eq!(overlay[&CellKey(1)].right, Strength::Connected);
    }

    #[test]
    fn test_self_loop_ignored() {
        let mut cells = with_abilities(&[(1, 1)]);
        path(&mut cells, &[1, 2, 11, 10, 1]);
        let up = TraversalRules { traversable_up: true, strict_allocation: false };
        assert!(compile_allocation_map(&cells, &shape(), up).is_empty());
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut cells = with_abilities(&[(1, 1), (5, 2), (23, 3), (40, 4)]);
        path(&mut cells, &[1, 2, 3, 4, 5, 14, 23, 22, 31, 40]);
        let a = compile_allocation_map(&cells, &shape(), STRICT);
        let b = compile_allocation_map(&cells, &shape(), STRICT);
        assert_eq!(a, b);
    }
}
