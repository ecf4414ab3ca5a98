//! Per-cell path connections

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// Number of cosmetic rendering variants a travel node can pick from
pub const VARIANT_COUNT: u8 = 4;

/// Connection strength on one side of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Strength {
    #[default]
    Unconnected,
    Connected,
    /// Part of an allocated path
    Allocated,
}

impl Strength {
    pub fn is_connected(self) -> bool {
        self != Self::Unconnected
    }
}

impl From<u8> for Strength {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Unconnected,
            1 => Self::Connected,
            _ => Self::Allocated,
        }
    }
}

impl From<Strength> for u8 {
    fn from(value: Strength) -> Self {
        match value {
            Strength::Unconnected => 0,
            Strength::Connected => 1,
            Strength::Allocated => 2,
        }
    }
}

/// Which sides of a cell connect to its neighbours, and how strongly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelNode {
    pub up: Strength,
    pub down: Strength,
    pub left: Strength,
    pub right: Strength,
    /// Rendering variant in `1..=VARIANT_COUNT`
    pub variant: u8,
}

impl Default for TravelNode {
    fn default() -> Self {
        Self {
            up: Strength::Unconnected,
            down: Strength::Unconnected,
            left: Strength::Unconnected,
            right: Strength::Unconnected,
            variant: 1,
        }
    }
}

impl TravelNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: u8) -> Self {
        self.variant = variant.clamp(1, VARIANT_COUNT);
        self
    }

    pub fn get(&self, direction: Direction) -> Strength {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: Direction, strength: Strength) {
        match direction {
            Direction::Up => self.up = strength,
            Direction::Down => self.down = strength,
            Direction::Left => self.left = strength,
            Direction::Right => self.right = strength,
        }
    }

    /// Per-direction maximum of both nodes
    pub fn merge(&mut self, other: &TravelNode) {
        self.up = self.up.max(other.up);
        self.down = self.down.max(other.down);
        self.left = self.left.max(other.left);
        self.right = self.right.max(other.right);
    }

    pub fn has_connections(&self) -> bool {
        Direction::ALL.iter().any(|&d| self.get(d).is_connected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_takes_maximum() {
        let mut a = TravelNode::new();
        a.up = Strength::Connected;
        a.left = Strength::Allocated;

        let mut b = TravelNode::new();
        b.up = Strength::Allocated;
        b.right = Strength::Connected;

        a.merge(&b);
        assert_eq!(a.up, Strength::Allocated);
        assert_eq!(a.down, Strength::Unconnected);
        assert_eq!(a.left, Strength::Allocated);
        assert_eq!(a.right, Strength::Connected);
    }

    #[test]
    fn test_has_connections() {
        let mut node = TravelNode::new();
        assert!(!node.has_connections());
        node.set(Direction::Down, Strength::Connected);
        assert!(node.has_connections());
    }

    #[test]
    fn test_strength_serializes_as_number() {
        let mut node = TravelNode::new();
        node.right = Strength::Allocated;
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"up":0,"down":0,"left":0,"right":2,"variant":1}"#);
    }

    #[test]
    fn test_out_of_range_strength_saturates() {
        assert_eq!(Strength::from(7), Strength::Allocated);
    }

    #[test]
    fn test_variant_clamped() {
        assert_eq!(TravelNode::new().with_variant(0).variant, 1);
        assert_eq!(TravelNode::new().with_variant(9).variant, VARIANT_COUNT);
    }
}
