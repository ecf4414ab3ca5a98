//! The four grid directions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by adjacency queries and the compiler
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Left or right
    pub fn is_lateral(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_is_involution() {
        for direction in Direction::ALL {
            assert_eq!(direction.reverse().reverse(), direction);
            assert_ne!(direction.reverse(), direction);
        }
    }

    #[test]
    fn test_lateral() {
        assert!(Direction::Left.is_lateral());
        assert!(Direction::Right.is_lateral());
        assert!(!Direction::Up.is_lateral());
        assert!(!Direction::Down.is_lateral());
    }
}
