//! Tree-wide settings and their documented bounds

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;
use crate::allocation::TraversalRules;
use crate::grid::GridShape;

pub const MAX_ABILITY_POINTS_MIN: i64 = 1;
pub const MAX_ABILITY_POINTS_MAX: i64 = 1984;
pub const MAX_ABILITY_POINTS_DEFAULT: i64 = 45;

pub const PAGES_MIN: i64 = 1;
pub const PAGES_MAX: i64 = 30;
pub const PAGES_DEFAULT: i64 = 7;

pub const HORIZONTAL_PAGES_MIN: i64 = 1;
pub const HORIZONTAL_PAGES_MAX: i64 = 30;
pub const HORIZONTAL_PAGES_DEFAULT: i64 = 1;

pub const ROWS_PER_PAGE_MIN: i64 = 3;
pub const ROWS_PER_PAGE_MAX: i64 = 11;
pub const ROWS_PER_PAGE_DEFAULT: i64 = 6;

pub const PAGES_DISPLAYED_MIN: i64 = 1;
pub const PAGES_DISPLAYED_MAX: i64 = 8;
pub const PAGES_DISPLAYED_DEFAULT: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    #[default]
    Archer,
    Assassin,
    Mage,
    Shaman,
    Warrior,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 5] = [
        Self::Archer,
        Self::Assassin,
        Self::Mage,
        Self::Shaman,
        Self::Warrior,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archer => "archer",
            Self::Assassin => "assassin",
            Self::Mage => "mage",
            Self::Shaman => "shaman",
            Self::Warrior => "warrior",
        }
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    #[serde(rename = "classs")]
    pub class: CharacterClass,
    pub max_ability_points: i32,
    pub pages: u32,
    pub horizontal_pages: u32,
    pub rows_per_page: u32,
    pub pages_displayed: u32,
    /// Rows wrap between the first and last column
    pub loop_tree: bool,
    #[serde(rename = "bTravesableUp")]
    pub traversable_up: bool,
    pub use_alternative_ability_icons: bool,
    /// No sideways hop directly after a downward hop
    pub strict_allocation: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            class: CharacterClass::Archer,
            max_ability_points: MAX_ABILITY_POINTS_DEFAULT as i32,
            pages: PAGES_DEFAULT as u32,
            horizontal_pages: HORIZONTAL_PAGES_DEFAULT as u32,
            rows_per_page: ROWS_PER_PAGE_DEFAULT as u32,
            pages_displayed: PAGES_DISPLAYED_DEFAULT as u32,
            loop_tree: false,
            traversable_up: false,
            use_alternative_ability_icons: false,
            strict_allocation: true,
        }
    }
}

impl Properties {
    /// Read properties field by field; anything missing or malformed falls
    /// back to its default and numbers are clamped into bounds
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();

        let class = value
            .get("classs")
            .and_then(Value::as_str)
            .and_then(CharacterClass::parse)
            .unwrap_or_default();

        let pages = fields::clamped(value, "pages", PAGES_MIN, PAGES_MAX, PAGES_DEFAULT);
        let pages_displayed = fields::clamped(
            value,
            "pagesDisplayed",
            PAGES_DISPLAYED_MIN,
            PAGES_DISPLAYED_MAX.min(pages),
            PAGES_DISPLAYED_DEFAULT,
        );

        Self {
            class,
            max_ability_points: fields::clamped(
                value,
                "maxAbilityPoints",
                MAX_ABILITY_POINTS_MIN,
                MAX_ABILITY_POINTS_MAX,
                MAX_ABILITY_POINTS_DEFAULT,
            ) as i32,
            pages: pages as u32,
            horizontal_pages: fields::clamped(
                value,
                "horizontalPages",
                HORIZONTAL_PAGES_MIN,
                HORIZONTAL_PAGES_MAX,
                HORIZONTAL_PAGES_DEFAULT,
            ) as u32,
            rows_per_page: fields::clamped(
                value,
                "rowsPerPage",
                ROWS_PER_PAGE_MIN,
                ROWS_PER_PAGE_MAX,
                ROWS_PER_PAGE_DEFAULT,
            ) as u32,
            pages_displayed: pages_displayed as u32,
            loop_tree: fields::flag(value, "loopTree", defaults.loop_tree),
            traversable_up: fields::flag(value, "bTravesableUp", defaults.traversable_up),
            use_alternative_ability_icons: fields::flag(
                value,
                "useAlternativeAbilityIcons",
                defaults.use_alternative_ability_icons,
            ),
            strict_allocation: fields::flag(value, "strictAllocation", defaults.strict_allocation),
        }
    }

    /// Pull every numeric field back into bounds
    pub fn clamped(mut self) -> Self {
        let clamp = |v: i64, min: i64, max: i64| v.clamp(min, max);
        self.max_ability_points = clamp(
            i64::from(self.max_ability_points),
            MAX_ABILITY_POINTS_MIN,
            MAX_ABILITY_POINTS_MAX,
        ) as i32;
        self.pages = clamp(i64::from(self.pages), PAGES_MIN, PAGES_MAX) as u32;
        self.horizontal_pages = clamp(
            i64::from(self.horizontal_pages),
            HORIZONTAL_PAGES_MIN,
            HORIZONTAL_PAGES_MAX,
        ) as u32;
        self.rows_per_page =
            clamp(i64::from(self.rows_per_page), ROWS_PER_PAGE_MIN, ROWS_PER_PAGE_MAX) as u32;
        self.pages_displayed = clamp(
            i64::from(self.pages_displayed),
            PAGES_DISPLAYED_MIN,
            PAGES_DISPLAYED_MAX.min(i64::from(self.pages)),
        ) as u32;
        self
    }

    pub fn rows(&self) -> u32 {
        self.pages * self.rows_per_page
    }

    pub fn shape(&self) -> GridShape {
        GridShape::new(self.rows(), self.loop_tree)
    }

    pub fn traversal_rules(&self) -> TraversalRules {
        TraversalRules {
            traversable_up: self.traversable_up,
            strict_allocation: self.strict_allocation,
        }
    }
}
