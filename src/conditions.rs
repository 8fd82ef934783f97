//! Property conditions: four categories, three ordered severity levels each.
//!
//! Each level maps to a fixed cost multiplier. Levels are ordered by
//! severity (derived `Ord`), and a harsher level never has a smaller
//! multiplier, which is what keeps estimates monotonic in the conditions.
//!
//! | Category     | level 1       | level 2        | level 3          |
//! |--------------|---------------|----------------|------------------|
//! | grass length | short  1.00   | medium 1.10    | tall 1.25        |
//! | obstacles    | none   1.00   | some   1.15    | heavy 1.30       |
//! | slope        | flat   1.00   | slight 1.10    | steep 1.25       |
//! | access       | easy   1.00   | gated  1.05    | obstructed 1.20  |

use serde::{Deserialize, Serialize};

use crate::error::ParseLevelError;

/// Behaviour shared by every condition level enum.
pub trait Severity: Copy + Ord + Sized + 'static {
    /// Category this level belongs to.
    const CATEGORY: ConditionCategory;
    /// All levels, mildest first.
    const LEVELS: [Self; 3];

    /// Cost multiplier for this level.
    fn multiplier(self) -> f64;
    /// Wire/storage name ("short", "gated", ...).
    fn as_str(self) -> &'static str;
    /// Display label.
    fn label(self) -> &'static str;
    /// One-line explanation shown next to the option.
    fn description(self) -> &'static str;

    /// Severity rank, 1 (mildest) to 3 (harshest).
    fn rank(self) -> u8 {
        Self::LEVELS
            .iter()
            .position(|&level| level == self)
            .map_or(1, |i| i as u8 + 1)
    }

    /// The next harsher level, if any.
    fn harsher(self) -> Option<Self> {
        Self::LEVELS.get(self.rank() as usize).copied()
    }

    /// Parse a wire name.
    fn parse(value: &str) -> Result<Self, ParseLevelError> {
        Self::LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str() == value)
            .ok_or_else(|| ParseLevelError {
                category: Self::CATEGORY.as_str(),
                value: value.to_string(),
            })
    }
}

macro_rules! severity_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $category:expr, {
            $($variant:ident => ($wire:literal, $label:literal, $mult:literal, $desc:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        #[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
        pub enum $name {
            $($variant),+
        }

        impl Severity for $name {
            const CATEGORY: ConditionCategory = $category;
            const LEVELS: [Self; 3] = [$($name::$variant),+];

            fn multiplier(self) -> f64 {
                match self {
                    $($name::$variant => $mult),+
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            fn description(self) -> &'static str {
                match self {
                    $($name::$variant => $desc),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseLevelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Severity>::parse(s)
            }
        }
    };
}

severity_enum!(
    /// How long the grass is.
    GrassLength, ConditionCategory::GrassLength, {
        Short => ("short", "Short", 1.00, "Well-maintained, under 3 inches"),
        Medium => ("medium", "Medium", 1.10, "Regular grass, 3-6 inches"),
        Tall => ("tall", "Tall", 1.25, "Overgrown, over 6 inches"),
    }
);

severity_enum!(
    /// Trees, bushes and structures in the work area.
    Obstacles, ConditionCategory::Obstacles, {
        None => ("none", "None", 1.00, "Clear area, no obstacles"),
        Some => ("some", "Some", 1.15, "Few trees, bushes, or structures"),
        Heavy => ("heavy", "Heavy", 1.30, "Many obstacles, complex navigation"),
    }
);

severity_enum!(
    /// Terrain slope.
    Slope, ConditionCategory::Slope, {
        Flat => ("flat", "Flat", 1.00, "Level ground, easy to work"),
        Slight => ("slight", "Slight", 1.10, "Gentle slope, manageable"),
        Steep => ("steep", "Steep", 1.25, "Significant slope, requires care"),
    }
);

severity_enum!(
    /// How easy it is to get equipment onto the property.
    Access, ConditionCategory::Access, {
        Easy => ("easy", "Easy", 1.00, "Direct access, no restrictions"),
        Gated => ("gated", "Gated", 1.05, "Gated community or restricted access"),
        Obstructed => ("obstructed", "Obstructed", 1.20, "Difficult access, narrow paths"),
    }
);

/// The four condition categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ConditionCategory {
    GrassLength,
    Obstacles,
    Slope,
    Access,
}

impl ConditionCategory {
    pub const ALL: [ConditionCategory; 4] = [
        ConditionCategory::GrassLength,
        ConditionCategory::Obstacles,
        ConditionCategory::Slope,
        ConditionCategory::Access,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::GrassLength => "grassLength",
            ConditionCategory::Obstacles => "obstacles",
            ConditionCategory::Slope => "slope",
            ConditionCategory::Access => "access",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ConditionCategory::GrassLength => "Grass Length",
            ConditionCategory::Obstacles => "Obstacles",
            ConditionCategory::Slope => "Terrain Slope",
            ConditionCategory::Access => "Property Access",
        }
    }
}

/// The full set of property conditions. All four fields are always present.
///
/// Defaults to medium grass, some obstacles, flat ground and easy access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PropertyConditions {
    pub grass_length: GrassLength,
    pub obstacles: Obstacles,
    pub slope: Slope,
    pub access: Access,
}

impl Default for PropertyConditions {
    fn default() -> Self {
        Self {
            grass_length: GrassLength::Medium,
            obstacles: Obstacles::Some,
            slope: Slope::Flat,
            access: Access::Easy,
        }
    }
}

impl PropertyConditions {
    pub fn new(grass_length: GrassLength, obstacles: Obstacles, slope: Slope, access: Access) -> Self {
        Self {
            grass_length,
            obstacles,
            slope,
            access,
        }
    }

    /// Product of the four multipliers. Difficulty compounds, so this is
    /// multiplicative rather than additive.
    pub fn total_modifier(&self) -> f64 {
        self.grass_length.multiplier()
            * self.obstacles.multiplier()
            * self.slope.multiplier()
            * self.access.multiplier()
    }

    /// Wire name of the level selected for a category.
    pub fn level_str(&self, category: ConditionCategory) -> &'static str {
        match category {
            ConditionCategory::GrassLength => self.grass_length.as_str(),
            ConditionCategory::Obstacles => self.obstacles.as_str(),
            ConditionCategory::Slope => self.slope.as_str(),
            ConditionCategory::Access => self.access.as_str(),
        }
    }

    /// Set one category from its wire name (e.g. a radio button value).
    ///
    /// On error the conditions are left unchanged.
    pub fn set_level(
        &mut self,
        category: ConditionCategory,
        value: &str,
    ) -> Result<(), ParseLevelError> {
        match category {
            ConditionCategory::GrassLength => self.grass_length = GrassLength::parse(value)?,
            ConditionCategory::Obstacles => self.obstacles = Obstacles::parse(value)?,
            ConditionCategory::Slope => self.slope = Slope::parse(value)?,
            ConditionCategory::Access => self.access = Access::parse(value)?,
        }
        Ok(())
    }

    /// Merge a partial update; unspecified fields keep their current level.
    pub fn apply(&mut self, update: ConditionsUpdate) {
        if let Some(grass_length) = update.grass_length {
            self.grass_length = grass_length;
        }
        if let Some(obstacles) = update.obstacles {
            self.obstacles = obstacles;
        }
        if let Some(slope) = update.slope {
            self.slope = slope;
        }
        if let Some(access) = update.access {
            self.access = access;
        }
    }

    /// Every valid combination (3^4 = 81).
    pub fn all() -> impl Iterator<Item = PropertyConditions> {
        GrassLength::LEVELS.into_iter().flat_map(|g| {
            Obstacles::LEVELS.into_iter().flat_map(move |o| {
                Slope::LEVELS.into_iter().flat_map(move |s| {
                    Access::LEVELS
                        .into_iter()
                        .map(move |a| PropertyConditions::new(g, o, s, a))
                })
            })
        })
    }
}

/// Partial change to [`PropertyConditions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsUpdate {
    pub grass_length: Option<GrassLength>,
    pub obstacles: Option<Obstacles>,
    pub slope: Option<Slope>,
    pub access: Option<Access>,
}
