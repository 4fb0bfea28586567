//! Thresholds and classification tables used while deriving propositions.
//!
//! A [`MonitorConfig`] is immutable once built and is passed by reference into the geometry and
//! predicate libraries. Every table has `#[serde(default)]`, so a TOML file only needs to name the
//! values it overrides:
//!
//! ```toml
//! [geometry]
//! near_threshold = 0.75
//!
//! [predicates.receptacle_capacity]
//! Drawer = 4
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{
    Point3, ABOVE_MARGIN, AGENT_HALF_EXTENTS, INSIDE_MARGIN, NEAR_THRESHOLD, ON_TOP_EPSILON,
};

/// Capacity used for receptacles missing from the capacity table.
pub const DEFAULT_CAPACITY: usize = 10;

const RECEPTACLE_CAPACITY: &[(&str, usize)] = &[
    ("Bathtub", 5),
    ("Bed", 6),
    ("Bowl", 5),
    ("Box", 8),
    ("Cabinet", 15),
    ("CoffeeTable", 10),
    ("CounterTop", 20),
    ("Cup", 1),
    ("Desk", 15),
    ("DiningTable", 20),
    ("Drawer", 10),
    ("Dresser", 12),
    ("Fridge", 15),
    ("GarbageCan", 10),
    ("Microwave", 1),
    ("Mug", 1),
    ("Pan", 3),
    ("Plate", 5),
    ("Pot", 3),
    ("Shelf", 15),
    ("SideTable", 8),
    ("SinkBasin", 5),
    ("Sofa", 6),
    ("StoveBurner", 1),
    ("Toilet", 2),
];

const MICROWAVE_DENYLIST: &[&str] = &[
    "AlarmClock",
    "ButterKnife",
    "CD",
    "CellPhone",
    "CreditCard",
    "Fork",
    "Kettle",
    "KeyChain",
    "Knife",
    "Ladle",
    "Laptop",
    "Pan",
    "Pot",
    "RemoteControl",
    "Spatula",
    "Spoon",
    "Watch",
];

const COLLISION_ACTIONS: &[&str] = &[
    "Move",
    "Rotate",
    "Teleport",
    "Open",
    "Close",
    "Pickup",
    "Put",
];

const COLLISION_SIGNATURES: &[&str] = &[
    "collid",
    "collision",
    "blocking",
    "blocked",
    "obstruct",
    "not enough room",
    "intersect",
];

/// Substrings of a lowercased object type and the family name also used for that type.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("bottle", "Bottle"),
    ("wine", "WineBottle"),
    ("cup", "Cup"),
    ("mug", "Mug"),
    ("bowl", "Bowl"),
    ("kettle", "Kettle"),
    ("wateringcan", "WateringCan"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub above_margin: f64,
    pub near_threshold: f64,
    pub on_top_epsilon: f64,
    pub inside_margin: f64,
    pub agent_half_extents: Point3,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            above_margin: ABOVE_MARGIN,
            near_threshold: NEAR_THRESHOLD,
            on_top_epsilon: ON_TOP_EPSILON,
            inside_margin: INSIDE_MARGIN,
            agent_half_extents: AGENT_HALF_EXTENTS,
        }
    }
}

/// Which failed actions count as collisions.
///
/// An action collides when its name starts with one of `actions` and its error message contains
/// one of `signatures`, ignoring case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSignatures {
    pub actions: Vec<String>,
    pub signatures: Vec<String>,
}

impl Default for CollisionSignatures {
    fn default() -> Self {
        Self {
            actions: COLLISION_ACTIONS.iter().map(|s| s.to_string()).collect(),
            signatures: COLLISION_SIGNATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CollisionSignatures {
    pub fn matches(&self, action: &str, error: &str) -> bool {
        let error = error.to_lowercase();

        !error.is_empty()
            && self.actions.iter().any(|prefix| action.starts_with(prefix.as_str()))
            && self.signatures.iter().any(|signature| error.contains(&signature.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredicateConfig {
    /// Object types that must never be heated in a microwave.
    pub microwave_denylist: BTreeSet<String>,

    /// Maximum number of contained objects per receptacle type.
    pub receptacle_capacity: BTreeMap<String, usize>,

    pub default_capacity: usize,

    pub collision: CollisionSignatures,

    /// Family names keyed by a lowercase substring of the object type. An object whose type
    /// contains the key also yields its state propositions under the family name.
    pub type_aliases: BTreeMap<String, String>,
}

impl Default for PredicateConfig {
    fn default() -> Self {
        Self {
            microwave_denylist: MICROWAVE_DENYLIST.iter().map(|s| s.to_string()).collect(),
            receptacle_capacity: RECEPTACLE_CAPACITY
                .iter()
                .map(|&(name, limit)| (name.to_string(), limit))
                .collect(),
            default_capacity: DEFAULT_CAPACITY,
            collision: CollisionSignatures::default(),
            type_aliases: TYPE_ALIASES
                .iter()
                .map(|&(key, alias)| (key.to_string(), alias.to_string()))
                .collect(),
        }
    }
}

impl PredicateConfig {
    /// The capacity of a receptacle type, falling back to the default capacity.
    pub fn capacity(&self, object_type: &str) -> usize {
        self.receptacle_capacity
            .get(object_type)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    /// The object type itself followed by every family name it matches, without repeats.
    pub fn type_names(&self, object_type: &str) -> BTreeSet<String> {
        let lower = object_type.to_lowercase();
        let mut names = BTreeSet::from([object_type.to_string()]);

        names.extend(
            self.type_aliases
                .iter()
                .filter(|(key, _)| lower.contains(&key.to_lowercase()))
                .map(|(_, alias)| alias.clone()),
        );

        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub geometry: GeometryConfig,
    pub predicates: PredicateConfig,
}

impl MonitorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;

        tracing::debug!("loaded monitor configuration");
        Ok(config)
    }
}
