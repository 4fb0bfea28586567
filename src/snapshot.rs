//! Typed schema of recorded trace files.
//!
//! A trace file is either a record `{"success": bool, "trajectory": [step, ...]}` or a bare list of
//! steps. Each step carries the planned and executed actions, their outcome, and the simulator's
//! `event_metadata` snapshot. Metadata is kept as raw JSON until the
//! [`TraceBuilder`](crate::builder::TraceBuilder) validates it, so a single broken step is reported
//! with its index instead of failing the whole document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TraceError;
use crate::geometry::{BoundingBox, Point3};
use crate::trace::ActionLabel;

/// Parameter keys whose values identify objects, in the order they appear in action labels.
const OBJECT_KEYS: &[&str] = &[
    "objectId",
    "object_id",
    "receptacleId",
    "receptacle_id",
    "targetObjectId",
    "object2Id",
];

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strip surrounding whitespace from an object identifier.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceRecord {
    /// Whether the agent reported completing its task.
    #[serde(default)]
    pub success: Option<bool>,

    pub trajectory: Vec<TraceStep>,
}

impl TraceRecord {
    /// Parse a trace document, accepting both the record form and a bare list of steps.
    pub fn from_json_str(contents: &str) -> Result<Self, TraceError> {
        let document: Value = serde_json::from_str(contents)?;

        let record = match document {
            Value::Array(_) => Self {
                success: None,
                trajectory: serde_json::from_value(document)?,
            },
            _ => serde_json::from_value(document)?,
        };

        Ok(record)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(flatten)]
    pub arguments: BTreeMap<String, Value>,
}

impl ActionCommand {
    pub fn name(&self) -> Option<&str> {
        self.action.as_deref().filter(|name| !name.is_empty())
    }

    /// Identifiers of the objects this action refers to.
    pub fn object_ids(&self) -> impl Iterator<Item = String> + '_ {
        OBJECT_KEYS.iter().filter_map(|&key| match self.arguments.get(key)? {
            Value::String(id) if !id.trim().is_empty() => Some(normalize_id(id)),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceStep {
    #[serde(default)]
    pub step: Option<usize>,

    #[serde(default)]
    pub plan_action: Option<ActionCommand>,

    #[serde(default)]
    pub thor_action: Option<ActionCommand>,

    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub event_metadata: Option<Value>,
}

impl TraceStep {
    pub fn event(&self) -> ActionEvent<'_> {
        ActionEvent {
            attempted: self.plan_action.as_ref(),
            executed: self.thor_action.as_ref(),
            success: self.success,
            error: self.error.as_deref().filter(|error| !error.is_empty()),
        }
    }
}

/// The action the agent attempted at one step and what the simulator made of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionEvent<'a> {
    pub attempted: Option<&'a ActionCommand>,
    pub executed: Option<&'a ActionCommand>,
    pub success: bool,
    pub error: Option<&'a str>,
}

impl<'a> ActionEvent<'a> {
    /// The executed command, or the attempted one when the simulator did not record it.
    pub fn command(&self) -> Option<&'a ActionCommand> {
        self.executed.or(self.attempted)
    }

    pub fn action_name(&self) -> Option<&'a str> {
        self.command().and_then(ActionCommand::name)
    }

    /// Render the event as `action: 'Name' 'objectId' ...`.
    pub fn label(&self) -> ActionLabel {
        let mut label = format!("action: '{}'", self.action_name().unwrap_or("NoOp"));

        if let Some(command) = self.command() {
            for id in command.object_ids() {
                // Writing to a String cannot fail.
                let _ = write!(label, " '{}'", id);
            }
        }

        ActionLabel::from(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub toggleable: bool,
    #[serde(default)]
    pub openable: bool,
    #[serde(default)]
    pub pickupable: bool,
    #[serde(default)]
    pub receptacle: bool,
    #[serde(default)]
    pub breakable: bool,
    #[serde(default)]
    pub cookable: bool,
    #[serde(default)]
    pub dirtyable: bool,
    #[serde(default)]
    pub sliceable: bool,
    #[serde(default)]
    pub can_fill_with_liquid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectValues {
    #[serde(default)]
    pub is_toggled: bool,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub is_broken: bool,
    #[serde(default)]
    pub is_cooked: bool,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default)]
    pub is_sliced: bool,
    #[serde(default)]
    pub is_filled_with_liquid: bool,
    #[serde(default, alias = "ObjectTemperature")]
    pub temperature: Option<String>,
}

impl ObjectValues {
    pub fn temperature_is(&self, category: &str) -> bool {
        self.temperature
            .as_deref()
            .map_or(false, |temperature| temperature.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBounds {
    #[serde(default, deserialize_with = "nullable")]
    object_bounds_corners: Vec<Point3>,
}

/// An object exactly as the simulator recorded it. Converted into an [`ObjectSnapshot`] once its
/// identifier has been checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    object_type: Option<String>,
    #[serde(flatten)]
    capabilities: Capabilities,
    #[serde(flatten)]
    values: ObjectValues,
    #[serde(default)]
    object_bounds: Option<RawBounds>,
    #[serde(default, deserialize_with = "nullable")]
    receptacle_object_ids: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    parent_receptacles: Vec<String>,
}

/// One object as seen by the simulator at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub id: String,
    pub object_type: String,
    pub capabilities: Capabilities,
    pub values: ObjectValues,
    pub bounds: Option<BoundingBox>,

    /// Identifiers of the objects this one contains or supports.
    pub contents: Vec<String>,

    /// Identifiers of the receptacles holding this object.
    pub parents: Vec<String>,
}

impl ObjectSnapshot {
    /// An object with no capabilities, no box and no contents.
    pub fn new(id: &str, object_type: &str) -> Self {
        Self {
            id: normalize_id(id),
            object_type: object_type.to_string(),
            capabilities: Capabilities::default(),
            values: ObjectValues::default(),
            bounds: None,
            contents: Vec::new(),
            parents: Vec::new(),
        }
    }
}

impl TryFrom<ObjectRecord> for ObjectSnapshot {
    type Error = String;

    fn try_from(raw: ObjectRecord) -> Result<Self, Self::Error> {
        let id = raw
            .object_id
            .as_deref()
            .or(raw.name.as_deref())
            .map(normalize_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "object has no objectId".to_string())?;

        let object_type = match raw.object_type.as_deref().map(str::trim) {
            Some(object_type) if !object_type.is_empty() => object_type.to_string(),
            _ => id.split('|').next().unwrap_or(&id).to_string(),
        };

        let bounds = raw
            .object_bounds
            .and_then(|bounds| BoundingBox::from_corners(bounds.object_bounds_corners));

        let normalize_all = |ids: Vec<String>| -> Vec<String> {
            ids.iter()
                .map(|id| normalize_id(id))
                .filter(|id| !id.is_empty())
                .collect()
        };

        Ok(Self {
            id,
            object_type,
            capabilities: raw.capabilities,
            values: raw.values,
            bounds,
            contents: normalize_all(raw.receptacle_object_ids),
            parents: normalize_all(raw.parent_receptacles),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum InventoryEntry {
    Id(String),
    Record {
        #[serde(default, rename = "objectId")]
        object_id: Option<String>,
        #[serde(default, rename = "object_id")]
        snake_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl InventoryEntry {
    /// The first non-empty identifier among `objectId`, `object_id` and `name`.
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Record {
                object_id,
                snake_id,
                name,
            } => [object_id, snake_id, name]
                .into_iter()
                .filter_map(|id| id.as_deref())
                .find(|id| !id.trim().is_empty())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AgentMetadata {
    #[serde(default)]
    position: Option<Point3>,
}

/// The agent's position and the identifiers of the objects it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSnapshot {
    pub position: Option<Point3>,
    pub inventory: BTreeSet<String>,
}

impl AgentSnapshot {
    pub fn holds(&self, id: &str) -> bool {
        self.inventory.contains(id)
    }
}

/// The simulator snapshot recorded after one step.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub objects: Vec<ObjectRecord>,

    #[serde(default, deserialize_with = "nullable")]
    inventory_objects: Vec<InventoryEntry>,

    #[serde(default, deserialize_with = "nullable")]
    agent: AgentMetadata,
}

impl EventMetadata {
    /// Validate every recorded object. Fails on an object without an identifier or on an
    /// identifier that appears twice.
    pub fn snapshots(&self) -> Result<Vec<ObjectSnapshot>, String> {
        let mut seen = BTreeSet::new();
        let mut snapshots = Vec::with_capacity(self.objects.len());

        for record in &self.objects {
            let snapshot = ObjectSnapshot::try_from(record.clone())?;

            if !seen.insert(snapshot.id.clone()) {
                return Err(format!("duplicate objectId {}", snapshot.id));
            }

            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    pub fn agent(&self) -> AgentSnapshot {
        let inventory = self
            .inventory_objects
            .iter()
            .map(|entry| normalize_id(entry.id()))
            .filter(|id| !id.is_empty())
            .collect();

        AgentSnapshot {
            position: self.agent.position,
            inventory,
        }
    }
}
