use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::annotation::Annotation;
use super::path::MapPath;

/// A quest-like task, optionally scoped to a map.
///
/// Missions form a directed dependency graph: a mission may require other
/// missions to be completed before it unlocks. Unlock state is never stored
/// on the record; it is derived from the statuses of the direct
/// prerequisites each time it is asked for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mission {
    pub id: Uuid,
    pub map_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: MissionStatus,
    /// Higher priorities sort first in listings.
    pub priority: i64,
    /// Free-form metadata owned by the client.
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle status of a mission.
///
/// Only `Completed` satisfies a dependency edge; `Cancelled` missions keep
/// their dependents locked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Input for creating a mission.
///
/// `title` defaults to an empty string when absent from a request body so
/// that the store can reject it with a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMissionInput {
    pub map_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Todo`.
    pub status: Option<MissionStatus>,
    /// Defaults to 0.
    pub priority: Option<i64>,
    pub meta: Option<serde_json::Value>,
}

/// Input for updating a mission. All fields are optional for partial updates;
/// an absent field keeps its previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMissionInput {
    pub map_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<MissionStatus>,
    pub priority: Option<i64>,
    pub meta: Option<serde_json::Value>,
}

/// Filter for mission listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionFilter {
    pub map_id: Option<Uuid>,
}

/// A mission with its graph neighbourhood and linked map entities, used for
/// detailed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDetails {
    #[serde(flatten)]
    pub mission: Mission,
    /// Derived from the statuses of `required_missions`.
    pub unlocked: bool,
    #[serde(rename = "requiredMissions")]
    pub required_missions: Vec<Mission>,
    #[serde(rename = "dependentMissions")]
    pub dependent_missions: Vec<Mission>,
    pub annotations: Vec<Annotation>,
    pub paths: Vec<MapPath>,
}

/// A directed edge: `mission_id` requires `required_mission_id` to be
/// completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub mission_id: Uuid,
    pub required_mission_id: Uuid,
}

/// Input for adding a dependency to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDependencyInput {
    pub required_mission_id: Uuid,
}
