use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point of interest placed on a map.
///
/// Coordinates are relative to the map image. The `unlocked` flag is
/// independent from mission status and is only read by the progression
/// report. A record without the flag (older exports, hand-written imports)
/// is unlocked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: Uuid,
    pub map_id: Uuid,
    #[serde(default)]
    pub layer_id: Option<Uuid>,
    /// Client-defined category such as `city` or `dungeon`.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub meta: Option<serde_json::Value>,
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn default_unlocked() -> bool {
    true
}

/// Input for creating an annotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAnnotationInput {
    pub map_id: Uuid,
    pub layer_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub meta: Option<serde_json::Value>,
    /// Defaults to `true`.
    pub unlocked: Option<bool>,
}

/// Input for updating an annotation. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAnnotationInput {
    pub layer_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub meta: Option<serde_json::Value>,
    pub unlocked: Option<bool>,
}

/// Filter for annotation listings on one map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFilter {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub layer_id: Option<Uuid>,
}

/// A media item (image, sound, link) attached to an annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: Uuid,
    pub annotation_id: Uuid,
    pub kind: String,
    pub url: String,
    pub description: Option<String>,
}

/// Input for attaching media to an annotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMediaInput {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    pub description: Option<String>,
}
