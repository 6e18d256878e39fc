use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum number of points for a path to be drawable.
pub const MIN_PATH_POINTS: usize = 2;

/// A polyline drawn on a map, such as a road or a river.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPath {
    pub id: Uuid,
    pub map_id: Uuid,
    #[serde(default)]
    pub layer_id: Option<Uuid>,
    pub name: String,
    pub points: Vec<Point>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A coordinate relative to the map image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Input for creating a path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMapPathInput {
    pub map_id: Uuid,
    pub layer_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Vec<Point>,
    pub meta: Option<serde_json::Value>,
}

/// Input for updating a path. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMapPathInput {
    pub layer_id: Option<Uuid>,
    pub name: Option<String>,
    pub points: Option<Vec<Point>>,
    pub meta: Option<serde_json::Value>,
}
