use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::path::Point;

/// Minimum number of vertices for a closed zone.
pub const MIN_SHAPE_POINTS: usize = 3;

/// A polygonal zone drawn on a map, such as a region or a kingdom border.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapShape {
    pub id: Uuid,
    pub map_id: Uuid,
    #[serde(default)]
    pub layer_id: Option<Uuid>,
    pub name: String,
    pub points: Vec<Point>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMapShapeInput {
    pub map_id: Uuid,
    pub layer_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Vec<Point>,
    pub meta: Option<serde_json::Value>,
}

/// Input for updating a shape. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMapShapeInput {
    pub layer_id: Option<Uuid>,
    pub name: Option<String>,
    pub points: Option<Vec<Point>>,
    pub meta: Option<serde_json::Value>,
}
