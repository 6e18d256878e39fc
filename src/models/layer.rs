use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named group of annotations, shapes and paths on one map.
///
/// Deleting a layer leaves its members on the map with no layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub id: Uuid,
    pub map_id: Uuid,
    pub name: String,
    /// Drawing order; lower values are listed first.
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a layer. The map comes from the route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLayerInput {
    #[serde(default)]
    pub name: String,
    pub order: Option<i64>,
}
