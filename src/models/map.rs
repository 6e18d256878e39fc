use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raster map that annotations, paths and missions are placed on.
///
/// The image itself lives outside the database; `image_path` is whatever
/// location the client uploaded it to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Map {
    pub id: Uuid,
    pub name: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMapInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_path: String,
}
