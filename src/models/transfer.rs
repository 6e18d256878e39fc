use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::annotation::{Annotation, Media};
use super::layer::Layer;
use super::link::{MissionAnnotationLink, MissionPathLink};
use super::map::Map;
use super::mission::{DependencyEdge, Mission};
use super::path::MapPath;
use super::shape::MapShape;

/// Format version written into every export.
pub const EXPORT_VERSION: &str = "2.0";

/// A full snapshot of every table, as produced by export and consumed by
/// import.
///
/// Relation rows reference the ids of the exported records. On import every
/// record receives a fresh id and every reference is remapped through the
/// ids present in the same bundle, so the graph topology is reproduced even
/// though the ids differ. Every list may be omitted from an import body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldExport {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub maps: Vec<Map>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub shapes: Vec<MapShape>,
    #[serde(default)]
    pub paths: Vec<MapPath>,
    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub mission_dependencies: Vec<DependencyEdge>,
    #[serde(default)]
    pub mission_annotations: Vec<MissionAnnotationLink>,
    #[serde(default)]
    pub mission_paths: Vec<MissionPathLink>,
}

/// Number of rows written per table by an import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub maps: usize,
    pub layers: usize,
    pub annotations: usize,
    pub media: usize,
    pub shapes: usize,
    pub paths: usize,
    pub missions: usize,
    pub mission_dependencies: usize,
    pub mission_annotations: usize,
    pub mission_paths: usize,
}

/// Response body of a successful import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: ImportSummary,
}
