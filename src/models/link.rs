use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Association row between a mission and an annotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MissionAnnotationLink {
    pub mission_id: Uuid,
    pub annotation_id: Uuid,
}

/// Association row between a mission and a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MissionPathLink {
    pub mission_id: Uuid,
    pub path_id: Uuid,
}

/// Input for linking an annotation to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkAnnotationInput {
    pub annotation_id: Uuid,
}

/// Input for linking a path to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkPathInput {
    pub path_id: Uuid,
}

/// Result of an idempotent insert into a relation table.
///
/// Inserting a pair that already exists is not an error; callers use the
/// distinction only to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyPresent,
}

impl LinkOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Body returned by link and dependency inserts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkResponse {
    pub success: bool,
    /// False when the pair already existed.
    pub created: bool,
}

impl From<LinkOutcome> for LinkResponse {
    fn from(outcome: LinkOutcome) -> Self {
        Self {
            success: true,
            created: outcome.is_created(),
        }
    }
}

/// Body returned by deletes and unlinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
