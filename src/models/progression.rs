use serde::{Deserialize, Serialize};

/// Aggregate completion figures for a map (or for everything).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressionReport {
    pub missions: MissionProgress,
    pub annotations: AnnotationProgress,
    pub overall: OverallProgress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissionProgress {
    pub total: u64,
    pub completed: u64,
    pub unlocked: u64,
    /// Percentage of completed missions, 0 when there are none.
    pub progress: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationProgress {
    pub total: u64,
    pub unlocked: u64,
    pub locked: u64,
    /// Percentage of unlocked annotations, 0 when there are none.
    pub progress: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverallProgress {
    pub progress: u32,
}

impl ProgressionReport {
    /// Build a report from raw counts.
    pub fn from_counts(
        total_missions: u64,
        completed_missions: u64,
        unlocked_missions: u64,
        total_annotations: u64,
        unlocked_annotations: u64,
    ) -> Self {
        Self {
            missions: MissionProgress {
                total: total_missions,
                completed: completed_missions,
                unlocked: unlocked_missions,
                progress: percent(completed_missions, total_missions),
            },
            annotations: AnnotationProgress {
                total: total_annotations,
                unlocked: unlocked_annotations,
                locked: total_annotations.saturating_sub(unlocked_annotations),
                progress: percent(unlocked_annotations, total_annotations),
            },
            overall: OverallProgress {
                progress: percent(
                    completed_missions + unlocked_annotations,
                    total_missions + total_annotations,
                ),
            },
        }
    }
}

/// Rounded percentage (half up), 0 for an empty denominator.
pub fn percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 200 + total) / (total * 2)) as u32
}
