use std::collections::HashMap;

use uuid::Uuid;

use super::dependencies::query_edges;
use super::{parse_uuid, Database};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::models::*;

impl Database {
    /// Compute the progression report, optionally scoped to one map.
    ///
    /// Missions and annotations are each filtered by their own `map_id`.
    /// Prerequisites are looked up across all maps, since an edge may cross
    /// map boundaries. All counts come from one read snapshot.
    pub fn compute_progression(&self, map_id: Option<Uuid>) -> Result<ProgressionReport> {
        self.transaction(|tx| {
            let scope = map_id.map(|u| u.to_string());

            let mut stmt = tx.prepare("SELECT id, status, map_id FROM missions")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        parse_uuid(row.get(0)?),
                        MissionStatus::from_str(&row.get::<_, String>(1)?).unwrap_or_default(),
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let statuses: HashMap<Uuid, MissionStatus> =
                rows.iter().map(|(id, status, _)| (*id, *status)).collect();
            let graph = DependencyGraph::from_edges(query_edges(tx, map_id)?);

            let in_scope: Vec<(Uuid, MissionStatus)> = rows
                .into_iter()
                .filter(|(_, _, mission_map)| scope.is_none() || *mission_map == scope)
                .map(|(id, status, _)| (id, status))
                .collect();

            let total_missions = in_scope.len() as u64;
            let completed_missions =
                in_scope.iter().filter(|(_, s)| s.is_completed()).count() as u64;
            let unlocked_missions = in_scope
                .iter()
                .filter(|(id, _)| graph.is_unlocked(*id, &statuses))
                .count() as u64;

            let (total_annotations, unlocked_annotations): (i64, i64) = tx.query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN unlocked IS NULL OR unlocked != 0 THEN 1 ELSE 0 END), 0)
                 FROM annotations WHERE (?1 IS NULL OR map_id = ?1)",
                [&scope],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(ProgressionReport::from_counts(
                total_missions,
                completed_missions,
                unlocked_missions,
                total_annotations as u64,
                unlocked_annotations as u64,
            ))
        })
    }
}
