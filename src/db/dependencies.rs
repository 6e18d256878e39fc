use std::collections::HashSet;

use rusqlite::Connection;
use uuid::Uuid;

use super::missions::{mission_from_row, require_mission, MISSION_COLUMNS, MISSION_ORDER};
use super::{parse_uuid, Database};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::models::*;

/// Direct prerequisites of a mission.
pub(super) fn query_required(conn: &Connection, mission_id: Uuid) -> Result<Vec<Mission>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM missions
         WHERE id IN (SELECT required_mission_id FROM mission_dependencies WHERE mission_id = ?)
         ORDER BY {}",
        MISSION_COLUMNS, MISSION_ORDER
    ))?;
    let missions = stmt
        .query_map([mission_id.to_string()], mission_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(missions)
}

/// Missions that directly require this one.
pub(super) fn query_dependents(conn: &Connection, mission_id: Uuid) -> Result<Vec<Mission>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM missions
         WHERE id IN (SELECT mission_id FROM mission_dependencies WHERE required_mission_id = ?)
         ORDER BY {}",
        MISSION_COLUMNS, MISSION_ORDER
    ))?;
    let missions = stmt
        .query_map([mission_id.to_string()], mission_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(missions)
}

/// Dependency edges whose dependent mission is on `map_id` (all edges when
/// `None`).
pub(super) fn query_edges(conn: &Connection, map_id: Option<Uuid>) -> Result<Vec<DependencyEdge>> {
    let mut stmt = conn.prepare(
        "SELECT d.mission_id, d.required_mission_id
         FROM mission_dependencies d
         JOIN missions m ON m.id = d.mission_id
         WHERE (?1 IS NULL OR m.map_id = ?1)
         ORDER BY d.rowid",
    )?;
    let edges = stmt
        .query_map([map_id.map(|u| u.to_string())], |row| {
            Ok(DependencyEdge {
                mission_id: parse_uuid(row.get(0)?),
                required_mission_id: parse_uuid(row.get(1)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(edges)
}

/// Insert an edge, absorbing duplicates (including ones inserted by a
/// concurrent writer between the check and the insert).
pub(super) fn insert_edge(conn: &Connection, edge: &DependencyEdge) -> Result<LinkOutcome> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO mission_dependencies (mission_id, required_mission_id) VALUES (?, ?)",
        (
            edge.mission_id.to_string(),
            edge.required_mission_id.to_string(),
        ),
    )?;
    Ok(if rows > 0 {
        LinkOutcome::Created
    } else {
        LinkOutcome::AlreadyPresent
    })
}

impl Database {
    // ============================================================
    // Dependency graph
    // ============================================================

    /// Record that `mission_id` requires `required_mission_id`.
    ///
    /// Self-dependencies are rejected before anything else is looked up.
    /// Longer cycles are accepted; see [`Database::deadlocked_missions`].
    pub fn add_dependency(&self, mission_id: Uuid, required_mission_id: Uuid) -> Result<LinkOutcome> {
        if mission_id == required_mission_id {
            return Err(Error::validation("A mission cannot depend on itself"));
        }

        self.transaction(|tx| {
            require_mission(tx, mission_id)?;
            require_mission(tx, required_mission_id)?;

            let outcome = insert_edge(
                tx,
                &DependencyEdge {
                    mission_id,
                    required_mission_id,
                },
            )?;
            if outcome.is_created() {
                tracing::debug!("Mission {} now requires {}", mission_id, required_mission_id);
            }
            Ok(outcome)
        })
    }

    /// Remove an edge. Succeeds whether or not the edge existed.
    pub fn remove_dependency(&self, mission_id: Uuid, required_mission_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "DELETE FROM mission_dependencies WHERE mission_id = ? AND required_mission_id = ?",
            (mission_id.to_string(), required_mission_id.to_string()),
        )?;
        Ok(())
    }

    /// Direct prerequisites of a mission (not transitive).
    pub fn get_required(&self, mission_id: Uuid) -> Result<Vec<Mission>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_required(&conn, mission_id)
    }

    /// Direct dependents of a mission (not transitive).
    pub fn get_dependents(&self, mission_id: Uuid) -> Result<Vec<Mission>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_dependents(&conn, mission_id)
    }

    /// Whether a mission is currently unlocked: all of its direct
    /// prerequisites are completed, or it has none.
    pub fn is_unlocked(&self, mission_id: Uuid) -> Result<bool> {
        self.transaction(|tx| {
            require_mission(tx, mission_id)?;
            let required = query_required(tx, mission_id)?;
            Ok(crate::graph::is_unlocked(required.iter().map(|m| m.status)))
        })
    }

    /// Missions sitting on a dependency cycle, optionally restricted to a map.
    ///
    /// These can never unlock by completing their prerequisites, because
    /// each one waits on another member of the same cycle.
    pub fn deadlocked_missions(&self, map_id: Option<Uuid>) -> Result<Vec<Mission>> {
        self.transaction(|tx| {
            let graph = DependencyGraph::from_edges(query_edges(tx, None)?);
            let deadlocked: HashSet<Uuid> = graph.deadlocked().into_iter().collect();
            if deadlocked.is_empty() {
                return Ok(Vec::new());
            }

            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM missions WHERE (?1 IS NULL OR map_id = ?1) ORDER BY {}",
                MISSION_COLUMNS, MISSION_ORDER
            ))?;
            let missions = stmt
                .query_map([map_id.map(|u| u.to_string())], mission_from_row)?
                .filter(|r| r.as_ref().map_or(true, |m| deadlocked.contains(&m.id)))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(missions)
        })
    }
}
