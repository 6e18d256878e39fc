use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::dependencies::{query_dependents, query_required};
use super::links::{query_linked_annotations, query_linked_paths};
use super::{meta_to_json, parse_datetime, parse_meta, parse_uuid, row_exists, Database};
use crate::error::{Error, Result};
use crate::graph;
use crate::models::*;

pub(super) const MISSION_COLUMNS: &str =
    "id, map_id, title, description, status, priority, meta_json, created_at, updated_at";

/// Listing order: priority descending, then creation order.
pub(super) const MISSION_ORDER: &str = "priority DESC, rowid ASC";

pub(super) fn mission_from_row(row: &Row) -> rusqlite::Result<Mission> {
    Ok(Mission {
        id: parse_uuid(row.get(0)?),
        map_id: row.get::<_, Option<String>>(1)?.map(parse_uuid),
        title: row.get(2)?,
        description: row.get(3)?,
        status: MissionStatus::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        priority: row.get(5)?,
        meta: parse_meta(row.get(6)?),
        created_at: parse_datetime(row.get(7)?),
        updated_at: parse_datetime(row.get(8)?),
    })
}

pub(super) fn insert_mission(conn: &Connection, m: &Mission) -> Result<()> {
    conn.execute(
        "INSERT INTO missions (id, map_id, title, description, status, priority, meta_json, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            m.id.to_string(),
            m.map_id.map(|u| u.to_string()),
            &m.title,
            &m.description,
            m.status.as_str(),
            m.priority,
            meta_to_json(&m.meta)?,
            m.created_at.to_rfc3339(),
            m.updated_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub(super) fn query_mission(conn: &Connection, id: Uuid) -> Result<Option<Mission>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM missions WHERE id = ?", MISSION_COLUMNS),
            [id.to_string()],
            mission_from_row,
        )
        .optional()?)
}

pub(super) fn require_mission(conn: &Connection, id: Uuid) -> Result<Mission> {
    query_mission(conn, id)?.ok_or_else(|| Error::not_found(format!("Mission {} not found", id)))
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title is required"));
    }
    Ok(())
}

fn require_map(conn: &Connection, map_id: Option<Uuid>) -> Result<()> {
    match map_id {
        Some(id) if !row_exists(conn, "maps", id)? => {
            Err(Error::not_found(format!("Map {} not found", id)))
        }
        _ => Ok(()),
    }
}

impl Database {
    // ============================================================
    // Mission store
    // ============================================================

    /// Missions ordered by priority (highest first), then creation order.
    pub fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM missions WHERE (?1 IS NULL OR map_id = ?1) ORDER BY {}",
            MISSION_COLUMNS, MISSION_ORDER
        ))?;

        let missions = stmt
            .query_map([filter.map_id.map(|u| u.to_string())], mission_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(missions)
    }

    pub fn get_mission(&self, id: Uuid) -> Result<Option<Mission>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_mission(&conn, id)
    }

    /// A mission with its prerequisites, dependents, linked annotations and
    /// linked paths, read from one snapshot.
    pub fn get_mission_details(&self, id: Uuid) -> Result<MissionDetails> {
        self.transaction(|tx| {
            let mission = require_mission(tx, id)?;
            let required_missions = query_required(tx, id)?;
            let dependent_missions = query_dependents(tx, id)?;
            let annotations = query_linked_annotations(tx, id)?;
            let paths = query_linked_paths(tx, id)?;
            let unlocked = graph::is_unlocked(required_missions.iter().map(|m| m.status));

            Ok(MissionDetails {
                mission,
                unlocked,
                required_missions,
                dependent_missions,
                annotations,
                paths,
            })
        })
    }

    pub fn create_mission(&self, input: CreateMissionInput) -> Result<Mission> {
        validate_title(&input.title)?;

        self.transaction(|tx| {
            require_map(tx, input.map_id)?;

            let now = Utc::now();
            let mission = Mission {
                id: Uuid::new_v4(),
                map_id: input.map_id,
                title: input.title,
                description: input.description,
                status: input.status.unwrap_or_default(),
                priority: input.priority.unwrap_or(0),
                meta: input.meta,
                created_at: now,
                updated_at: now,
            };
            insert_mission(tx, &mission)?;

            tracing::debug!("Created mission {} ({})", mission.id, mission.title);
            Ok(mission)
        })
    }

    /// Apply a partial update. Fields absent from `input` keep their value.
    pub fn update_mission(&self, id: Uuid, input: UpdateMissionInput) -> Result<Mission> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }

        self.transaction(|tx| {
            let existing = require_mission(tx, id)?;
            if input.map_id.is_some() {
                require_map(tx, input.map_id)?;
            }

            let updated = Mission {
                map_id: input.map_id.or(existing.map_id),
                title: input.title.unwrap_or(existing.title),
                description: input.description.or(existing.description),
                status: input.status.unwrap_or(existing.status),
                priority: input.priority.unwrap_or(existing.priority),
                meta: input.meta.or(existing.meta),
                updated_at: Utc::now(),
                ..existing
            };

            tx.execute(
                "UPDATE missions
                 SET map_id = ?, title = ?, description = ?, status = ?, priority = ?, meta_json = ?, updated_at = ?
                 WHERE id = ?",
                (
                    updated.map_id.map(|u| u.to_string()),
                    &updated.title,
                    &updated.description,
                    updated.status.as_str(),
                    updated.priority,
                    meta_to_json(&updated.meta)?,
                    updated.updated_at.to_rfc3339(),
                    id.to_string(),
                ),
            )?;

            Ok(updated)
        })
    }

    /// Delete a mission with its dependency edges (both directions) and its
    /// links. Returns whether a mission was removed; deleting an absent id
    /// is not an error.
    pub fn delete_mission(&self, id: Uuid) -> Result<bool> {
        self.transaction(|tx| {
            let id = id.to_string();
            let edges = tx.execute(
                "DELETE FROM mission_dependencies WHERE mission_id = ?1 OR required_mission_id = ?1",
                [&id],
            )?;
            tx.execute("DELETE FROM mission_annotations WHERE mission_id = ?", [&id])?;
            tx.execute("DELETE FROM mission_paths WHERE mission_id = ?", [&id])?;
            let rows = tx.execute("DELETE FROM missions WHERE id = ?", [&id])?;

            if rows > 0 {
                tracing::debug!("Deleted mission {} and {} dependency edges", id, edges);
            }
            Ok(rows > 0)
        })
    }
}
