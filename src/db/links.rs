use rusqlite::Connection;
use uuid::Uuid;

use super::entities::{annotation_from_row, path_from_row, ANNOTATION_COLUMNS, PATH_COLUMNS};
use super::missions::require_mission;
use super::{parse_uuid, row_exists, Database};
use crate::error::{Error, Result};
use crate::models::*;

pub(super) fn query_linked_annotations(conn: &Connection, mission_id: Uuid) -> Result<Vec<Annotation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM annotations
         WHERE id IN (SELECT annotation_id FROM mission_annotations WHERE mission_id = ?)
         ORDER BY rowid",
        ANNOTATION_COLUMNS
    ))?;
    let annotations = stmt
        .query_map([mission_id.to_string()], annotation_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(annotations)
}

pub(super) fn query_linked_paths(conn: &Connection, mission_id: Uuid) -> Result<Vec<MapPath>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM paths
         WHERE id IN (SELECT path_id FROM mission_paths WHERE mission_id = ?)
         ORDER BY rowid",
        PATH_COLUMNS
    ))?;
    let paths = stmt
        .query_map([mission_id.to_string()], path_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(paths)
}

pub(super) fn query_annotation_links(conn: &Connection) -> Result<Vec<MissionAnnotationLink>> {
    let mut stmt =
        conn.prepare("SELECT mission_id, annotation_id FROM mission_annotations ORDER BY rowid")?;
    let links = stmt
        .query_map([], |row| {
            Ok(MissionAnnotationLink {
                mission_id: parse_uuid(row.get(0)?),
                annotation_id: parse_uuid(row.get(1)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(links)
}

pub(super) fn query_path_links(conn: &Connection) -> Result<Vec<MissionPathLink>> {
    let mut stmt = conn.prepare("SELECT mission_id, path_id FROM mission_paths ORDER BY rowid")?;
    let links = stmt
        .query_map([], |row| {
            Ok(MissionPathLink {
                mission_id: parse_uuid(row.get(0)?),
                path_id: parse_uuid(row.get(1)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(links)
}

pub(super) fn insert_annotation_link(conn: &Connection, link: &MissionAnnotationLink) -> Result<LinkOutcome> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO mission_annotations (mission_id, annotation_id) VALUES (?, ?)",
        (link.mission_id.to_string(), link.annotation_id.to_string()),
    )?;
    Ok(outcome(rows))
}

pub(super) fn insert_path_link(conn: &Connection, link: &MissionPathLink) -> Result<LinkOutcome> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO mission_paths (mission_id, path_id) VALUES (?, ?)",
        (link.mission_id.to_string(), link.path_id.to_string()),
    )?;
    Ok(outcome(rows))
}

fn outcome(rows: usize) -> LinkOutcome {
    if rows > 0 {
        LinkOutcome::Created
    } else {
        LinkOutcome::AlreadyPresent
    }
}

impl Database {
    // ============================================================
    // Mission links
    // ============================================================

    /// Link an annotation to a mission. Linking an existing pair again is a
    /// success that reports [`LinkOutcome::AlreadyPresent`].
    pub fn link_annotation(&self, mission_id: Uuid, annotation_id: Uuid) -> Result<LinkOutcome> {
        self.transaction(|tx| {
            require_mission(tx, mission_id)?;
            if !row_exists(tx, "annotations", annotation_id)? {
                return Err(Error::not_found(format!("Annotation {} not found", annotation_id)));
            }
            insert_annotation_link(
                tx,
                &MissionAnnotationLink {
                    mission_id,
                    annotation_id,
                },
            )
        })
    }

    /// Remove an annotation link. Succeeds whether or not it existed.
    pub fn unlink_annotation(&self, mission_id: Uuid, annotation_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "DELETE FROM mission_annotations WHERE mission_id = ? AND annotation_id = ?",
            (mission_id.to_string(), annotation_id.to_string()),
        )?;
        Ok(())
    }

    /// Link a path to a mission. Same contract as [`Database::link_annotation`].
    pub fn link_path(&self, mission_id: Uuid, path_id: Uuid) -> Result<LinkOutcome> {
        self.transaction(|tx| {
            require_mission(tx, mission_id)?;
            if !row_exists(tx, "paths", path_id)? {
                return Err(Error::not_found(format!("Path {} not found", path_id)));
            }
            insert_path_link(tx, &MissionPathLink { mission_id, path_id })
        })
    }

    /// Remove a path link. Succeeds whether or not it existed.
    pub fn unlink_path(&self, mission_id: Uuid, path_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "DELETE FROM mission_paths WHERE mission_id = ? AND path_id = ?",
            (mission_id.to_string(), path_id.to_string()),
        )?;
        Ok(())
    }

    pub fn get_linked_annotations(&self, mission_id: Uuid) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_linked_annotations(&conn, mission_id)
    }

    pub fn get_linked_paths(&self, mission_id: Uuid) -> Result<Vec<MapPath>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_linked_paths(&conn, mission_id)
    }
}
