use std::collections::HashMap;

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use super::dependencies::{insert_edge, query_edges};
use super::entities::*;
use super::links::{insert_annotation_link, insert_path_link, query_annotation_links, query_path_links};
use super::missions::{insert_mission, mission_from_row, MISSION_COLUMNS};
use super::{row_exists, Database};
use crate::error::{Error, Result};
use crate::models::*;

/// Old id → new id for one table during an import.
struct IdMap {
    table: &'static str,
    ids: HashMap<Uuid, Uuid>,
}

impl IdMap {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            ids: HashMap::new(),
        }
    }

    fn assign(&mut self, old: Uuid) -> Uuid {
        let new = Uuid::new_v4();
        self.ids.insert(old, new);
        new
    }

    /// Translate a reference. Ids imported in the same bundle are remapped;
    /// anything else must name a row that already exists.
    fn resolve(&self, conn: &Connection, id: Uuid) -> Result<Uuid> {
        if let Some(new) = self.ids.get(&id) {
            return Ok(*new);
        }
        if row_exists(conn, self.table, id)? {
            return Ok(id);
        }
        Err(Error::validation(format!(
            "Import references unknown {} row {}",
            self.table, id
        )))
    }

    fn resolve_optional(&self, conn: &Connection, id: Option<Uuid>) -> Result<Option<Uuid>> {
        id.map(|id| self.resolve(conn, id)).transpose()
    }
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    f: impl FnMut(&rusqlite::Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], f)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Database {
    /// Snapshot every table. Records are listed in creation order.
    pub fn export_world(&self) -> Result<WorldExport> {
        self.transaction(|tx| {
            Ok(WorldExport {
                version: EXPORT_VERSION.to_string(),
                exported_at: Some(Utc::now()),
                maps: query_all(
                    tx,
                    &format!("SELECT {} FROM maps ORDER BY rowid", MAP_COLUMNS),
                    map_from_row,
                )?,
                layers: query_all(
                    tx,
                    &format!("SELECT {} FROM layers ORDER BY rowid", LAYER_COLUMNS),
                    layer_from_row,
                )?,
                annotations: query_all(
                    tx,
                    &format!("SELECT {} FROM annotations ORDER BY rowid", ANNOTATION_COLUMNS),
                    annotation_from_row,
                )?,
                media: query_all(
                    tx,
                    &format!("SELECT {} FROM media ORDER BY rowid", MEDIA_COLUMNS),
                    media_from_row,
                )?,
                shapes: query_all(
                    tx,
                    &format!("SELECT {} FROM shapes ORDER BY rowid", SHAPE_COLUMNS),
                    shape_from_row,
                )?,
                paths: query_all(
                    tx,
                    &format!("SELECT {} FROM paths ORDER BY rowid", PATH_COLUMNS),
                    path_from_row,
                )?,
                missions: query_all(
                    tx,
                    &format!("SELECT {} FROM missions ORDER BY rowid", MISSION_COLUMNS),
                    mission_from_row,
                )?,
                mission_dependencies: query_edges(tx, None)?,
                mission_annotations: query_annotation_links(tx)?,
                mission_paths: query_path_links(tx)?,
            })
        })
    }

    /// Import a bundle in one transaction.
    ///
    /// Every record gets a fresh id and every reference is remapped, so
    /// importing an export reproduces the same graph next to the existing
    /// data. Any invalid record rolls the whole import back.
    pub fn import_world(&self, bundle: WorldExport) -> Result<ImportSummary> {
        let summary = self.transaction(|tx| {
            let mut summary = ImportSummary::default();
            let mut maps = IdMap::new("maps");
            let mut layers = IdMap::new("layers");
            let mut annotations = IdMap::new("annotations");
            let mut paths = IdMap::new("paths");
            let mut missions = IdMap::new("missions");

            for map in bundle.maps {
                let id = maps.assign(map.id);
                insert_map(tx, &Map { id, ..map })?;
                summary.maps += 1;
            }

            for layer in bundle.layers {
                let map_id = maps.resolve(tx, layer.map_id)?;
                let id = layers.assign(layer.id);
                insert_layer(tx, &Layer { id, map_id, ..layer })?;
                summary.layers += 1;
            }

            for annotation in bundle.annotations {
                let map_id = maps.resolve(tx, annotation.map_id)?;
                let layer_id = layers.resolve_optional(tx, annotation.layer_id)?;
                let id = annotations.assign(annotation.id);
                insert_annotation(
                    tx,
                    &Annotation {
                        id,
                        map_id,
                        layer_id,
                        ..annotation
                    },
                )?;
                summary.annotations += 1;
            }

            for media in bundle.media {
                let annotation_id = annotations.resolve(tx, media.annotation_id)?;
                let media = Media {
                    id: Uuid::new_v4(),
                    annotation_id,
                    ..media
                };
                insert_media(tx, &media)?;
                summary.media += 1;
            }

            for shape in bundle.shapes {
                let shape = MapShape {
                    id: Uuid::new_v4(),
                    map_id: maps.resolve(tx, shape.map_id)?,
                    layer_id: layers.resolve_optional(tx, shape.layer_id)?,
                    ..shape
                };
                insert_shape(tx, &shape)?;
                summary.shapes += 1;
            }

            for path in bundle.paths {
                let map_id = maps.resolve(tx, path.map_id)?;
                let layer_id = layers.resolve_optional(tx, path.layer_id)?;
                let id = paths.assign(path.id);
                insert_path(
                    tx,
                    &MapPath {
                        id,
                        map_id,
                        layer_id,
                        ..path
                    },
                )?;
                summary.paths += 1;
            }

            for mission in bundle.missions {
                if mission.title.trim().is_empty() {
                    return Err(Error::validation("Imported mission has an empty title"));
                }
                let map_id = maps.resolve_optional(tx, mission.map_id)?;
                let id = missions.assign(mission.id);
                insert_mission(tx, &Mission { id, map_id, ..mission })?;
                summary.missions += 1;
            }

            for edge in bundle.mission_dependencies {
                let edge = DependencyEdge {
                    mission_id: missions.resolve(tx, edge.mission_id)?,
                    required_mission_id: missions.resolve(tx, edge.required_mission_id)?,
                };
                if edge.mission_id == edge.required_mission_id {
                    return Err(Error::validation("Imported dependency references itself"));
                }
                if insert_edge(tx, &edge)?.is_created() {
                    summary.mission_dependencies += 1;
                }
            }

            for link in bundle.mission_annotations {
                let link = MissionAnnotationLink {
                    mission_id: missions.resolve(tx, link.mission_id)?,
                    annotation_id: annotations.resolve(tx, link.annotation_id)?,
                };
                if insert_annotation_link(tx, &link)?.is_created() {
                    summary.mission_annotations += 1;
                }
            }

            for link in bundle.mission_paths {
                let link = MissionPathLink {
                    mission_id: missions.resolve(tx, link.mission_id)?,
                    path_id: paths.resolve(tx, link.path_id)?,
                };
                if insert_path_link(tx, &link)?.is_created() {
                    summary.mission_paths += 1;
                }
            }

            Ok(summary)
        })?;

        tracing::info!("Import committed: {:?}", summary);
        Ok(summary)
    }
}
