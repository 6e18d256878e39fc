use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{meta_to_json, parse_datetime, parse_meta, parse_uuid, row_exists, Database};
use crate::error::{Error, Result};
use crate::models::*;

pub(super) const MAP_COLUMNS: &str = "id, name, image_path, created_at";

pub(super) const LAYER_COLUMNS: &str = r#"id, map_id, name, "order", created_at"#;

pub(super) const ANNOTATION_COLUMNS: &str =
    "id, map_id, layer_id, type, title, description, x, y, width, height, meta_json, unlocked, created_at";

pub(super) const MEDIA_COLUMNS: &str = "id, annotation_id, kind, url, description";

pub(super) const PATH_COLUMNS: &str = "id, map_id, layer_id, name, path_json, meta_json, created_at";

pub(super) const SHAPE_COLUMNS: &str = "id, map_id, layer_id, name, shape_json, meta_json, created_at";

pub(super) fn map_from_row(row: &Row) -> rusqlite::Result<Map> {
    Ok(Map {
        id: parse_uuid(row.get(0)?),
        name: row.get(1)?,
        image_path: row.get(2)?,
        created_at: parse_datetime(row.get(3)?),
    })
}

pub(super) fn layer_from_row(row: &Row) -> rusqlite::Result<Layer> {
    Ok(Layer {
        id: parse_uuid(row.get(0)?),
        map_id: parse_uuid(row.get(1)?),
        name: row.get(2)?,
        order: row.get(3)?,
        created_at: parse_datetime(row.get(4)?),
    })
}

pub(super) fn annotation_from_row(row: &Row) -> rusqlite::Result<Annotation> {
    Ok(Annotation {
        id: parse_uuid(row.get(0)?),
        map_id: parse_uuid(row.get(1)?),
        layer_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        kind: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        x: row.get(6)?,
        y: row.get(7)?,
        width: row.get(8)?,
        height: row.get(9)?,
        meta: parse_meta(row.get(10)?),
        unlocked: row.get::<_, Option<i64>>(11)?.map_or(true, |v| v != 0),
        created_at: parse_datetime(row.get(12)?),
    })
}

pub(super) fn media_from_row(row: &Row) -> rusqlite::Result<Media> {
    Ok(Media {
        id: parse_uuid(row.get(0)?),
        annotation_id: parse_uuid(row.get(1)?),
        kind: row.get(2)?,
        url: row.get(3)?,
        description: row.get(4)?,
    })
}

pub(super) fn path_from_row(row: &Row) -> rusqlite::Result<MapPath> {
    let points_json: String = row.get(4)?;
    Ok(MapPath {
        id: parse_uuid(row.get(0)?),
        map_id: parse_uuid(row.get(1)?),
        layer_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        name: row.get(3)?,
        points: serde_json::from_str(&points_json).unwrap_or_default(),
        meta: parse_meta(row.get(5)?),
        created_at: parse_datetime(row.get(6)?),
    })
}

pub(super) fn shape_from_row(row: &Row) -> rusqlite::Result<MapShape> {
    let points_json: String = row.get(4)?;
    Ok(MapShape {
        id: parse_uuid(row.get(0)?),
        map_id: parse_uuid(row.get(1)?),
        layer_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        name: row.get(3)?,
        points: serde_json::from_str(&points_json).unwrap_or_default(),
        meta: parse_meta(row.get(5)?),
        created_at: parse_datetime(row.get(6)?),
    })
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_points(points: &[Point], min: usize, what: &str) -> Result<()> {
    if points.len() < min {
        return Err(Error::validation(format!(
            "A {} needs at least {} points",
            what, min
        )));
    }
    Ok(())
}

/// A layer reference must name a layer of the same map.
fn check_layer(conn: &Connection, map_id: Uuid, layer_id: Option<Uuid>) -> Result<()> {
    let Some(layer_id) = layer_id else {
        return Ok(());
    };
    let owner: Option<String> = conn
        .query_row(
            "SELECT map_id FROM layers WHERE id = ?",
            [layer_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match owner {
        None => Err(Error::not_found("Layer not found")),
        Some(owner) if parse_uuid(owner.clone()) != map_id => {
            Err(Error::validation("Layer belongs to another map"))
        }
        Some(_) => Ok(()),
    }
}

pub(super) fn insert_map(conn: &Connection, map: &Map) -> Result<()> {
    conn.execute(
        "INSERT INTO maps (id, name, image_path, created_at) VALUES (?, ?, ?, ?)",
        (
            map.id.to_string(),
            &map.name,
            &map.image_path,
            map.created_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub(super) fn insert_layer(conn: &Connection, layer: &Layer) -> Result<()> {
    conn.execute(
        r#"INSERT INTO layers (id, map_id, name, "order", created_at) VALUES (?, ?, ?, ?, ?)"#,
        (
            layer.id.to_string(),
            layer.map_id.to_string(),
            &layer.name,
            layer.order,
            layer.created_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub(super) fn insert_annotation(conn: &Connection, a: &Annotation) -> Result<()> {
    conn.execute(
        "INSERT INTO annotations (id, map_id, layer_id, type, title, description, x, y, width, height, meta_json, unlocked, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            a.id.to_string(),
            a.map_id.to_string(),
            a.layer_id.map(|id| id.to_string()),
            &a.kind,
            &a.title,
            &a.description,
            a.x,
            a.y,
            a.width,
            a.height,
            meta_to_json(&a.meta)?,
            a.unlocked,
            a.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub(super) fn insert_media(conn: &Connection, m: &Media) -> Result<()> {
    conn.execute(
        "INSERT INTO media (id, annotation_id, kind, url, description) VALUES (?, ?, ?, ?, ?)",
        (
            m.id.to_string(),
            m.annotation_id.to_string(),
            &m.kind,
            &m.url,
            &m.description,
        ),
    )?;
    Ok(())
}

pub(super) fn insert_path(conn: &Connection, p: &MapPath) -> Result<()> {
    conn.execute(
        "INSERT INTO paths (id, map_id, layer_id, name, path_json, meta_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            p.id.to_string(),
            p.map_id.to_string(),
            p.layer_id.map(|id| id.to_string()),
            &p.name,
            serde_json::to_string(&p.points)?,
            meta_to_json(&p.meta)?,
            p.created_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub(super) fn insert_shape(conn: &Connection, s: &MapShape) -> Result<()> {
    conn.execute(
        "INSERT INTO shapes (id, map_id, layer_id, name, shape_json, meta_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            s.id.to_string(),
            s.map_id.to_string(),
            s.layer_id.map(|id| id.to_string()),
            &s.name,
            serde_json::to_string(&s.points)?,
            meta_to_json(&s.meta)?,
            s.created_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn query_annotation(conn: &Connection, id: Uuid) -> Result<Option<Annotation>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM annotations WHERE id = ?", ANNOTATION_COLUMNS),
            [id.to_string()],
            annotation_from_row,
        )
        .optional()?)
}

fn query_shape(conn: &Connection, id: Uuid) -> Result<Option<MapShape>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM shapes WHERE id = ?", SHAPE_COLUMNS),
            [id.to_string()],
            shape_from_row,
        )
        .optional()?)
}

fn query_path(conn: &Connection, id: Uuid) -> Result<Option<MapPath>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM paths WHERE id = ?", PATH_COLUMNS),
            [id.to_string()],
            path_from_row,
        )
        .optional()?)
}

impl Database {
    // ============================================================
    // Map operations
    // ============================================================

    pub fn get_all_maps(&self) -> Result<Vec<Map>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM maps ORDER BY rowid",
            MAP_COLUMNS
        ))?;
        let maps = stmt
            .query_map([], map_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(maps)
    }

    pub fn get_map(&self, id: Uuid) -> Result<Option<Map>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM maps WHERE id = ?", MAP_COLUMNS),
                [id.to_string()],
                map_from_row,
            )
            .optional()?)
    }

    pub fn create_map(&self, input: CreateMapInput) -> Result<Map> {
        require_non_empty(&input.name, "name")?;
        require_non_empty(&input.image_path, "image_path")?;

        let map = Map {
            id: Uuid::new_v4(),
            name: input.name,
            image_path: input.image_path,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        insert_map(&conn, &map)?;
        Ok(map)
    }

    /// Delete a map together with its layers, annotations, shapes, paths and missions.
    pub fn delete_map(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM maps WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Layer operations
    // ============================================================

    /// Layers of a map by drawing order, then creation order.
    pub fn get_layers_by_map(&self, map_id: Uuid) -> Result<Vec<Layer>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM layers WHERE map_id = ? ORDER BY "order", rowid"#,
            LAYER_COLUMNS
        ))?;
        let layers = stmt
            .query_map([map_id.to_string()], layer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(layers)
    }

    pub fn create_layer(&self, map_id: Uuid, input: CreateLayerInput) -> Result<Layer> {
        require_non_empty(&input.name, "name")?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if !row_exists(&conn, "maps", map_id)? {
            return Err(Error::not_found("Map not found"));
        }

        let layer = Layer {
            id: Uuid::new_v4(),
            map_id,
            name: input.name,
            order: input.order.unwrap_or(0),
            created_at: Utc::now(),
        };
        insert_layer(&conn, &layer)?;
        Ok(layer)
    }

    /// Delete a layer. Its annotations, shapes and paths stay on the map
    /// without a layer.
    pub fn delete_layer(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM layers WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Annotation operations
    // ============================================================

    /// Annotations of a map in creation order, optionally restricted to one
    /// type and one layer.
    pub fn get_annotations_by_map(
        &self,
        map_id: Uuid,
        filter: &AnnotationFilter,
    ) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM annotations
             WHERE map_id = ?1 AND (?2 IS NULL OR type = ?2) AND (?3 IS NULL OR layer_id = ?3)
             ORDER BY rowid",
            ANNOTATION_COLUMNS
        ))?;
        let params = (
            map_id.to_string(),
            filter.kind.as_deref(),
            filter.layer_id.map(|id| id.to_string()),
        );
        let annotations = stmt
            .query_map(params, annotation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(annotations)
    }

    pub fn get_annotation(&self, id: Uuid) -> Result<Option<Annotation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_annotation(&conn, id)
    }

    pub fn create_annotation(&self, input: CreateAnnotationInput) -> Result<Annotation> {
        require_non_empty(&input.title, "title")?;
        require_non_empty(&input.kind, "type")?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if !row_exists(&conn, "maps", input.map_id)? {
            return Err(Error::not_found("Map not found"));
        }
        check_layer(&conn, input.map_id, input.layer_id)?;

        let annotation = Annotation {
            id: Uuid::new_v4(),
            map_id: input.map_id,
            layer_id: input.layer_id,
            kind: input.kind,
            title: input.title,
            description: input.description,
            x: input.x,
            y: input.y,
            width: input.width,
            height: input.height,
            meta: input.meta,
            unlocked: input.unlocked.unwrap_or(true),
            created_at: Utc::now(),
        };
        insert_annotation(&conn, &annotation)?;
        Ok(annotation)
    }

    pub fn update_annotation(
        &self,
        id: Uuid,
        input: UpdateAnnotationInput,
    ) -> Result<Option<Annotation>> {
        if let Some(title) = &input.title {
            require_non_empty(title, "title")?;
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = query_annotation(&conn, id)? else {
            return Ok(None);
        };
        check_layer(&conn, existing.map_id, input.layer_id)?;

        let updated = Annotation {
            layer_id: input.layer_id.or(existing.layer_id),
            kind: input.kind.unwrap_or(existing.kind),
            title: input.title.unwrap_or(existing.title),
            description: input.description.or(existing.description),
            x: input.x.unwrap_or(existing.x),
            y: input.y.unwrap_or(existing.y),
            width: input.width.or(existing.width),
            height: input.height.or(existing.height),
            meta: input.meta.or(existing.meta),
            unlocked: input.unlocked.unwrap_or(existing.unlocked),
            ..existing
        };

        conn.execute(
            "UPDATE annotations
             SET layer_id = ?, type = ?, title = ?, description = ?, x = ?, y = ?, width = ?, height = ?, meta_json = ?, unlocked = ?
             WHERE id = ?",
            rusqlite::params![
                updated.layer_id.map(|id| id.to_string()),
                &updated.kind,
                &updated.title,
                &updated.description,
                updated.x,
                updated.y,
                updated.width,
                updated.height,
                meta_to_json(&updated.meta)?,
                updated.unlocked,
                id.to_string(),
            ],
        )?;

        Ok(Some(updated))
    }

    /// Delete an annotation; its media and mission links go with it.
    pub fn delete_annotation(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM annotations WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Media operations
    // ============================================================

    pub fn get_media(&self, annotation_id: Uuid) -> Result<Vec<Media>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media WHERE annotation_id = ? ORDER BY rowid",
            MEDIA_COLUMNS
        ))?;
        let media = stmt
            .query_map([annotation_id.to_string()], media_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(media)
    }

    pub fn create_media(&self, annotation_id: Uuid, input: CreateMediaInput) -> Result<Media> {
        require_non_empty(&input.kind, "kind")?;
        require_non_empty(&input.url, "url")?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if !row_exists(&conn, "annotations", annotation_id)? {
            return Err(Error::not_found("Annotation not found"));
        }

        let media = Media {
            id: Uuid::new_v4(),
            annotation_id,
            kind: input.kind,
            url: input.url,
            description: input.description,
        };
        insert_media(&conn, &media)?;
        Ok(media)
    }

    // ============================================================
    // Shape operations
    // ============================================================

    pub fn get_shapes_by_map(&self, map_id: Uuid, layer_id: Option<Uuid>) -> Result<Vec<MapShape>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shapes
             WHERE map_id = ?1 AND (?2 IS NULL OR layer_id = ?2)
             ORDER BY rowid",
            SHAPE_COLUMNS
        ))?;
        let shapes = stmt
            .query_map(
                (map_id.to_string(), layer_id.map(|id| id.to_string())),
                shape_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(shapes)
    }

    pub fn get_shape(&self, id: Uuid) -> Result<Option<MapShape>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_shape(&conn, id)
    }

    pub fn create_shape(&self, input: CreateMapShapeInput) -> Result<MapShape> {
        validate_points(&input.points, MIN_SHAPE_POINTS, "shape")?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if !row_exists(&conn, "maps", input.map_id)? {
            return Err(Error::not_found("Map not found"));
        }
        check_layer(&conn, input.map_id, input.layer_id)?;

        let shape = MapShape {
            id: Uuid::new_v4(),
            map_id: input.map_id,
            layer_id: input.layer_id,
            name: input.name,
            points: input.points,
            meta: input.meta,
            created_at: Utc::now(),
        };
        insert_shape(&conn, &shape)?;
        Ok(shape)
    }

    pub fn update_shape(&self, id: Uuid, input: UpdateMapShapeInput) -> Result<Option<MapShape>> {
        if let Some(points) = &input.points {
            validate_points(points, MIN_SHAPE_POINTS, "shape")?;
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = query_shape(&conn, id)? else {
            return Ok(None);
        };
        check_layer(&conn, existing.map_id, input.layer_id)?;

        let updated = MapShape {
            layer_id: input.layer_id.or(existing.layer_id),
            name: input.name.unwrap_or(existing.name),
            points: input.points.unwrap_or(existing.points),
            meta: input.meta.or(existing.meta),
            ..existing
        };

        conn.execute(
            "UPDATE shapes SET layer_id = ?, name = ?, shape_json = ?, meta_json = ? WHERE id = ?",
            (
                updated.layer_id.map(|id| id.to_string()),
                &updated.name,
                serde_json::to_string(&updated.points)?,
                meta_to_json(&updated.meta)?,
                id.to_string(),
            ),
        )?;

        Ok(Some(updated))
    }

    pub fn delete_shape(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM shapes WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Path operations
    // ============================================================

    pub fn get_paths_by_map(&self, map_id: Uuid, layer_id: Option<Uuid>) -> Result<Vec<MapPath>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM paths
             WHERE map_id = ?1 AND (?2 IS NULL OR layer_id = ?2)
             ORDER BY rowid",
            PATH_COLUMNS
        ))?;
        let paths = stmt
            .query_map(
                (map_id.to_string(), layer_id.map(|id| id.to_string())),
                path_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paths)
    }

    pub fn get_path(&self, id: Uuid) -> Result<Option<MapPath>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_path(&conn, id)
    }

    pub fn create_path(&self, input: CreateMapPathInput) -> Result<MapPath> {
        validate_points(&input.points, MIN_PATH_POINTS, "path")?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if !row_exists(&conn, "maps", input.map_id)? {
            return Err(Error::not_found("Map not found"));
        }
        check_layer(&conn, input.map_id, input.layer_id)?;

        let path = MapPath {
            id: Uuid::new_v4(),
            map_id: input.map_id,
            layer_id: input.layer_id,
            name: input.name,
            points: input.points,
            meta: input.meta,
            created_at: Utc::now(),
        };
        insert_path(&conn, &path)?;
        Ok(path)
    }

    pub fn update_path(&self, id: Uuid, input: UpdateMapPathInput) -> Result<Option<MapPath>> {
        if let Some(points) = &input.points {
            validate_points(points, MIN_PATH_POINTS, "path")?;
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = query_path(&conn, id)? else {
            return Ok(None);
        };
        check_layer(&conn, existing.map_id, input.layer_id)?;

        let updated = MapPath {
            layer_id: input.layer_id.or(existing.layer_id),
            name: input.name.unwrap_or(existing.name),
            points: input.points.unwrap_or(existing.points),
            meta: input.meta.or(existing.meta),
            ..existing
        };

        conn.execute(
            "UPDATE paths SET layer_id = ?, name = ?, path_json = ?, meta_json = ? WHERE id = ?",
            (
                updated.layer_id.map(|id| id.to_string()),
                &updated.name,
                serde_json::to_string(&updated.points)?,
                meta_to_json(&updated.meta)?,
                id.to_string(),
            ),
        )?;

        Ok(Some(updated))
    }

    /// Delete a path; its mission links go with it.
    pub fn delete_path(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM paths WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
