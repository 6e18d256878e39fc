use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::db::Database;
use crate::models::*;

type ApiResult<T> = Result<T, ApiError>;

/// `?map_id=` on listing routes. An empty value means "all maps".
#[derive(Debug, Default, Deserialize)]
pub struct MapScopeQuery {
    pub map_id: Option<String>,
}

impl MapScopeQuery {
    fn map_id(&self) -> ApiResult<Option<Uuid>> {
        optional_uuid("map_id", self.map_id.as_deref())
    }
}

/// `?layer_id=` on map listings. An empty value means "every layer".
#[derive(Debug, Default, Deserialize)]
pub struct LayerScopeQuery {
    pub layer_id: Option<String>,
}

impl LayerScopeQuery {
    fn layer_id(&self) -> ApiResult<Option<Uuid>> {
        optional_uuid("layer_id", self.layer_id.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnotationQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub layer_id: Option<String>,
}

impl AnnotationQuery {
    fn filter(self) -> ApiResult<AnnotationFilter> {
        Ok(AnnotationFilter {
            layer_id: optional_uuid("layer_id", self.layer_id.as_deref())?,
            kind: self.kind.filter(|k| !k.is_empty()),
        })
    }
}

fn optional_uuid(field: &str, raw: Option<&str>) -> ApiResult<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", field, raw))),
    }
}

/// 201 for a new relation row, 200 when the pair was already there.
fn link_response(outcome: LinkOutcome) -> (StatusCode, Json<LinkResponse>) {
    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(outcome.into()))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Missions
// ============================================================

pub async fn list_missions(
    State(db): State<Database>,
    ApiQuery(query): ApiQuery<MapScopeQuery>,
) -> ApiResult<Json<Vec<Mission>>> {
    let filter = MissionFilter {
        map_id: query.map_id()?,
    };
    Ok(Json(db.list_missions(&filter)?))
}

pub async fn get_mission(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MissionDetails>> {
    Ok(Json(db.get_mission_details(id)?))
}

pub async fn create_mission(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateMissionInput>,
) -> ApiResult<(StatusCode, Json<Mission>)> {
    let mission = db.create_mission(input)?;
    Ok((StatusCode::CREATED, Json(mission)))
}

pub async fn update_mission(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateMissionInput>,
) -> ApiResult<Json<Mission>> {
    Ok(Json(db.update_mission(id, input)?))
}

pub async fn delete_mission(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_mission(id)?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_deadlocked(
    State(db): State<Database>,
    ApiQuery(query): ApiQuery<MapScopeQuery>,
) -> ApiResult<Json<Vec<Mission>>> {
    Ok(Json(db.deadlocked_missions(query.map_id()?)?))
}

// ============================================================
// Mission links
// ============================================================

pub async fn link_annotation(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LinkAnnotationInput>,
) -> ApiResult<(StatusCode, Json<LinkResponse>)> {
    Ok(link_response(db.link_annotation(id, input.annotation_id)?))
}

pub async fn unlink_annotation(
    State(db): State<Database>,
    ApiPath((id, annotation_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<SuccessResponse>> {
    db.unlink_annotation(id, annotation_id)?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn link_path(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LinkPathInput>,
) -> ApiResult<(StatusCode, Json<LinkResponse>)> {
    Ok(link_response(db.link_path(id, input.path_id)?))
}

pub async fn unlink_path(
    State(db): State<Database>,
    ApiPath((id, path_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<SuccessResponse>> {
    db.unlink_path(id, path_id)?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Dependencies
// ============================================================

pub async fn list_dependencies(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Mission>>> {
    Ok(Json(db.get_required(id)?))
}

pub async fn list_dependents(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Mission>>> {
    Ok(Json(db.get_dependents(id)?))
}

pub async fn add_dependency(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AddDependencyInput>,
) -> ApiResult<(StatusCode, Json<LinkResponse>)> {
    Ok(link_response(db.add_dependency(id, input.required_mission_id)?))
}

pub async fn remove_dependency(
    State(db): State<Database>,
    ApiPath((id, required_mission_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<SuccessResponse>> {
    db.remove_dependency(id, required_mission_id)?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Progression
// ============================================================

pub async fn get_progression(
    State(db): State<Database>,
    ApiQuery(query): ApiQuery<MapScopeQuery>,
) -> ApiResult<Json<ProgressionReport>> {
    Ok(Json(db.compute_progression(query.map_id()?)?))
}

// ============================================================
// Maps
// ============================================================

pub async fn list_maps(State(db): State<Database>) -> ApiResult<Json<Vec<Map>>> {
    Ok(Json(db.get_all_maps()?))
}

pub async fn get_map(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Map>> {
    db.get_map(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Map not found"))
}

pub async fn create_map(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateMapInput>,
) -> ApiResult<(StatusCode, Json<Map>)> {
    let map = db.create_map(input)?;
    Ok((StatusCode::CREATED, Json(map)))
}

pub async fn delete_map(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_map(id)?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_map_annotations(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AnnotationQuery>,
) -> ApiResult<Json<Vec<Annotation>>> {
    Ok(Json(db.get_annotations_by_map(id, &query.filter()?)?))
}

pub async fn list_map_shapes(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LayerScopeQuery>,
) -> ApiResult<Json<Vec<MapShape>>> {
    Ok(Json(db.get_shapes_by_map(id, query.layer_id()?)?))
}

pub async fn list_map_paths(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LayerScopeQuery>,
) -> ApiResult<Json<Vec<MapPath>>> {
    Ok(Json(db.get_paths_by_map(id, query.layer_id()?)?))
}

// ============================================================
// Layers
// ============================================================

pub async fn list_layers(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Layer>>> {
    Ok(Json(db.get_layers_by_map(id)?))
}

pub async fn create_layer(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CreateLayerInput>,
) -> ApiResult<(StatusCode, Json<Layer>)> {
    let layer = db.create_layer(id, input)?;
    Ok((StatusCode::CREATED, Json(layer)))
}

pub async fn delete_layer(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_layer(id)?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Annotations
// ============================================================

pub async fn create_annotation(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateAnnotationInput>,
) -> ApiResult<(StatusCode, Json<Annotation>)> {
    let annotation = db.create_annotation(input)?;
    Ok((StatusCode::CREATED, Json(annotation)))
}

pub async fn update_annotation(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateAnnotationInput>,
) -> ApiResult<Json<Annotation>> {
    db.update_annotation(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Annotation not found"))
}

pub async fn delete_annotation(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_annotation(id)?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_media(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Media>>> {
    Ok(Json(db.get_media(id)?))
}

pub async fn create_media(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CreateMediaInput>,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let media = db.create_media(id, input)?;
    Ok((StatusCode::CREATED, Json(media)))
}

// ============================================================
// Shapes
// ============================================================

pub async fn create_shape(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateMapShapeInput>,
) -> ApiResult<(StatusCode, Json<MapShape>)> {
    let shape = db.create_shape(input)?;
    Ok((StatusCode::CREATED, Json(shape)))
}

pub async fn update_shape(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateMapShapeInput>,
) -> ApiResult<Json<MapShape>> {
    db.update_shape(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shape not found"))
}

pub async fn delete_shape(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_shape(id)?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Paths
// ============================================================

pub async fn create_path(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateMapPathInput>,
) -> ApiResult<(StatusCode, Json<MapPath>)> {
    let path = db.create_path(input)?;
    Ok((StatusCode::CREATED, Json(path)))
}

pub async fn update_path(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateMapPathInput>,
) -> ApiResult<Json<MapPath>> {
    db.update_path(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Path not found"))
}

pub async fn delete_path(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    db.delete_path(id)?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Export / Import
// ============================================================

pub async fn export_world(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    let export = db.export_world()?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"worldnotes-export.json\"",
        )],
        Json(export),
    ))
}

pub async fn import_world(
    State(db): State<Database>,
    ApiJson(bundle): ApiJson<WorldExport>,
) -> ApiResult<Json<ImportResponse>> {
    let imported = db.import_world(bundle)?;
    Ok(Json(ImportResponse {
        success: true,
        imported,
    }))
}
