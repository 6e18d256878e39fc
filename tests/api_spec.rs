use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;
use worldnotes::api::{create_router, ErrorBody};
use worldnotes::db::Database;
use worldnotes::models::*;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_mission(server: &TestServer, title: &str) -> Mission {
    server
        .post("/api/missions")
        .json(&json!({ "title": title }))
        .await
        .json::<Mission>()
}

async fn create_test_map(server: &TestServer) -> Map {
    server
        .post("/api/maps")
        .json(&CreateMapInput {
            name: "Overworld".to_string(),
            image_path: "/maps/overworld.png".to_string(),
        })
        .await
        .json::<Map>()
}

async fn create_test_annotation(server: &TestServer, map_id: Uuid) -> Annotation {
    server
        .post("/api/annotations")
        .json(&json!({
            "map_id": map_id,
            "type": "poi",
            "title": "Shrine",
            "x": 12.5,
            "y": 40.0
        }))
        .await
        .json::<Annotation>()
}

// ============================================================
// Health endpoint
// ============================================================

mod health {
    use super::*;

    #[tokio::test]
    async fn returns_ok() {
        let server = setup();

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

// ============================================================
// Mission CRUD
// ============================================================

mod missions {
    use super::*;

    #[tokio::test]
    async fn create_returns_created_status() {
        let server = setup();

        let response = server
            .post("/api/missions")
            .json(&json!({
                "title": "Slay the dragon",
                "description": "It lives in the mountain",
                "priority": 4,
                "meta": { "reward": 100 }
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let mission: Mission = response.json();
        assert_eq!(mission.title, "Slay the dragon");
        assert_eq!(mission.status, MissionStatus::Todo);
        assert_eq!(mission.priority, 4);
        assert_eq!(mission.meta, Some(json!({ "reward": 100 })));
    }

    #[tokio::test]
    async fn create_without_title_is_a_bad_request() {
        let server = setup();

        let response = server
            .post("/api/missions")
            .json(&json!({ "description": "No title" }))
            .await;

        response.assert_status_bad_request();
        let body: ErrorBody = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let server = setup();

        let response = server.post("/api/missions").text("{ not json").await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_status_is_a_bad_request() {
        let server = setup();

        let response = server
            .post("/api/missions")
            .json(&json!({ "title": "Odd", "status": "paused" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn list_orders_by_priority() {
        let server = setup();

        server
            .post("/api/missions")
            .json(&json!({ "title": "A", "priority": 1 }))
            .await;
        server
            .post("/api/missions")
            .json(&json!({ "title": "B", "priority": 5 }))
            .await;

        let response = server.get("/api/missions").await;

        response.assert_status_ok();
        let missions: Vec<Mission> = response.json();
        let titles: Vec<&str> = missions.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn list_treats_empty_map_id_as_all_maps() {
        let server = setup();
        create_test_mission(&server, "Anywhere").await;

        let response = server.get("/api/missions?map_id=").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Mission>>().len(), 1);
    }

    #[tokio::test]
    async fn list_rejects_malformed_map_id() {
        let server = setup();

        let response = server.get("/api/missions?map_id=nope").await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn get_returns_details_with_relations() {
        let server = setup();
        let prereq = create_test_mission(&server, "Prereq").await;
        let mission = create_test_mission(&server, "Main").await;
        server
            .post(&format!("/api/missions/{}/dependencies", mission.id))
            .json(&json!({ "required_mission_id": prereq.id }))
            .await;

        let response = server.get(&format!("/api/missions/{}", mission.id)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Main");
        assert_eq!(body["unlocked"], false);
        assert_eq!(body["requiredMissions"][0]["id"], json!(prereq.id));
        assert_eq!(body["dependentMissions"], json!([]));
        assert_eq!(body["annotations"], json!([]));
        assert_eq!(body["paths"], json!([]));
    }

    #[tokio::test]
    async fn get_returns_not_found_for_nonexistent_mission() {
        let server = setup();

        let response = server.get(&format!("/api/missions/{}", Uuid::new_v4())).await;

        response.assert_status_not_found();
        let body: ErrorBody = response.json();
        assert!(body.error.contains("not found"));
    }

    #[tokio::test]
    async fn get_rejects_malformed_id() {
        let server = setup();

        let response = server.get("/api/missions/not-a-uuid").await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn update_modifies_only_given_fields() {
        let server = setup();
        let mission = create_test_mission(&server, "Original").await;

        let response = server
            .put(&format!("/api/missions/{}", mission.id))
            .json(&json!({ "status": "completed" }))
            .await;

        response.assert_status_ok();
        let updated: Mission = response.json();
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.status, MissionStatus::Completed);
    }

    #[tokio::test]
    async fn update_returns_not_found_for_nonexistent_mission() {
        let server = setup();

        let response = server
            .put(&format!("/api/missions/{}", Uuid::new_v4()))
            .json(&json!({ "title": "Ghost" }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_always_reports_success() {
        let server = setup();
        let mission = create_test_mission(&server, "Doomed").await;

        let response = server.delete(&format!("/api/missions/{}", mission.id)).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));

        let again = server.delete(&format!("/api/missions/{}", mission.id)).await;
        again.assert_status_ok();

        server
            .get(&format!("/api/missions/{}", mission.id))
            .await
            .assert_status_not_found();
    }
}

// ============================================================
// Dependencies
// ============================================================

mod dependencies {
    use super::*;

    #[tokio::test]
    async fn add_returns_created_then_ok_for_duplicate() {
        let server = setup();
        let a = create_test_mission(&server, "A").await;
        let b = create_test_mission(&server, "B").await;
        let path = format!("/api/missions/{}/dependencies", b.id);

        let first = server
            .post(&path)
            .json(&json!({ "required_mission_id": a.id }))
            .await;
        first.assert_status(StatusCode::CREATED);
        assert!(first.json::<LinkResponse>().created);

        let second = server
            .post(&path)
            .json(&json!({ "required_mission_id": a.id }))
            .await;
        second.assert_status_ok();
        assert!(!second.json::<LinkResponse>().created);

        let required: Vec<Mission> = server.get(&path).await.json();
        assert_eq!(required.len(), 1);
    }

    #[tokio::test]
    async fn self_dependency_is_a_bad_request() {
        let server = setup();
        let a = create_test_mission(&server, "A").await;

        let response = server
            .post(&format!("/api/missions/{}/dependencies", a.id))
            .json(&json!({ "required_mission_id": a.id }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn missing_mission_is_not_found() {
        let server = setup();
        let a = create_test_mission(&server, "A").await;

        let response = server
            .post(&format!("/api/missions/{}/dependencies", a.id))
            .json(&json!({ "required_mission_id": Uuid::new_v4() }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn remove_always_succeeds() {
        let server = setup();

        let response = server
            .delete(&format!(
                "/api/missions/{}/dependencies/{}",
                Uuid::new_v4(),
                Uuid::new_v4()
            ))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));
    }

    #[tokio::test]
    async fn completing_prerequisite_unlocks_dependent() {
        let server = setup();
        let a = create_test_mission(&server, "A").await;
        let b = create_test_mission(&server, "B").await;
        server
            .post(&format!("/api/missions/{}/dependencies", b.id))
            .json(&json!({ "required_mission_id": a.id }))
            .await;

        let before: MissionDetails = server.get(&format!("/api/missions/{}", b.id)).await.json();
        assert!(!before.unlocked);

        server
            .put(&format!("/api/missions/{}", a.id))
            .json(&json!({ "status": "completed" }))
            .await;

        let after: MissionDetails = server.get(&format!("/api/missions/{}", b.id)).await.json();
        assert!(after.unlocked);

        let dependents: Vec<Mission> = server
            .get(&format!("/api/missions/{}/dependents", a.id))
            .await
            .json();
        assert_eq!(dependents[0].id, b.id);
    }

    #[tokio::test]
    async fn deadlocked_lists_cycle_members() {
        let server = setup();
        let a = create_test_mission(&server, "A").await;
        let b = create_test_mission(&server, "B").await;
        create_test_mission(&server, "Bystander").await;
        server
            .post(&format!("/api/missions/{}/dependencies", a.id))
            .json(&json!({ "required_mission_id": b.id }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/api/missions/{}/dependencies", b.id))
            .json(&json!({ "required_mission_id": a.id }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/missions/deadlocked").await;

        response.assert_status_ok();
        let mut ids: Vec<Uuid> = response.json::<Vec<Mission>>().into_iter().map(|m| m.id).collect();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);
    }
}

// ============================================================
// Mission links
// ============================================================

mod links {
    use super::*;

    #[tokio::test]
    async fn linking_annotation_twice_keeps_one_link() {
        let server = setup();
        let map = create_test_map(&server).await;
        let annotation = create_test_annotation(&server, map.id).await;
        let mission = create_test_mission(&server, "Visit shrine").await;
        let path = format!("/api/missions/{}/annotations", mission.id);

        server
            .post(&path)
            .json(&LinkAnnotationInput { annotation_id: annotation.id })
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&path)
            .json(&LinkAnnotationInput { annotation_id: annotation.id })
            .await
            .assert_status_ok();

        let details: MissionDetails = server
            .get(&format!("/api/missions/{}", mission.id))
            .await
            .json();
        assert_eq!(details.annotations.len(), 1);
        assert_eq!(details.annotations[0].id, annotation.id);
    }

    #[tokio::test]
    async fn linking_missing_annotation_is_not_found() {
        let server = setup();
        let mission = create_test_mission(&server, "Nowhere").await;

        let response = server
            .post(&format!("/api/missions/{}/annotations", mission.id))
            .json(&json!({ "annotation_id": Uuid::new_v4() }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn links_and_unlinks_a_path() {
        let server = setup();
        let map = create_test_map(&server).await;
        let road: MapPath = server
            .post("/api/paths")
            .json(&json!({
                "map_id": map.id,
                "name": "King's road",
                "points": [{ "x": 0.0, "y": 0.0 }, { "x": 3.0, "y": 4.0 }]
            }))
            .await
            .json();
        let mission = create_test_mission(&server, "Travel").await;
        let link = format!("/api/missions/{}/paths", mission.id);

        server
            .post(&link)
            .json(&LinkPathInput { path_id: road.id })
            .await
            .assert_status(StatusCode::CREATED);

        let relinked = server.post(&link).json(&LinkPathInput { path_id: road.id }).await;
        relinked.assert_status_ok();
        relinked.assert_json(&json!({ "success": true, "created": false }));

        let details: MissionDetails = server
            .get(&format!("/api/missions/{}", mission.id))
            .await
            .json();
        assert_eq!(details.paths.len(), 1);

        server
            .delete(&format!("/api/missions/{}/paths/{}", mission.id, road.id))
            .await
            .assert_status_ok();

        let details: MissionDetails = server
            .get(&format!("/api/missions/{}", mission.id))
            .await
            .json();
        assert!(details.paths.is_empty());
    }
}

// ============================================================
// Progression
// ============================================================

mod progression {
    use super::*;

    #[tokio::test]
    async fn empty_world_reports_zero() {
        let server = setup();

        let response = server.get("/api/progression").await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "missions": { "total": 0, "completed": 0, "unlocked": 0, "progress": 0 },
            "annotations": { "total": 0, "unlocked": 0, "locked": 0, "progress": 0 },
            "overall": { "progress": 0 }
        }));
    }

    #[tokio::test]
    async fn counts_missions_and_annotations() {
        let server = setup();
        let map = create_test_map(&server).await;
        create_test_annotation(&server, map.id).await;
        let a = create_test_mission(&server, "A").await;
        create_test_mission(&server, "B").await;
        server
            .put(&format!("/api/missions/{}", a.id))
            .json(&json!({ "status": "completed" }))
            .await;

        let report: ProgressionReport = server
            .get(&format!("/api/progression?map_id={}", map.id))
            .await
            .json();
        assert_eq!(report.missions.total, 0);
        assert_eq!(report.annotations.total, 1);
        assert_eq!(report.overall.progress, 100);

        let report: ProgressionReport = server.get("/api/progression").await.json();
        assert_eq!(report.missions.total, 2);
        assert_eq!(report.missions.progress, 50);
        assert_eq!(report.overall.progress, 67);
    }
}

// ============================================================
// Map entities
// ============================================================

mod entities {
    use super::*;

    #[tokio::test]
    async fn map_lifecycle() {
        let server = setup();
        let map = create_test_map(&server).await;

        server
            .get(&format!("/api/maps/{}", map.id))
            .await
            .assert_status_ok();
        assert_eq!(server.get("/api/maps").await.json::<Vec<Map>>().len(), 1);

        server
            .delete(&format!("/api/maps/{}", map.id))
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/maps/{}", map.id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn annotations_filter_by_type() {
        let server = setup();
        let map = create_test_map(&server).await;
        create_test_annotation(&server, map.id).await;
        server
            .post("/api/annotations")
            .json(&json!({ "map_id": map.id, "type": "city", "title": "Capital", "x": 1.0, "y": 1.0 }))
            .await
            .assert_status(StatusCode::CREATED);

        let cities: Vec<Annotation> = server
            .get(&format!("/api/maps/{}/annotations?type=city", map.id))
            .await
            .json();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].kind, "city");

        let all: Vec<Annotation> = server
            .get(&format!("/api/maps/{}/annotations", map.id))
            .await
            .json();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn annotation_for_missing_map_is_not_found() {
        let server = setup();

        let response = server
            .post("/api/annotations")
            .json(&json!({ "map_id": Uuid::new_v4(), "type": "poi", "title": "Lost", "x": 0.0, "y": 0.0 }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn annotation_unlocked_flag_can_be_toggled() {
        let server = setup();
        let map = create_test_map(&server).await;
        let annotation = create_test_annotation(&server, map.id).await;
        assert!(annotation.unlocked);

        let updated: Annotation = server
            .put(&format!("/api/annotations/{}", annotation.id))
            .json(&json!({ "unlocked": false }))
            .await
            .json();

        assert!(!updated.unlocked);
        assert_eq!(updated.title, annotation.title);
    }

    #[tokio::test]
    async fn media_is_attached_to_annotation() {
        let server = setup();
        let map = create_test_map(&server).await;
        let annotation = create_test_annotation(&server, map.id).await;
        let path = format!("/api/annotations/{}/media", annotation.id);

        server
            .post(&path)
            .json(&json!({ "kind": "image", "url": "https://example.com/shrine.png" }))
            .await
            .assert_status(StatusCode::CREATED);

        let media: Vec<Media> = server.get(&path).await.json();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].kind, "image");
    }

    #[tokio::test]
    async fn layers_are_created_listed_and_deleted() {
        let server = setup();
        let map = create_test_map(&server).await;
        let layers = format!("/api/maps/{}/layers", map.id);

        let response = server.post(&layers).json(&json!({ "name": "Rivers", "order": 1 })).await;
        response.assert_status(StatusCode::CREATED);
        let rivers: Layer = response.json();
        let cities: Layer = server.post(&layers).json(&json!({ "name": "Cities" })).await.json();

        let listed: Vec<Uuid> = server
            .get(&layers)
            .await
            .json::<Vec<Layer>>()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(listed, vec![cities.id, rivers.id]);

        server
            .delete(&format!("/api/layers/{}", rivers.id))
            .await
            .assert_status_ok();
        assert_eq!(server.get(&layers).await.json::<Vec<Layer>>().len(), 1);
    }

    #[tokio::test]
    async fn layer_without_name_is_a_bad_request() {
        let server = setup();
        let map = create_test_map(&server).await;

        server
            .post(&format!("/api/maps/{}/layers", map.id))
            .json(&json!({ "order": 3 }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn map_listings_filter_by_layer() {
        let server = setup();
        let map = create_test_map(&server).await;
        let layer: Layer = server
            .post(&format!("/api/maps/{}/layers", map.id))
            .json(&json!({ "name": "Ruins" }))
            .await
            .json();
        create_test_annotation(&server, map.id).await;
        server
            .post("/api/annotations")
            .json(&json!({
                "map_id": map.id,
                "layer_id": layer.id,
                "type": "ruin",
                "title": "Old fort",
                "x": 2.0,
                "y": 3.0
            }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/shapes")
            .json(&json!({
                "map_id": map.id,
                "layer_id": layer.id,
                "name": "Fort grounds",
                "points": [{ "x": 0.0, "y": 0.0 }, { "x": 2.0, "y": 0.0 }, { "x": 1.0, "y": 2.0 }]
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let annotations: Vec<Annotation> = server
            .get(&format!("/api/maps/{}/annotations?layer_id={}", map.id, layer.id))
            .await
            .json();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].title, "Old fort");

        let shapes: Vec<MapShape> = server
            .get(&format!("/api/maps/{}/shapes?layer_id={}", map.id, layer.id))
            .await
            .json();
        assert_eq!(shapes.len(), 1);

        let paths: Vec<MapPath> = server
            .get(&format!("/api/maps/{}/paths?layer_id={}", map.id, layer.id))
            .await
            .json();
        assert!(paths.is_empty());

        server
            .get(&format!("/api/maps/{}/annotations?layer_id=nope", map.id))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn shape_lifecycle() {
        let server = setup();
        let map = create_test_map(&server).await;

        let response = server
            .post("/api/shapes")
            .json(&json!({
                "map_id": map.id,
                "name": "Duchy",
                "points": [{ "x": 0.0, "y": 0.0 }, { "x": 5.0, "y": 0.0 }, { "x": 5.0, "y": 5.0 }],
                "meta": { "fill": "green" }
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let shape: MapShape = response.json();

        let updated: MapShape = server
            .put(&format!("/api/shapes/{}", shape.id))
            .json(&json!({ "name": "Grand duchy" }))
            .await
            .json();
        assert_eq!(updated.name, "Grand duchy");
        assert_eq!(updated.points, shape.points);
        assert_eq!(updated.meta, Some(json!({ "fill": "green" })));

        server
            .delete(&format!("/api/shapes/{}", shape.id))
            .await
            .assert_status_ok();
        let shapes: Vec<MapShape> = server
            .get(&format!("/api/maps/{}/shapes", map.id))
            .await
            .json();
        assert!(shapes.is_empty());

        server
            .put(&format!("/api/shapes/{}", shape.id))
            .json(&json!({ "name": "Gone" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn shape_with_two_points_is_a_bad_request() {
        let server = setup();
        let map = create_test_map(&server).await;

        let response = server
            .post("/api/shapes")
            .json(&json!({
                "map_id": map.id,
                "points": [{ "x": 0.0, "y": 0.0 }, { "x": 1.0, "y": 1.0 }]
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn path_with_one_point_is_a_bad_request() {
        let server = setup();
        let map = create_test_map(&server).await;

        let response = server
            .post("/api/paths")
            .json(&json!({ "map_id": map.id, "name": "Dot", "points": [{ "x": 0.0, "y": 0.0 }] }))
            .await;

        response.assert_status_bad_request();
    }
}

// ============================================================
// Export / Import
// ============================================================

mod transfer {
    use super::*;

    #[tokio::test]
    async fn export_sets_download_header() {
        let server = setup();
        create_test_mission(&server, "Exported").await;

        let response = server.get("/api/export").await;

        response.assert_status_ok();
        let disposition = response.header("content-disposition");
        assert!(disposition.to_str().unwrap().contains("worldnotes-export.json"));
        let export: WorldExport = response.json();
        assert_eq!(export.version, EXPORT_VERSION);
        assert_eq!(export.missions.len(), 1);
    }

    #[tokio::test]
    async fn import_restores_dependencies() {
        let source = setup();
        let a = create_test_mission(&source, "A").await;
        let b = create_test_mission(&source, "B").await;
        source
            .post(&format!("/api/missions/{}/dependencies", b.id))
            .json(&json!({ "required_mission_id": a.id }))
            .await;
        let export: WorldExport = source.get("/api/export").await.json();

        let target = setup();
        let response = target.post("/api/import").json(&export).await;

        response.assert_status_ok();
        let body: ImportResponse = response.json();
        assert!(body.success);
        assert_eq!(body.imported.missions, 2);
        assert_eq!(body.imported.mission_dependencies, 1);

        let missions: Vec<Mission> = target.get("/api/missions").await.json();
        let new_b = missions.iter().find(|m| m.title == "B").unwrap();
        let required: Vec<Mission> = target
            .get(&format!("/api/missions/{}/dependencies", new_b.id))
            .await
            .json();
        assert_eq!(required[0].title, "A");
    }

    #[tokio::test]
    async fn import_with_dangling_reference_is_rejected() {
        let server = setup();

        let response = server
            .post("/api/import")
            .json(&json!({
                "mission_annotations": [{
                    "mission_id": Uuid::new_v4(),
                    "annotation_id": Uuid::new_v4()
                }]
            }))
            .await;

        response.assert_status_bad_request();
    }
}

// ============================================================
// Security
// ============================================================

mod security_auth {
    use super::*;
    use worldnotes::api::{create_router_with_config, SecurityConfig};

    fn setup_with(config: SecurityConfig) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with_config(db, config);
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        server.get("/api/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_requires_auth() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server.get("/api/missions").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorBody = response.json();
        assert_eq!(body.error, "Missing bearer token");
    }

    #[tokio::test]
    async fn protected_endpoint_accepts_valid_bearer_token() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server
            .get("/api/missions")
            .add_header("Authorization", "Bearer test-secret-key")
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_invalid_bearer_token() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server
            .get("/api/progression")
            .add_header("Authorization", "Bearer wrong-key")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_malformed_auth_header() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server
            .get("/api/missions")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rate_limiter_rejects_excess_requests() {
        let server = setup_with(SecurityConfig::with_rate_limit(2));

        server.get("/api/missions").await.assert_status_ok();
        server.get("/api/missions").await.assert_status_ok();
        server
            .get("/api/missions")
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);

        // health is outside the limiter
        server.get("/api/health").await.assert_status_ok();
    }
}
