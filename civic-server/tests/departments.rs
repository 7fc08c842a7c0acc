mod common;

use common::TestApp;
use http::{Method, StatusCode};
use serde_json::json;
use shared::models::AdminStatus;

fn create_body(name: &str, code: &str, email: &str) -> serde_json::Value {
    json!({
        "name": name,
        "code": code,
        "contact_email": email,
        "categories": ["roads", "lighting"],
        "priority": 2,
        "working_hours": { "days": ["Monday", "friday"], "start": "08:00", "end": "16:30" },
        "location": { "address": "1 City Hall Plaza", "coordinates": { "lat": 40.7, "lng": -74.0 } }
    })
}

#[tokio::test]
async fn test_create_then_get_keeps_categories_in_order() {
    let app = TestApp::new().await;
    let token = app.admin_token(AdminStatus::Active).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/departments",
            Some(&token),
            Some(create_body("Roads", "roads", "Roads@City.gov")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Department created");
    assert_eq!(body["data"]["code"], "ROADS");
    assert_eq!(body["data"]["contact_email"], "roads@city.gov");
    assert_eq!(body["data"]["working_hours"]["days"], json!(["monday", "friday"]));

    let id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/departments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["categories"], json!(["roads", "lighting"]));
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_conflicts_name_the_field() {
    let app = TestApp::new().await;
    let token = app.admin_token(AdminStatus::Active).await;
    let existing = app.seed_department("ROADS", None).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/departments",
            Some(&token),
            Some(create_body("Streets", "roads", "streets@city.gov")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "code");
    assert_eq!(body["errors"][0]["value"], "ROADS");

    // Deactivated rows still hold their unique values
    app.request(
        Method::DELETE,
        &format!("/api/departments/{}", existing.id),
        Some(&token),
        None,
    )
    .await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/departments",
            Some(&token),
            Some(create_body("Streets", "STREETS", &existing.contact_email)),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"][0]["field"], "contact_email");
}

#[tokio::test]
async fn test_update_conflict_and_partial_merge() {
    let app = TestApp::new().await;
    let token = app.admin_token(AdminStatus::Active).await;
    let roads = app.seed_department("ROADS", None).await;
    let water = app.seed_department("WATER", None).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/departments/{}", water.id),
            Some(&token),
            Some(json!({ "code": "roads" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"][0]["field"], "code");

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/departments/{}", roads.id),
            Some(&token),
            Some(json!({ "priority": 5, "description": "Potholes and signage" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["priority"], 5);
    assert_eq!(body["data"]["description"], "Potholes and signage");
    assert_eq!(body["data"]["name"], roads.name);
}

#[tokio::test]
async fn test_soft_delete_keeps_row() {
    let app = TestApp::new().await;
    let token = app.admin_token(AdminStatus::Active).await;
    let roads = app.seed_department("ROADS", None).await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/departments/{}", roads.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = app.get(&format!("/api/departments/{}", roads.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
    assert_eq!(body["data"]["code"], "ROADS");
    assert_eq!(body["data"]["categories"], json!(["roads", "lighting"]));

    let (_, body) = app.get("/api/departments?is_active=false", None).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_pagination_contract() {
    let app = TestApp::new().await;
    for i in 0..45 {
        app.seed_department(&format!("D{i:02}"), None).await;
    }

    let (status, body) = app.get("/api/departments?limit=20&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 20);
    assert_eq!(body["pagination"]["total"], 45);
    assert_eq!(body["pagination"]["pages"], 3);
    assert_eq!(body["pagination"]["page"], 2);

    let (_, body) = app.get("/api/departments?limit=20&page=3", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    // Bad pagination falls back to defaults
    let (status, body) = app.get("/api/departments?limit=abc&page=-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["limit"], 20);
    assert_eq!(body["pagination"]["page"], 1);
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new().await;
    app.seed_department("ROADS", None).await;
    app.seed_department("WATER", None).await;

    let (_, body) = app.get("/api/departments?search=water", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["code"], "WATER");

    let (_, body) = app.get("/api/departments?category=lighting", None).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app.get("/api/departments?category=parks", None).await;
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(body["pagination"]["pages"], 0);

    let (status, body) = app.get("/api/departments?is_active=TRUE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);

    let (status, body) = app.get("/api/departments?is_active=sometimes", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "is_active");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = TestApp::new().await;
    let token = app.admin_token(AdminStatus::Active).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/departments",
            Some(&token),
            Some(json!({
                "name": "R",
                "code": "ROADS",
                "contact_email": "nope",
                "categories": ["roads", ""],
                "priority": 7
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    for expected in ["name", "contact_email", "categories", "priority"] {
        assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
    }

    let (status, body) = app.get("/api/departments/not-a-number", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "id");

    let (status, _) = app.get("/api/departments/999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_guard() {
    let app = TestApp::new().await;
    let body = Some(create_body("Roads", "ROADS", "roads@city.gov"));

    let (status, response) = app
        .request(Method::POST, "/api/departments", None, body.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["success"], false);

    let (status, _) = app
        .request(Method::POST, "/api/departments", Some("garbage"), body.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let access = app.user_token("acct-1", "admin");
    let (status, _) = app
        .request(Method::POST, "/api/departments", Some(&access), body.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let suspended = app.admin_token(AdminStatus::Suspended).await;
    let (status, _) = app
        .request(Method::POST, "/api/departments", Some(&suspended), body.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ghost = app
        .state
        .jwt_service
        .generate_admin_token(123_456, "ghost@city.gov", "admin")
        .unwrap();
    let (status, _) = app
        .request(Method::POST, "/api/departments", Some(&ghost), body.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public
    let (status, _) = app.get("/api/departments", None).await;
    assert_eq!(status, StatusCode::OK);
}
