//! Shared helpers for router-level tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use civic_server::ServerState;
use civic_server::api::build_app;
use civic_server::auth::JwtConfig;
use civic_server::db::repository::admin;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::models::{AdminStatus, Department, DepartmentCreate, Issue, IssueCreate};
use tower::ServiceExt;

pub struct TestApp {
    pub state: ServerState,
    app: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let state = ServerState::for_tests(JwtConfig::for_tests())
            .await
            .expect("test state");
        Self::with_state(state)
    }

    pub fn with_state(state: ServerState) -> Self {
        let app = build_app(state.clone());
        Self { state, app }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// Admin token for a freshly seeded administrator
    pub async fn admin_token(&self, status: AdminStatus) -> String {
        let email = format!("admin-{}@city.gov", shared::util::snowflake_id());
        let record = admin::create(&self.state.db.pool, "Ops", &email, "admin", status)
            .await
            .expect("seed admin");
        self.state
            .jwt_service
            .generate_admin_token(record.id, &record.email, &record.role)
            .expect("admin token")
    }

    /// Access token for an ordinary account
    pub fn user_token(&self, account_id: &str, role: &str) -> String {
        self.state
            .jwt_service
            .generate_token(account_id, account_id, role)
            .expect("user token")
    }

    pub async fn seed_department(&self, code: &str, account_id: Option<&str>) -> Department {
        let data: DepartmentCreate = serde_json::from_value(serde_json::json!({
            "name": format!("Department {code}"),
            "code": code,
            "contact_email": format!("{}@city.gov", code.to_lowercase()),
            "categories": ["roads", "lighting"],
            "account_id": account_id,
        }))
        .expect("department payload");
        self.state
            .departments
            .create(data)
            .await
            .expect("seed department")
    }

    pub async fn seed_issue(&self, department_id: i64, title: &str) -> Issue {
        self.state
            .issues
            .create(IssueCreate {
                title: title.into(),
                description: "Reported by a resident".into(),
                category: "roads".into(),
                department_id: Some(department_id),
                reporter_id: "citizen-1".into(),
                address: None,
            })
            .await
            .expect("seed issue")
    }
}
