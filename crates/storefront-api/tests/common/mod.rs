#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use storefront_api::routes::router;
use storefront_api::{AppState, AppStateInner};
use storefront_db::Database;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("storefront.db")).unwrap();
    let state = AppStateInner::new(db);
    TestApp {
        router: router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn create_user(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/users",
                Some(json!({ "name": name, "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_component(&self, name: &str, slug: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/components",
                Some(json!({ "name": name, "slug": slug })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Records a purchase and returns the created order.
    pub async fn purchase(&self, body: Value) -> Value {
        let (status, response) = self.call(Method::POST, "/orders", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{response}");
        assert_eq!(response["success"], true);
        response["purchase"].clone()
    }
}
