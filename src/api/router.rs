//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Handlers use `State<ApiContext>`; the audit layer wraps them all.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/forms", get(endpoints::forms::list))
        .route("/forms/:kind", get(endpoints::forms::schema))
        .route(
            "/diagnoses/:kind",
            axum::routing::post(endpoints::diagnoses::submit),
        )
        .route("/history", get(endpoints::history::list))
        .route("/admin", get(endpoints::admin::dashboard))
        .route(
            "/admin/diagnoses/:id/form",
            get(endpoints::admin::edit_form),
        )
        .route(
            "/admin/diagnoses/:id",
            axum::routing::put(endpoints::admin::update).delete(endpoints::admin::delete),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors);

    Router::new().nest("/api", routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core_state::tests::mock_state;
    use crate::inference::{
        DEPRESSION_RISK, HEART_NO_RISK, HEART_RISK, OBESITY_CATEGORIES, UNDETERMINED,
    };
    use crate::store::gateway::tests::OfflineStore;
    use crate::store::{DocumentStore, MemoryStore};

    const ADMIN_PEER: &str = "198.51.100.4:50000";
    const VIEWER_PEER: &str = "192.0.2.9:50000";

    fn setup(heart: i64, depression: i64, obesity: i64) -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        let core = Arc::new(mock_state(heart, depression, obesity, store.clone()));
        store
            .patch("ips/198_51_100_4", &json!({"role": 1, "access_times": []}))
            .unwrap();
        (store, api_router(core))
    }

    fn request(method: &str, uri: &str, peer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        req
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn heart_values() -> Value {
        json!({
            "age": 45,
            "gender": 0,
            "chest_pain": 1,
            "blood_pressure": 130,
            "cholesterol": 240,
            "heartbeat": 150,
            "thalassemia": 3
        })
    }

    async fn submit_heart(app: &Router, user: &str) -> Value {
        let req = request(
            "POST",
            "/api/diagnoses/heart",
            None,
            Some(json!({"user_name": user, "values": heart_values()})),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (_, app) = setup(0, 0, 0);
        let response = app.oneshot(request("GET", "/api/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
        assert_eq!(json["timezone"], "Asia/Bangkok");
    }

    #[tokio::test]
    async fn forms_list_and_schema() {
        let (_, app) = setup(0, 0, 0);
        let json = response_json(
            app.clone()
                .oneshot(request("GET", "/api/forms", None, None))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[2]["kind"], "obesity");
        assert_eq!(json[2]["field_count"], 16);

        let json = response_json(
            app.clone()
                .oneshot(request("GET", "/api/forms/heart", None, None))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["fields"][0]["name"], "age");
        assert_eq!(json["fields"][1]["type"], "choice");
        assert_eq!(json["fields"][1]["options"][0]["label"], "Nam");
        assert_eq!(json["fields"][1]["options"][0]["code"], 0);

        let response = app
            .oneshot(request("GET", "/api/forms/diabetes", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_heart_stores_record() {
        let (store, app) = setup(0, 0, 0);
        let json = submit_heart(&app, "Lan").await;

        assert_eq!(json["display"], format!("Lan: {HEART_NO_RISK}"));
        assert_eq!(json["warnings"], json!([]));
        let id = json["id"].as_str().unwrap();
        let stored = store.get(&format!("diagnoses/{id}")).unwrap();
        assert_eq!(stored["inputs"]["thalassemia"], "Bình thường (3)");
        assert_eq!(stored["timestamp"].as_str().unwrap().len(), 19);
    }

    #[tokio::test]
    async fn placeholder_blocks_prediction_and_write() {
        let (store, app) = setup(1, 0, 0);
        let mut values = heart_values();
        values["gender"] = Value::Null;
        values.as_object_mut().unwrap().remove("thalassemia");

        let req = request(
            "POST",
            "/api/diagnoses/heart",
            None,
            Some(json!({"user_name": "Lan", "values": values})),
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        let fields: Vec<_> = json["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["gender", "thalassemia"]);
        assert_eq!(store.get("diagnoses").unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn depression_risk_message() {
        let (_, app) = setup(0, 1, 0);
        let values = json!({
            "gender": 1, "age": 21, "study_pressure": 4, "cgpa": 7.5,
            "satisfaction": 2, "sleep": 1, "diet": 1, "suicide_thoughts": 1,
            "study_hours": 9, "financial_pressure": 5, "family_history": 0
        });
        let req = request(
            "POST",
            "/api/diagnoses/depression",
            None,
            Some(json!({"user_name": "Minh", "values": values})),
        );
        let json = response_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(json["record"]["result"], DEPRESSION_RISK);
        assert_eq!(json["record"]["inputs"]["gender"], "Nam (1)");
    }

    #[tokio::test]
    async fn obesity_classes_map_to_categories() {
        let values = json!({
            "gender": 0, "age": 30, "height": 1.6, "weight": 55.0,
            "family_history": 0, "caloric_food": 1, "veg_intake": 1,
            "meals_per_day": 3, "snacking": 1, "smoking": 0, "water_liter": 2.0,
            "track_calories": 0, "activity": 2, "device_time": 1,
            "alcohol": 0, "transport": 2
        });

        for (class, expected) in [(3, OBESITY_CATEGORIES[3]), (7, UNDETERMINED)] {
            let (_, app) = setup(0, 0, class);
            let req = request(
                "POST",
                "/api/diagnoses/obesity",
                None,
                Some(json!({"user_name": "Hà", "values": values.clone()})),
            );
            let json = response_json(app.oneshot(req).await.unwrap()).await;
            assert_eq!(json["class_id"], class);
            assert_eq!(json["record"]["result"], expected);
        }
    }

    #[tokio::test]
    async fn unknown_kind_is_404() {
        let (_, app) = setup(0, 0, 0);
        let req = request("POST", "/api/diagnoses/flu", None, Some(json!({"values": {}})));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn offline_store_returns_warning() {
        let core = Arc::new(mock_state(1, 0, 0, Arc::new(OfflineStore)));
        let app = api_router(core);
        let req = request(
            "POST",
            "/api/diagnoses/heart",
            None,
            Some(json!({"user_name": "Lan", "values": heart_values()})),
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["id"], Value::Null);
        assert_eq!(json["record"]["result"], HEART_RISK);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_fills_missing_fields() {
        let (store, app) = setup(0, 0, 0);
        submit_heart(&app, "Lan").await;
        store.post("diagnoses", &json!({"user_name": "Old"})).unwrap();

        let json = response_json(
            app.oneshot(request("GET", "/api/history", None, None))
                .await
                .unwrap(),
        )
        .await;
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["user_name"], "Lan");
        assert_eq!(entries[0]["type"], "heart");
        assert_eq!(entries[1]["result"], crate::diagnosis::UNKNOWN_FIELD);
    }

    #[tokio::test]
    async fn viewer_visit_is_recorded_and_sees_history() {
        let (store, app) = setup(0, 0, 0);
        submit_heart(&app, "Lan").await;

        let json = response_json(
            app.clone()
                .oneshot(request("GET", "/api/admin", Some(VIEWER_PEER), None))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["role"], "viewer");
        assert_eq!(json["identity"]["key"], "192_0_2_9");
        assert_eq!(json["visits"], 1);
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
        assert!(json.get("records").is_none());

        app.oneshot(request("GET", "/api/admin", Some(VIEWER_PEER), None))
            .await
            .unwrap();
        let entry = store.get("ips/192_0_2_9").unwrap();
        assert_eq!(entry["role"], 0);
        assert_eq!(entry["access_times"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_sees_full_records() {
        let (_, app) = setup(0, 0, 0);
        let submitted = submit_heart(&app, "Lan").await;

        let json = response_json(
            app.oneshot(request("GET", "/api/admin", Some(ADMIN_PEER), None))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["role"], "admin");
        let records = json["records"].as_array().unwrap();
        assert_eq!(records[0]["id"], submitted["id"]);
        assert_eq!(records[0]["inputs"]["gender"], "Nam (0)");
    }

    #[tokio::test]
    async fn viewer_cannot_mutate() {
        let (store, app) = setup(0, 0, 0);
        let id = submit_heart(&app, "Lan").await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/admin/diagnoses/{id}");

        let response = app
            .clone()
            .oneshot(request("DELETE", &uri, Some(VIEWER_PEER), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                "PUT",
                &uri,
                None,
                Some(json!({"values": heart_values()})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert!(store.get(&format!("diagnoses/{id}")).unwrap().is_object());
        assert_eq!(store.get("ips/192_0_2_9").unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn admin_edit_recomputes_and_keeps_timestamp() {
        let (store, app) = setup(1, 0, 0);
        let submitted = submit_heart(&app, "Lan").await;
        let id = submitted["id"].as_str().unwrap();
        let path = format!("diagnoses/{id}");
        store
            .patch(&path, &json!({"timestamp": "2025-12-31 23:59:59", "result": "old"}))
            .unwrap();

        let form = response_json(
            app.clone()
                .oneshot(request(
                    "GET",
                    &format!("/api/admin/diagnoses/{id}/form"),
                    Some(ADMIN_PEER),
                    None,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(form["values"], heart_values());

        let mut values = form["values"].clone();
        values["cholesterol"] = json!(300);
        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/admin/diagnoses/{id}"),
                Some(ADMIN_PEER),
                Some(json!({"user_name": "Lan B", "values": values})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = store.get(&path).unwrap();
        assert_eq!(stored["timestamp"], "2025-12-31 23:59:59");
        assert_eq!(stored["result"], HEART_RISK);
        assert_eq!(stored["user_name"], "Lan B");
        assert_eq!(stored["type"], "heart");
        assert_eq!(stored["inputs"]["cholesterol"], 300);
    }

    #[tokio::test]
    async fn edit_form_reports_unknown_stored_option() {
        let (store, app) = setup(0, 0, 0);
        let id = submit_heart(&app, "Lan").await["id"].as_str().unwrap().to_string();
        store
            .patch(
                &format!("diagnoses/{id}/inputs"),
                &json!({"chest_pain": "Sharp pain (9)"}),
            )
            .unwrap();

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/admin/diagnoses/{id}/form"),
                Some(ADMIN_PEER),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response_json(response).await["error"]["code"], "DATA_ERROR");
    }

    #[tokio::test]
    async fn edit_of_missing_record_is_404() {
        let (_, app) = setup(0, 0, 0);
        let response = app
            .oneshot(request(
                "PUT",
                "/api/admin/diagnoses/-missing",
                Some(ADMIN_PEER),
                Some(json!({"values": heart_values()})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_delete_is_idempotent() {
        let (store, app) = setup(0, 0, 0);
        let id = submit_heart(&app, "Lan").await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/admin/diagnoses/{id}");

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request("DELETE", &uri, Some(ADMIN_PEER), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = response_json(response).await;
            assert_eq!(json["deleted"], true);
        }
        assert_eq!(store.get(&format!("diagnoses/{id}")).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn encoded_slash_id_cannot_reach_the_collection() {
        let (store, app) = setup(0, 0, 0);
        let first = submit_heart(&app, "Lan").await["id"].as_str().unwrap().to_string();
        let second = submit_heart(&app, "Minh").await["id"].as_str().unwrap().to_string();

        for (method, uri, body) in [
            ("DELETE", "/api/admin/diagnoses/%2F", None),
            ("GET", "/api/admin/diagnoses/%2F/form", None),
            (
                "PUT",
                "/api/admin/diagnoses/%2F",
                Some(json!({"values": heart_values()})),
            ),
        ] {
            let response = app
                .clone()
                .oneshot(request(method, uri, Some(ADMIN_PEER), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(response_json(response).await["error"]["code"], "NOT_FOUND");
        }

        let all = store.get("diagnoses").unwrap();
        assert!(all.get(&first).is_some());
        assert!(all.get(&second).is_some());
    }

    #[tokio::test]
    async fn mistyped_body_gets_error_json() {
        let (store, app) = setup(0, 0, 0);
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/diagnoses/heart",
                None,
                Some(json!({"user_name": 5, "values": []})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"].as_str().unwrap().contains("user_name"));

        let id = submit_heart(&app, "Lan").await["id"].as_str().unwrap().to_string();
        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/admin/diagnoses/{id}"),
                Some(ADMIN_PEER),
                Some(json!({"values": "not an object"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["error"]["code"], "BAD_REQUEST");
        assert_eq!(store.get(&format!("diagnoses/{id}/user_name")).unwrap(), "Lan");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (_, app) = setup(0, 0, 0);
        let response = app
            .oneshot(request("GET", "/api/nonexistent", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
