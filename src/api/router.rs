//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`; CORS is permissive so the static
//! booking and doctor pages can call it from any origin.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::clinic_state::ClinicState;

/// Build the clinic API router.
pub fn clinic_api_router(clinic: Arc<ClinicState>) -> Router {
    build_router(ApiContext::new(clinic))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/book", post(endpoints::booking::book))
        .route("/appointments", get(endpoints::appointments::by_mobile))
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/appointments/:id/cancel",
            post(endpoints::appointments::cancel),
        )
        .route("/doctor/appointments", get(endpoints::appointments::list_all))
        .route(
            "/doctor/patient_history/:mobile",
            get(endpoints::appointments::patient_history),
        )
        .route("/doctor/report", post(endpoints::reports::submit))
        .route("/report/:id", get(endpoints::reports::get))
        .route("/queue", get(endpoints::queue::summary))
        .route("/queue/:department", get(endpoints::queue::snapshot))
        .route(
            "/queue/:department/advance",
            post(endpoints::queue::advance),
        )
        .route("/doctors", get(endpoints::doctors::list))
        .route("/doctors/:id/status", put(endpoints::doctors::set_status))
        .route("/checkin", post(endpoints::checkin::resolve))
        .route("/checkin/qr", get(endpoints::checkin::qr))
        .route(
            "/settings/wait_time",
            get(endpoints::settings::wait_time).put(endpoints::settings::set_wait_time),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::clinic_state::test_support::test_state;

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_of(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn cardiology_booking(mobile: &str) -> serde_json::Value {
        serde_json::json!({
            "department": "Cardiology",
            "date": "2024-05-01",
            "patient_mobile": mobile,
            "patient_name": "Asha Rao",
            "patient_age": 34
        })
    }

    #[tokio::test]
    async fn health_reports_schema() {
        let (clinic, _tmp) = test_state();
        let response = clinic_api_router(clinic)
            .oneshot(get_req("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["schema_version"], 1);
    }

    #[tokio::test]
    async fn booking_is_idempotent_over_http() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let first = app
            .clone()
            .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let first = json_of(first).await;
        assert_eq!(first["token"], 1);
        assert_eq!(first["idempotent"], false);
        assert_eq!(first["availability"][0]["status"], "Busy");

        let second = app
            .clone()
            .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let second = json_of(second).await;
        assert_eq!(second["appointment_id"], first["appointment_id"]);
        assert_eq!(second["idempotent"], true);
        assert_eq!(second["queue"]["total"], 1);
    }

    #[tokio::test]
    async fn short_field_names_are_accepted() {
        let (clinic, _tmp) = test_state();
        let body = serde_json::json!({
            "dept": "ENT",
            "date": "2024-05-01",
            "mobile": "9000000002",
            "patient_name": "Ravi",
            "patient_age": 40
        });
        let response = clinic_api_router(clinic)
            .oneshot(json_req("POST", "/api/book", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn invalid_booking_returns_reason_code() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let response = app
            .clone()
            .oneshot(json_req("POST", "/api/book", cardiology_booking("123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["retryable"], false);

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/book")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn report_flow_and_double_completion() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let booked = json_of(
            app.clone()
                .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
                .await
                .unwrap(),
        )
        .await;
        let id = booked["appointment_id"].clone();

        let report = serde_json::json!({
            "appointment_id": id,
            "diagnosis": "Hypertension",
            "medicines": "Amlodipine 5mg",
            "notes": "Recheck BP",
            "follow_up_date": "2024-06-01"
        });
        let response = app
            .clone()
            .oneshot(json_req("POST", "/api/doctor/report", report.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["appointment"]["status"], "Completed");
        assert_eq!(json["appointment"]["follow_up_date"], "2024-06-01");

        let again = app
            .clone()
            .oneshot(json_req("POST", "/api/doctor/report", report))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);
        assert_eq!(json_of(again).await["error"]["code"], "ALREADY_FINALIZED");

        let stored = app
            .oneshot(get_req(&format!("/api/report/{id}")))
            .await
            .unwrap();
        assert_eq!(stored.status(), StatusCode::OK);
        assert_eq!(json_of(stored).await["diagnosis"], "Hypertension");
    }

    #[tokio::test]
    async fn queue_advance_and_summary() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);
        app.clone()
            .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/queue/Cardiology/advance?date=2024-05-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["advanced"], true);
        assert_eq!(json["queue"]["current"], 1);

        let summary = json_of(
            app.clone()
                .oneshot(get_req("/api/queue?date=2024-05-01"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(summary["total"], 1);
        assert_eq!(summary["wait_minutes"], 0);

        let unknown = app
            .oneshot(get_req("/api/queue/Astrology"))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn department_names_with_spaces_resolve() {
        let (clinic, _tmp) = test_state();
        let response = clinic_api_router(clinic)
            .oneshot(get_req("/api/queue/General%20Physician?date=2024-05-01"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["department"], "General Physician");
    }

    #[tokio::test]
    async fn checkin_resolves_or_rejects() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let scan = |raw: &'static str| {
            Request::builder()
                .method("POST")
                .uri("/api/checkin")
                .body(Body::from(raw))
                .unwrap()
        };

        let unknown = app
            .clone()
            .oneshot(scan(r#"{"m":"9000000001","n":"Asha"}"#))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_of(unknown).await["error"]["code"], "PATIENT_NOT_FOUND");

        let garbage = app.clone().oneshot(scan("hello")).await.unwrap();
        assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(garbage).await["error"]["code"], "INVALID_CHECKIN");

        app.clone()
            .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
            .await
            .unwrap();
        let found = app
            .clone()
            .oneshot(scan(r#"{"m":"9000000001","n":"Asha"}"#))
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        let json = json_of(found).await;
        assert_eq!(json["display_name"], "Asha Rao");
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);

        let qr = app
            .oneshot(get_req("/api/checkin/qr?mobile=9000000001"))
            .await
            .unwrap();
        assert_eq!(qr.status(), StatusCode::OK);
        assert_eq!(qr.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn doctor_override_and_roster() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let roster = json_of(
            app.clone()
                .oneshot(get_req("/api/doctors?date=2024-05-01"))
                .await
                .unwrap(),
        )
        .await;
        let doctor = roster["doctors"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["department"] == "Cardiology")
            .unwrap()
            .clone();
        assert_eq!(doctor["status"], "Available");

        let response = app
            .clone()
            .oneshot(json_req(
                "PUT",
                &format!("/api/doctors/{}/status", doctor["id"]),
                serde_json::json!({ "status": "Off" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["off_duty"], true);

        let rejected = app
            .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::CONFLICT);
        assert_eq!(json_of(rejected).await["error"]["code"], "DEPARTMENT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn appointments_lookup_and_cancel() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);
        let booked = json_of(
            app.clone()
                .oneshot(json_req("POST", "/api/book", cardiology_booking("9000000001")))
                .await
                .unwrap(),
        )
        .await;
        let id = booked["appointment_id"].clone();

        let list = json_of(
            app.clone()
                .oneshot(get_req("/api/appointments?mobile=9000000001"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(list["appointments"][0]["id"], id);

        let cancel = Request::builder()
            .method("POST")
            .uri(format!("/api/appointments/{id}/cancel"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(cancel).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["appointment"]["status"], "Cancelled");

        let cancel_again = Request::builder()
            .method("POST")
            .uri(format!("/api/appointments/{id}/cancel"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(cancel_again).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let missing = app.oneshot(get_req("/api/appointments/999")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wait_time_setting_round_trip() {
        let (clinic, _tmp) = test_state();
        let app = clinic_api_router(clinic);

        let response = app
            .clone()
            .oneshot(json_req(
                "PUT",
                "/api/settings/wait_time",
                serde_json::json!({ "minutes": 10 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let current = json_of(
            app.clone()
                .oneshot(get_req("/api/settings/wait_time"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(current["minutes"], 10);

        let rejected = app
            .oneshot(json_req(
                "PUT",
                "/api/settings/wait_time",
                serde_json::json!({ "minutes": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let (clinic, _tmp) = test_state();
        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/api/book")
            .header(header::ORIGIN, "http://localhost:8080")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = clinic_api_router(clinic).oneshot(preflight).await.unwrap();
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn not_found_for_unknown_route() {
        let (clinic, _tmp) = test_state();
        let response = clinic_api_router(clinic)
            .oneshot(get_req("/api/nonexistent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
