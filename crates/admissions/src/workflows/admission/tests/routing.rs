use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::admission::domain::{AdmissionStatus, TransitionPayload};
use crate::workflows::admission::policy::AdmissionPolicy;
use crate::workflows::admission::router::{admission_router, ACTOR_HEADER};
use crate::workflows::admission::service::AdmissionService;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTOR_HEADER, ACTOR)
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn patch_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::patch(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTOR_HEADER, ACTOR)
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::put(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTOR_HEADER, ACTOR)
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_creates_records() {
    let (service, _, _) = build_service();
    let router = admission_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/admissions",
            json!({ "cnic": "61101-0001000-1", "full_name": "Areeba Saleem" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("pending")));
    assert_eq!(payload.get("fee_status"), Some(&json!("unpaid")));
    assert!(payload.get("form_id").is_some());
}

#[tokio::test]
async fn submit_route_requires_actor_header() {
    let (service, _, _) = build_service();
    let router = admission_router(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/admissions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "cnic": "61101-0001001-3", "full_name": "Basit Mir" }).to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("unauthenticated")));
}

#[tokio::test]
async fn duplicate_submission_maps_to_conflict() {
    let (service, _, _) = build_service();
    let router = admission_router(service);

    let body = json!({ "cnic": "61101-0001002-5", "full_name": "Dania Umar" });
    let response = router
        .clone()
        .oneshot(post_json("/api/v1/admissions", body.clone()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(post_json("/api/v1/admissions", body))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("conflict")));
}

#[tokio::test]
async fn unknown_target_status_is_rejected_not_coerced() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission("61101-0001003-7", "Eman Sheikh"))
        .expect("submission succeeds");
    let router = admission_router(service.clone());

    let uri = format!("/api/v1/admissions/{}/status", record.form_id);
    let response = router
        .oneshot(patch_json(&uri, json!({ "target_status": "archived" })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("validation")));

    let stored = service.get(&record.form_id).expect("record loads");
    assert_eq!(
        stored.status,
        AdmissionStatus::Pending,
        "rejected input must leave the record untouched"
    );
}

#[tokio::test]
async fn illegal_transition_maps_to_conflict_status() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission("61101-0001004-9", "Faizan Abbas"))
        .expect("submission succeeds");
    let router = admission_router(service);

    let uri = format!("/api/v1/admissions/{}/status", record.form_id);
    let response = router
        .oneshot(patch_json(&uri, json!({ "target_status": "selected" })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("illegal_transition")));
}

#[tokio::test]
async fn missing_remarks_maps_to_unprocessable() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission("61101-0001005-1", "Ghazal Rauf"))
        .expect("submission succeeds");
    let router = admission_router(service);

    let uri = format!("/api/v1/admissions/{}/status", record.form_id);
    let response = router
        .oneshot(patch_json(&uri, json!({ "target_status": "trash" })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("missing_payload")));
}

#[tokio::test]
async fn marks_route_stores_percentage() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission("61101-0001006-3", "Hamza Yousaf"))
        .expect("submission succeeds");
    service
        .request_transition(
            &record.form_id,
            AdmissionStatus::Appeared,
            TransitionPayload::default(),
            ACTOR,
        )
        .expect("pending -> appeared");
    let router = admission_router(service);

    let uri = format!("/api/v1/admissions/{}/marks", record.form_id);
    let response = router
        .oneshot(put_json(&uri, json!({ "obtained": 35, "total": 50 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("entry_test_percentage"), Some(&json!(70.0)));
    assert_eq!(payload.get("status"), Some(&json!("appeared")));
}

#[tokio::test]
async fn get_route_returns_not_found_for_unknown_forms() {
    let (service, _, _) = build_service();
    let router = admission_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/form-424242")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("not_found")));
}

#[tokio::test]
async fn list_route_rejects_unknown_status_filters() {
    let (service, _, _) = build_service();
    let router = admission_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions?status=archived")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("validation")));
}

#[tokio::test]
async fn list_route_filters_by_status() {
    let (service, _, _) = build_service();
    service
        .submit(submission("61101-0001007-5", "Inaya Baig"))
        .expect("submission succeeds");
    let router = admission_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions?status=pending")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let records = payload.as_array().expect("list body is an array");
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn audit_route_returns_the_trail() {
    let (service, _, _) = build_service();
    let record = service
        .submit(submission("61101-0001008-7", "Jibran Latif"))
        .expect("submission succeeds");
    service
        .request_transition(
            &record.form_id,
            AdmissionStatus::Appeared,
            TransitionPayload::default(),
            ACTOR,
        )
        .expect("pending -> appeared");
    let router = admission_router(service);

    let uri = format!("/api/v1/admissions/{}/audit", record.form_id);
    let response = router
        .oneshot(
            Request::get(&uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let trail = payload.as_array().expect("trail body is an array");
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].get("from_status"), Some(&json!("pending")));
    assert_eq!(trail[0].get("to_status"), Some(&json!("appeared")));
    assert_eq!(trail[0].get("actor"), Some(&json!(ACTOR)));
}

#[tokio::test]
async fn repository_outage_returns_opaque_internal_error() {
    let service = Arc::new(AdmissionService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAudit::default()),
        AdmissionPolicy::default(),
    ));
    let router = admission_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/admissions",
            json!({ "cnic": "61101-0001009-9", "full_name": "Khadija Noman" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("internal")));
    assert_eq!(payload.get("message"), Some(&json!("internal error")));
}
