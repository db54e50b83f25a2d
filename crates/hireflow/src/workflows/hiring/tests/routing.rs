use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::hiring::router::hiring_router;

use super::common::{
    answered_application, authed_request, build_service, candidate, manager, read_json_body,
    seeded_position,
};

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let (service, _, _) = build_service();
    let router = hiring_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/hiring/analytics/status-summary")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_roles_are_unauthorized() {
    let (service, _, _) = build_service();
    let router = hiring_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/hiring/positions")
                .header("x-caller-subject", "mgr-1")
                .header("x-caller-email", "hiring@example.com")
                .header("x-caller-role", "WIZARD")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn candidates_are_forbidden_from_analytics() {
    let (service, _, _) = build_service();
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "GET",
            "/api/v1/hiring/analytics/status-summary",
            &candidate("dana@example.com"),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn scoring_an_answer_reports_the_review_transition() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    let (_, answers) = answered_application(&service, &position, &questions, "dana@example.com");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "POST",
            &format!("/api/v1/hiring/answers/{}/score", answers[0].id.0),
            &manager(),
            Some(json!({ "score": 85.0 })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 85.0);
    assert_eq!(body["application"]["evaluationStatus"], "IN_REVIEW");
    assert_eq!(body["question"]["weight"], 1.0);
}

#[tokio::test]
async fn finalizing_with_unscored_answers_returns_the_count() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    let (application, answers) =
        answered_application(&service, &position, &questions, "dana@example.com");
    service
        .score_answer(&manager(), &answers[0].id, 80.0)
        .expect("score recorded");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "POST",
            &format!("/api/v1/hiring/applications/{}/finalize", application.id.0),
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["unscoredAnswers"], 1);
}

#[tokio::test]
async fn finalize_returns_scoring_and_persisted_outcome() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    let (application, answers) =
        answered_application(&service, &position, &questions, "dana@example.com");
    service
        .score_answer(&manager(), &answers[0].id, 90.0)
        .expect("score recorded");
    service
        .score_answer(&manager(), &answers[1].id, 70.0)
        .expect("score recorded");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "POST",
            &format!("/api/v1/hiring/applications/{}/finalize", application.id.0),
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["scoring"]["totalScore"], 230.0);
    assert_eq!(body["scoring"]["scorePercentage"], 76.67);
    assert_eq!(body["scoring"]["passed"], true);
    assert_eq!(body["application"]["evaluationStatus"], "PASSED");
    assert_eq!(body["application"]["overallResult"], "PASSED");
}

#[tokio::test]
async fn evaluation_withholds_the_percentage_until_scoring_starts() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    let (application, _) =
        answered_application(&service, &position, &questions, "dana@example.com");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "GET",
            &format!(
                "/api/v1/hiring/applications/{}/evaluation",
                application.id.0
            ),
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body["evaluation"]["scorePercentage"].is_null());
    assert_eq!(body["evaluation"]["progress"]["totalAnswers"], 2);
    assert_eq!(body["evaluation"]["progress"]["scoredAnswers"], 0);
    assert_eq!(body["evaluation"]["threshold"], 70.0);
}

#[tokio::test]
async fn analytics_responses_carry_the_envelope() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    answered_application(&service, &position, &questions, "dana@example.com");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "GET",
            "/api/v1/hiring/analytics/status-summary",
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["completed"], 1);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_applications_are_not_found() {
    let (service, _, _) = build_service();
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "GET",
            "/api/v1/hiring/applications/app-999999/evaluation",
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn starting_an_application_over_http_creates_it() {
    let (service, _, _) = build_service();
    let (position, _) = seeded_position(&service);
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "POST",
            &format!("/api/v1/hiring/positions/{}/applications", position.id.0),
            &candidate("sam@example.com"),
            Some(json!({ "name": "Sam Porter" })),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["candidateEmail"], "sam@example.com");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["evaluationStatus"], "PENDING");
}

#[tokio::test]
async fn export_returns_csv() {
    let (service, _, _) = build_service();
    let (position, questions) = seeded_position(&service);
    answered_application(&service, &position, &questions, "dana@example.com");
    let router = hiring_router(service);

    let response = router
        .oneshot(authed_request(
            "GET",
            "/api/v1/hiring/analytics/export",
            &manager(),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    assert_eq!(content_type.as_deref(), Some("text/csv"));
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    let text = String::from_utf8(body.to_vec()).expect("utf8 csv");
    assert!(text.contains("dana@example.com"));
}
