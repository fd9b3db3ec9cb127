use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::test_support;

const BOUNDARY: &str = "examhall-test-boundary";

fn exam_payload(opens_in: Duration) -> serde_json::Value {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("nanoseconds");
    let start_time = (now + opens_in).format(&Rfc3339).unwrap();
    let end_time = (now + opens_in + Duration::hours(3)).format(&Rfc3339).unwrap();

    json!({
        "name": "Organic chemistry final",
        "start_time": start_time,
        "end_time": end_time,
        "duration_minutes": 90,
        "total_grade": 50.0,
        "attempts_allowed": 1
    })
}

fn multipart_request(uri: &str, token: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn listing_requires_authentication() {
    let (app, _settings, _guard) = test_support::lazy_app().await;

    let response = app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", None, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn malformed_token_is_rejected_before_any_query() {
    let (app, _settings, _guard) = test_support::lazy_app().await;

    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some("not-a-jwt"),
            Some(exam_payload(Duration::hours(1))),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn admin_creates_exam_and_students_see_it_listed() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "student@example.com").await;
    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let student_token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&student_token),
            Some(exam_payload(Duration::hours(1))),
        ))
        .await
        .expect("student create");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&admin_token),
            Some(exam_payload(Duration::hours(1))),
        ))
        .await
        .expect("admin create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    let exam_id = created["id"].as_str().expect("exam id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams",
            Some(&student_token),
            None,
        ))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let listing = test_support::read_json(response).await;
    let exams = listing["exams"].as_array().expect("exams");
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0]["id"], exam_id.as_str());
    assert_eq!(exams[0]["gate"]["state"], "not_yet_open");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/sessions"),
            Some(&student_token),
            Some(json!({"confirm": true})),
        ))
        .await
        .expect("early start");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn invalid_exam_window_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let mut payload = exam_payload(Duration::hours(1));
    payload["end_time"] = payload["start_time"].clone();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn session_start_requires_confirmation_and_is_reused() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "student@example.com").await;
    let exam = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());
    let uri = format!("/api/v1/exams/{}/sessions", exam.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("unconfirmed");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = test_support::read_json(response).await;
    assert!(body["detail"].as_str().unwrap_or_default().contains("60 minutes"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"confirm": true})),
        ))
        .await
        .expect("confirmed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = test_support::read_json(response).await;
    assert_eq!(first["status"], "active");
    assert!(first["remaining_seconds"].as_i64().unwrap_or_default() > 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"confirm": true})),
        ))
        .await
        .expect("resume");
    assert_eq!(response.status(), StatusCode::OK);
    let resumed = test_support::read_json(response).await;
    assert_eq!(resumed["id"], first["id"]);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn incomplete_profile_cannot_start_a_session() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "fresh@example.com",
        crate::db::types::UserRole::Student,
        false,
    )
    .await;
    let exam = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/sessions", exam.id),
            Some(&token),
            Some(json!({"confirm": true})),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn multiple_choice_question_rejects_duplicate_options() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let exam = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());
    let uri = format!("/api/v1/exams/{}/questions", exam.id);

    let response = ctx
        .app
        .clone()
        .oneshot(multipart_request(
            &uri,
            &token,
            &[
                ("kind", "multiple_choice"),
                ("text", "Which gas is inert?"),
                ("grade", "5"),
                ("option", "Argon"),
                ("option", "Argon"),
                ("correct_answer", "Argon"),
            ],
        ))
        .await
        .expect("duplicate");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(multipart_request(
            &uri,
            &token,
            &[
                ("kind", "multiple_choice"),
                ("text", "Which gas is inert?"),
                ("grade", "5"),
                ("option", "Argon"),
                ("option", ""),
                ("option", "Oxygen"),
                ("correct_answer", "Argon"),
            ],
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let question = test_support::read_json(response).await;
    assert_eq!(question["options"], json!(["Argon", "Oxygen"]));
    assert_eq!(question["correct_answer"], "Argon");
    assert!(question["image_url"].is_null());
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn image_attachment_without_storage_is_unavailable() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let exam = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"kind\"\r\n\r\nessay\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nDescribe it\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"grade\"\r\n\r\n10\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cell.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n\
         --{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/exams/{}/questions", exam.id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[ignore = "requires local postgres and redis"]
async fn grade_must_not_exceed_exam_total() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "student@example.com").await;
    let exam = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let student_token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/sessions", exam.id),
            Some(&student_token),
            Some(json!({"confirm": true})),
        ))
        .await
        .expect("start");
    let session = test_support::read_json(response).await;
    let session_id = session["id"].as_str().expect("session id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/submit"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::OK);

    let grade_uri = format!("/api/v1/exams/{}/submissions/{}/grade", exam.id, student.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &grade_uri,
            Some(&admin_token),
            Some(json!({"total_grade": exam.total_grade + 1.0})),
        ))
        .await
        .expect("too high");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &grade_uri,
            Some(&admin_token),
            Some(json!({"grade": 15.0, "feedback": "Solid work"})),
        ))
        .await
        .expect("grade");
    assert_eq!(response.status(), StatusCode::OK);
    let graded = test_support::read_json(response).await;
    assert_eq!(graded["total_grade"], 15.0);
    assert_eq!(graded["feedback"], "Solid work");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}/submissions", exam.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("list");
    let submissions = test_support::read_json(response).await;
    assert_eq!(submissions[0]["student_email"], "student@example.com");
    assert_eq!(submissions[0]["total_grade"], 15.0);
}
