use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::submissions::StudentGradeRow;
use crate::schemas::grade::GradeEntryResponse;
use crate::services::grade_band::{render_grade_view, GradeSource};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_grades)).route("/:exam_id", get(get_grade))
}

async fn list_grades(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeEntryResponse>>, ApiError> {
    let rows = repositories::submissions::list_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grades"))?;

    let entries = render_grade_view(rows.into_iter().map(grade_source));
    Ok(Json(entries.into_iter().map(GradeEntryResponse::from_entry).collect()))
}

async fn get_grade(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<GradeEntryResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let submission = repositories::submissions::find(state.db(), &exam.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("No submission for this exam".to_string()))?;

    let source = GradeSource {
        grade: submission.grade(),
        exam_id: exam.id,
        exam_name: exam.name,
        exam_total: exam.total_grade,
        feedback: submission.feedback,
    };

    render_grade_view([source])
        .into_iter()
        .next()
        .map(|entry| Json(GradeEntryResponse::from_entry(entry)))
        .ok_or_else(|| ApiError::NotFound("Grade is not available yet".to_string()))
}

fn grade_source(row: StudentGradeRow) -> GradeSource {
    GradeSource {
        grade: row.grade(),
        exam_id: row.exam_id,
        exam_name: row.exam_name,
        exam_total: row.exam_total_grade,
        feedback: row.feedback,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::core::time::primitive_now_utc;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    #[ignore = "requires local postgres and redis"]
    async fn only_graded_submissions_are_listed() {
        let ctx = test_support::setup_test_context().await;
        let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
        let student = test_support::insert_student(ctx.state.db(), "student@example.com").await;
        let graded = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;
        let pending = test_support::insert_open_exam(ctx.state.db(), &admin.id).await;

        for exam in [&graded, &pending] {
            let now = primitive_now_utc();
            let session_id = Uuid::new_v4().to_string();
            repositories::sessions::create(
                ctx.state.db(),
                repositories::sessions::CreateSession {
                    id: &session_id,
                    exam_id: &exam.id,
                    student_id: &student.id,
                    attempt_number: 1,
                    started_at: now,
                    expires_at: now,
                },
            )
            .await
            .expect("create session");
            repositories::submissions::upsert(
                ctx.state.db(),
                repositories::submissions::UpsertSubmission {
                    exam_id: &exam.id,
                    student_id: &student.id,
                    session_id: &session_id,
                    answers: &Default::default(),
                    auto_submitted: false,
                    submitted_at: now,
                },
            )
            .await
            .expect("upsert submission");
        }

        repositories::submissions::set_grade(
            ctx.state.db(),
            &graded.id,
            &student.id,
            graded.total_grade * 0.95,
            Some("Well done"),
            &admin.id,
            primitive_now_utc(),
        )
        .await
        .expect("set grade")
        .expect("submission");

        let token = test_support::bearer_token(&student, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/grades", Some(&token), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        let entries = body.as_array().expect("array");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["exam_id"], graded.id.as_str());
        assert_eq!(entries[0]["band"], "pass_high");
        assert_eq!(entries[0]["color"], "green");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/grades/{}", pending.id),
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
