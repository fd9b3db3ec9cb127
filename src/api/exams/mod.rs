mod handlers;
mod helpers;
mod queries;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        // Student endpoints
        .route("/", get(handlers::list_exams).post(handlers::create_exam))
        .route("/live", get(handlers::live_exams))
        .route("/:exam_id/gate", get(handlers::exam_gate))
        .route("/:exam_id/sessions", post(handlers::start_session))
        // Admin endpoints
        .route("/manage", get(handlers::list_managed_exams))
        .route(
            "/:exam_id",
            get(handlers::get_exam).patch(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route(
            "/:exam_id/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route("/:exam_id/questions/:question_id", delete(handlers::delete_question))
        .route("/:exam_id/submissions", get(handlers::list_exam_submissions))
        .route("/:exam_id/submissions/:student_id/grade", put(handlers::grade_submission))
}

#[cfg(test)]
mod tests;
