use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_image_upload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::QuestionKind;
use crate::repositories;
use crate::schemas::question::QuestionResponse;
use crate::services::question_authoring::{image_object_key, ImageAttachment, QuestionDraft};

use super::super::helpers;

pub(in crate::api::exams) async fn create_question(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;

    let mut kind: Option<QuestionKind> = None;
    let mut text = String::new();
    let mut grade = String::new();
    let mut options: Vec<String> = Vec::new();
    let mut correct_answer: Option<String> = None;
    let mut image: Option<ImageAttachment> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "kind" => {
                let raw = read_text(field).await?;
                kind = Some(QuestionKind::parse(&raw).ok_or_else(|| {
                    ApiError::BadRequest(format!("Unknown question kind '{raw}'"))
                })?);
            }
            "text" => text = read_text(field).await?,
            "grade" => grade = read_text(field).await?,
            "option" | "options" | "options[]" => options.push(read_text(field).await?),
            "correct_answer" | "correctAnswer" => correct_answer = Some(read_text(field).await?),
            "image" | "file" => image = Some(read_image(&state, field).await?),
            _ => {}
        }
    }

    let mut draft = QuestionDraft::new(QuestionKind::MultipleChoice);
    if let Some(kind) = kind {
        draft.select_kind(kind);
    }
    draft.set_text(text);
    draft.set_grade(grade);
    for (slot, option) in options.into_iter().enumerate() {
        draft.set_option(slot, option)?;
    }
    if let Some(answer) = correct_answer {
        draft.select_answer(answer);
    }
    if let Some(image) = image {
        draft.attach_image(image);
    }

    let validated = draft.validate()?;
    tracing::debug!(exam_id = %exam.id, kind = draft.kind().as_str(), "Question draft validated");

    let uploaded_key = match draft.take_image() {
        Some(image) => Some(upload_image(&state, image).await?),
        None => None,
    };
    let image_url = uploaded_key.as_ref().map(|(_, url)| url.as_str());

    let created = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            kind: validated.kind,
            text: &validated.text,
            options: &validated.options,
            correct_answer: validated.correct_answer.as_deref(),
            grade: validated.grade,
            image_url,
            created_at: primitive_now_utc(),
        },
    )
    .await;

    let question = match created {
        Ok(question) => question,
        Err(err) => {
            if let (Some((key, _)), Some(storage)) = (&uploaded_key, state.storage()) {
                if let Err(cleanup) = storage.delete_object(key).await {
                    tracing::warn!(error = %cleanup, key = %key, "Failed to remove orphaned image");
                }
            }
            return Err(ApiError::internal(err, "Failed to create question"));
        }
    };

    tracing::info!(
        question_id = %question.id,
        exam_id = %exam.id,
        admin_id = %admin.id,
        kind = question.kind.as_str(),
        "Question created"
    );

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

pub(in crate::api::exams) async fn list_questions(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

pub(in crate::api::exams) async fn delete_question(
    Path((exam_id, question_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete(state.db(), &exam_id, &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|_| ApiError::BadRequest("Invalid form field".to_string()))
}

async fn read_image(state: &AppState, mut field: Field<'_>) -> Result<ImageAttachment, ApiError> {
    let filename = field.file_name().unwrap_or("image.jpg").to_string();
    let content_type =
        field.content_type().unwrap_or("application/octet-stream").to_string();
    let extension = validate_image_upload(
        &filename,
        &content_type,
        &state.settings().storage().allowed_image_extensions,
    )?;

    let max_mb = state.settings().storage().max_upload_size_mb;
    let max_bytes = max_mb * 1024 * 1024;
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|_| ApiError::BadRequest("Failed to read image".to_string()))?
    {
        if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(ApiError::BadRequest(format!("Image exceeds {max_mb}MB limit")));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Image file is empty".to_string()));
    }

    Ok(ImageAttachment { extension, content_type, bytes })
}

async fn upload_image(
    state: &AppState,
    image: ImageAttachment,
) -> Result<(String, String), ApiError> {
    let storage = state.storage().ok_or_else(|| {
        ApiError::ServiceUnavailable("Image storage is not configured".to_string())
    })?;

    let key = image_object_key(&image.extension, OffsetDateTime::now_utc());
    let stored = storage.upload_bytes(&key, &image.content_type, image.bytes).await.map_err(|e| {
        tracing::error!(error = %e, key = %key, "Question image upload failed");
        ApiError::BadGateway("Image upload failed, please try again".to_string())
    })?;

    tracing::info!(
        key = %stored.key,
        size = stored.size,
        sha256 = %stored.sha256,
        "Question image stored"
    );
    Ok((stored.key, stored.url))
}
