use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::applications::intake::{self, Upload};
use crate::applications::queries;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus, DocumentCategory, DocumentMeta};
use crate::state::AppState;
use crate::storage::FileStore;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub message: String,
    pub application: ApplicationRow,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/applications
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let submission = intake::parse_submission(multipart).await?;
    let (mut application, files) = submission.validate()?;

    let duplicate = queries::find_same_day_submission(
        &state.db,
        &application.personal_info.email,
        &application.personal_info.phone,
    )
    .await?;
    if duplicate.is_some() {
        return Err(AppError::Validation(
            "Duplicate application detected for today".to_string(),
        ));
    }

    // Files land on disk before the row references them.
    let stored = store_uploads(&state.files, &files).await?;
    for (category, meta) in stored {
        application.documents.set(category, meta);
    }

    let id = match queries::insert_application(&state.db, &application).await {
        Ok(id) => id,
        Err(e) => {
            // Compensate the writes above so a failed insert leaves no
            // orphaned files behind.
            for meta in application.documents.iter() {
                state.files.remove_best_effort(&meta.stored_path).await;
            }
            return Err(e.into());
        }
    };

    info!(
        "Application {id} submitted for role '{}' with {} documents",
        application.role,
        application.documents.iter().count()
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id,
            message: "Application submitted successfully",
        }),
    ))
}

/// Writes each screened upload to the store. If one write fails, the
/// ones already written are removed before the error is returned.
async fn store_uploads(
    files: &FileStore,
    uploads: &[(DocumentCategory, Upload)],
) -> Result<Vec<(DocumentCategory, DocumentMeta)>, AppError> {
    let mut stored: Vec<(DocumentCategory, DocumentMeta)> = Vec::with_capacity(uploads.len());
    for (category, upload) in uploads {
        match files.save(&upload.original_name, &upload.bytes).await {
            Ok(stored_path) => stored.push((
                *category,
                DocumentMeta {
                    original_name: upload.original_name.clone(),
                    stored_path,
                    mime_type: upload.content_type.clone(),
                    size_bytes: upload.bytes.len() as i64,
                },
            )),
            Err(e) => {
                for (_, meta) in &stored {
                    files.remove_best_effort(&meta.stored_path).await;
                }
                return Err(AppError::Storage(format!("Failed to store upload: {e:#}")));
            }
        }
    }
    Ok(stored)
}

/// GET /api/applications
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let search = params.search.as_deref().filter(|s| !s.is_empty());
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all");

    let rows = queries::list_applications(&state.db, search, status).await?;
    Ok(Json(rows))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = queries::get_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    Ok(Json(application))
}

/// PUT /api/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let status = ApplicationStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("Invalid status".to_string()))?;

    let application = queries::update_status(&state.db, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    info!("Application {id} marked {}", status.as_str());
    Ok(Json(ApplicationResponse {
        message: format!("Application {} successfully", status.as_str()),
        application,
    }))
}

/// POST /api/applications/:id/offer-letter
pub async fn handle_upload_offer_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApplicationResponse>, AppError> {
    let upload = intake::parse_offer_letter(multipart).await?;

    // Remember the current letter so the overwrite can clean it up.
    let previous = queries::get_application(&state.db, id)
        .await?
        .and_then(|row| row.offer_letter.map(|letter| letter.stored_path.clone()));

    let stored_path = state
        .files
        .save(&upload.original_name, &upload.bytes)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to store offer letter: {e:#}")))?;

    let letter = DocumentMeta {
        original_name: upload.original_name,
        stored_path: stored_path.clone(),
        mime_type: upload.content_type,
        size_bytes: upload.bytes.len() as i64,
    };

    let Some(application) = queries::set_offer_letter(&state.db, id, &letter).await? else {
        // Unknown id: take the just-written file back out of the store.
        state.files.remove_best_effort(&stored_path).await;
        return Err(AppError::NotFound("Application not found".to_string()));
    };

    if let Some(previous) = previous {
        state.files.remove_best_effort(&previous).await;
    }

    info!("Offer letter attached to application {id}");
    Ok(Json(ApplicationResponse {
        message: "Offer letter uploaded successfully".to_string(),
        application,
    }))
}

/// DELETE /api/applications/:id/offer-letter
pub async fn handle_remove_offer_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let application = queries::get_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    if let Some(letter) = &application.offer_letter {
        state.files.remove_best_effort(&letter.stored_path).await;
    }
    queries::clear_offer_letter(&state.db, id).await?;

    info!("Offer letter removed from application {id}");
    Ok(Json(MessageResponse {
        message: "Offer letter removed successfully",
    }))
}

/// DELETE /api/applications
///
/// Rows are deleted first in a single statement; the file sweep runs
/// afterwards best-effort. A crash in between orphans files but never
/// leaves rows referencing deleted ones.
pub async fn handle_clear_all(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let paths = queries::collect_stored_paths(&state.db).await?;
    let removed = queries::delete_all(&state.db).await?;

    for path in &paths {
        state.files.remove_best_effort(path).await;
    }

    info!("Cleared {removed} applications and {} stored files", paths.len());
    Ok(Json(MessageResponse {
        message: "All records cleared successfully",
    }))
}
