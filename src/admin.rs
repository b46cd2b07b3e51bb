use crate::db::repositories::poll_repository;
use crate::error::PollError;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    pub title: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub options: Option<Vec<OptionInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub text: String,
    pub order: i32,
}

/// Full-shape validation applied to creation and to the merged form of an
/// update. Rules fire in a fixed order so a request violating several of
/// them reports the same one every time.
fn validate_poll_shape(
    title: &str,
    deadline: DateTime<Utc>,
    options: &[String],
    now: DateTime<Utc>,
) -> Result<(), PollError> {
    if title.trim().is_empty() {
        return Err(PollError::EmptyTitle);
    }

    if options.len() < 2 {
        return Err(PollError::TooFewOptions);
    }

    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(PollError::EmptyOption);
    }

    if deadline <= now {
        return Err(PollError::DeadlineNotFuture);
    }

    Ok(())
}

pub async fn create_poll(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<CreatePollRequest>,
) -> Result<impl IntoResponse, PollError> {
    validate_poll_shape(&payload.title, payload.deadline, &payload.options, Utc::now())?;

    let poll = poll_repository::create_poll(
        &app_state.db,
        &payload.title,
        payload.deadline,
        &payload.options,
    )
    .await?;

    info!("poll {} created", poll.id);
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Partial updates are validated against the merged record: fields the
/// caller omitted keep their stored values, including the stored option
/// texts, so changing only the title cannot be rejected for options that
/// were valid all along.
pub async fn update_poll(
    Extension(app_state): Extension<AppState>,
    Path(poll_id): Path<Uuid>,
    Json(payload): Json<UpdatePollRequest>,
) -> Result<impl IntoResponse, PollError> {
    let existing = poll_repository::get_poll(&app_state.db, poll_id)
        .await?
        .ok_or(PollError::PollNotFound)?;

    if payload.title.is_some() || payload.deadline.is_some() || payload.options.is_some() {
        let merged_options: Vec<String> = match &payload.options {
            Some(opts) => opts.iter().map(|o| o.text.clone()).collect(),
            None => poll_repository::get_poll_options(&app_state.db, poll_id)
                .await?
                .into_iter()
                .map(|o| o.option_text)
                .collect(),
        };

        let title = payload.title.as_deref().unwrap_or(&existing.title);
        let deadline = payload.deadline.unwrap_or(existing.deadline);
        validate_poll_shape(title, deadline, &merged_options, Utc::now())?;
    }

    let replacements: Option<Vec<(String, i32)>> = payload
        .options
        .map(|opts| opts.into_iter().map(|o| (o.text, o.order)).collect());

    let poll = poll_repository::update_poll(
        &app_state.db,
        poll_id,
        payload.title.as_deref(),
        payload.deadline,
        replacements.as_deref(),
    )
    .await?
    .ok_or(PollError::PollNotFound)?;

    info!("poll {} updated", poll.id);
    Ok(Json(poll))
}

pub async fn delete_poll(
    Extension(app_state): Extension<AppState>,
    Path(poll_id): Path<Uuid>,
) -> Result<impl IntoResponse, PollError> {
    poll_repository::delete_poll(&app_state.db, poll_id).await?;

    info!("poll {} deleted", poll_id);
    Ok(Json(json!({ "success": true })))
}

pub async fn list_polls(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, PollError> {
    let polls = poll_repository::get_all_polls(&app_state.db).await?;

    Ok(Json(polls))
}
