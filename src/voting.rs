use crate::db::models::{Poll, PollStatus};
use crate::db::repositories::{poll_repository, vote_repository};
use crate::error::PollError;
use crate::net;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub poll_id: Uuid,
    pub option_id: Uuid,
}

/// Status gates before the deadline gate: a closed poll reports
/// `PollNotActive` even when its deadline has also passed.
fn check_eligibility(poll: &Poll, now: DateTime<Utc>) -> Result<(), PollError> {
    if poll.status != PollStatus::Active {
        return Err(PollError::PollNotActive);
    }

    if poll.deadline < now {
        return Err(PollError::PollExpired);
    }

    Ok(())
}

pub async fn submit_vote(
    Extension(app_state): Extension<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, PollError> {
    let source = net::client_addr(&headers, peer);

    let poll = poll_repository::get_poll(&app_state.db, payload.poll_id)
        .await?
        .ok_or(PollError::PollNotFound)?;

    check_eligibility(&poll, Utc::now())?;

    let option = poll_repository::get_option(&app_state.db, payload.option_id).await?;
    if !option.is_some_and(|o| o.poll_id == payload.poll_id) {
        return Err(PollError::OptionNotInPoll);
    }

    if vote_repository::has_voted(&app_state.db, payload.poll_id, &source).await? {
        return Err(PollError::AlreadyVoted);
    }

    // Concurrent submissions from one source can both pass the check above;
    // the storage constraint decides the winner and the loser surfaces as a
    // duplicate, never as a second vote row.
    vote_repository::insert_vote(&app_state.db, payload.poll_id, payload.option_id, &source)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => PollError::AlreadyVoted,
            other => PollError::Database(other),
        })?;

    info!("vote recorded for poll {}", payload.poll_id);
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(status: PollStatus, deadline: DateTime<Utc>) -> Poll {
        let now = Utc::now();
        Poll {
            id: Uuid::new_v4(),
            title: "Lunch".to_string(),
            deadline,
            status,
            created_at: now,
            updated_at: now,
            options: None,
        }
    }

    #[test]
    fn active_poll_with_future_deadline_is_eligible() {
        let now = Utc::now();
        let poll = poll(PollStatus::Active, now + Duration::days(1));

        assert!(check_eligibility(&poll, now).is_ok());
    }

    #[test]
    fn closed_poll_is_not_active_even_with_future_deadline() {
        let now = Utc::now();
        let poll = poll(PollStatus::Closed, now + Duration::days(1));

        assert!(matches!(
            check_eligibility(&poll, now),
            Err(PollError::PollNotActive)
        ));
    }

    #[test]
    fn past_deadline_reports_expired() {
        let now = Utc::now();
        let poll = poll(PollStatus::Active, now - Duration::minutes(5));

        assert!(matches!(
            check_eligibility(&poll, now),
            Err(PollError::PollExpired)
        ));
    }

    #[test]
    fn closed_and_expired_reports_not_active_first() {
        let now = Utc::now();
        let poll = poll(PollStatus::Closed, now - Duration::minutes(5));

        assert!(matches!(
            check_eligibility(&poll, now),
            Err(PollError::PollNotActive)
        ));
    }

    #[test]
    fn vote_request_uses_camel_case_field_names() {
        let parsed: VoteRequest = serde_json::from_str(
            r#"{"pollId":"7f7d3a10-0ae5-4c91-9a5e-2f2b7c716dcb",
                "optionId":"3b74a98c-7f5d-4e0e-a9ce-5ad7f6c3f1f2"}"#,
        )
        .unwrap();

        assert_eq!(
            parsed.poll_id,
            "7f7d3a10-0ae5-4c91-9a5e-2f2b7c716dcb".parse::<Uuid>().unwrap()
        );
    }
}
