use crate::db::connection::DbPool;
use sqlx::Error;
use uuid::Uuid;

pub async fn has_voted(pool: &DbPool, poll_id: Uuid, ip_address: &str) -> Result<bool, Error> {
    let row = sqlx::query("SELECT id FROM votes WHERE poll_id = $1 AND ip_address = $2")
        .bind(poll_id)
        .bind(ip_address)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Votes are create-only; nothing in the service ever updates or deletes a
/// vote row. A unique violation here means another request from the same
/// source won the race and must be reported as a duplicate by the caller.
pub async fn insert_vote(
    pool: &DbPool,
    poll_id: Uuid,
    option_id: Uuid,
    ip_address: &str,
) -> Result<(), Error> {
    sqlx::query("INSERT INTO votes (id, poll_id, option_id, ip_address) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(poll_id)
        .bind(option_id)
        .bind(ip_address)
        .execute(pool)
        .await?;

    Ok(())
}
