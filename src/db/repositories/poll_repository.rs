use crate::db::connection::DbPool;
use crate::db::models::{Poll, PollOption, PollStatus};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Error, Row};
use uuid::Uuid;

fn poll_from_row(row: &PgRow) -> Poll {
    let status: String = row.get("status");
    Poll {
        id: row.get("id"),
        title: row.get("title"),
        deadline: row.get("deadline"),
        status: PollStatus::from_db(&status),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        options: None,
    }
}

fn option_from_row(row: &PgRow) -> PollOption {
    PollOption {
        id: row.get("id"),
        poll_id: row.get("poll_id"),
        option_text: row.get("option_text"),
        display_order: row.get("display_order"),
        vote_count: None,
        percentage: None,
    }
}

/// Persists the poll and its options as one transaction; either every row
/// exists afterwards or none do. Options keep their 1-based input position
/// as display order.
pub async fn create_poll(
    pool: &DbPool,
    title: &str,
    deadline: DateTime<Utc>,
    options: &[String],
) -> Result<Poll, Error> {
    let mut tx = pool.begin().await?;

    let poll_id = Uuid::new_v4();
    let row = sqlx::query(
        "INSERT INTO polls (id, title, deadline, status) VALUES ($1, $2, $3, 'active')
         RETURNING id, title, deadline, status, created_at, updated_at",
    )
    .bind(poll_id)
    .bind(title)
    .bind(deadline)
    .fetch_one(&mut *tx)
    .await?;

    let mut poll = poll_from_row(&row);

    let mut inserted = Vec::with_capacity(options.len());
    for (i, text) in options.iter().enumerate() {
        let option_id = Uuid::new_v4();
        let display_order = i as i32 + 1;

        sqlx::query(
            "INSERT INTO vote_options (id, poll_id, option_text, display_order)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(option_id)
        .bind(poll_id)
        .bind(text)
        .bind(display_order)
        .execute(&mut *tx)
        .await?;

        inserted.push(PollOption {
            id: option_id,
            poll_id,
            option_text: text.clone(),
            display_order,
            vote_count: None,
            percentage: None,
        });
    }

    tx.commit().await?;

    poll.options = Some(inserted);
    Ok(poll)
}

/// Column updates and option replacement happen in one transaction, so a
/// reader never sees the new title next to the old option set. Replacing
/// options deletes the old rows, which cascades to their votes.
pub async fn update_poll(
    pool: &DbPool,
    poll_id: Uuid,
    title: Option<&str>,
    deadline: Option<DateTime<Utc>>,
    options: Option<&[(String, i32)]>,
) -> Result<Option<Poll>, Error> {
    let mut tx = pool.begin().await?;

    if title.is_some() || deadline.is_some() {
        sqlx::query(
            "UPDATE polls SET title = COALESCE($2, title),
             deadline = COALESCE($3, deadline), updated_at = NOW() WHERE id = $1",
        )
        .bind(poll_id)
        .bind(title)
        .bind(deadline)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(replacements) = options {
        sqlx::query("DELETE FROM vote_options WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?;

        for (text, order) in replacements {
            sqlx::query(
                "INSERT INTO vote_options (id, poll_id, option_text, display_order)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(poll_id)
            .bind(text)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        }
    }

    let row = sqlx::query(
        "SELECT id, title, deadline, status, created_at, updated_at FROM polls WHERE id = $1",
    )
    .bind(poll_id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row.map(|r| poll_from_row(&r)))
}

// Options and votes go with the poll via ON DELETE CASCADE; deleting an
// unknown id is a no-op.
pub async fn delete_poll(pool: &DbPool, poll_id: Uuid) -> Result<(), Error> {
    sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(poll_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_poll(pool: &DbPool, poll_id: Uuid) -> Result<Option<Poll>, Error> {
    let row = sqlx::query(
        "SELECT id, title, deadline, status, created_at, updated_at FROM polls WHERE id = $1",
    )
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| poll_from_row(&r)))
}

pub async fn get_all_polls(pool: &DbPool) -> Result<Vec<Poll>, Error> {
    let rows = sqlx::query(
        "SELECT id, title, deadline, status, created_at, updated_at FROM polls
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(poll_from_row).collect())
}

pub async fn get_active_poll(pool: &DbPool) -> Result<Option<Poll>, Error> {
    let row = sqlx::query(
        "SELECT id, title, deadline, status, created_at, updated_at FROM polls
         WHERE status = 'active' AND deadline > NOW()
         ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| poll_from_row(&r)))
}

pub async fn get_historical_polls(pool: &DbPool) -> Result<Vec<Poll>, Error> {
    let rows = sqlx::query(
        "SELECT id, title, deadline, status, created_at, updated_at FROM polls
         WHERE status = 'closed' OR deadline < NOW()
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(poll_from_row).collect())
}

pub async fn get_poll_options(pool: &DbPool, poll_id: Uuid) -> Result<Vec<PollOption>, Error> {
    let rows = sqlx::query(
        "SELECT id, poll_id, option_text, display_order FROM vote_options
         WHERE poll_id = $1 ORDER BY display_order",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(option_from_row).collect())
}

pub async fn get_option(pool: &DbPool, option_id: Uuid) -> Result<Option<PollOption>, Error> {
    let row = sqlx::query(
        "SELECT id, poll_id, option_text, display_order FROM vote_options WHERE id = $1",
    )
    .bind(option_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| option_from_row(&r)))
}

/// Left join so options nobody picked still show up with a zero count.
pub async fn get_options_with_counts(
    pool: &DbPool,
    poll_id: Uuid,
) -> Result<Vec<PollOption>, Error> {
    let rows = sqlx::query(
        "SELECT vo.id, vo.poll_id, vo.option_text, vo.display_order,
                COUNT(v.id) AS vote_count
         FROM vote_options vo
         LEFT JOIN votes v ON v.option_id = vo.id
         WHERE vo.poll_id = $1
         GROUP BY vo.id
         ORDER BY vo.display_order",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| PollOption {
            id: r.get("id"),
            poll_id: r.get("poll_id"),
            option_text: r.get("option_text"),
            display_order: r.get("display_order"),
            vote_count: Some(r.get::<i64, _>("vote_count")),
            percentage: None,
        })
        .collect())
}
