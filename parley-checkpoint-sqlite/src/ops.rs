use sqlx::{Row, SqlitePool};

use crate::error::CheckpointSqlError;
use crate::schema::{DELETE_CHECKPOINT_SQL, SELECT_CHECKPOINT_SQL, UPSERT_CHECKPOINT_SQL};

/// A checkpoint row before its state is decoded.
#[derive(Debug, Clone)]
pub struct StoredCheckpoint {
    pub thread_id: i64,
    pub pending_step: Option<String>,
    pub step: i64,
    pub created_at: String,
    pub state_json: serde_json::Value,
}

pub async fn save_checkpoint(
    pool: &SqlitePool,
    thread_id: i64,
    pending_step: Option<&str>,
    step: i64,
    created_at: &str,
    state_json: &serde_json::Value,
) -> Result<(), CheckpointSqlError> {
    let state_text = serde_json::to_string(state_json).map_err(CheckpointSqlError::Serialization)?;

    sqlx::query(UPSERT_CHECKPOINT_SQL)
        .bind(thread_id)
        .bind(pending_step)
        .bind(step)
        .bind(created_at)
        .bind(state_text)
        .execute(pool)
        .await
        .map_err(CheckpointSqlError::Query)?;

    Ok(())
}

pub async fn load_checkpoint(
    pool: &SqlitePool,
    thread_id: i64,
) -> Result<Option<StoredCheckpoint>, CheckpointSqlError> {
    let row = sqlx::query(SELECT_CHECKPOINT_SQL)
        .bind(thread_id)
        .fetch_optional(pool)
        .await
        .map_err(CheckpointSqlError::Query)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let state_text: String = row.try_get("state_json").map_err(CheckpointSqlError::Query)?;
    let state_json = serde_json::from_str(&state_text)
        .map_err(|error| CheckpointSqlError::Corrupt(format!("state_json: {error}")))?;

    Ok(Some(StoredCheckpoint {
        thread_id: row.try_get("thread_id").map_err(CheckpointSqlError::Query)?,
        pending_step: row.try_get("pending_step").map_err(CheckpointSqlError::Query)?,
        step: row.try_get("step").map_err(CheckpointSqlError::Query)?,
        created_at: row.try_get("created_at").map_err(CheckpointSqlError::Query)?,
        state_json,
    }))
}

pub async fn delete_checkpoint(pool: &SqlitePool, thread_id: i64) -> Result<(), CheckpointSqlError> {
    sqlx::query(DELETE_CHECKPOINT_SQL)
        .bind(thread_id)
        .execute(pool)
        .await
        .map_err(CheckpointSqlError::Query)?;

    Ok(())
}
