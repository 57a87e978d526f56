//! SQLite-backed [`Checkpointer`] keeping one row per thread.

pub mod error;
pub mod migrations;
pub mod ops;
pub mod schema;

use std::convert::TryFrom;

use parley_core::{Checkpoint, Checkpointer, GraphState, ParleyError, StateSchema, ThreadId};

use crate::error::CheckpointSqlError;
use crate::migrations::run_migrations;
use crate::ops::{delete_checkpoint, load_checkpoint, save_checkpoint};

#[derive(Debug, Clone)]
pub struct SqliteCheckpointer {
    pool: sqlx::SqlitePool,
}

#[derive(Debug, Clone)]
pub struct SqliteCheckpointerBuilder {
    database_url: String,
    max_connections: u32,
}

impl SqliteCheckpointer {
    pub fn builder(database_url: impl Into<String>) -> SqliteCheckpointerBuilder {
        SqliteCheckpointerBuilder {
            database_url: database_url.into(),
            max_connections: 1,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }
}

impl SqliteCheckpointerBuilder {
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub async fn build(self) -> Result<SqliteCheckpointer, CheckpointSqlError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(CheckpointSqlError::Connection)?;

        run_migrations(&pool).await?;
        tracing::debug!(url = %self.database_url, "sqlite checkpointer ready");

        Ok(SqliteCheckpointer { pool })
    }
}

fn checkpoint_error(message: impl Into<String>) -> ParleyError {
    ParleyError::CheckpointFailed(message.into())
}

fn map_sql_error(error: CheckpointSqlError) -> ParleyError {
    checkpoint_error(error.to_string())
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for SqliteCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), ParleyError> {
        let step = i64::try_from(checkpoint.step)
            .map_err(|_| checkpoint_error("checkpoint step does not fit into i64"))?;
        let state_json = serde_json::to_value(&checkpoint.state)
            .map_err(|error| checkpoint_error(format!("failed to serialize checkpoint state: {error}")))?;

        save_checkpoint(
            &self.pool,
            checkpoint.thread_id,
            checkpoint.pending_step.as_deref(),
            step,
            &checkpoint.created_at,
            &state_json,
        )
        .await
        .map_err(map_sql_error)
    }

    async fn load(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, ParleyError> {
        let Some(stored) = load_checkpoint(&self.pool, thread_id)
            .await
            .map_err(map_sql_error)?
        else {
            return Ok(None);
        };

        let step = u64::try_from(stored.step)
            .map_err(|_| checkpoint_error("checkpoint step is negative"))?;
        let state: GraphState<S> = serde_json::from_value(stored.state_json).map_err(|error| {
            checkpoint_error(format!("failed to deserialize checkpoint state: {error}"))
        })?;

        Ok(Some(Checkpoint {
            thread_id: stored.thread_id,
            pending_step: stored.pending_step,
            step,
            created_at: stored.created_at,
            state,
        }))
    }

    async fn clear(&self, thread_id: ThreadId) -> Result<(), ParleyError> {
        delete_checkpoint(&self.pool, thread_id)
            .await
            .map_err(map_sql_error)
    }
}
