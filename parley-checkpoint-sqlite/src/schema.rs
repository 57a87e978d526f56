/// One row per thread: saving replaces the thread's previous checkpoint.
pub const CREATE_CHECKPOINTS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS parley_checkpoints (\
    thread_id INTEGER PRIMARY KEY,\
    pending_step TEXT,\
    step INTEGER NOT NULL,\
    created_at TEXT NOT NULL,\
    state_json TEXT NOT NULL\
)";

pub const MIGRATION_STATEMENTS_SQL: [&str; 1] = [CREATE_CHECKPOINTS_TABLE_SQL];

pub const UPSERT_CHECKPOINT_SQL: &str = "INSERT INTO parley_checkpoints \
    (thread_id, pending_step, step, created_at, state_json) VALUES (?, ?, ?, ?, ?) \
    ON CONFLICT(thread_id) DO UPDATE SET \
    pending_step = excluded.pending_step, \
    step = excluded.step, \
    created_at = excluded.created_at, \
    state_json = excluded.state_json";

pub const SELECT_CHECKPOINT_SQL: &str = "SELECT thread_id, pending_step, step, created_at, state_json \
    FROM parley_checkpoints WHERE thread_id = ?";

pub const DELETE_CHECKPOINT_SQL: &str = "DELETE FROM parley_checkpoints WHERE thread_id = ?";
