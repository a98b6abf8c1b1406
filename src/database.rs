use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    username       TEXT    UNIQUE NOT NULL,
    email          TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id        TEXT    PRIMARY KEY,
    user_id   TEXT    NOT NULL REFERENCES users(id),
    title     TEXT    NOT NULL,
    amount    REAL    NOT NULL,
    category  TEXT    NOT NULL,
    date      INTEGER NOT NULL
);
"#;

const CREATE_BUDGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS budgets (
    id        TEXT    PRIMARY KEY,
    user_id   TEXT    NOT NULL REFERENCES users(id),
    category  TEXT    NOT NULL,
    amount    REAL    NOT NULL
);
"#;

const CREATE_SAVING_GOALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS saving_goals (
    id              TEXT    PRIMARY KEY,
    user_id         TEXT    NOT NULL REFERENCES users(id),
    title           TEXT    NOT NULL,
    target_amount   REAL    NOT NULL,
    current_amount  REAL    NOT NULL DEFAULT 0
);
"#;

const CREATE_REMINDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
    id            TEXT    PRIMARY KEY,
    user_id       TEXT    NOT NULL REFERENCES users(id),
    title         TEXT    NOT NULL,
    due_date      INTEGER NOT NULL,
    is_completed  INTEGER NOT NULL DEFAULT 0
);
"#;

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_budgets_user ON budgets(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_saving_goals_user ON saving_goals(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reminders_user_due ON reminders(user_id, due_date)",
];

pub type Db = Arc<RwLock<Connection>>;

/// Opens (creating if needed) the tracker database under `data_dir`.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    create_schema(&conn).await?;
    Ok(Arc::new(RwLock::new(conn)))
}

async fn create_schema(conn: &Connection) -> Result<()> {
    for statement in [
        CREATE_USERS_TABLE,
        CREATE_EXPENSES_TABLE,
        CREATE_BUDGETS_TABLE,
        CREATE_SAVING_GOALS_TABLE,
        CREATE_REMINDERS_TABLE,
    ] {
        conn.execute(statement, ()).await?;
    }
    for statement in CREATE_INDEXES {
        conn.execute(statement, ()).await?;
    }
    Ok(())
}
