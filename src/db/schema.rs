//! SQL DDL for initializing the credential storage.
//! Every statement is idempotent and safe to run on each startup.

/// SQLite schema:
/// - `username` PRIMARY KEY (unique users)
/// - `(owner, name)` PRIMARY KEY (unique secrets per user)
/// - `owner` references `users` with ON DELETE CASCADE
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY NOT NULL,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS secrets (
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (owner, name),
    FOREIGN KEY (owner)
        REFERENCES users (username)
            ON DELETE CASCADE
            ON UPDATE NO ACTION
);
"#;

/// PostgreSQL schema. Same relations as SQLite, plus the `user_directory`
/// view that `list_users` reads from.
pub const POSTGRES_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS secrets (
    owner TEXT NOT NULL REFERENCES users (username) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (owner, name)
);

CREATE OR REPLACE VIEW user_directory AS
    SELECT username FROM users;
"#;

/// Advisory lock key held while Postgres DDL runs.
pub const POSTGRES_SCHEMA_LOCK: i64 = 0x6372_6564_7661_756c;

/// Split a DDL bundle into individual statements; sqlx prepares one at a time.
pub fn statements(ddl: &str) -> impl Iterator<Item = &str> {
    ddl.split(';').map(str::trim).filter(|s| !s.is_empty())
}
