pub mod mapping;
pub mod sqlite;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use taskman_domain::TaskmanResult;
use tracing::debug;

/// 创建嵌入式 SQLite 连接池，启用外键约束和 WAL 模式，
/// 并在返回前完成建表迁移
pub async fn create_pool(url: &str, max_connections: u32) -> TaskmanResult<SqlitePool> {
    debug!("Creating SQLite pool at: {}", url);

    let connect_options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> TaskmanResult<()> {
    debug!("Running SQLite database migrations");

    // 创建分类表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建任务表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            due TEXT,
            priority TEXT NOT NULL DEFAULT 'LOW',
            category_id INTEGER,
            notify_enabled INTEGER NOT NULL DEFAULT 1,
            notified INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建索引
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_tasks_category_id ON tasks(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due)",
        "CREATE INDEX IF NOT EXISTS idx_tasks_notification ON tasks(notify_enabled, notified)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    debug!("Successfully completed SQLite database migrations");
    Ok(())
}
