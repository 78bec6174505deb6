use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use taskman_domain::{
    entities::{ClaimOutcome, NewTask, Task, TaskFilter},
    repositories::TaskRepository,
    TaskmanError, TaskmanResult,
};
use tracing::{debug, warn};

use crate::database::mapping::{format_instant, row_to_task};

const TASK_COLUMNS: &str = "id, title, description, due, priority, category_id, \
     notify_enabled, notified, created_at, updated_at";

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(new_task: &NewTask) -> TaskmanResult<()> {
        if new_task.title.trim().is_empty() {
            return Err(TaskmanError::validation_error("任务标题不能为空"));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, new_task: &NewTask) -> TaskmanResult<Task> {
        Self::validate(new_task)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, due, priority, category_id, \
             notify_enabled, notified, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.due.map(format_instant))
        .bind(new_task.priority)
        .bind(new_task.category_id)
        .bind(new_task.notify_enabled)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("创建任务 {}: {}", id, new_task.title);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| TaskmanError::task_not_found(id))
    }

    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_task).transpose()
    }

    async fn list(&self, filter: &TaskFilter) -> TaskmanResult<Vec<Task>> {
        // 与原始展示顺序一致：有截止时间的在前，按截止时间升序
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");
        if filter.category_id.is_some() {
            sql.push_str(" WHERE category_id = ?");
        }
        sql.push_str(" ORDER BY due IS NULL, due");
        // SQLite 要求 OFFSET 必须跟在 LIMIT 之后，LIMIT -1 表示不限制行数
        if filter.limit.is_some() || filter.offset.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(category_id) = filter.category_id {
            query = query.bind(category_id);
        }
        if filter.limit.is_some() || filter.offset.is_some() {
            query = query
                .bind(filter.limit.unwrap_or(-1))
                .bind(filter.offset.unwrap_or(0));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_task).collect()
    }

    async fn update(&self, id: i64, changes: &NewTask) -> TaskmanResult<Task> {
        Self::validate(changes)?;

        // 整体字段替换，并重新武装提醒
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, due = ?, priority = ?, \
             category_id = ?, notify_enabled = ?, notified = 0, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.due.map(format_instant))
        .bind(changes.priority)
        .bind(changes.category_id)
        .bind(changes.notify_enabled)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskmanError::task_not_found(id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| TaskmanError::task_not_found(id))
    }

    async fn move_to_category(&self, id: i64, category_id: Option<i64>) -> TaskmanResult<bool> {
        let result = sqlx::query("UPDATE tasks SET category_id = ?, updated_at = ? WHERE id = ?")
            .bind(category_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> TaskmanResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_notification_candidates(&self) -> TaskmanResult<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE due IS NOT NULL AND notify_enabled = 1 AND notified = 0"
        ))
        .fetch_all(&self.pool)
        .await?;

        // 单条记录损坏不应中断整次扫描，跳过并留日志
        let mut tasks = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_task(row) {
                Ok(task) => tasks.push(task),
                Err(e @ TaskmanError::MalformedDue { .. }) => {
                    warn!("跳过损坏的提醒候选: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(tasks)
    }

    async fn claim_notified(&self, id: i64, now: DateTime<Utc>) -> TaskmanResult<ClaimOutcome> {
        // 单条带完整资格谓词的条件更新，至多一次语义的基石：
        // 扫描后被编辑、停用或删除的任务在这里全部落空
        let result = sqlx::query(
            "UPDATE tasks SET notified = 1 \
             WHERE id = ? AND notified = 0 AND notify_enabled = 1 \
               AND due IS NOT NULL AND due <= ?",
        )
        .bind(id)
        .bind(format_instant(now))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ClaimOutcome::Claimed);
        }

        let exists: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists.0 > 0 {
            Ok(ClaimOutcome::AlreadyNotified)
        } else {
            Ok(ClaimOutcome::NotFound)
        }
    }
}
