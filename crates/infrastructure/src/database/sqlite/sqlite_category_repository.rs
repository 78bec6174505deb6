use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use taskman_domain::{
    entities::{Category, NewCategory},
    repositories::CategoryRepository,
    TaskmanError, TaskmanResult,
};
use tracing::{debug, info};

use crate::database::mapping::row_to_category;

pub struct SqliteCategoryRepository {
    pool: SqlitePool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(new_category: &NewCategory) -> TaskmanResult<()> {
        if new_category.title.trim().is_empty() {
            return Err(TaskmanError::validation_error("分类标题不能为空"));
        }
        Ok(())
    }

    fn map_unique_violation(err: sqlx::Error, title: &str) -> TaskmanError {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return TaskmanError::CategoryTitleExists {
                    title: title.to_string(),
                };
            }
        }
        err.into()
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn create(&self, new_category: &NewCategory) -> TaskmanResult<Category> {
        Self::validate(new_category)?;

        let result = sqlx::query(
            "INSERT INTO categories (title, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(&new_category.title)
        .bind(&new_category.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &new_category.title))?;

        let id = result.last_insert_rowid();
        debug!("创建分类 {}: {}", id, new_category.title);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| TaskmanError::category_not_found(id))
    }

    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, title, description, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn list(&self) -> TaskmanResult<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, title, description, created_at FROM categories ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_category).collect()
    }

    async fn update(&self, id: i64, changes: &NewCategory) -> TaskmanResult<Category> {
        Self::validate(changes)?;

        let result = sqlx::query("UPDATE categories SET title = ?, description = ? WHERE id = ?")
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_unique_violation(e, &changes.title))?;

        if result.rows_affected() == 0 {
            return Err(TaskmanError::category_not_found(id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| TaskmanError::category_not_found(id))
    }

    async fn delete(&self, id: i64) -> TaskmanResult<bool> {
        // 先解除任务的弱引用再删除分类，两步在同一事务中完成；
        // 任务本身永远不会被级联删除
        let mut tx = self.pool.begin().await?;

        let unlinked = sqlx::query("UPDATE tasks SET category_id = NULL WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if deleted.rows_affected() > 0 {
            info!(
                "删除分类 {}，解除了 {} 个任务的归属",
                id,
                unlinked.rows_affected()
            );
        }

        Ok(deleted.rows_affected() > 0)
    }
}
