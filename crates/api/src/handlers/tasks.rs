use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use taskman_domain::entities::{NewTask, Priority, TaskFilter};
use taskman_domain::TaskmanError;

use crate::{
    error::ApiResult,
    response::{created, deleted, success},
    routes::AppState,
};

fn default_notify_enabled() -> bool {
    true
}

/// 任务创建请求
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    pub category_id: Option<i64>,
    #[serde(default = "default_notify_enabled")]
    pub notify_enabled: bool,
}

/// 任务更新请求，整体替换字段
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    pub category_id: Option<i64>,
    #[serde(default = "default_notify_enabled")]
    pub notify_enabled: bool,
}

/// 任务移动请求，category_id 为空表示移出分类
#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    pub category_id: Option<i64>,
}

/// 任务查询参数
#[derive(Debug, Deserialize)]
pub struct TaskQueryParams {
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CreateTaskRequest {
    fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            due: self.due,
            priority: self.priority,
            category_id: self.category_id,
            notify_enabled: self.notify_enabled,
        }
    }
}

impl UpdateTaskRequest {
    fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            due: self.due,
            priority: self.priority,
            category_id: self.category_id,
            notify_enabled: self.notify_enabled,
        }
    }
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if let Some(category_id) = request.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let task = state.task_repo.create(&request.into_new_task()).await?;
    Ok(created(task))
}

/// 获取任务列表
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let filter = TaskFilter {
        category_id: params.category_id,
        limit: params.limit,
        offset: params.offset,
    };
    let tasks = state.task_repo.list(&filter).await?;
    Ok(success(tasks))
}

/// 获取单个任务
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let task = state
        .task_repo
        .get_by_id(id)
        .await?
        .ok_or(TaskmanError::TaskNotFound { id })?;
    Ok(success(task))
}

/// 更新任务，编辑会重置提醒状态
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if let Some(category_id) = request.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let task = state.task_repo.update(id, &request.into_new_task()).await?;
    Ok(success(task))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if !state.task_repo.delete(id).await? {
        return Err(TaskmanError::TaskNotFound { id }.into());
    }
    Ok(deleted(format!("任务 {} 已删除", id)))
}

/// 移动任务到指定分类
pub async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<MoveTaskRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if let Some(category_id) = request.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    if !state
        .task_repo
        .move_to_category(id, request.category_id)
        .await?
    {
        return Err(TaskmanError::TaskNotFound { id }.into());
    }

    let task = state
        .task_repo
        .get_by_id(id)
        .await?
        .ok_or(TaskmanError::TaskNotFound { id })?;
    Ok(success(task))
}

async fn ensure_category_exists(state: &AppState, category_id: i64) -> ApiResult<()> {
    state
        .category_repo
        .get_by_id(category_id)
        .await?
        .ok_or(TaskmanError::CategoryNotFound { id: category_id })?;
    Ok(())
}
