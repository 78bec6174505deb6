use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use taskman_domain::entities::NewCategory;
use taskman_domain::TaskmanError;

use crate::{
    error::ApiResult,
    response::{created, deleted, success},
    routes::AppState,
};

/// 分类创建/更新请求
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub title: String,
    pub description: Option<String>,
}

impl CategoryRequest {
    fn into_new_category(self) -> NewCategory {
        NewCategory {
            title: self.title,
            description: self.description,
        }
    }
}

/// 创建分类，标题必须全局唯一
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let category = state
        .category_repo
        .create(&request.into_new_category())
        .await?;
    Ok(created(category))
}

/// 获取分类列表
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let categories = state.category_repo.list().await?;
    Ok(success(categories))
}

/// 获取单个分类
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let category = state
        .category_repo
        .get_by_id(id)
        .await?
        .ok_or(TaskmanError::CategoryNotFound { id })?;
    Ok(success(category))
}

/// 更新分类
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let category = state
        .category_repo
        .update(id, &request.into_new_category())
        .await?;
    Ok(success(category))
}

/// 删除分类，分类下的任务保留并脱离分类
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if !state.category_repo.delete(id).await? {
        return Err(TaskmanError::CategoryNotFound { id }.into());
    }
    Ok(deleted(format!("分类 {} 已删除", id)))
}
