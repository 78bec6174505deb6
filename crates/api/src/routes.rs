use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use taskman_notifier::NotificationScheduler;

use crate::handlers::{
    categories::{
        create_category, delete_category, get_category, list_categories, update_category,
    },
    health::health_check,
    notifications::get_due_notifications,
    tasks::{create_task, delete_task, get_task, list_tasks, move_task, update_task},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_repo: Arc<dyn taskman_domain::repositories::TaskRepository>,
    pub category_repo: Arc<dyn taskman_domain::repositories::CategoryRepository>,
    pub notifier: Arc<NotificationScheduler>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 任务管理API
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task))
        .route("/api/tasks/{id}/update", post(update_task))
        .route("/api/tasks/{id}/delete", post(delete_task))
        .route("/api/tasks/{id}/move", post(move_task))
        // 分类管理API
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/{id}", get(get_category))
        .route("/api/categories/{id}/update", post(update_category))
        .route("/api/categories/{id}/delete", post(delete_category))
        // 到期提醒API
        .route("/api/notifications", get(get_due_notifications))
        .with_state(state)
}
