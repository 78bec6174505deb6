//! # Taskman API
//!
//! 任务管理系统的REST API模块，基于Axum框架构建。
//!
//! ## API 端点
//!
//! ### 任务管理
//! - `GET /api/tasks` - 获取任务列表（可按分类过滤）
//! - `POST /api/tasks` - 创建新任务
//! - `GET /api/tasks/{id}` - 获取任务详情
//! - `POST /api/tasks/{id}/update` - 更新任务（编辑会重置提醒状态）
//! - `POST /api/tasks/{id}/delete` - 删除任务
//! - `POST /api/tasks/{id}/move` - 移动任务到指定分类
//!
//! ### 分类管理
//! - `GET /api/categories` - 获取分类列表
//! - `POST /api/categories` - 创建分类
//! - `GET /api/categories/{id}` - 获取分类详情
//! - `POST /api/categories/{id}/update` - 更新分类
//! - `POST /api/categories/{id}/delete` - 删除分类（任务保留）
//!
//! ### 到期提醒
//! - `GET /api/notifications` - 拉取当前到期的提醒（原子认领）
//!
//! ### 系统
//! - `GET /health` - 健康检查
//!
//! ## 响应格式
//!
//! 成功响应统一使用 `ApiResponse` 信封：
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { "id": 1, "title": "写周报" },
//!   "message": null,
//!   "timestamp": "2026-08-29T10:00:00Z"
//! }
//! ```
//!
//! 错误响应携带错误类型、状态码和修复建议。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use taskman_domain::repositories::{CategoryRepository, TaskRepository};
use taskman_notifier::NotificationScheduler;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(
    task_repo: Arc<dyn TaskRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    notifier: Arc<NotificationScheduler>,
    cors_enabled: bool,
) -> Router {
    let state = AppState {
        task_repo,
        category_repo,
        notifier,
    };

    let router = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    );

    if cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration as StdDuration;
    use taskman_testing_utils::{
        CollectingAlertSink, FixedClock, MockCategoryRepository, MockTaskRepository, TaskBuilder,
    };
    use tower::ServiceExt;

    fn test_app_with(tasks: Vec<taskman_domain::entities::Task>) -> Router {
        let task_repo = MockTaskRepository::with_tasks(tasks);
        let category_repo = MockCategoryRepository::linked_to(&task_repo);
        let notifier = Arc::new(NotificationScheduler::new(
            Arc::new(task_repo.clone()),
            Arc::new(FixedClock::new(Utc::now())),
            Arc::new(CollectingAlertSink::new()),
            StdDuration::from_secs(30),
        ));

        create_app(
            Arc::new(task_repo),
            Arc::new(category_repo),
            notifier,
            true,
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app_with(vec![]);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_get_task() {
        let app = test_app_with(vec![]);

        let payload = json!({
            "title": "写周报",
            "priority": "HIGH"
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tasks")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "写周报");
        assert_eq!(body["data"]["priority"], "HIGH");
        let id = body["data"]["id"].as_i64().unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/tasks/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_missing_task_returns_404() {
        let app = test_app_with(vec![]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/tasks/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "TASK_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_task_with_unknown_category_returns_404() {
        let app = test_app_with(vec![]);

        let payload = json!({
            "title": "孤儿任务",
            "category_id": 42
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tasks")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "CATEGORY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_duplicate_category_title_returns_409() {
        let app = test_app_with(vec![]);

        let payload = json!({ "title": "工作" });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/categories")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/categories")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "CATEGORY_TITLE_EXISTS");
    }

    #[tokio::test]
    async fn test_notifications_endpoint_claims_once() {
        let app = test_app_with(vec![TaskBuilder::new()
            .with_id(1)
            .with_title("到期任务")
            .with_due(Utc::now() - Duration::minutes(5))
            .build()]);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["title"], "到期任务");

        // 同一个任务不会被第二次请求重复拿到
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_move_task_detaches_category() {
        let app = test_app_with(vec![TaskBuilder::new()
            .with_id(1)
            .with_title("归档任务")
            .with_category(7)
            .build()]);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tasks/1/move")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "category_id": null }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["category_id"], Value::Null);
    }
}
