use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskman_domain::TaskmanError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("领域错误: {0}")]
    Domain(#[from] TaskmanError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Domain(TaskmanError::TaskNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("任务 ID {} 不存在", id),
                "TASK_NOT_FOUND".to_string(),
                vec![
                    "请检查任务ID是否正确".to_string(),
                    "使用 GET /api/tasks 查看所有任务".to_string(),
                ],
            ),
            ApiError::Domain(TaskmanError::CategoryNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("分类 ID {} 不存在", id),
                "CATEGORY_NOT_FOUND".to_string(),
                vec![
                    "请检查分类ID是否正确".to_string(),
                    "使用 GET /api/categories 查看所有分类".to_string(),
                ],
            ),
            ApiError::Domain(TaskmanError::CategoryTitleExists { title }) => (
                StatusCode::CONFLICT,
                format!("分类标题 '{}' 已存在", title),
                "CATEGORY_TITLE_EXISTS".to_string(),
                vec![
                    "分类标题必须唯一".to_string(),
                    "请换一个标题后重试".to_string(),
                ],
            ),
            ApiError::Domain(TaskmanError::ValidationError(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数验证失败: {}", msg),
                "VALIDATION_ERROR".to_string(),
                vec!["请检查请求参数是否符合要求".to_string()],
            ),
            ApiError::Domain(TaskmanError::MalformedDue { id, value }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("任务 {} 的到期时间 '{}' 无法解析", id, value),
                "MALFORMED_DUE".to_string(),
                vec!["该记录的到期时间已损坏，请重新编辑任务".to_string()],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {}", msg),
                "BAD_REQUEST".to_string(),
                vec![
                    "请检查请求格式和参数".to_string(),
                    "确保Content-Type正确设置".to_string(),
                ],
            ),
            ApiError::Serialization(err) => (
                StatusCode::BAD_REQUEST,
                "请求数据格式错误".to_string(),
                "SERIALIZATION_ERROR".to_string(),
                vec![
                    "请检查JSON格式是否正确".to_string(),
                    format!("详细错误: {}", err),
                ],
            ),
            ApiError::Domain(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    "查看 GET /health 检查系统状态".to_string(),
                ],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_not_found_maps_to_404() {
        let err = ApiError::Domain(TaskmanError::TaskNotFound { id: 42 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_category_title_maps_to_409() {
        let err = ApiError::Domain(TaskmanError::CategoryTitleExists {
            title: "工作".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::Domain(TaskmanError::validation_error("标题不能为空"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_failure_maps_to_500() {
        let err = ApiError::Domain(TaskmanError::database_error("connection reset"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
