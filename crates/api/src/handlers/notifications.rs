use axum::extract::State;

use crate::{error::ApiResult, response::success, routes::AppState};

/// 拉取当前到期的提醒
///
/// 走与后台循环相同的认领原语：返回的每条提醒都在本次请求中
/// 被原子认领，刷新页面不会拿到重复的提醒。
pub async fn get_due_notifications(
    State(state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let alerts = state.notifier.check_due_now().await?;
    Ok(success(alerts))
}
