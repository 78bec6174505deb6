use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskman_domain::{entities::Task, repositories::TaskRepository, TaskmanResult};
use tracing::debug;

/// 到期扫描器
///
/// 只读组件：向仓储查询提醒候选（due 非空、notify_enabled、未 notified），
/// 再按给定时刻过滤出真正到期的任务。返回顺序不作保证，
/// 每次调用反映调用时刻的存储状态，不做任何缓存。
pub struct DueScanner {
    task_repo: Arc<dyn TaskRepository>,
}

impl DueScanner {
    pub fn new(task_repo: Arc<dyn TaskRepository>) -> Self {
        Self { task_repo }
    }

    /// 查找在 `now` 时刻已到期的任务
    pub async fn find_due(&self, now: DateTime<Utc>) -> TaskmanResult<Vec<Task>> {
        let candidates = self.task_repo.find_notification_candidates().await?;
        let total = candidates.len();

        let due: Vec<Task> = candidates
            .into_iter()
            .filter(|task| task.is_due_at(now))
            .collect();

        debug!("扫描到 {} 个候选任务，其中 {} 个已到期", total, due.len());

        Ok(due)
    }
}
