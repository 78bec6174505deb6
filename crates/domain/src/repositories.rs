//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则。
//! 提醒的至多一次语义完全建立在 `claim_notified` 的单记录条件更新之上。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Category, ClaimOutcome, NewCategory, NewTask, Task, TaskFilter};
use crate::errors::TaskmanResult;

/// 任务仓储抽象
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建任务，`notified` 始终以 false 开始
    async fn create(&self, new_task: &NewTask) -> TaskmanResult<Task>;
    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Task>>;
    async fn list(&self, filter: &TaskFilter) -> TaskmanResult<Vec<Task>>;
    /// 整体替换任务字段并把 `notified` 重置为 false（重新武装提醒）
    async fn update(&self, id: i64, changes: &NewTask) -> TaskmanResult<Task>;
    /// 只变更分类归属，不触碰 `notified`
    async fn move_to_category(&self, id: i64, category_id: Option<i64>) -> TaskmanResult<bool>;
    async fn delete(&self, id: i64) -> TaskmanResult<bool>;

    /// 查询提醒候选：due 非空、notify_enabled、尚未 notified。
    /// 到期时间无法解析的记录跳过本次查询，不会中断其他记录。
    async fn find_notification_candidates(&self) -> TaskmanResult<Vec<Task>>;

    /// 原子认领：仅当任务在 `now` 时刻仍满足完整的提醒条件
    /// （存在、due <= now、notify_enabled、notified=false）时置位 notified。
    /// 两个并发认领者至多一个得到 `Claimed`。
    async fn claim_notified(&self, id: i64, now: DateTime<Utc>) -> TaskmanResult<ClaimOutcome>;
}

/// 分类仓储抽象
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// 创建分类，标题重复时返回 `CategoryTitleExists`
    async fn create(&self, new_category: &NewCategory) -> TaskmanResult<Category>;
    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Category>>;
    async fn list(&self) -> TaskmanResult<Vec<Category>>;
    /// 重命名同样受标题唯一性约束
    async fn update(&self, id: i64, changes: &NewCategory) -> TaskmanResult<Category>;
    /// 删除分类时把引用它的任务的 category_id 置空，绝不删除任务
    async fn delete(&self, id: i64) -> TaskmanResult<bool>;
}
