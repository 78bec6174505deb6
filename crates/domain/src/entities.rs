use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务实体
///
/// `notified` 只会由 claim 操作置为 true，编辑任务时重置为 false
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// 到期时间，None 表示无截止时间，永远不会触发提醒
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    /// 弱引用分类，删除分类时置空而不是级联删除任务
    pub category_id: Option<i64>,
    pub notify_enabled: bool,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 是否满足提醒候选条件（不含到期时间比较）
    pub fn is_notification_candidate(&self) -> bool {
        self.due.is_some() && self.notify_enabled && !self.notified
    }

    /// 在给定时刻是否已到期
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.due, Some(due) if due <= now)
    }
}

/// 任务优先级，只影响提醒的展示策略，不影响调度资格
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(format!("Invalid priority: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for Priority {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Priority {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Priority {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 创建/编辑任务时的完整字段集合
///
/// 编辑是整体替换，仓储层会同时把 `notified` 重置为 false
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub category_id: Option<i64>,
    pub notify_enabled: bool,
}

/// 分类实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    /// 全局唯一，创建和重命名时由仓储层校验
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub title: String,
    pub description: Option<String>,
}

/// 任务列表查询条件
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 发送给 AlertSink 的提醒消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
}

impl Alert {
    pub fn for_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority,
        }
    }
}

/// claim 操作（条件更新 notified 标志）的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// 本次调用成功认领，调用方负责发出提醒
    Claimed,
    /// 任务仍存在但不再满足认领条件，属于并发竞争的正常结果
    AlreadyNotified,
    /// 任务在扫描后被删除
    NotFound,
}
