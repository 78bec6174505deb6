use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TaskmanError {
    #[error("数据库操作失败: {0}")]
    DatabaseOperation(String),
    #[error("任务不存在: id={id}")]
    TaskNotFound { id: i64 },
    #[error("分类不存在: id={id}")]
    CategoryNotFound { id: i64 },
    #[error("分类标题已存在: {title}")]
    CategoryTitleExists { title: String },
    #[error("任务 {id} 的到期时间无法解析: {value}")]
    MalformedDue { id: i64, value: String },
    #[error("数据验证失败: {0}")]
    ValidationError(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("数据序列化错误: {0}")]
    Serialization(String),
    #[error("提醒调度器已在运行")]
    SchedulerAlreadyRunning,
    #[error("提醒投递失败: {0}")]
    AlertDelivery(String),
    #[error("系统内部错误: {0}")]
    Internal(String),
}

pub type TaskmanResult<T> = Result<T, TaskmanError>;

impl TaskmanError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn task_not_found(id: i64) -> Self {
        Self::TaskNotFound { id }
    }
    pub fn category_not_found(id: i64) -> Self {
        Self::CategoryNotFound { id }
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }
    /// 下个扫描周期重试即可恢复的临时性错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskmanError::DatabaseOperation(_))
    }
    pub fn user_message(&self) -> &str {
        match self {
            TaskmanError::TaskNotFound { .. } => "请求的任务不存在",
            TaskmanError::CategoryNotFound { .. } => "请求的分类不存在",
            TaskmanError::CategoryTitleExists { .. } => "分类标题已被占用",
            TaskmanError::ValidationError(_) => "输入数据验证失败",
            TaskmanError::MalformedDue { .. } => "任务的到期时间数据已损坏，请重新编辑任务",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<sqlx::Error> for TaskmanError {
    fn from(err: sqlx::Error) -> Self {
        TaskmanError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TaskmanError {
    fn from(err: serde_json::Error) -> Self {
        TaskmanError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TaskmanError {
    fn from(err: anyhow::Error) -> Self {
        TaskmanError::Internal(err.to_string())
    }
}
