//! 时钟与提醒出口的端口抽象
//!
//! 调度逻辑通过 trait 获取当前时间，测试中可以注入固定时钟；
//! AlertSink 负责提醒的呈现，调度器对展示方式保持无感知。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::Alert;
use crate::errors::TaskmanResult;

/// 提供当前时刻
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟（生产环境实现）
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 提醒消费方
///
/// 实现方可能在另一个执行上下文中渲染提醒，
/// 跨上下文的交接由实现方自己保证安全（例如通过 channel 转发）。
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> TaskmanResult<()>;
}
