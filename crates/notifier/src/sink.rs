use async_trait::async_trait;
use taskman_domain::{
    entities::{Alert, Priority},
    ports::AlertSink,
    TaskmanError, TaskmanResult,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 把提醒写入日志的出口，无界面部署时的默认实现
#[derive(Debug, Clone, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &Alert) -> TaskmanResult<()> {
        match alert.priority {
            Priority::High => {
                warn!("任务到期提醒 [高优先级]: {} (id={})", alert.title, alert.id);
            }
            Priority::Medium => {
                info!("任务到期提醒 [中优先级]: {} (id={})", alert.title, alert.id);
            }
            Priority::Low => {
                info!("任务到期提醒 [低优先级]: {} (id={})", alert.title, alert.id);
            }
        }
        Ok(())
    }
}

/// 通过通道把提醒转交给另一个执行上下文的出口
///
/// 调度器永远不直接触碰展示状态；拥有渲染权的消费者
/// 在自己的单线程上下文里接收并呈现提醒。
pub struct ChannelAlertSink {
    tx: mpsc::UnboundedSender<Alert>,
}

impl ChannelAlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn deliver(&self, alert: &Alert) -> TaskmanResult<()> {
        self.tx
            .send(alert.clone())
            .map_err(|_| TaskmanError::AlertDelivery("提醒消费端已关闭".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alert() -> Alert {
        Alert {
            id: 7,
            title: "entregar relatório".to_string(),
            priority: Priority::High,
        }
    }

    #[tokio::test]
    async fn test_channel_sink_hands_off_alert() {
        let (sink, mut rx) = ChannelAlertSink::new();
        sink.deliver(&sample_alert()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, 7);
        assert_eq!(received.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_consumer() {
        let (sink, rx) = ChannelAlertSink::new();
        drop(rx);

        let result = sink.deliver(&sample_alert()).await;
        assert!(matches!(result, Err(TaskmanError::AlertDelivery(_))));
    }

    #[tokio::test]
    async fn test_log_sink_accepts_all_priorities() {
        let sink = LogAlertSink;
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            let alert = Alert {
                priority,
                ..sample_alert()
            };
            assert!(sink.deliver(&alert).await.is_ok());
        }
    }
}
