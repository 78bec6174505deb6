use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskman_domain::{
    entities::{Alert, ClaimOutcome, Task},
    ports::{AlertSink, Clock},
    repositories::TaskRepository,
    TaskmanError, TaskmanResult,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::scanner::DueScanner;

/// 后台循环的句柄，stop 时通过它通知并等待循环退出
struct LoopHandle {
    shutdown_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

/// 提醒调度器
///
/// 拥有一个可取消的重复定时器，每个扫描周期执行一次 tick：
/// 取当前时刻、扫描到期任务、逐个原子认领、认领成功才投递提醒。
/// 正确性完全依赖仓储的单记录条件更新，进程内不持有额外的调度锁。
pub struct NotificationScheduler {
    scanner: DueScanner,
    task_repo: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
    alert_sink: Arc<dyn AlertSink>,
    poll_interval: Duration,
    running: Mutex<Option<LoopHandle>>,
}

impl NotificationScheduler {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        clock: Arc<dyn Clock>,
        alert_sink: Arc<dyn AlertSink>,
        poll_interval: Duration,
    ) -> Self {
        let scanner = DueScanner::new(Arc::clone(&task_repo));

        Self {
            scanner,
            task_repo,
            clock,
            alert_sink,
            poll_interval,
            running: Mutex::new(None),
        }
    }

    /// 启动后台扫描循环；重复启动返回错误而不是崩溃
    pub fn start(self: &Arc<Self>) -> TaskmanResult<()> {
        let mut running = self.running.lock().unwrap();
        if running.is_some() {
            return Err(TaskmanError::SchedulerAlreadyRunning);
        }

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let scheduler = Arc::clone(self);
        let interval = self.poll_interval;

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = scheduler.tick().await {
                            // 存储暂时不可用只会推迟提醒：任务未被认领，
                            // 下个周期的扫描仍会找到它
                            error!("到期扫描失败，等待下个周期重试: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
            debug!("提醒调度循环退出");
        });

        *running = Some(LoopHandle { shutdown_tx, join });
        info!("提醒调度器已启动，扫描周期 {:?}", interval);
        Ok(())
    }

    /// 停止后台循环
    ///
    /// 不会打断正在进行的 tick，但等待循环完全退出后才返回，
    /// 因此返回之后不会再有任何 tick 执行。可与运行中的 tick 并发调用。
    pub async fn stop(&self) {
        let handle = { self.running.lock().unwrap().take() };

        match handle {
            Some(LoopHandle { shutdown_tx, join }) => {
                let _ = shutdown_tx.send(());
                if let Err(e) = join.await {
                    error!("等待提醒调度循环退出失败: {}", e);
                }
                info!("提醒调度器已停止");
            }
            None => {
                debug!("提醒调度器未在运行，stop 无操作");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap().is_some()
    }

    /// 执行一次完整的扫描-认领-投递周期
    ///
    /// 由定时器触发，也可以在测试中直接调用。
    /// 单个任务的失败只影响它自己，不会中断同一周期内的其他任务。
    pub async fn tick(&self) -> TaskmanResult<Vec<Alert>> {
        let alerts = self.scan_and_claim().await?;

        for alert in &alerts {
            if let Err(e) = self.alert_sink.deliver(alert).await {
                // 任务已被认领，提醒不会重发，只能记录投递失败
                error!("任务 {} 的提醒投递失败: {}", alert.id, e);
            }
        }

        Ok(alerts)
    }

    /// 同步的到期检查，供请求/响应前端调用
    ///
    /// 与 tick 共享同一个认领原语，与后台循环并发调用时
    /// 每个任务仍然至多被认领一次。返回的列表即这条路径的投递结果。
    pub async fn check_due_now(&self) -> TaskmanResult<Vec<Alert>> {
        self.scan_and_claim().await
    }

    async fn scan_and_claim(&self) -> TaskmanResult<Vec<Alert>> {
        let now = self.clock.now();
        let due = self.scanner.find_due(now).await?;
        let mut alerts = Vec::new();

        for task in &due {
            match self.claim(task, now).await {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => {}
                Err(e) => {
                    error!("认领任务 {} 失败: {}", task.id, e);
                }
            }
        }

        if !alerts.is_empty() {
            info!("本次扫描认领了 {} 个到期任务", alerts.len());
        }

        Ok(alerts)
    }

    /// 原子认领：只有条件更新成功的调用方才能发出提醒
    async fn claim(
        &self,
        task: &Task,
        now: chrono::DateTime<chrono::Utc>,
    ) -> TaskmanResult<Option<Alert>> {
        match self.task_repo.claim_notified(task.id, now).await? {
            ClaimOutcome::Claimed => Ok(Some(Alert::for_task(task))),
            ClaimOutcome::AlreadyNotified => {
                // 并发竞争的正常结果：被另一条路径抢先认领，
                // 或扫描后任务被编辑得不再符合条件
                debug!("任务 {} 已被认领或不再符合条件，跳过", task.id);
                Ok(None)
            }
            ClaimOutcome::NotFound => {
                debug!("任务 {} 在扫描后被删除，跳过", task.id);
                Ok(None)
            }
        }
    }
}
