use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use taskman_api::create_app;
use taskman_config::AppConfig;
use taskman_domain::ports::SystemClock;
use taskman_domain::repositories::{CategoryRepository, TaskRepository};
use taskman_infrastructure::{create_pool, SqliteCategoryRepository, SqliteTaskRepository};
use taskman_notifier::{LogAlertSink, NotificationScheduler};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

/// 应用运行模式
#[derive(Debug, Clone)]
pub enum AppMode {
    /// 仅运行API服务器
    Api,
    /// 仅运行后台提醒调度器
    Notifier,
    /// 运行所有组件
    All,
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    task_repo: Arc<dyn TaskRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    scheduler: Arc<NotificationScheduler>,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);

        // 创建数据库连接池并完成迁移
        info!("连接数据库: {}", config.database.url);
        let pool = create_pool(&config.database.url, config.database.max_connections)
            .await
            .context("初始化数据库失败")?;
        info!("数据库连接成功");

        // 创建Repository实例
        let task_repo: Arc<dyn TaskRepository> =
            Arc::new(SqliteTaskRepository::new(pool.clone()));
        let category_repo: Arc<dyn CategoryRepository> =
            Arc::new(SqliteCategoryRepository::new(pool));

        // 创建提醒调度器，API的按需检查和后台循环共用同一个实例
        let scheduler = Arc::new(NotificationScheduler::new(
            Arc::clone(&task_repo),
            Arc::new(SystemClock),
            Arc::new(LogAlertSink),
            Duration::from_secs(config.notifier.poll_interval_seconds),
        ));

        Ok(Self {
            config,
            mode,
            task_repo,
            category_repo,
            scheduler,
        })
    }

    /// 运行应用程序
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        match self.mode {
            AppMode::Api => {
                self.run_api(shutdown_rx).await?;
            }
            AppMode::Notifier => {
                self.run_notifier(shutdown_rx).await?;
            }
            AppMode::All => {
                self.run_all_components(shutdown_rx).await?;
            }
        }

        Ok(())
    }

    /// 运行后台提醒调度器
    async fn run_notifier(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "启动提醒调度器，扫描周期 {} 秒",
            self.config.notifier.poll_interval_seconds
        );

        self.scheduler.start()?;

        // 等待关闭信号
        let _ = shutdown_rx.recv().await;
        info!("提醒调度器收到关闭信号");

        // stop 等待循环完全退出
        self.scheduler.stop().await;

        info!("提醒调度器已停止");
        Ok(())
    }

    /// 运行API模式
    async fn run_api(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动API服务器: {}", self.config.api.bind_address);

        let app = create_app(
            Arc::clone(&self.task_repo),
            Arc::clone(&self.category_repo),
            Arc::clone(&self.scheduler),
            self.config.api.cors_enabled,
        );

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                error!("API服务器运行失败: {}", e);
            }
        });

        // 等待关闭信号
        let _ = shutdown_rx.recv().await;
        info!("API服务器收到关闭信号");

        server_handle.abort();

        info!("API服务器已停止");
        Ok(())
    }

    /// 运行所有组件
    async fn run_all_components(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动所有组件");

        let mut handles = Vec::new();

        if self.config.notifier.enabled {
            let app = self.clone_for_mode(AppMode::Notifier);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_notifier(shutdown_rx).await {
                    error!("提醒调度器运行失败: {}", e);
                }
            }));
        }

        if self.config.api.enabled {
            let app = self.clone_for_mode(AppMode::Api);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_api(shutdown_rx).await {
                    error!("API服务器运行失败: {}", e);
                }
            }));
        }

        // 等待所有组件完成
        for handle in handles {
            let _ = handle.await;
        }

        info!("所有组件已停止");
        Ok(())
    }

    /// 为特定模式克隆应用实例，共享仓储和调度器
    fn clone_for_mode(&self, mode: AppMode) -> Self {
        Self {
            config: self.config.clone(),
            mode,
            task_repo: Arc::clone(&self.task_repo),
            category_repo: Arc::clone(&self.category_repo),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}
