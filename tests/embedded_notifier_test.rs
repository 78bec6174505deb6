//! 端到端集成测试：真实 SQLite 文件 + 后台调度循环

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, Utc};
    use taskman_domain::entities::Priority;
    use taskman_domain::ports::SystemClock;
    use taskman_domain::repositories::TaskRepository;
    use taskman_infrastructure::{create_pool, SqliteTaskRepository};
    use taskman_notifier::{ChannelAlertSink, NotificationScheduler};
    use taskman_testing_utils::NewTaskBuilder;
    use tempfile::TempDir;

    async fn file_backed_repo(dir: &TempDir) -> Arc<SqliteTaskRepository> {
        let db_path = dir.path().join("tasks.db");
        let url = format!("sqlite:{}", db_path.display());
        let pool = create_pool(&url, 5).await.expect("初始化数据库失败");
        Arc::new(SqliteTaskRepository::new(pool))
    }

    #[tokio::test]
    async fn test_background_loop_delivers_over_real_database() {
        let dir = TempDir::new().unwrap();
        let repo = file_backed_repo(&dir).await;

        repo.create(
            &NewTaskBuilder::new()
                .with_title("整理发票")
                .with_due(Utc::now() - Duration::seconds(5))
                .with_priority(Priority::High)
                .build(),
        )
        .await
        .unwrap();

        let (sink, mut alerts_rx) = ChannelAlertSink::new();
        let scheduler = Arc::new(NotificationScheduler::new(
            repo.clone(),
            Arc::new(SystemClock),
            Arc::new(sink),
            StdDuration::from_millis(20),
        ));

        scheduler.start().unwrap();

        let alert = tokio::time::timeout(StdDuration::from_secs(2), alerts_rx.recv())
            .await
            .expect("等待提醒超时")
            .expect("提醒通道被关闭");
        assert_eq!(alert.title, "整理发票");
        assert_eq!(alert.priority, Priority::High);

        // 同一个任务在后续周期里不会再出现
        let second = tokio::time::timeout(StdDuration::from_millis(200), alerts_rx.recv()).await;
        assert!(second.is_err());

        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_database_survives_process_restart() {
        let dir = TempDir::new().unwrap();

        let created_id = {
            let repo = file_backed_repo(&dir).await;
            repo.create(
                &NewTaskBuilder::new()
                    .with_title("persistent")
                    .with_due(Utc::now() + Duration::hours(1))
                    .build(),
            )
            .await
            .unwrap()
            .id
        };

        // 重新打开同一个文件，数据和迁移状态都还在
        let repo = file_backed_repo(&dir).await;
        let task = repo.get_by_id(created_id).await.unwrap().unwrap();
        assert_eq!(task.title, "persistent");
        assert!(!task.notified);
    }
}
