#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, Utc};
    use taskman_domain::entities::{ClaimOutcome, Priority};
    use taskman_domain::repositories::TaskRepository;
    use taskman_domain::TaskmanError;
    use taskman_notifier::NotificationScheduler;
    use taskman_testing_utils::{
        CollectingAlertSink, FixedClock, MockTaskRepository, NewTaskBuilder, TaskBuilder,
    };

    fn make_scheduler(
        repo: &MockTaskRepository,
        clock: &FixedClock,
        sink: &CollectingAlertSink,
    ) -> Arc<NotificationScheduler> {
        Arc::new(NotificationScheduler::new(
            Arc::new(repo.clone()),
            Arc::new(clock.clone()),
            Arc::new(sink.clone()),
            StdDuration::from_millis(10),
        ))
    }

    #[tokio::test]
    async fn test_tick_emits_exactly_once_per_task() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_title("task_a")
            .with_due(now - Duration::seconds(1))
            .with_priority(Priority::High)
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        let alerts = scheduler.tick().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, 1);
        assert_eq!(alerts[0].title, "task_a");
        assert_eq!(alerts[0].priority, Priority::High);
        assert_eq!(sink.count(), 1);

        // 第二次 tick 不再为同一个任务发提醒
        let alerts = scheduler.tick().await.unwrap();
        assert!(alerts.is_empty());
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_future_task_waits_for_its_due_time() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now + Duration::hours(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        assert!(scheduler.tick().await.unwrap().is_empty());
        assert_eq!(sink.count(), 0);

        // 模拟时间越过到期点后才触发
        clock.advance(Duration::hours(2));
        let alerts = scheduler.tick().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_edit_rearms_a_notified_task() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_title("original")
            .with_due(now - Duration::minutes(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        assert_eq!(scheduler.tick().await.unwrap().len(), 1);
        assert!(scheduler.tick().await.unwrap().is_empty());

        // 编辑重置 notified；新的到期时间仍在过去，任务重新可提醒
        repo.update(
            1,
            &NewTaskBuilder::new()
                .with_title("edited")
                .with_due(now - Duration::seconds(10))
                .build(),
        )
        .await
        .unwrap();

        let alerts = scheduler.tick().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "edited");
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_claims_yield_exactly_one_success() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now - Duration::seconds(1))
            .build()]);

        let repo_a = repo.clone();
        let repo_b = repo.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { repo_a.claim_notified(1, now).await.unwrap() }),
            tokio::spawn(async move { repo_b.claim_notified(1, now).await.unwrap() }),
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        let claimed = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::Claimed)
            .count();
        let already = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::AlreadyNotified)
            .count();
        assert_eq!(claimed, 1);
        assert_eq!(already, 1);
    }

    #[tokio::test]
    async fn test_on_demand_check_races_background_tick() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now - Duration::seconds(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        // 两条路径共享同一个认领原语，总共只产生一条提醒
        let (tick_alerts, on_demand_alerts) =
            tokio::join!(scheduler.tick(), scheduler.check_due_now());
        let total = tick_alerts.unwrap().len() + on_demand_alerts.unwrap().len();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_on_demand_check_claims_just_like_a_tick() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_title("web_visible")
            .with_due(now - Duration::seconds(5))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        let alerts = scheduler.check_due_now().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "web_visible");
        // 按需路径的投递就是返回值本身，不经过后台 sink
        assert_eq!(sink.count(), 0);

        // 已被按需路径认领，后台 tick 不再发出
        assert!(scheduler.tick().await.unwrap().is_empty());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_scan_failure_delays_but_does_not_lose_alerts() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now - Duration::seconds(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        repo.fail_next_scans(1);
        let result = scheduler.tick().await;
        assert!(matches!(result, Err(TaskmanError::DatabaseOperation(_))));
        assert_eq!(sink.count(), 0);

        // 失败的 tick 没有认领任何任务，下一次成功的 tick 仍会提醒
        let alerts = scheduler.tick().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_rearm_the_task() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now - Duration::seconds(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        sink.set_failing(true);
        let alerts = scheduler.tick().await.unwrap();
        // 认领先于投递：投递失败不回滚 notified
        assert_eq!(alerts.len(), 1);
        assert_eq!(sink.count(), 0);

        sink.set_failing(false);
        assert!(scheduler.tick().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_twice_is_a_reported_error() {
        let repo = MockTaskRepository::new();
        let clock = FixedClock::new(Utc::now());
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        scheduler.start().unwrap();
        assert!(scheduler.is_running());
        assert!(matches!(
            scheduler.start(),
            Err(TaskmanError::SchedulerAlreadyRunning)
        ));

        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_background_loop_picks_up_due_tasks() {
        let now = Utc::now();
        let repo = MockTaskRepository::with_tasks(vec![TaskBuilder::new()
            .with_id(1)
            .with_due(now - Duration::seconds(1))
            .build()]);
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        scheduler.start().unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        scheduler.stop().await;

        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_no_ticks_after_stop_returns() {
        let now = Utc::now();
        let repo = MockTaskRepository::new();
        let clock = FixedClock::new(now);
        let sink = CollectingAlertSink::new();
        let scheduler = make_scheduler(&repo, &clock, &sink);

        scheduler.start().unwrap();
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        scheduler.stop().await;

        // stop 返回后才写入的到期任务不会再被后台循环看到
        repo.create(
            &NewTaskBuilder::new()
                .with_title("after stop")
                .with_due(now - Duration::seconds(1))
                .build(),
        )
        .await
        .unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        assert_eq!(sink.count(), 0);

        // 重新启动是允许的
        scheduler.start().unwrap();
        scheduler.stop().await;
    }
}
