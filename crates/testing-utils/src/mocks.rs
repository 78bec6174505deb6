//! Mock implementations for repository and port traits
//!
//! In-memory implementations for unit testing without a real database.
//! `MockTaskRepository::claim_notified` performs the eligibility check and
//! the flag update under one lock, mirroring the single-record atomicity
//! the SQLite store provides.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taskman_domain::entities::{
    Alert, Category, ClaimOutcome, NewCategory, NewTask, Task, TaskFilter,
};
use taskman_domain::ports::{AlertSink, Clock};
use taskman_domain::repositories::{CategoryRepository, TaskRepository};
use taskman_domain::{TaskmanError, TaskmanResult};

/// Mock implementation of TaskRepository for testing
#[derive(Clone)]
pub struct MockTaskRepository {
    tasks: Arc<Mutex<HashMap<i64, Task>>>,
    next_id: Arc<Mutex<i64>>,
    scan_failures: Arc<AtomicUsize>,
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            scan_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mut task_map = HashMap::new();
        let mut max_id = 0;

        for task in tasks {
            if task.id > max_id {
                max_id = task.id;
            }
            task_map.insert(task.id, task);
        }

        Self {
            tasks: Arc::new(Mutex::new(task_map)),
            next_id: Arc::new(Mutex::new(max_id + 1)),
            scan_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `n` candidate scans fail with a database error
    pub fn fail_next_scans(&self, n: usize) {
        self.scan_failures.store(n, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }

    fn take_scan_failure(&self) -> bool {
        self.scan_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn shared_tasks(&self) -> Arc<Mutex<HashMap<i64, Task>>> {
        Arc::clone(&self.tasks)
    }
}

impl Default for MockTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn create(&self, new_task: &NewTask) -> TaskmanResult<Task> {
        if new_task.title.trim().is_empty() {
            return Err(TaskmanError::validation_error("任务标题不能为空"));
        }

        let mut tasks = self.tasks.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        let now = Utc::now();
        let task = Task {
            id: *next_id,
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            due: new_task.due,
            priority: new_task.priority,
            category_id: new_task.category_id,
            notify_enabled: new_task.notify_enabled,
            notified: false,
            created_at: now,
            updated_at: now,
        };
        *next_id += 1;

        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskmanResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        let mut filtered: Vec<Task> = tasks
            .values()
            .filter(|t| filter.category_id.is_none() || t.category_id == filter.category_id)
            .cloned()
            .collect();

        // due-less tasks sort last, mirroring the store's ordering
        filtered.sort_by_key(|t| (t.due.is_none(), t.due, t.id));

        if let Some(offset) = filter.offset {
            filtered = filtered.into_iter().skip(offset as usize).collect();
        }
        if let Some(limit) = filter.limit {
            filtered.truncate(limit as usize);
        }

        Ok(filtered)
    }

    async fn update(&self, id: i64, changes: &NewTask) -> TaskmanResult<Task> {
        if changes.title.trim().is_empty() {
            return Err(TaskmanError::validation_error("任务标题不能为空"));
        }

        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| TaskmanError::task_not_found(id))?;

        task.title = changes.title.clone();
        task.description = changes.description.clone();
        task.due = changes.due;
        task.priority = changes.priority;
        task.category_id = changes.category_id;
        task.notify_enabled = changes.notify_enabled;
        // editing re-arms the notification
        task.notified = false;
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    async fn move_to_category(&self, id: i64, category_id: Option<i64>) -> TaskmanResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&id) {
            Some(task) => {
                task.category_id = category_id;
                task.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> TaskmanResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks.remove(&id).is_some())
    }

    async fn find_notification_candidates(&self) -> TaskmanResult<Vec<Task>> {
        if self.take_scan_failure() {
            return Err(TaskmanError::database_error("injected scan failure"));
        }

        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .values()
            .filter(|t| t.is_notification_candidate())
            .cloned()
            .collect())
    }

    async fn claim_notified(&self, id: i64, now: DateTime<Utc>) -> TaskmanResult<ClaimOutcome> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&id) {
            Some(task) if task.is_notification_candidate() && task.is_due_at(now) => {
                task.notified = true;
                Ok(ClaimOutcome::Claimed)
            }
            Some(_) => Ok(ClaimOutcome::AlreadyNotified),
            None => Ok(ClaimOutcome::NotFound),
        }
    }
}

/// Mock implementation of CategoryRepository for testing
///
/// Use `linked_to` so deleting a category also clears `category_id`
/// on the tasks held by the paired MockTaskRepository.
#[derive(Clone)]
pub struct MockCategoryRepository {
    categories: Arc<Mutex<HashMap<i64, Category>>>,
    next_id: Arc<Mutex<i64>>,
    tasks: Option<Arc<Mutex<HashMap<i64, Task>>>>,
}

impl MockCategoryRepository {
    pub fn new() -> Self {
        Self {
            categories: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            tasks: None,
        }
    }

    pub fn linked_to(task_repo: &MockTaskRepository) -> Self {
        Self {
            categories: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            tasks: Some(task_repo.shared_tasks()),
        }
    }
}

impl Default for MockCategoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryRepository for MockCategoryRepository {
    async fn create(&self, new_category: &NewCategory) -> TaskmanResult<Category> {
        if new_category.title.trim().is_empty() {
            return Err(TaskmanError::validation_error("分类标题不能为空"));
        }

        let mut categories = self.categories.lock().unwrap();
        if categories
            .values()
            .any(|c| c.title == new_category.title)
        {
            return Err(TaskmanError::CategoryTitleExists {
                title: new_category.title.clone(),
            });
        }

        let mut next_id = self.next_id.lock().unwrap();
        let category = Category {
            id: *next_id,
            title: new_category.title.clone(),
            description: new_category.description.clone(),
            created_at: Utc::now(),
        };
        *next_id += 1;

        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_by_id(&self, id: i64) -> TaskmanResult<Option<Category>> {
        let categories = self.categories.lock().unwrap();
        Ok(categories.get(&id).cloned())
    }

    async fn list(&self) -> TaskmanResult<Vec<Category>> {
        let categories = self.categories.lock().unwrap();
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    async fn update(&self, id: i64, changes: &NewCategory) -> TaskmanResult<Category> {
        let mut categories = self.categories.lock().unwrap();
        if categories
            .values()
            .any(|c| c.id != id && c.title == changes.title)
        {
            return Err(TaskmanError::CategoryTitleExists {
                title: changes.title.clone(),
            });
        }

        let category = categories
            .get_mut(&id)
            .ok_or_else(|| TaskmanError::category_not_found(id))?;
        category.title = changes.title.clone();
        category.description = changes.description.clone();
        Ok(category.clone())
    }

    async fn delete(&self, id: i64) -> TaskmanResult<bool> {
        let mut categories = self.categories.lock().unwrap();
        let removed = categories.remove(&id).is_some();

        if removed {
            if let Some(tasks) = &self.tasks {
                let mut tasks = tasks.lock().unwrap();
                for task in tasks.values_mut() {
                    if task.category_id == Some(id) {
                        task.category_id = None;
                    }
                }
            }
        }

        Ok(removed)
    }
}

/// Steppable clock for driving due-time logic in tests
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// AlertSink that records every delivered alert
#[derive(Clone)]
pub struct CollectingAlertSink {
    delivered: Arc<Mutex<Vec<Alert>>>,
    failing: Arc<AtomicBool>,
}

impl CollectingAlertSink {
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn delivered(&self) -> Vec<Alert> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    /// Simulate a presentation layer that rejects deliveries
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for CollectingAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for CollectingAlertSink {
    async fn deliver(&self, alert: &Alert) -> TaskmanResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TaskmanError::AlertDelivery(
                "collecting sink set to fail".to_string(),
            ));
        }
        self.delivered.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
