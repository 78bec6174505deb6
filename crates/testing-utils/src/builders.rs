//! Test data builders for creating test entities
//!
//! Builder patterns with sensible defaults and easy customization.

use chrono::{DateTime, Utc};
use taskman_domain::entities::{NewTask, Priority, Task};

/// Builder for creating test Task entities
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self {
            task: Task {
                id: 1,
                title: "test_task".to_string(),
                description: None,
                due: None,
                priority: Priority::Low,
                category_id: None,
                notify_enabled: true,
                notified: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.task.description = Some(description.to_string());
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.task.due = Some(due);
        self
    }

    pub fn without_due(mut self) -> Self {
        self.task.due = None;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.task.category_id = Some(category_id);
        self
    }

    pub fn notify_disabled(mut self) -> Self {
        self.task.notify_enabled = false;
        self
    }

    pub fn already_notified(mut self) -> Self {
        self.task.notified = true;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating NewTask payloads (create/update requests)
pub struct NewTaskBuilder {
    new_task: NewTask,
}

impl NewTaskBuilder {
    pub fn new() -> Self {
        Self {
            new_task: NewTask {
                title: "test_task".to_string(),
                description: None,
                due: None,
                priority: Priority::Low,
                category_id: None,
                notify_enabled: true,
            },
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.new_task.title = title.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.new_task.description = Some(description.to_string());
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.new_task.due = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.new_task.priority = priority;
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.new_task.category_id = Some(category_id);
        self
    }

    pub fn notify_disabled(mut self) -> Self {
        self.new_task.notify_enabled = false;
        self
    }

    pub fn build(self) -> NewTask {
        self.new_task
    }
}

impl Default for NewTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}
