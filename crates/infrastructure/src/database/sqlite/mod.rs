pub mod sqlite_category_repository;
pub mod sqlite_task_repository;

pub use sqlite_category_repository::SqliteCategoryRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
