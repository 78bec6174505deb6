pub mod database;

pub use database::sqlite::{SqliteCategoryRepository, SqliteTaskRepository};
pub use database::{create_pool, run_migrations};
