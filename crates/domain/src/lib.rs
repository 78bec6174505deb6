pub mod entities;
pub mod errors;
pub mod ports;
pub mod repositories;

pub use entities::{
    Alert, Category, ClaimOutcome, NewCategory, NewTask, Priority, Task, TaskFilter,
};
pub use errors::{TaskmanError, TaskmanResult};
pub use ports::{AlertSink, Clock, SystemClock};
pub use repositories::{CategoryRepository, TaskRepository};
