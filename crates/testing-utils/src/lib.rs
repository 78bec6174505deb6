//! Shared test doubles and data builders
//!
//! In-memory mock repositories, a steppable clock and a collecting alert
//! sink, so scheduler logic can be exercised without a real database or
//! real time passing.

pub mod builders;
pub mod mocks;

pub use builders::{NewTaskBuilder, TaskBuilder};
pub use mocks::{CollectingAlertSink, FixedClock, MockCategoryRepository, MockTaskRepository};
