pub mod scanner;
pub mod scheduler;
pub mod sink;

pub use scanner::DueScanner;
pub use scheduler::NotificationScheduler;
pub use sink::{ChannelAlertSink, LogAlertSink};
