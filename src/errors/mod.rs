// Error handling module
pub mod core_error;
pub mod recovery;

pub use core_error::CoreError;
pub use recovery::{RetryConfiguration, RetryHandler};
