pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod progress;
pub mod sort;
pub mod storage;

pub use config::AppConfig;
pub use engine::{ExtractEngine, ExtractResult, SortEngine, SortResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
