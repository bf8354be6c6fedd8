pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod scheduler;
pub mod shutdown;
pub mod source;
pub mod worker;

pub use error::{PipelineError, Result};
