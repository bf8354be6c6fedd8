pub mod coordinator;
pub mod cursor;
pub mod job;

pub use coordinator::{Coordinator, RunSummary};
pub use cursor::JobCursor;
pub use job::{JobDescriptor, JobList, WorkerId, WorkerReport};
