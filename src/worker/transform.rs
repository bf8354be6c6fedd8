use async_trait::async_trait;

use crate::error::Result;
use crate::scheduler::JobDescriptor;

/// The opaque per-job computation a worker delegates to.
///
/// Implementations read the input named by the descriptor, perform their
/// transformation, and write the output file as a side effect. The worker
/// loop converts errors into failure reports; implementations never need to
/// handle pool concerns.
#[async_trait]
pub trait ItemTransform: Send + Sync {
    async fn apply(&self, job: &JobDescriptor) -> Result<()>;
}
