//! The worker side of the pool: receive one job, run the transform, report,
//! block for the next assignment.
//!
//! Workers never pull work themselves; the coordinator pushes the next
//! descriptor after each report. Per-item errors are caught here and turned
//! into failure reports so that only a genuine panic takes a worker down.

pub mod transform;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::scheduler::{JobDescriptor, WorkerId, WorkerReport};

pub use transform::ItemTransform;

/// Execute-and-report loop for one worker.
///
/// Runs until the job channel closes (the coordinator's termination
/// handshake) or the coordinator goes away.
pub async fn run(
    worker_id: WorkerId,
    mut jobs: mpsc::Receiver<JobDescriptor>,
    reports: mpsc::Sender<WorkerReport>,
    transform: Arc<dyn ItemTransform>,
) {
    while let Some(job) = jobs.recv().await {
        let success = match transform.apply(&job).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    worker_id,
                    input = %job.input_ref,
                    output_index = job.output_index,
                    error = %e,
                    "Job failed"
                );
                false
            }
        };

        if reports
            .send(WorkerReport { worker_id, success })
            .await
            .is_err()
        {
            break;
        }
    }
    tracing::debug!(worker_id, "Worker loop finished");
}
