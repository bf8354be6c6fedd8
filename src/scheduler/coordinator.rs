use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::scheduler::cursor::JobCursor;
use crate::scheduler::job::{JobDescriptor, JobList, WorkerId, WorkerReport};
use crate::worker::{self, ItemTransform};

/// Each worker holds at most one assignment at a time.
const JOB_CHANNEL_CAPACITY: usize = 1;

/// Pool-level view of one live worker.
#[derive(Debug)]
struct WorkerHandle {
    job_tx: mpsc::Sender<JobDescriptor>,
    in_flight: Option<JobDescriptor>,
}

/// Notification that a worker task finished, cleanly or by panicking.
#[derive(Debug)]
struct WorkerExit {
    worker_id: WorkerId,
    crashed: bool,
}

/// Final accounting for one run.
///
/// `lost` counts jobs that were in flight on a worker that died before
/// reporting; they are never requeued, so their outputs are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs_total: u64,
    pub assigned: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub lost: u64,
    pub respawns: u64,
}

impl RunSummary {
    fn record(&mut self, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Owns the job list, the dispatch cursor, and the worker pool.
///
/// Workers are tokio tasks fed through per-worker channels; the coordinator
/// is a single run-to-completion loop over worker reports and worker exits,
/// so the cursor is never touched by more than one logical thread of
/// control. A worker that dies is replaced immediately with a fresh
/// identity; its in-flight job is abandoned.
pub struct Coordinator {
    jobs: JobList,
    cursor: JobCursor,
    pool_size: usize,
    transform: Arc<dyn ItemTransform>,
    workers: HashMap<WorkerId, WorkerHandle>,
    next_worker_id: WorkerId,
    report_tx: mpsc::Sender<WorkerReport>,
    report_rx: mpsc::Receiver<WorkerReport>,
    exit_tx: mpsc::Sender<WorkerExit>,
    exit_rx: mpsc::Receiver<WorkerExit>,
    summary: RunSummary,
}

impl Coordinator {
    pub fn new(jobs: JobList, transform: Arc<dyn ItemTransform>, config: &RunConfig) -> Self {
        let pool_size = config.pool_size.max(1);
        let (report_tx, report_rx) = mpsc::channel(pool_size);
        let (exit_tx, exit_rx) = mpsc::channel(pool_size);
        Self {
            cursor: JobCursor::new(config.stride),
            jobs,
            pool_size,
            transform,
            workers: HashMap::new(),
            next_worker_id: 1,
            report_tx,
            report_rx,
            exit_tx,
            exit_rx,
            summary: RunSummary::default(),
        }
    }

    /// Drive the run to completion.
    ///
    /// Spawns the pool, seeds each worker with an initial job, then hands
    /// out the remaining jobs pull-style as workers report. Returns once
    /// every job has been handed out and every outstanding assignment has
    /// either been reported or lost to a crash, or once `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) -> RunSummary {
        self.summary.jobs_total = self.cursor.total_assignments(&self.jobs);
        tracing::info!(
            pool_size = self.pool_size,
            jobs = self.summary.jobs_total,
            "Starting worker pool"
        );

        for _ in 0..self.pool_size {
            self.spawn_worker().await;
        }

        loop {
            if self.cursor.is_exhausted(&self.jobs) && self.outstanding() == 0 {
                break;
            }

            tokio::select! {
                maybe_report = self.report_rx.recv() => {
                    if let Some(report) = maybe_report {
                        self.on_report(report).await;
                    }
                }
                maybe_exit = self.exit_rx.recv() => {
                    if let Some(exit) = maybe_exit {
                        self.on_exit(exit).await;
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, draining pool");
                    break;
                }
            }
        }

        self.drain().await
    }

    fn outstanding(&self) -> usize {
        self.workers
            .values()
            .filter(|w| w.in_flight.is_some())
            .count()
    }

    /// Spawn one worker task plus a monitor task that reports its exit.
    /// The new worker is seeded with the next unassigned job if one remains.
    async fn spawn_worker(&mut self) {
        let worker_id = self.next_worker_id;
        self.next_worker_id += 1;

        let (job_tx, job_rx) = mpsc::channel(JOB_CHANNEL_CAPACITY);
        let task = tokio::spawn(worker::run(
            worker_id,
            job_rx,
            self.report_tx.clone(),
            Arc::clone(&self.transform),
        ));

        // The monitor converts both clean exits and panics into a single
        // exit event, which is the coordinator's only liveness signal.
        let exit_tx = self.exit_tx.clone();
        tokio::spawn(async move {
            let crashed = task.await.is_err();
            let _ = exit_tx.send(WorkerExit { worker_id, crashed }).await;
        });

        self.workers.insert(
            worker_id,
            WorkerHandle {
                job_tx,
                in_flight: None,
            },
        );
        tracing::info!(worker_id, "Worker started");

        self.try_dispatch(worker_id).await;
    }

    /// Hand `worker_id` the next unassigned job, if any remain.
    async fn try_dispatch(&mut self, worker_id: WorkerId) {
        let Some(handle) = self.workers.get_mut(&worker_id) else {
            return;
        };
        let Some(job) = self.cursor.next_assignment(&self.jobs) else {
            // Run is winding down; the worker stays idle until the
            // termination handshake closes its channel.
            return;
        };

        handle.in_flight = Some(job.clone());
        tracing::info!(
            worker_id,
            input = %job.input_ref,
            output_index = job.output_index,
            "Job assigned"
        );
        if handle.job_tx.send(job).await.is_err() {
            // The worker died before receiving; the exit event that follows
            // accounts for the loss.
            tracing::warn!(worker_id, "Worker unreachable at dispatch");
        }
        self.summary.assigned += 1;
    }

    async fn on_report(&mut self, report: WorkerReport) {
        let Some(handle) = self.workers.get_mut(&report.worker_id) else {
            // A worker can panic right after sending its report; its job
            // was already written off when the exit event arrived first.
            tracing::debug!(worker_id = report.worker_id, "Report from dead worker, ignoring");
            return;
        };
        handle.in_flight = None;

        self.summary.record(report.success);
        tracing::debug!(
            worker_id = report.worker_id,
            success = report.success,
            "Worker reported"
        );

        self.try_dispatch(report.worker_id).await;
    }

    async fn on_exit(&mut self, exit: WorkerExit) {
        let Some(handle) = self.workers.remove(&exit.worker_id) else {
            return;
        };

        if let Some(job) = handle.in_flight {
            self.summary.lost += 1;
            tracing::warn!(
                worker_id = exit.worker_id,
                input = %job.input_ref,
                output_index = job.output_index,
                "Worker died with a job in flight; its output will be missing"
            );
        } else {
            tracing::warn!(worker_id = exit.worker_id, crashed = exit.crashed, "Worker died");
        }

        // Keep the pool at full strength. The replacement gets a fresh
        // identity and, like a startup worker, the next unassigned job.
        self.summary.respawns += 1;
        tracing::info!("Spawning replacement worker");
        self.spawn_worker().await;
    }

    /// Termination handshake: close every job channel so idle workers end
    /// their receive loop, wait for all of them to exit, then collect any
    /// reports that were still queued.
    async fn drain(mut self) -> RunSummary {
        let mut in_flight: HashMap<WorkerId, JobDescriptor> = self
            .workers
            .drain()
            .filter_map(|(id, handle)| handle.in_flight.map(|job| (id, job)))
            .collect();
        drop(self.exit_tx);

        // Keep consuming reports while waiting for the exits, so a worker
        // mid-send can never wedge the drain on a full report channel.
        loop {
            tokio::select! {
                maybe_exit = self.exit_rx.recv() => {
                    if maybe_exit.is_none() {
                        break;
                    }
                }
                maybe_report = self.report_rx.recv() => {
                    if let Some(report) = maybe_report {
                        in_flight.remove(&report.worker_id);
                        self.summary.record(report.success);
                    }
                }
            }
        }

        // Every worker has exited; whatever is left in the channel was sent
        // before its worker finished.
        while let Ok(report) = self.report_rx.try_recv() {
            in_flight.remove(&report.worker_id);
            self.summary.record(report.success);
        }

        // Anything still unreported went down with its worker.
        self.summary.lost += in_flight.len() as u64;

        self.summary
    }
}
