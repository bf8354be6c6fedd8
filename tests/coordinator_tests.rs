use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use posepipe::config::RunConfig;
use posepipe::error::PipelineError;
use posepipe::scheduler::{Coordinator, JobDescriptor, JobList, RunSummary};
use posepipe::worker::ItemTransform;

/// Transform that records every job it completes and can be told to fail,
/// panic (simulating a worker crash), or sleep per input.
#[derive(Default)]
struct MockTransform {
    seen: Mutex<Vec<JobDescriptor>>,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl MockTransform {
    fn seen(&self) -> Vec<JobDescriptor> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemTransform for MockTransform {
    async fn apply(&self, job: &JobDescriptor) -> posepipe::Result<()> {
        if let Some(delay) = self.delays.get(&job.input_ref) {
            tokio::time::sleep(*delay).await;
        }
        if self.panic_on.contains(&job.input_ref) {
            panic!("simulated worker crash on {}", job.input_ref);
        }
        self.seen.lock().unwrap().push(job.clone());
        if self.fail_on.contains(&job.input_ref) {
            return Err(PipelineError::Internal("simulated item failure".into()));
        }
        Ok(())
    }
}

fn job_list(names: &[&str]) -> JobList {
    JobList::new(names.iter().map(|s| s.to_string()).collect())
}

async fn run_pool(
    jobs: JobList,
    transform: Arc<MockTransform>,
    pool_size: usize,
    stride: usize,
) -> RunSummary {
    let config = RunConfig::new("/unused")
        .with_pool_size(pool_size)
        .with_stride(stride);
    Coordinator::new(jobs, transform, &config)
        .run(CancellationToken::new())
        .await
}

/// Scenario A: four jobs over two workers. Every job is assigned exactly
/// once, output indices follow job-list order, and the run terminates.
#[tokio::test]
async fn four_jobs_two_workers_full_coverage() {
    let transform = Arc::new(MockTransform::default());
    let summary = run_pool(job_list(&["a", "b", "c", "d"]), transform.clone(), 2, 1).await;

    assert_eq!(summary.jobs_total, 4);
    assert_eq!(summary.assigned, 4);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.lost, 0);
    assert_eq!(summary.respawns, 0);

    let seen = transform.seen();
    assert_eq!(seen.len(), 4);

    // No double assignment: each input appears exactly once.
    let inputs: HashSet<&str> = seen.iter().map(|j| j.input_ref.as_str()).collect();
    assert_eq!(inputs, HashSet::from(["a", "b", "c", "d"]));

    // Output index is the job's position in list order, regardless of
    // which worker ran it.
    let mapping: HashMap<&str, u64> = seen
        .iter()
        .map(|j| (j.input_ref.as_str(), j.output_index))
        .collect();
    assert_eq!(
        mapping,
        HashMap::from([("a", 0), ("b", 1), ("c", 2), ("d", 3)])
    );
}

/// Scenario B: sixteen entries at stride 8 yield two jobs with dense
/// output indices 0 and 1.
#[tokio::test]
async fn stride_eight_dispatches_sparse_jobs_with_dense_indices() {
    let names: Vec<String> = (0..16).map(|i| format!("pose{i}.json")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let transform = Arc::new(MockTransform::default());
    let summary = run_pool(job_list(&name_refs), transform.clone(), 4, 8).await;

    assert_eq!(summary.jobs_total, 2);
    assert_eq!(summary.assigned, 2);
    assert_eq!(summary.succeeded, 2);

    let mapping: HashMap<String, u64> = transform
        .seen()
        .into_iter()
        .map(|j| (j.input_ref, j.output_index))
        .collect();
    assert_eq!(
        mapping,
        HashMap::from([
            ("pose0.json".to_string(), 0),
            ("pose8.json".to_string(), 1),
        ])
    );
}

/// Scenario C: a worker crash loses its in-flight job, the pool is
/// replenished, and every other job still completes.
#[tokio::test]
async fn crash_loses_one_job_and_respawns_worker() {
    let transform = Arc::new(MockTransform {
        panic_on: HashSet::from(["c".to_string()]),
        ..MockTransform::default()
    });
    let summary = run_pool(job_list(&["a", "b", "c", "d", "e"]), transform.clone(), 2, 1).await;

    assert_eq!(summary.assigned, 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.lost, 1);
    assert!(summary.respawns >= 1);

    let inputs: HashSet<String> = transform
        .seen()
        .into_iter()
        .map(|j| j.input_ref)
        .collect();
    assert_eq!(
        inputs,
        HashSet::from([
            "a".to_string(),
            "b".to_string(),
            "d".to_string(),
            "e".to_string(),
        ])
    );
}

/// P5: slowing one worker down never changes the output-index mapping,
/// because indices are fixed at assignment time.
#[tokio::test]
async fn completion_order_does_not_change_output_indices() {
    let transform = Arc::new(MockTransform {
        delays: HashMap::from([("a".to_string(), Duration::from_millis(200))]),
        ..MockTransform::default()
    });
    let summary = run_pool(job_list(&["a", "b", "c", "d"]), transform.clone(), 2, 1).await;

    assert_eq!(summary.succeeded, 4);

    let seen = transform.seen();
    // "a" finishes last even though it was assigned first.
    assert_eq!(seen.last().unwrap().input_ref, "a");

    let mapping: HashMap<String, u64> = seen
        .into_iter()
        .map(|j| (j.input_ref, j.output_index))
        .collect();
    assert_eq!(
        mapping,
        HashMap::from([
            ("a".to_string(), 0),
            ("b".to_string(), 1),
            ("c".to_string(), 2),
            ("d".to_string(), 3),
        ])
    );
}

/// A handled per-item failure is terminal for the job but not the worker:
/// the same worker keeps receiving jobs and the failure is never retried.
#[tokio::test]
async fn item_failure_is_not_retried_and_worker_continues() {
    let transform = Arc::new(MockTransform {
        fail_on: HashSet::from(["b".to_string()]),
        ..MockTransform::default()
    });
    let summary = run_pool(job_list(&["a", "b", "c", "d"]), transform.clone(), 1, 1).await;

    assert_eq!(summary.assigned, 4);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.respawns, 0);

    let attempts = transform
        .seen()
        .iter()
        .filter(|j| j.input_ref == "b")
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn empty_job_list_terminates_immediately() {
    let transform = Arc::new(MockTransform::default());
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_pool(JobList::default(), transform, 4, 1),
    )
    .await
    .expect("run should terminate without jobs");

    assert_eq!(summary, RunSummary::default());
}

#[tokio::test]
async fn pool_larger_than_job_list() {
    let transform = Arc::new(MockTransform::default());
    let summary = run_pool(job_list(&["a", "b"]), transform.clone(), 8, 1).await;

    assert_eq!(summary.assigned, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(transform.seen().len(), 2);
}

/// Cancellation drains in-flight jobs and returns without assigning the
/// rest of the list.
#[tokio::test]
async fn shutdown_token_stops_dispatch_and_drains() {
    let names = ["a", "b", "c", "d"];
    let delays: HashMap<String, Duration> = names
        .iter()
        .map(|n| (n.to_string(), Duration::from_millis(200)))
        .collect();
    let transform = Arc::new(MockTransform {
        delays,
        ..MockTransform::default()
    });

    let config = RunConfig::new("/unused").with_pool_size(2).with_stride(1);
    let coordinator = Coordinator::new(job_list(&names), transform.clone(), &config);

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), coordinator.run(token))
        .await
        .expect("drain should finish promptly");

    // Only the two seeded jobs were ever assigned, and both completed
    // during the drain.
    assert_eq!(summary.assigned, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.lost, 0);
    assert_eq!(transform.seen().len(), 2);
}
