use std::num::NonZeroUsize;

use crate::scheduler::job::{JobDescriptor, JobList};

/// Dispatch state owned exclusively by the coordinator.
///
/// `next_job` walks the job list in fixed strides; `next_output_index`
/// advances by exactly one per assignment, independently, so sparsely
/// sampled inputs still produce a densely numbered output sequence.
/// Both are monotonically non-decreasing. Index 0 is a valid, assignable
/// job.
#[derive(Debug)]
pub struct JobCursor {
    next_job: usize,
    next_output_index: u64,
    stride: NonZeroUsize,
}

impl JobCursor {
    pub fn new(stride: NonZeroUsize) -> Self {
        Self {
            next_job: 0,
            next_output_index: 0,
            stride,
        }
    }

    /// Take the next unassigned job, advancing both counters.
    ///
    /// Returns `None` once the stride walk has passed the end of the list;
    /// the cursor never moves backwards, so a job is handed out at most
    /// once.
    pub fn next_assignment(&mut self, jobs: &JobList) -> Option<JobDescriptor> {
        let input_ref = jobs.get(self.next_job)?.to_string();
        let descriptor = JobDescriptor {
            input_ref,
            output_index: self.next_output_index,
        };
        self.next_job += self.stride.get();
        self.next_output_index += 1;
        Some(descriptor)
    }

    /// True once every job in the list has been handed out.
    pub fn is_exhausted(&self, jobs: &JobList) -> bool {
        self.next_job >= jobs.len()
    }

    /// Number of jobs this cursor will hand out in total for `jobs`.
    pub fn total_assignments(&self, jobs: &JobList) -> u64 {
        (jobs.len().div_ceil(self.stride.get())) as u64
    }
}
