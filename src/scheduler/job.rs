use serde::{Deserialize, Serialize};

/// Identity of one worker in the pool. Fresh for every spawn; a respawned
/// worker never reuses a dead worker's id.
pub type WorkerId = u64;

/// The ordered, immutable list of input identifiers for one run.
///
/// Built once by the job source at startup and read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobList {
    entries: Vec<String>,
}

impl JobList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for JobList {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

/// The unit of work sent from the coordinator to a worker.
///
/// `output_index` determines the deterministic output file name; it is
/// fixed at assignment time so outputs stay stable no matter which worker
/// runs the job or when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub input_ref: String,
    pub output_index: u64,
}

/// Completion message sent from a worker back to the coordinator.
///
/// `success` reflects the item outcome only. A failed item is terminal for
/// the job (never retried) but not for the worker, which is handed the next
/// job regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_list_indexing() {
        let jobs = JobList::new(vec!["a.jpg".into(), "b.jpg".into()]);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs.get(0), Some("a.jpg"));
        assert_eq!(jobs.get(1), Some("b.jpg"));
        assert_eq!(jobs.get(2), None);
    }

    #[test]
    fn job_list_empty() {
        let jobs = JobList::default();
        assert!(jobs.is_empty());
        assert_eq!(jobs.get(0), None);
    }
}
