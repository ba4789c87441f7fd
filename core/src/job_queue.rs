//! Pending replace jobs and batch-edit bookkeeping.
//!
//! While a batch edit is open, jobs accumulate; when the outermost batch
//! closes they are released as one ordered [`EditBatch`]. Outside a batch
//! every push is released immediately as a single-job batch.

use serde::{Deserialize, Serialize};

/// One replace operation: drop `removed` chars at `start`, insert `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceJob {
    pub start: usize,
    pub removed: usize,
    pub text: String,
}

impl ReplaceJob {
    pub fn new(start: usize, removed: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            removed,
            text: text.into(),
        }
    }

    /// Inserted length in characters.
    pub fn inserted_len(&self) -> usize {
        self.text.chars().count()
    }

    /// A job that neither removes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.text.is_empty()
    }
}

/// Jobs released together, in push order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBatch {
    jobs: Vec<ReplaceJob>,
}

impl EditBatch {
    pub fn new(jobs: Vec<ReplaceJob>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[ReplaceJob] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<ReplaceJob> {
        self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Queue of jobs plus the batch nesting depth.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    pending: Vec<ReplaceJob>,
    depth: usize,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current batch nesting depth; 0 means no batch is open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_batch(&self) -> bool {
        self.depth > 0
    }

    pub fn pending(&self) -> &[ReplaceJob] {
        &self.pending
    }

    /// Queue a job. Outside a batch this flushes right away and returns the
    /// single-job batch to deliver. No-op jobs are dropped.
    pub fn push(&mut self, job: ReplaceJob) -> Option<EditBatch> {
        if job.is_noop() {
            return None;
        }
        self.pending.push(job);
        if self.depth == 0 {
            self.flush()
        } else {
            None
        }
    }

    /// Take every pending job. Returns `None` when nothing was pending.
    pub fn flush(&mut self) -> Option<EditBatch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(EditBatch::new(std::mem::take(&mut self.pending)))
    }

    /// Open a (possibly nested) batch. Returns true on the outermost open.
    pub fn begin_batch(&mut self) -> bool {
        self.depth += 1;
        self.depth == 1
    }

    /// Close one batch level.
    ///
    /// Returns `None` when no batch was open. Otherwise returns the flushed
    /// batch (present only when the outermost level closed with pending jobs)
    /// and whether a batch remains open.
    pub fn end_batch(&mut self) -> Option<(Option<EditBatch>, bool)> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        if self.depth == 0 {
            Some((self.flush(), false))
        } else {
            Some((None, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_outside_batch_flushes_each() {
        let mut queue = JobQueue::new();
        let first = queue.push(ReplaceJob::new(0, 0, "a")).unwrap();
        let second = queue.push(ReplaceJob::new(1, 0, "b")).unwrap();
        assert_eq!(first.jobs(), &[ReplaceJob::new(0, 0, "a")]);
        assert_eq!(second.len(), 1);
        assert!(queue.pending().is_empty());
    }

    #[test]
    fn test_batch_groups_in_order() {
        let mut queue = JobQueue::new();
        assert!(queue.begin_batch());
        assert!(!queue.begin_batch());
        for i in 0..3 {
            assert!(queue.push(ReplaceJob::new(i, 0, "x")).is_none());
        }

        let (batch, still_open) = queue.end_batch().unwrap();
        assert!(batch.is_none());
        assert!(still_open);

        let (batch, still_open) = queue.end_batch().unwrap();
        let batch = batch.unwrap();
        assert!(!still_open);
        let starts: Vec<usize> = batch.jobs().iter().map(|j| j.start).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_noop_job_dropped() {
        let mut queue = JobQueue::new();
        assert!(queue.push(ReplaceJob::new(3, 0, "")).is_none());
        assert!(queue.pending().is_empty());
    }

    #[test]
    fn test_empty_flush_and_unbalanced_end() {
        let mut queue = JobQueue::new();
        assert!(queue.flush().is_none());
        assert!(queue.end_batch().is_none());
        queue.begin_batch();
        assert_eq!(queue.end_batch(), Some((None, false)));
    }
}
