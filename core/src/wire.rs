//! Flat wire encoding of edit batches.
//!
//! A batch crosses the engine boundary as an array of 4-integer records
//! `(start, removed, text_offset, text_len)` plus one concatenated text blob,
//! so no per-job string has to be allocated on the far side. Offsets and
//! lengths count characters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::job_queue::{EditBatch, ReplaceJob};

/// Wire form of an [`EditBatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBatch {
    pub records: Vec<[i32; 4]>,
    pub text: String,
}

impl WireBatch {
    /// Encode jobs in order.
    pub fn encode(jobs: &[ReplaceJob]) -> Self {
        let mut records = Vec::with_capacity(jobs.len());
        let mut text = String::new();
        let mut offset = 0usize;
        for job in jobs {
            let len = job.inserted_len();
            records.push([
                job.start as i32,
                job.removed as i32,
                offset as i32,
                len as i32,
            ]);
            text.push_str(&job.text);
            offset += len;
        }
        Self { records, text }
    }

    pub fn from_batch(batch: &EditBatch) -> Self {
        Self::encode(batch.jobs())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rebuild the jobs, checking every record against the blob.
    pub fn decode(&self) -> Result<EditBatch> {
        let chars: Vec<char> = self.text.chars().collect();
        let mut jobs = Vec::with_capacity(self.records.len());
        for (i, &[start, removed, offset, len]) in self.records.iter().enumerate() {
            if start < 0 || removed < 0 || offset < 0 || len < 0 {
                return Err(SessionError::MalformedBatch(format!(
                    "record {i} has a negative field"
                )));
            }
            let (offset, len) = (offset as usize, len as usize);
            let end = offset + len;
            if end > chars.len() {
                return Err(SessionError::MalformedBatch(format!(
                    "record {i} reads text {offset}..{end} of {}",
                    chars.len()
                )));
            }
            let text: String = chars[offset..end].iter().collect();
            jobs.push(ReplaceJob::new(start as usize, removed as usize, text));
        }
        Ok(EditBatch::new(jobs))
    }

    /// Apply the batch to a mirror of the session text, in order.
    pub fn apply_to(&self, mirror: &mut String) -> Result<()> {
        for job in self.decode()?.into_jobs() {
            let char_len = mirror.chars().count();
            if job.start + job.removed > char_len {
                return Err(SessionError::range(
                    "mirror replace range",
                    job.start as i64,
                    job.removed as i64,
                    char_len,
                ));
            }
            let byte_at = |pos: usize| {
                mirror
                    .char_indices()
                    .nth(pos)
                    .map_or(mirror.len(), |(b, _)| b)
            };
            let from = byte_at(job.start);
            let to = byte_at(job.start + job.removed);
            mirror.replace_range(from..to, &job.text);
        }
        Ok(())
    }
}
