//! Bounded history of successful uploads, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub training_id: String,
    pub object_name: String,
    pub files_count: u32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UploadHistory {
    records: VecDeque<UploadRecord>,
    limit: usize,
}

impl UploadHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, record: UploadRecord) {
        self.records.push_front(record);
        self.records.truncate(self.limit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> UploadRecord {
        UploadRecord {
            training_id: format!("t-{}", n),
            object_name: "cat".to_string(),
            files_count: n,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_history_newest_first_and_bounded() {
        let mut history = UploadHistory::new(3);
        for n in 1..=5 {
            history.record(record(n));
        }

        assert_eq!(history.len(), 3);
        let ids: Vec<_> = history.iter().map(|r| r.training_id.as_str()).collect();
        assert_eq!(ids, vec!["t-5", "t-4", "t-3"]);
    }
}
