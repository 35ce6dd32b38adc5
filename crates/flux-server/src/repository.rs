//! Status-check persistence.

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_name,
            timestamp: Utc::now(),
        }
    }
}

/// Storage for status checks.
pub trait StatusRepository: Send + Sync {
    fn insert(&self, check: StatusCheck) -> ApiResult<()>;
    /// All checks, oldest first.
    fn list(&self) -> ApiResult<Vec<StatusCheck>>;
}

/// Process-local repository.
#[derive(Default)]
pub struct MemoryRepository {
    checks: DashMap<u64, StatusCheck>,
    next_seq: AtomicU64,
    limit: Option<usize>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts once `limit` checks are stored.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

impl StatusRepository for MemoryRepository {
    fn insert(&self, check: StatusCheck) -> ApiResult<()> {
        if let Some(limit) = self.limit {
            if self.checks.len() >= limit {
                return Err(ApiError::Repository(format!(
                    "status store is full ({} entries)",
                    limit
                )));
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.checks.insert(seq, check);
        Ok(())
    }

    fn list(&self) -> ApiResult<Vec<StatusCheck>> {
        let mut entries: Vec<(u64, StatusCheck)> = self
            .checks
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, check)| check).collect())
    }
}
