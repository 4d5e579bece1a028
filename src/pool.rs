//! Process-wide memory of questions already served, per category.
//!
//! The pool never calls the model. The fetcher takes a per-category guard
//! with [`QuestionPool::lock`], filters and marks under it, and releases it
//! before any model call.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::{normalize_question_text, QuestionRecord};

type ServedSet = Arc<AsyncMutex<HashSet<String>>>;

/// Category → normalized texts of questions already returned to callers.
///
/// Grows monotonically until [`reset`](Self::reset). Cloning shares the
/// underlying state.
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    categories: Arc<Mutex<HashMap<String, ServedSet>>>,
}

/// Exclusive access to one category's served set.
///
/// Filtering and marking through the same guard form one read-modify-write
/// step; concurrent requests for the same category cannot both serve the same
/// question.
#[derive(Debug)]
pub struct CategoryGuard {
    served: OwnedMutexGuard<HashSet<String>>,
}

impl CategoryGuard {
    /// Keep only candidates not yet served, in order.
    pub fn filter_unused(&self, candidates: Vec<QuestionRecord>) -> Vec<QuestionRecord> {
        candidates
            .into_iter()
            .filter(|record| !self.served.contains(&record.dedup_key()))
            .collect()
    }

    /// Record `records` as served.
    pub fn mark_served(&mut self, records: &[QuestionRecord]) {
        self.served
            .extend(records.iter().map(QuestionRecord::dedup_key));
    }

    /// Number of questions served so far in this category.
    pub fn served_count(&self) -> usize {
        self.served.len()
    }
}

impl QuestionPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, category: &str) -> ServedSet {
        // The outer map is only touched briefly; a poisoned lock still holds
        // a consistent map.
        let mut map = self
            .categories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(category.to_string()).or_default().clone()
    }

    /// Acquire the per-category guard, waiting for concurrent holders.
    pub async fn lock(&self, category: &str) -> CategoryGuard {
        CategoryGuard {
            served: self.entry(category).lock_owned().await,
        }
    }

    /// Keep only candidates not yet served in `category`.
    pub async fn filter_unused(
        &self,
        category: &str,
        candidates: Vec<QuestionRecord>,
    ) -> Vec<QuestionRecord> {
        self.lock(category).await.filter_unused(candidates)
    }

    /// Record `records` as served in `category`.
    pub async fn mark_served(&self, category: &str, records: &[QuestionRecord]) {
        self.lock(category).await.mark_served(records);
    }

    /// Number of questions served so far in `category`.
    pub async fn served_count(&self, category: &str) -> usize {
        self.lock(category).await.served_count()
    }

    /// Forget everything served, in every category.
    pub fn reset(&self) {
        let mut map = self
            .categories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.clear();
        tracing::info!("question pool cleared");
    }
}
