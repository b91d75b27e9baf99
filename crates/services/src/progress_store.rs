use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use client::{ProgressClient, ProgressFilter};
use learner_core::model::{ContentNodeId, ProgressFraction, ProgressMetadata};

use crate::error::ProgressStoreError;

/// A stored progress value together with its question-count metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEntry {
    pub fraction: ProgressFraction,
    pub metadata: ProgressMetadata,
}

/// Session-wide map from content id to the learner's best-known progress.
///
/// Values only ever advance: an update that is not strictly greater than the
/// stored value is ignored, so an out-of-order response can never regress a
/// learner's recorded progress.
pub struct ProgressStore {
    client: Arc<dyn ProgressClient>,
    entries: RwLock<HashMap<ContentNodeId, ProgressEntry>>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(client: Arc<dyn ProgressClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record a progress value for a content node.
    ///
    /// Applies only when no entry exists or the new fraction is strictly
    /// greater; metadata is replaced together with the value. Returns whether
    /// the update was applied.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Poisoned` if the store lock is poisoned.
    pub fn set_progress(
        &self,
        id: &ContentNodeId,
        fraction: ProgressFraction,
        metadata: ProgressMetadata,
    ) -> Result<bool, ProgressStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ProgressStoreError::Poisoned)?;
        match entries.get(id) {
            Some(existing) if existing.fraction >= fraction => Ok(false),
            _ => {
                entries.insert(id.clone(), ProgressEntry { fraction, metadata });
                Ok(true)
            }
        }
    }

    /// Look up the stored entry for a content node.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Poisoned` if the store lock is poisoned.
    pub fn progress(&self, id: &ContentNodeId) -> Result<Option<ProgressEntry>, ProgressStoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ProgressStoreError::Poisoned)?;
        Ok(entries.get(id).copied())
    }

    /// Fetch progress records in the given scope and fold each one in.
    ///
    /// Resolves with the number of records that actually advanced the store.
    /// An empty result applies zero records and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Client` if the fetch fails.
    pub async fn fetch_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<usize, ProgressStoreError> {
        let updates = self.client.list_progress(filter).await?;
        debug!(count = updates.len(), "applying progress records");

        let mut applied = 0;
        for update in updates {
            if self.set_progress(&update.content_id, update.fraction, update.metadata)? {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::{InMemoryClient, ProgressUpdate};

    fn fraction(value: f64) -> ProgressFraction {
        ProgressFraction::new(value).unwrap()
    }

    fn store() -> ProgressStore {
        ProgressStore::new(Arc::new(InMemoryClient::new()))
    }

    #[test]
    fn progress_never_regresses() {
        let store = store();
        let id = ContentNodeId::new("n1");

        assert!(store
            .set_progress(&id, fraction(0.6), ProgressMetadata::default())
            .unwrap());
        assert!(!store
            .set_progress(&id, fraction(0.4), ProgressMetadata::default())
            .unwrap());
        assert!(!store
            .set_progress(&id, fraction(0.6), ProgressMetadata::default())
            .unwrap());

        let entry = store.progress(&id).unwrap().unwrap();
        assert_eq!(entry.fraction, fraction(0.6));
    }

    #[test]
    fn stored_value_is_max_of_sequence() {
        let store = store();
        let id = ContentNodeId::new("n1");
        for value in [0.2, 0.9, 0.5, 0.9, 0.1] {
            let _ = store
                .set_progress(&id, fraction(value), ProgressMetadata::default())
                .unwrap();
        }
        assert_eq!(store.progress(&id).unwrap().unwrap().fraction, fraction(0.9));
    }

    #[test]
    fn metadata_moves_with_the_value() {
        let store = store();
        let id = ContentNodeId::new("n1");
        let first = ProgressMetadata {
            total_questions: Some(10),
            answered_questions: Some(2),
        };
        let second = ProgressMetadata {
            total_questions: Some(10),
            answered_questions: Some(7),
        };

        store.set_progress(&id, fraction(0.2), first).unwrap();
        store.set_progress(&id, fraction(0.7), second).unwrap();
        // rejected update must not clobber metadata either
        store
            .set_progress(&id, fraction(0.1), ProgressMetadata::default())
            .unwrap();

        assert_eq!(store.progress(&id).unwrap().unwrap().metadata, second);
    }

    #[tokio::test]
    async fn fetch_progress_applies_every_record() {
        let remote = InMemoryClient::new();
        for (id, value) in [("a", 0.3), ("b", 1.0)] {
            remote
                .seed_progress(ProgressUpdate {
                    content_id: ContentNodeId::new(id),
                    fraction: fraction(value),
                    metadata: ProgressMetadata::default(),
                })
                .unwrap();
        }

        let store = ProgressStore::new(Arc::new(remote));
        let applied = store
            .fetch_progress(&ProgressFilter::default())
            .await
            .unwrap();

        assert_eq!(applied, 2);
        assert!(store
            .progress(&ContentNodeId::new("b"))
            .unwrap()
            .unwrap()
            .fraction
            .is_complete());
    }

    #[tokio::test]
    async fn empty_fetch_is_not_an_error() {
        let store = store();
        let applied = store
            .fetch_progress(&ProgressFilter::for_lesson(
                learner_core::model::LessonId::new("missing"),
            ))
            .await
            .unwrap();
        assert_eq!(applied, 0);
    }
}
