use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use client::{ContentClient, ProgressFilter};
use learner_core::model::{Classroom, ContentNode, ContentNodeId};

use crate::error::ResumableServiceError;
use crate::progress_store::ProgressStore;

#[derive(Default)]
struct ResumableState {
    nodes: Vec<ContentNode>,
    more: Option<String>,
    seq: u64,
}

/// Owns the paginated list of content the learner can pick back up,
/// independent of classroom membership.
pub struct ResumableService {
    content: Arc<dyn ContentClient>,
    progress: Arc<ProgressStore>,
    state: RwLock<ResumableState>,
    fetch_seq: AtomicU64,
}

impl ResumableService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentClient>, progress: Arc<ProgressStore>) -> Self {
        Self {
            content,
            progress,
            state: RwLock::new(ResumableState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, ResumableState>, ResumableServiceError>
    {
        self.state
            .read()
            .map_err(|_| ResumableServiceError::Poisoned)
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, ResumableState>, ResumableServiceError> {
        self.state
            .write()
            .map_err(|_| ResumableServiceError::Poisoned)
    }

    async fn apply_page_progress(
        &self,
        nodes: &[ContentNode],
    ) -> Result<(), ResumableServiceError> {
        if nodes.is_empty() {
            return Ok(());
        }
        let ids: Vec<ContentNodeId> = nodes.iter().map(|n| n.id().clone()).collect();
        self.progress
            .fetch_progress(&ProgressFilter::for_content(ids))
            .await?;
        Ok(())
    }

    /// Fetch the first page of resumable content, apply its progress records,
    /// and replace the collection. The continuation token for the next page is
    /// stored, or cleared when this is the only page.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Client` if a fetch fails; the previous
    /// state is kept untouched on failure.
    pub async fn fetch_resumable_nodes(&self) -> Result<(), ResumableServiceError> {
        let ticket = self.fetch_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let page = self.content.fetch_resume(None).await?;
        self.apply_page_progress(&page.results).await?;

        let mut state = self.write()?;
        if ticket <= state.seq {
            debug!(ticket, "discarding stale resumable page");
            return Ok(());
        }
        debug!(count = page.results.len(), more = page.more.is_some(), "replacing resumable nodes");
        state.seq = ticket;
        state.nodes = page.results;
        state.more = page.more;
        Ok(())
    }

    /// Fetch the next page and append it. Resolves immediately as a no-op when
    /// no continuation token is stored.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Client` if a fetch fails.
    pub async fn fetch_more_resumable_nodes(&self) -> Result<(), ResumableServiceError> {
        let token = self.read()?.more.clone();
        let Some(token) = token else {
            return Ok(());
        };

        let page = self.content.fetch_resume(Some(&token)).await?;
        self.apply_page_progress(&page.results).await?;

        let mut state = self.write()?;
        state.nodes.extend(page.results);
        state.more = page.more;
        Ok(())
    }

    /// The resumable collection, de-duplicated by node id (pagination and
    /// classroom-resource overlap can repeat nodes), preserving order.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Poisoned` if the state lock is poisoned.
    pub fn resumable_nodes(&self) -> Result<Vec<ContentNode>, ResumableServiceError> {
        let state = self.read()?;
        let mut seen = HashSet::new();
        Ok(state
            .nodes
            .iter()
            .filter(|n| seen.insert(n.id().clone()))
            .cloned()
            .collect())
    }

    /// Linear lookup of a resumable node by id. Absence is a normal outcome.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Poisoned` if the state lock is poisoned.
    pub fn get_resumable_node(
        &self,
        id: &ContentNodeId,
    ) -> Result<Option<ContentNode>, ResumableServiceError> {
        let state = self.read()?;
        Ok(state.nodes.iter().find(|n| n.id() == id).cloned())
    }

    /// Resumable nodes not referenced by any lesson in the given classrooms.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Poisoned` if the state lock is poisoned.
    pub fn resumable_outside_classes(
        &self,
        classrooms: &[Classroom],
    ) -> Result<Vec<ContentNode>, ResumableServiceError> {
        let assigned: HashSet<&ContentNodeId> = classrooms
            .iter()
            .flat_map(|c| c.lessons().iter())
            .flat_map(|l| l.resources().iter())
            .map(|r| &r.content_node_id)
            .collect();

        Ok(self
            .resumable_nodes()?
            .into_iter()
            .filter(|n| !assigned.contains(n.id()))
            .collect())
    }

    /// Whether another page can still be fetched.
    ///
    /// # Errors
    ///
    /// Returns `ResumableServiceError::Poisoned` if the state lock is poisoned.
    pub fn more_available(&self) -> Result<bool, ResumableServiceError> {
        Ok(self.read()?.more.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use client::InMemoryClient;
    use learner_core::model::ContentKind;
    use learner_core::time::fixed_now;

    fn node(id: &str, age_minutes: i64) -> ContentNode {
        ContentNode::new(
            ContentNodeId::new(id),
            format!("Node {id}"),
            ContentKind::Exercise,
            Some(fixed_now() - Duration::minutes(age_minutes)),
        )
    }

    fn service_with(remote: InMemoryClient) -> ResumableService {
        let progress = Arc::new(ProgressStore::new(Arc::new(remote.clone())));
        ResumableService::new(Arc::new(remote), progress)
    }

    #[tokio::test]
    async fn first_fetch_replaces_and_stores_token() {
        let remote = InMemoryClient::new().with_page_size(2);
        for (id, age) in [("a", 1), ("b", 2), ("c", 3)] {
            remote.seed_resume_node(node(id, age)).unwrap();
        }

        let service = service_with(remote);
        service.fetch_resumable_nodes().await.unwrap();

        let nodes = service.resumable_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(service.more_available().unwrap());

        // a refetch replaces rather than appends
        service.fetch_resumable_nodes().await.unwrap();
        assert_eq!(service.resumable_nodes().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fetch_more_appends_until_exhausted() {
        let remote = InMemoryClient::new().with_page_size(2);
        for (id, age) in [("a", 1), ("b", 2), ("c", 3)] {
            remote.seed_resume_node(node(id, age)).unwrap();
        }

        let service = service_with(remote);
        service.fetch_resumable_nodes().await.unwrap();
        service.fetch_more_resumable_nodes().await.unwrap();

        let nodes = service.resumable_nodes().unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(!service.more_available().unwrap());

        // exhausted: further calls are no-ops
        service.fetch_more_resumable_nodes().await.unwrap();
        assert_eq!(service.resumable_nodes().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn fetch_more_without_token_is_a_no_op() {
        let service = service_with(InMemoryClient::new());
        service.fetch_more_resumable_nodes().await.unwrap();
        assert!(service.resumable_nodes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exposed_collection_deduplicates_by_id() {
        let remote = InMemoryClient::new();
        remote.seed_resume_node(node("a", 1)).unwrap();
        remote.seed_resume_node(node("a", 5)).unwrap();
        remote.seed_resume_node(node("b", 2)).unwrap();

        let service = service_with(remote);
        service.fetch_resumable_nodes().await.unwrap();

        let nodes = service.resumable_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id().as_str(), "a");
        assert_eq!(nodes[1].id().as_str(), "b");
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let remote = InMemoryClient::new();
        remote.seed_resume_node(node("a", 1)).unwrap();

        let service = service_with(remote);
        service.fetch_resumable_nodes().await.unwrap();

        assert!(service
            .get_resumable_node(&ContentNodeId::new("a"))
            .unwrap()
            .is_some());
        assert!(service
            .get_resumable_node(&ContentNodeId::new("zz"))
            .unwrap()
            .is_none());
    }
}
