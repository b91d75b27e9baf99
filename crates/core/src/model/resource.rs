use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ClassId, ContentNodeId, LessonId};
use crate::model::progress::ProgressFraction;

/// The kind of material a content node holds.
///
/// Topics are containers; every other kind is a leaf resource a learner can
/// consume directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Topic,
    Video,
    Audio,
    Document,
    Exercise,
    Html5,
}

impl ContentKind {
    /// True when the node is a consumable resource rather than a container.
    #[must_use]
    pub fn is_resource(self) -> bool {
        !matches!(self, ContentKind::Topic)
    }
}

/// A piece of browsable content, independent of any classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    id: ContentNodeId,
    title: String,
    kind: ContentKind,
    last_interaction: Option<DateTime<Utc>>,
}

impl ContentNode {
    #[must_use]
    pub fn new(
        id: ContentNodeId,
        title: impl Into<String>,
        kind: ContentKind,
        last_interaction: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            last_interaction,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ContentNodeId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// When the learner last interacted with this node, if ever.
    #[must_use]
    pub fn last_interaction(&self) -> Option<DateTime<Utc>> {
        self.last_interaction
    }
}

/// A lesson's reference to a content node.
///
/// Detail fetches denormalize the node and its progress inline; list fetches
/// leave both unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub content_node_id: ContentNodeId,
    pub content_node: Option<ContentNode>,
    pub progress: Option<ProgressFraction>,
}

impl ResourceRef {
    #[must_use]
    pub fn new(content_node_id: ContentNodeId) -> Self {
        Self {
            content_node_id,
            content_node: None,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_content_node(mut self, node: ContentNode) -> Self {
        self.content_node = Some(node);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFraction) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// A classroom resource a learner has started but not finished, annotated with
/// the lesson and classroom it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub content_node_id: ContentNodeId,
    pub progress: ProgressFraction,
    pub lesson_id: LessonId,
    pub class_id: ClassId,
    pub content_node: ContentNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_is_not_a_resource() {
        assert!(!ContentKind::Topic.is_resource());
        assert!(ContentKind::Video.is_resource());
        assert!(ContentKind::Exercise.is_resource());
    }

    #[test]
    fn resource_ref_builders() {
        let node = ContentNode::new(
            ContentNodeId::new("n1"),
            "Fractions",
            ContentKind::Exercise,
            None,
        );
        let resource = ResourceRef::new(ContentNodeId::new("n1"))
            .with_content_node(node.clone())
            .with_progress(ProgressFraction::new(0.4).unwrap());

        assert_eq!(resource.content_node, Some(node));
        assert_eq!(resource.progress.unwrap().value(), 0.4);
    }

    #[test]
    fn content_kind_serde_names() {
        let json = serde_json::to_string(&ContentKind::Html5).unwrap();
        assert_eq!(json, "\"html5\"");
        let kind: ContentKind = serde_json::from_str("\"topic\"").unwrap();
        assert_eq!(kind, ContentKind::Topic);
    }
}
