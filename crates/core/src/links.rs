//! Pure navigation-target builders.
//!
//! A "back-link" carries the originating route inside the target route's query
//! parameters (`prevName`, plus `prevParams`/`prevQuery` as percent-encoded
//! JSON) so a detail page can offer a return action without any navigation
//! history of its own.

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::model::{ContentNodeId, Lesson, PageName, Quiz, QuizState, RouteDescriptor};

/// Query key holding the originating route's page name.
pub const PREV_NAME: &str = "prevName";
/// Query key holding the originating route's params, percent-encoded JSON.
pub const PREV_PARAMS: &str = "prevParams";
/// Query key holding the originating route's query, percent-encoded JSON.
pub const PREV_QUERY: &str = "prevQuery";

// ─── Class Assignment Links ────────────────────────────────────────────────────

/// Route to the playlist page for a classroom lesson.
#[must_use]
pub fn class_lesson_link(lesson: &Lesson) -> RouteDescriptor {
    RouteDescriptor::new(PageName::LessonPlaylist)
        .with_param("classId", lesson.classroom_id().as_str())
        .with_param("lessonId", lesson.id().as_str())
}

/// Route to a classroom quiz. A submitted quiz opens its report; anything else
/// opens the viewer at the first question.
#[must_use]
pub fn class_quiz_link(quiz: &Quiz) -> RouteDescriptor {
    let target = |name: PageName| {
        RouteDescriptor::new(name)
            .with_param("classId", quiz.classroom_id().as_str())
            .with_param("examId", quiz.id().as_str())
            .with_param("questionNumber", 0_i64)
    };

    match quiz.progress().state() {
        QuizState::Closed => target(PageName::ExamReport)
            .with_param("questionInteraction", 0_i64)
            .with_param("tryIndex", 0_i64),
        QuizState::NotStarted | QuizState::InProgress => target(PageName::ExamViewer),
    }
}

// ─── Content Links With Back-Links ─────────────────────────────────────────────

/// Link to a content node, recording the current route as the back-link.
///
/// Returns `None` when there is no current route to return to.
#[must_use]
pub fn content_link_with_current_back(
    id: &ContentNodeId,
    is_resource: bool,
    device_id: Option<&str>,
    current: Option<&RouteDescriptor>,
) -> Option<RouteDescriptor> {
    let current = current?;
    Some(
        content_target(id, is_resource, device_id)
            .with_query(PREV_NAME, current.name.as_str())
            .with_query(PREV_PARAMS, encode_json(&current.params))
            .with_query(PREV_QUERY, encode_json(&current.query)),
    )
}

/// Link to a content node, carrying the current route's back-link forward
/// unchanged. Used when moving resource-to-resource so the original origin is
/// not lost.
#[must_use]
pub fn content_link_keep_current_back(
    id: &ContentNodeId,
    is_resource: bool,
    device_id: Option<&str>,
    current: &RouteDescriptor,
) -> RouteDescriptor {
    let mut route = content_target(id, is_resource, device_id);
    for key in [PREV_NAME, PREV_PARAMS, PREV_QUERY] {
        if let Some(value) = current.query.get(key) {
            route.query.insert(key.to_owned(), value.clone());
        }
    }
    route
}

/// Link up to a parent topic, reusing the back-link that was embedded one
/// level down. Pops one level of the navigation stack: the new route's query
/// becomes the decoded `prevQuery` of the current route.
#[must_use]
pub fn content_link_with_previous_back(
    id: &ContentNodeId,
    device_id: Option<&str>,
    current: &RouteDescriptor,
) -> RouteDescriptor {
    let mut route = content_target(id, false, device_id);
    route.query = decode_json_map(current.query.get(PREV_QUERY));
    route
}

/// Decodes the current route's back-link into a navigable descriptor.
///
/// Absent or malformed pieces fall back to the home page with empty params and
/// query rather than surfacing a parse error.
#[must_use]
pub fn back_route(current: &RouteDescriptor) -> RouteDescriptor {
    let name = current
        .query
        .get(PREV_NAME)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(PageName::Home);

    RouteDescriptor {
        name,
        params: decode_json_map(current.query.get(PREV_PARAMS)),
        query: decode_json_map(current.query.get(PREV_QUERY)),
    }
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn content_target(
    id: &ContentNodeId,
    is_resource: bool,
    device_id: Option<&str>,
) -> RouteDescriptor {
    let name = if is_resource {
        PageName::TopicsContent
    } else {
        PageName::TopicsTopic
    };
    let mut route = RouteDescriptor::new(name).with_param("id", id.as_str());
    if let Some(device) = device_id {
        route = route.with_param("deviceId", device);
    }
    route
}

fn encode_json<T: Serialize>(value: &T) -> String {
    // String-keyed maps of plain values cannot fail to serialize.
    let json = serde_json::to_string(value).unwrap_or_else(|_| String::from("{}"));
    utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string()
}

fn decode_json_map<T>(raw: Option<&String>) -> BTreeMap<String, T>
where
    T: DeserializeOwned,
{
    let Some(raw) = raw else {
        return BTreeMap::new();
    };
    let Ok(text) = percent_decode_str(raw).decode_utf8() else {
        return BTreeMap::new();
    };
    serde_json::from_str(&text).unwrap_or_default()
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassId, LessonId, LessonProgress, ParamValue, QuizId, QuizProgress};

    fn current_route() -> RouteDescriptor {
        RouteDescriptor::new(PageName::TopicsTopic)
            .with_param("id", "topic-9")
            .with_param("deviceId", "dev-1")
            .with_query("searchTerm", "long division")
    }

    fn quiz_with(started: bool, closed: bool) -> Quiz {
        Quiz::new(
            QuizId::new("q1"),
            "Quiz",
            true,
            ClassId::new("c1"),
            QuizProgress { started, closed },
        )
        .unwrap()
    }

    #[test]
    fn lesson_link_targets_playlist() {
        let lesson = Lesson::new(
            LessonId::new("l1"),
            "Lesson",
            true,
            ClassId::new("c1"),
            vec![],
            LessonProgress::new(0, 1).unwrap(),
        )
        .unwrap();

        let route = class_lesson_link(&lesson);
        assert_eq!(route.name, PageName::LessonPlaylist);
        assert_eq!(route.params["classId"], ParamValue::from("c1"));
        assert_eq!(route.params["lessonId"], ParamValue::from("l1"));
    }

    #[test]
    fn closed_quiz_links_to_report() {
        let route = class_quiz_link(&quiz_with(true, true));
        assert_eq!(route.name, PageName::ExamReport);
        assert_eq!(route.params["questionNumber"], ParamValue::Number(0));
        assert_eq!(route.params["questionInteraction"], ParamValue::Number(0));
        assert_eq!(route.params["tryIndex"], ParamValue::Number(0));
    }

    #[test]
    fn open_quiz_links_to_viewer_without_report_params() {
        let route = class_quiz_link(&quiz_with(true, false));
        assert_eq!(route.name, PageName::ExamViewer);
        assert_eq!(route.params["questionNumber"], ParamValue::Number(0));
        assert!(!route.params.contains_key("questionInteraction"));
        assert!(!route.params.contains_key("tryIndex"));
    }

    #[test]
    fn back_link_round_trips_params_and_query() {
        let current = current_route();
        let link = content_link_with_current_back(
            &ContentNodeId::new("n1"),
            false,
            None,
            Some(&current),
        )
        .unwrap();

        assert_eq!(link.name, PageName::TopicsTopic);
        assert_eq!(link.query[PREV_NAME], "TOPICS_TOPIC");

        let restored = back_route(&link);
        assert_eq!(restored.name, current.name);
        assert_eq!(restored.params, current.params);
        assert_eq!(restored.query, current.query);
    }

    #[test]
    fn resource_flag_selects_content_page() {
        let link = content_link_with_current_back(
            &ContentNodeId::new("n1"),
            true,
            Some("dev-2"),
            Some(&current_route()),
        )
        .unwrap();
        assert_eq!(link.name, PageName::TopicsContent);
        assert_eq!(link.params["deviceId"], ParamValue::from("dev-2"));
    }

    #[test]
    fn no_current_route_yields_no_link() {
        let link = content_link_with_current_back(&ContentNodeId::new("n1"), true, None, None);
        assert!(link.is_none());
    }

    #[test]
    fn keep_current_back_propagates_back_link_untouched() {
        let current = current_route();
        let first = content_link_with_current_back(
            &ContentNodeId::new("n1"),
            true,
            None,
            Some(&current),
        )
        .unwrap();
        let second =
            content_link_keep_current_back(&ContentNodeId::new("n2"), true, None, &first);

        assert_eq!(second.params["id"], ParamValue::from("n2"));
        assert_eq!(second.query[PREV_NAME], first.query[PREV_NAME]);
        assert_eq!(second.query[PREV_PARAMS], first.query[PREV_PARAMS]);
        assert_eq!(second.query[PREV_QUERY], first.query[PREV_QUERY]);
    }

    #[test]
    fn previous_back_pops_one_level() {
        // origin -> resource: the resource's route embeds origin's query,
        // which itself held a back-link two levels up.
        let origin = RouteDescriptor::new(PageName::TopicsTopic)
            .with_param("id", "parent")
            .with_query(PREV_NAME, "HOME")
            .with_query("searchTerm", "algebra");
        let resource = content_link_with_current_back(
            &ContentNodeId::new("n1"),
            true,
            None,
            Some(&origin),
        )
        .unwrap();

        let up = content_link_with_previous_back(&ContentNodeId::new("parent"), None, &resource);
        assert_eq!(up.name, PageName::TopicsTopic);
        assert_eq!(up.query.get(PREV_NAME).map(String::as_str), Some("HOME"));
        assert_eq!(
            up.query.get("searchTerm").map(String::as_str),
            Some("algebra")
        );
    }

    #[test]
    fn malformed_back_link_falls_back_to_home() {
        let route = RouteDescriptor::new(PageName::TopicsContent)
            .with_query(PREV_NAME, "NOT_A_PAGE")
            .with_query(PREV_PARAMS, "%7Bnot-json")
            .with_query(PREV_QUERY, "also not json");

        let back = back_route(&route);
        assert_eq!(back.name, PageName::Home);
        assert!(back.params.is_empty());
        assert!(back.query.is_empty());
    }

    #[test]
    fn missing_back_link_defaults_to_home() {
        let back = back_route(&RouteDescriptor::new(PageName::TopicsContent));
        assert_eq!(back.name, PageName::Home);
        assert!(back.params.is_empty());
        assert!(back.query.is_empty());
    }
}
