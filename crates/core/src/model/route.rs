use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a navigable page in the learn frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageName {
    Home,
    TopicsTopic,
    TopicsContent,
    LessonPlaylist,
    ExamViewer,
    ExamReport,
}

impl PageName {
    /// The wire name used in encoded back-links.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PageName::Home => "HOME",
            PageName::TopicsTopic => "TOPICS_TOPIC",
            PageName::TopicsContent => "TOPICS_CONTENT",
            PageName::LessonPlaylist => "LESSON_PLAYLIST",
            PageName::ExamViewer => "EXAM_VIEWER",
            PageName::ExamReport => "EXAM_REPORT",
        }
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for parsing a `PageName` from its wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePageNameError {
    raw: String,
}

impl fmt::Display for ParsePageNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown page name: {}", self.raw)
    }
}

impl std::error::Error for ParsePageNameError {}

impl FromStr for PageName {
    type Err = ParsePageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOME" => Ok(PageName::Home),
            "TOPICS_TOPIC" => Ok(PageName::TopicsTopic),
            "TOPICS_CONTENT" => Ok(PageName::TopicsContent),
            "LESSON_PLAYLIST" => Ok(PageName::LessonPlaylist),
            "EXAM_VIEWER" => Ok(PageName::ExamViewer),
            "EXAM_REPORT" => Ok(PageName::ExamReport),
            _ => Err(ParsePageNameError { raw: s.to_owned() }),
        }
    }
}

/// A route parameter: either text or a number, matching what URL segments can
/// carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(i64),
    Text(String),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Number(i64::from(value))
    }
}

/// A navigation target: page name plus the params and query it needs.
///
/// Ordered maps keep encoded back-links byte-stable for a given route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub name: PageName,
    pub params: BTreeMap<String, ParamValue>,
    pub query: BTreeMap<String, String>,
}

impl RouteDescriptor {
    #[must_use]
    pub fn new(name: PageName) -> Self {
        Self {
            name,
            params: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}
