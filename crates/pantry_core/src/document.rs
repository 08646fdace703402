use serde::{Deserialize, Serialize};

/// Placeholder used when a record carries no duration.
pub const UNKNOWN_TOTAL_TIME: &str = "Unknown";

/// One entry of the searchable corpus. Built once at load time and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            total_time: None,
            url: None,
        }
    }

    pub fn with_total_time(mut self, total_time: impl Into<String>) -> Self {
        self.total_time = Some(total_time.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Text the index tokenizes: title followed by body.
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }

    pub fn total_time_or_unknown(&self) -> &str {
        self.total_time
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_TOTAL_TIME)
    }
}
