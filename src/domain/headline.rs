use serde::{Deserialize, Serialize};

/// Feed-level metadata embedded into every entry of a poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub title: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
}

/// A feed item as delivered by the poller, before normalization.
///
/// `published` is an epoch-milliseconds timestamp in string form; it is
/// coerced to a number when the entry is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeadline {
    pub title: String,
    pub published: String,
    pub link: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
}

impl RawHeadline {
    pub fn new(published: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            published: published.into(),
            ..Default::default()
        }
    }
}

/// Result of polling one source: its publisher and headlines in feed order.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub publisher: Publisher,
    pub headlines: Vec<RawHeadline>,
}
