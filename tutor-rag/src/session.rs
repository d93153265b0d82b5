//! Explicit per-user session state.

use crate::document::META_TOPIC;
use crate::vectorstore::MetadataFilter;

/// Per-user session state, passed explicitly into the answer service.
///
/// A session carries no global mutable state: everything a query needs is
/// on this value. Setting a topic narrows retrieval to fragments whose
/// metadata matches it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier of the user this session belongs to.
    pub user_id: String,
    /// Current study topic, if the user has picked one.
    pub topic: Option<String>,
}

impl Session {
    /// Create a session for a user with no topic set.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), topic: None }
    }

    /// Set the current topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Clear the current topic.
    pub fn clear_topic(&mut self) {
        self.topic = None;
    }

    /// The retrieval filter implied by this session, if any.
    pub fn filter(&self) -> Option<MetadataFilter> {
        self.topic.as_ref().map(|topic| MetadataFilter::equals(META_TOPIC, topic.clone()))
    }
}
