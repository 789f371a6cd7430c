//! Topic listing for the health check.

use thiserror::Error;

/// Errors raised while listing topics.
#[derive(Debug, Error)]
pub enum TopicError {
    /// The listing service could not be reached.
    #[error("topic listing unavailable: {0}")]
    Unavailable(String),
}

/// Lists the bus topics the service depends on.
pub trait TopicSource: Send + Sync {
    fn list_topics(&self) -> Result<Vec<String>, TopicError>;
}

/// A fixed topic list, usually taken from `[health] topics` in the config.
#[derive(Debug, Clone, Default)]
pub struct StaticTopics {
    topics: Vec<String>,
}

impl StaticTopics {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }
}

impl TopicSource for StaticTopics {
    fn list_topics(&self) -> Result<Vec<String>, TopicError> {
        Ok(self.topics.clone())
    }
}
