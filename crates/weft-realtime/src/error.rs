//! Error types for the realtime layer

/// Realtime dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// A registered query failed against current data
    #[error("query {query:?} failed: {reason}")]
    QueryFailed {
        /// Query name
        query: String,
        /// What the query source reported
        reason: String,
    },

    /// No mutation handler is registered under this name
    #[error("no mutation handler named {0:?}")]
    UnknownMutation(String),

    /// Transformation could not be encoded for publish
    #[error(transparent)]
    Transform(#[from] weft_transform::TransformError),
}
