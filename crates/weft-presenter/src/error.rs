//! Error types for the presentation engine

/// Presentation errors
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// A binding-name path resolved to nothing
    #[error("no binding named {0:?} in this view")]
    UnknownBinding(String),

    /// Markup manipulation failed
    #[error("markup error: {0}")]
    Markup(#[from] weft_markup::MarkupError),

    /// A presentation hook failed for one instance
    #[error("presentation hook failed for instance {instance_id:?}: {reason}")]
    HookFailed {
        /// `data-id` of the affected instance, when bound
        instance_id: Option<String>,
        /// What the hook reported
        reason: String,
    },
}
