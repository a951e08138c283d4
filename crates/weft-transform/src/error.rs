//! Error types for transformation encoding and decoding

/// Transformation wire errors
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Payload could not be serialized or parsed as a wire message
    ///
    /// Unknown operation names are not an error; they decode as
    /// [`Op::Unknown`](crate::instruction::Op).
    #[error("transformation wire error: {0}")]
    Wire(#[from] serde_json::Error),
}
