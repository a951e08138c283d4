//! Error types for markup parsing

/// Markup layer errors
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// Input ended inside a tag or attribute
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof {
        /// Byte offset where input ran out
        offset: usize,
    },

    /// A closing tag did not match the open element
    #[error("mismatched closing tag </{found}> at byte {offset}, expected </{expected}>")]
    MismatchedTag {
        /// Tag name that was open
        expected: String,
        /// Tag name that closed
        found: String,
        /// Byte offset of the closing tag
        offset: usize,
    },

    /// A closing tag appeared with no matching open element
    #[error("stray closing tag </{found}> at byte {offset}")]
    StrayClosingTag {
        /// Tag name that closed
        found: String,
        /// Byte offset of the closing tag
        offset: usize,
    },

    /// Malformed tag syntax
    #[error("malformed tag at byte {offset}: {reason}")]
    MalformedTag {
        /// Byte offset of the tag
        offset: usize,
        /// What went wrong
        reason: String,
    },
}
