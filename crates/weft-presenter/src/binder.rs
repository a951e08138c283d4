//! Binders
//!
//! A [`Binder`] is a user-supplied per-scope transform consulted before raw
//! object values. A binder that does not know a prop falls through to the
//! raw value, so binders only ever override what they name.

use indexmap::IndexMap;

use crate::value::DataObject;

/// Bound output of one binder prop
///
/// `content` replaces the prop's inner markup; named `parts` address
/// attribute groups (`class`, `style`, booleans, plain attributes) with the
/// merge semantics of the binding engine. A prop that declares parts but no
/// `content` keeps the raw object value as its content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundParts {
    /// Replacement inner markup, when the binder overrides `content`
    pub content: Option<String>,
    /// Named attribute parts in declaration order
    pub parts: IndexMap<String, String>,
}

impl BoundParts {
    /// Parts with only replacement content
    #[inline]
    #[must_use]
    pub fn content(value: impl Into<String>) -> Self {
        Self {
            content: Some(value.into()),
            ..Self::default()
        }
    }

    /// Builder-style named part
    #[must_use]
    pub fn with_part(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.insert(name.into(), value.into());
        self
    }
}

/// Per-scope value transform
pub trait Binder {
    /// Scope name this binder applies to
    fn scope(&self) -> &str;

    /// Bind one prop of one object
    ///
    /// Return `None` to fall back to the raw object value.
    fn bind_prop(&self, prop: &str, object: &DataObject) -> Option<BoundParts>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PostBinder;

    impl Binder for PostBinder {
        fn scope(&self) -> &str {
            "post"
        }

        fn bind_prop(&self, prop: &str, object: &DataObject) -> Option<BoundParts> {
            match prop {
                "title" => {
                    let raw = object.get("title")?.display();
                    Some(BoundParts::content(raw.to_uppercase()))
                }
                "mood" => Some(BoundParts::default().with_part("style", "color: red")),
                _ => None,
            }
        }
    }

    #[test]
    fn binder_overrides_named_prop() {
        let object = crate::value::DataObject::new().with_scalar("title", "hello");
        let parts = PostBinder.bind_prop("title", &object).unwrap();
        assert_eq!(parts.content.as_deref(), Some("HELLO"));
    }

    #[test]
    fn binder_misses_fall_through() {
        let object = crate::value::DataObject::new();
        assert!(PostBinder.bind_prop("body", &object).is_none());
    }

    #[test]
    fn binder_part_without_content() {
        let object = crate::value::DataObject::new();
        let parts = PostBinder.bind_prop("mood", &object).unwrap();
        assert!(parts.content.is_none());
        assert_eq!(parts.parts.get("style").map(String::as_str), Some("color: red"));
    }
}
