//! Channel addressing
//!
//! Pure mapping from a mutation's identity and qualifying data to the
//! canonical channel string used for both subscribe and publish. The two
//! sides never coordinate, so the output must be byte-identical for
//! identical inputs.
//!
//! Grammar:
//! `scope:<s>;mutation:<m>[;component:<c>][::qualifier1:<v1>;qualifier2:<v2>...]`

use indexmap::IndexMap;
use tracing::debug;
use weft_presenter::{DataObject, Value};

/// Addressing inputs for one mutation channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelAddress {
    /// Data scope name
    pub scope: String,
    /// Mutation name
    pub mutation: String,
    /// Optional component discriminator
    pub component: Option<String>,
    /// Field names resolved against the first data element
    pub qualifiers: Vec<String>,
    /// Explicit qualifier values; `None` entries are dropped
    pub qualifications: IndexMap<String, Option<String>>,
}

impl ChannelAddress {
    /// Address for a scope/mutation pair
    #[must_use]
    pub fn new(scope: impl Into<String>, mutation: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            mutation: mutation.into(),
            ..Self::default()
        }
    }

    /// Builder-style component discriminator
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Builder-style data-resolved qualifier
    #[must_use]
    pub fn with_qualifier(mut self, name: impl Into<String>) -> Self {
        self.qualifiers.push(name.into());
        self
    }

    /// Builder-style explicit qualification
    #[must_use]
    pub fn with_qualification(
        mut self,
        name: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> Self {
        self.qualifications.insert(name.into(), value.map(Into::into));
        self
    }

    /// Build the canonical channel string against a data snapshot
    ///
    /// Qualifier fields are read from the first element of `data` (a
    /// representative record); fields missing there are dropped, as are
    /// `None` qualifications.
    #[must_use]
    pub fn build(&self, data: &[DataObject]) -> String {
        let mut channel = format!("scope:{};mutation:{}", self.scope, self.mutation);
        if let Some(component) = &self.component {
            channel.push_str(";component:");
            channel.push_str(component);
        }

        let mut pairs: Vec<(String, String)> = Vec::new();
        let representative = data.first();
        for name in &self.qualifiers {
            match representative.and_then(|object| object.get(name)) {
                Some(value @ Value::Scalar(_)) => pairs.push((name.clone(), value.display())),
                _ => debug!(qualifier = %name, "qualifier missing on representative record"),
            }
        }
        for (name, value) in &self.qualifications {
            if pairs.iter().any(|(existing, _)| existing == name) {
                continue;
            }
            if let Some(value) = value {
                pairs.push((name.clone(), value.clone()));
            }
        }

        if !pairs.is_empty() {
            channel.push_str("::");
            let joined: Vec<String> = pairs
                .into_iter()
                .map(|(name, value)| format!("{name}:{value}"))
                .collect();
            channel.push_str(&joined.join(";"));
        }
        channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: i64) -> DataObject {
        DataObject::new().with_scalar("id", id)
    }

    #[test]
    fn builds_scope_mutation_qualifier_form() {
        let address = ChannelAddress::new("post", "changed").with_qualifier("id");
        assert_eq!(address.build(&[record(5)]), "scope:post;mutation:changed::id:5");
    }

    #[test]
    fn component_slots_between_mutation_and_qualifiers() {
        let address = ChannelAddress::new("post", "changed")
            .with_component("sidebar")
            .with_qualifier("id");
        assert_eq!(
            address.build(&[record(5)]),
            "scope:post;mutation:changed;component:sidebar::id:5"
        );
    }

    #[test]
    fn nil_qualifications_are_dropped() {
        let address = ChannelAddress::new("post", "changed")
            .with_qualification("user", Some("7"))
            .with_qualification("team", None::<String>);
        assert_eq!(
            address.build(&[]),
            "scope:post;mutation:changed::user:7"
        );
    }

    #[test]
    fn missing_qualifier_field_is_dropped() {
        let address = ChannelAddress::new("post", "changed").with_qualifier("author");
        assert_eq!(address.build(&[record(5)]), "scope:post;mutation:changed");
    }

    #[test]
    fn no_qualifiers_means_no_double_colon() {
        let address = ChannelAddress::new("post", "created");
        assert_eq!(address.build(&[record(1)]), "scope:post;mutation:created");
    }

    proptest! {
        #[test]
        fn channel_is_deterministic(id in any::<i64>(), scope in "[a-z]{1,12}", mutation in "[a-z]{1,12}") {
            let address = ChannelAddress::new(scope, mutation).with_qualifier("id");
            let data = vec![record(id)];
            let first = address.build(&data);
            let second = address.build(&data);
            prop_assert_eq!(first, second);
        }
    }
}
