//! Mutation registry
//!
//! Maps scope names to the registrations that must be re-run when data in
//! that scope changes. Registrations survive for the life of the process
//! and are shared across dispatch threads.

use dashmap::DashMap;
use tracing::debug;
use weft_transform::ChannelAddress;

/// One recorded interest in a scope's mutations
///
/// Captures everything needed to recompute and republish a view region
/// later: the query to re-run, the channel to publish on, and the
/// transform id identifying the region on the client.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRegistration {
    /// Scope whose data this registration watches
    pub scope: String,
    /// Mutation handler to invoke with the refreshed data
    pub mutation: String,
    /// Named query that produces the data set
    pub query: String,
    /// Arguments the query was originally run with
    pub query_args: Vec<serde_json::Value>,
    /// Channel to publish resulting transformations on
    pub address: ChannelAddress,
    /// Identifies the client-side region transformations apply to
    pub transform_id: String,
}

/// Concurrent scope-keyed registration store
#[derive(Debug, Default)]
pub struct MutationRegistry {
    by_scope: DashMap<String, Vec<MutationRegistration>>,
}

impl MutationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a scope's mutations
    ///
    /// An identical registration (same scope, mutation, query, args,
    /// address, and transform id) is recorded once; re-registering it is a
    /// no-op. Returns whether the registration was newly added.
    pub fn register(&self, registration: MutationRegistration) -> bool {
        let mut entries = self
            .by_scope
            .entry(registration.scope.clone())
            .or_default();
        if entries.contains(&registration) {
            debug!(
                scope = %registration.scope,
                mutation = %registration.mutation,
                "duplicate registration skipped"
            );
            return false;
        }
        entries.push(registration);
        true
    }

    /// Remove every registration whose transform id matches
    ///
    /// Returns how many registrations were removed.
    pub fn deregister(&self, transform_id: &str) -> usize {
        let mut removed = 0;
        for mut entry in self.by_scope.iter_mut() {
            let before = entry.value().len();
            entry
                .value_mut()
                .retain(|registration| registration.transform_id != transform_id);
            removed += before - entry.value().len();
        }
        removed
    }

    /// Snapshot of the registrations watching a scope
    #[must_use]
    pub fn registrations_for(&self, scope: &str) -> Vec<MutationRegistration> {
        self.by_scope
            .get(scope)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Total registration count across all scopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_scope.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether no registrations exist
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(scope: &str, transform_id: &str) -> MutationRegistration {
        MutationRegistration {
            scope: scope.to_string(),
            mutation: "changed".to_string(),
            query: "all".to_string(),
            query_args: vec![],
            address: ChannelAddress::new(scope, "changed"),
            transform_id: transform_id.to_string(),
        }
    }

    #[test]
    fn register_and_look_up_by_scope() {
        let registry = MutationRegistry::new();
        assert!(registry.register(registration("post", "t1")));
        assert!(registry.register(registration("comment", "t2")));

        let posts = registry.registrations_for("post");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].transform_id, "t1");
        assert!(registry.registrations_for("author").is_empty());
    }

    #[test]
    fn duplicate_registration_is_skipped() {
        let registry = MutationRegistry::new();
        assert!(registry.register(registration("post", "t1")));
        assert!(!registry.register(registration("post", "t1")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_scope_different_region_both_kept() {
        let registry = MutationRegistry::new();
        assert!(registry.register(registration("post", "t1")));
        assert!(registry.register(registration("post", "t2")));
        assert_eq!(registry.registrations_for("post").len(), 2);
    }

    #[test]
    fn deregister_removes_across_scopes() {
        let registry = MutationRegistry::new();
        registry.register(registration("post", "t1"));
        registry.register(registration("comment", "t1"));
        registry.register(registration("post", "t2"));

        assert_eq!(registry.deregister("t1"), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.registrations_for("post")[0].transform_id, "t2");
    }

    #[test]
    fn concurrent_registration_is_safe() {
        use std::sync::Arc;

        let registry = Arc::new(MutationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register(registration("post", &format!("t{i}")));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.registrations_for("post").len(), 8);
    }
}
