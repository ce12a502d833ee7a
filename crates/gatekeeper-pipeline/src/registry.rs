//! The filter registry.
//!
//! Readers (one per request) never take a lock: the resolved order is an
//! immutable snapshot behind an [`ArcSwap`] and conditions live in a sharded
//! map. Writers (administrative mutations) are serialized by a mutex so two
//! registrations never resolve against each other's half-applied state.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::condition::Condition;
use crate::error::RegistryError;
use crate::filter::{FilterDescriptor, SecurityFilter};
use crate::order::resolve_order;
use crate::request::RequestView;

/// Filters in resolved execution order.
pub type OrderedFilters = Arc<Vec<Arc<dyn SecurityFilter>>>;

pub struct FilterRegistry {
    filters: DashMap<String, Arc<dyn SecurityFilter>>,
    conditions: DashMap<String, Vec<Arc<Condition>>>,
    order: ArcSwap<Vec<Arc<dyn SecurityFilter>>>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("order", &self.resolved_order())
            .finish_non_exhaustive()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: DashMap::new(),
            conditions: DashMap::new(),
            order: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Resolves the order for `candidates` and installs it.
    fn install(
        &self,
        candidates: HashMap<String, Arc<dyn SecurityFilter>>,
    ) -> Result<(), RegistryError> {
        let descriptors: Vec<FilterDescriptor> = candidates
            .values()
            .map(|f| f.descriptor().clone())
            .collect();

        let ids = resolve_order(&descriptors)?;
        let ordered: Vec<Arc<dyn SecurityFilter>> = ids
            .iter()
            .filter_map(|id| candidates.get(id).cloned())
            .collect();

        self.filters.retain(|id, _| candidates.contains_key(id));
        for (id, filter) in candidates {
            self.filters.insert(id, filter);
        }
        self.order.store(Arc::new(ordered));

        info!(filter.order = ?ids, "Filter order resolved");

        Ok(())
    }

    fn current_filters(&self) -> HashMap<String, Arc<dyn SecurityFilter>> {
        self.filters
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }

    /// Adds `filter`, replacing any filter with the same id, and re-resolves
    /// the order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Cycle`] if the new constraints contain a
    /// cycle. Nothing changes in that case; the previous order stays in effect.
    pub fn register(&self, filter: Arc<dyn SecurityFilter>) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();

        let id = filter.descriptor().id.clone();
        let mut candidates = self.current_filters();
        let replaced = candidates.insert(id.clone(), filter).is_some();

        if let Err(e) = self.install(candidates) {
            error!(filter.id = %id, error = %e, "Filter registration refused, keeping previous order");
            return Err(e);
        }

        info!(filter.id = %id, replaced, "Filter registered");

        Ok(())
    }

    /// Removes a filter and its conditions. Returns whether it was registered.
    pub fn unregister(&self, filter_id: &str) -> bool {
        let _guard = self.write_lock.lock();

        let mut candidates = self.current_filters();
        if candidates.remove(filter_id).is_none() {
            return false;
        }

        // Dropping a node cannot introduce a cycle.
        if let Err(e) = self.install(candidates) {
            error!(filter.id = %filter_id, error = %e, "Order resolution failed after unregister");
            return false;
        }
        self.conditions.remove(filter_id);

        info!(filter.id = %filter_id, "Filter unregistered");

        true
    }

    /// Removes every filter and condition.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();

        self.filters.clear();
        self.conditions.clear();
        self.order.store(Arc::new(Vec::new()));

        info!("Filter registry cleared");
    }

    /// Attaches `condition` to a registered filter, replacing any condition
    /// with the same id. Takes effect for the next request.
    pub fn add_condition(
        &self,
        filter_id: &str,
        condition: Condition,
    ) -> Result<Arc<Condition>, RegistryError> {
        let _guard = self.write_lock.lock();

        if !self.filters.contains_key(filter_id) {
            return Err(RegistryError::UnknownFilter(filter_id.to_string()));
        }

        let condition = Arc::new(condition);
        let mut attached = self.conditions.entry(filter_id.to_string()).or_default();
        attached.retain(|c| c.id() != condition.id());
        attached.push(Arc::clone(&condition));

        info!(
            filter.id = %filter_id,
            condition.id = %condition.id(),
            condition.kind = ?condition.kind(),
            "Condition added"
        );

        Ok(condition)
    }

    /// Detaches `stale_id` and attaches `condition` as one step, so no
    /// concurrent mutation can observe or interleave with the intermediate
    /// state.
    pub fn replace_condition(
        &self,
        filter_id: &str,
        stale_id: &str,
        condition: Condition,
    ) -> Result<Arc<Condition>, RegistryError> {
        let _guard = self.write_lock.lock();

        if !self.filters.contains_key(filter_id) {
            return Err(RegistryError::UnknownFilter(filter_id.to_string()));
        }

        let condition = Arc::new(condition);
        let mut attached = self.conditions.entry(filter_id.to_string()).or_default();
        attached.retain(|c| c.id() != stale_id && c.id() != condition.id());
        attached.push(Arc::clone(&condition));

        info!(
            filter.id = %filter_id,
            condition.id = %condition.id(),
            replaced = %stale_id,
            "Condition replaced"
        );

        Ok(condition)
    }

    /// Detaches a condition. Returns whether it was attached.
    pub fn remove_condition(&self, filter_id: &str, condition_id: &str) -> bool {
        let _guard = self.write_lock.lock();

        let removed = match self.conditions.get_mut(filter_id) {
            Some(mut attached) => {
                let before = attached.len();
                attached.retain(|c| c.id() != condition_id);
                attached.len() != before
            }
            None => false,
        };

        if removed {
            info!(filter.id = %filter_id, condition.id = %condition_id, "Condition removed");
        }

        removed
    }

    /// Flips the enabled flag of an attached condition.
    pub fn set_condition_enabled(
        &self,
        filter_id: &str,
        condition_id: &str,
        enabled: bool,
    ) -> Result<Arc<Condition>, RegistryError> {
        let condition = self.condition(filter_id, condition_id).ok_or_else(|| {
            RegistryError::UnknownCondition {
                filter_id: filter_id.to_string(),
                condition_id: condition_id.to_string(),
            }
        })?;

        condition.set_enabled(enabled);

        info!(
            filter.id = %filter_id,
            condition.id = %condition_id,
            enabled,
            "Condition toggled"
        );

        Ok(condition)
    }

    /// Id of the first enabled condition on `filter_id` that matches `request`.
    pub fn skip_reason(&self, filter_id: &str, request: &RequestView<'_>) -> Option<String> {
        self.conditions.get(filter_id).and_then(|attached| {
            attached
                .iter()
                .find(|c| c.should_skip(request))
                .map(|c| c.id().to_string())
        })
    }

    /// `false` iff at least one enabled condition on `filter_id` matches.
    pub fn should_apply(&self, filter_id: &str, request: &RequestView<'_>) -> bool {
        self.skip_reason(filter_id, request).is_none()
    }

    /// Current execution order as filter ids.
    pub fn resolved_order(&self) -> Vec<String> {
        self.order
            .load()
            .iter()
            .map(|f| f.descriptor().id.clone())
            .collect()
    }

    /// Current execution order as filters. The snapshot never changes.
    pub fn ordered_filters(&self) -> OrderedFilters {
        self.order.load_full()
    }

    /// Descriptors in execution order.
    pub fn descriptors(&self) -> Vec<FilterDescriptor> {
        self.order
            .load()
            .iter()
            .map(|f| f.descriptor().clone())
            .collect()
    }

    pub fn filter(&self, filter_id: &str) -> Option<Arc<dyn SecurityFilter>> {
        self.filters.get(filter_id).map(|f| Arc::clone(f.value()))
    }

    pub fn contains(&self, filter_id: &str) -> bool {
        self.filters.contains_key(filter_id)
    }

    pub fn conditions_for(&self, filter_id: &str) -> Vec<Arc<Condition>> {
        self.conditions
            .get(filter_id)
            .map(|attached| attached.value().clone())
            .unwrap_or_default()
    }

    pub fn condition(&self, filter_id: &str, condition_id: &str) -> Option<Arc<Condition>> {
        self.conditions.get(filter_id).and_then(|attached| {
            attached
                .iter()
                .find(|c| c.id() == condition_id)
                .map(Arc::clone)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Chain;
    use async_trait::async_trait;
    use axum::extract::Request;
    use axum::http::{HeaderMap, Method};
    use axum::response::Response;
    use gatekeeper_core::AppError;

    struct NamedFilter(FilterDescriptor);

    #[async_trait]
    impl SecurityFilter for NamedFilter {
        fn descriptor(&self) -> &FilterDescriptor {
            &self.0
        }

        async fn apply(&self, request: Request, chain: Chain) -> Result<Response, AppError> {
            Ok(chain.proceed(request).await)
        }
    }

    fn filter(descriptor: FilterDescriptor) -> Arc<dyn SecurityFilter> {
        Arc::new(NamedFilter(descriptor))
    }

    fn view<'a>(method: &'a Method, path: &'a str, headers: &'a HeaderMap) -> RequestView<'a> {
        RequestView::new(method, path, headers, None)
    }

    fn registry_with(ids: &[(&str, i32)]) -> FilterRegistry {
        let registry = FilterRegistry::new();
        for (id, priority) in ids {
            registry
                .register(filter(FilterDescriptor::new(*id, *priority)))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_register_resolves_order() {
        let registry = FilterRegistry::new();
        registry
            .register(filter(
                FilterDescriptor::new("authorization", 300).runs_after("jwt_verification"),
            ))
            .unwrap();
        registry
            .register(filter(FilterDescriptor::new("jwt_verification", 200)))
            .unwrap();
        registry
            .register(filter(
                FilterDescriptor::new("authentication", 100).runs_before("jwt_verification"),
            ))
            .unwrap();

        assert_eq!(
            registry.resolved_order(),
            vec!["authentication", "jwt_verification", "authorization"]
        );
    }

    #[test]
    fn test_reregister_replaces_and_resorts() {
        let registry = registry_with(&[("a", 1), ("b", 2)]);
        assert_eq!(registry.resolved_order(), vec!["a", "b"]);

        registry
            .register(filter(FilterDescriptor::new("a", 3)))
            .unwrap();

        assert_eq!(registry.resolved_order(), vec!["b", "a"]);
        assert_eq!(registry.filter("a").unwrap().descriptor().priority, 3);
        assert_eq!(registry.descriptors().len(), 2);
    }

    #[test]
    fn test_cycle_keeps_previous_order() {
        let registry = FilterRegistry::new();
        registry
            .register(filter(FilterDescriptor::new("A", 1).runs_before("B")))
            .unwrap();
        registry
            .register(filter(FilterDescriptor::new("B", 2)))
            .unwrap();
        let before = registry.resolved_order();

        let result = registry.register(filter(FilterDescriptor::new("B", 2).runs_before("A")));

        assert!(matches!(result, Err(RegistryError::Cycle(_))));
        assert_eq!(registry.resolved_order(), before);
        assert_eq!(registry.filter("B").unwrap().descriptor().runs_before, None);
    }

    #[test]
    fn test_unregister_removes_filter_and_conditions() {
        let registry = registry_with(&[("a", 1), ("b", 2)]);
        registry
            .add_condition("a", Condition::always_skip("a-off", "off"))
            .unwrap();

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert_eq!(registry.resolved_order(), vec!["b"]);
        assert!(registry.conditions_for("a").is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = registry_with(&[("a", 1)]);
        registry
            .add_condition("a", Condition::always_skip("a-off", "off"))
            .unwrap();

        registry.clear();

        assert!(registry.resolved_order().is_empty());
        assert!(!registry.contains("a"));
        assert!(registry.conditions_for("a").is_empty());
    }

    #[test]
    fn test_condition_on_unknown_filter() {
        let registry = FilterRegistry::new();
        let result = registry.add_condition("ghost", Condition::always_skip("x", "x"));
        assert!(matches!(result, Err(RegistryError::UnknownFilter(_))));
    }

    #[test]
    fn test_should_apply_with_no_conditions() {
        let registry = registry_with(&[("f", 1)]);
        let headers = HeaderMap::new();
        assert!(registry.should_apply("f", &view(&Method::GET, "/x", &headers)));
    }

    #[test]
    fn test_should_apply_with_one_condition() {
        let registry = registry_with(&[("f", 1)]);
        let headers = HeaderMap::new();
        registry
            .add_condition("f", Condition::path(&["/public/**"], &[], "public").unwrap())
            .unwrap();

        assert!(!registry.should_apply("f", &view(&Method::GET, "/public/a", &headers)));
        assert!(registry.should_apply("f", &view(&Method::GET, "/private", &headers)));
    }

    #[test]
    fn test_should_apply_ors_many_conditions() {
        let registry = registry_with(&[("f", 1)]);
        let headers = HeaderMap::new();
        for pattern in ["/one", "/two", "/three"] {
            registry
                .add_condition("f", Condition::path(&[pattern], &[], pattern).unwrap())
                .unwrap();
        }

        for path in ["/one", "/two", "/three"] {
            assert!(!registry.should_apply("f", &view(&Method::GET, path, &headers)));
        }
        assert!(registry.should_apply("f", &view(&Method::GET, "/four", &headers)));
    }

    #[test]
    fn test_disabled_condition_does_not_skip() {
        let registry = registry_with(&[("f", 1)]);
        let headers = HeaderMap::new();
        let condition = registry
            .add_condition("f", Condition::path(&["/**"], &[], "all").unwrap())
            .unwrap();
        let request = view(&Method::GET, "/x", &headers);

        assert!(!registry.should_apply("f", &request));

        registry
            .set_condition_enabled("f", condition.id(), false)
            .unwrap();
        assert!(registry.should_apply("f", &request));
        assert!(!registry.condition("f", condition.id()).unwrap().is_enabled());
    }

    #[test]
    fn test_remove_condition() {
        let registry = registry_with(&[("f", 1)]);
        let headers = HeaderMap::new();
        let condition = registry
            .add_condition("f", Condition::always_skip("f-disable-condition", "off"))
            .unwrap();

        assert_eq!(
            registry.skip_reason("f", &view(&Method::GET, "/", &headers)),
            Some("f-disable-condition".to_string())
        );

        assert!(registry.remove_condition("f", condition.id()));
        assert!(!registry.remove_condition("f", condition.id()));
        assert!(registry.should_apply("f", &view(&Method::GET, "/", &headers)));
    }

    #[test]
    fn test_same_condition_id_replaces() {
        let registry = registry_with(&[("f", 1)]);
        registry
            .add_condition("f", Condition::always_skip("fixed", "first"))
            .unwrap();
        registry
            .add_condition("f", Condition::never_skip("fixed", "second"))
            .unwrap();

        let attached = registry.conditions_for("f");
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].description(), "second");
    }

    #[test]
    fn test_toggle_unknown_condition() {
        let registry = registry_with(&[("f", 1)]);
        assert!(matches!(
            registry.set_condition_enabled("f", "nope", true),
            Err(RegistryError::UnknownCondition { .. })
        ));
    }

    #[test]
    fn test_snapshot_is_stable_across_registration() {
        let registry = registry_with(&[("a", 1)]);
        let snapshot = registry.ordered_filters();

        registry
            .register(filter(FilterDescriptor::new("b", 0)))
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.ordered_filters().len(), 2);
    }

    #[test]
    fn test_replace_condition_swaps_in_one_step() {
        let registry = registry_with(&[("f", 1)]);
        registry
            .add_condition("f", Condition::always_skip("off", "disabled"))
            .unwrap();
        registry
            .add_condition("f", Condition::never_skip("keep", "unrelated"))
            .unwrap();

        registry
            .replace_condition("f", "off", Condition::never_skip("on", "enabled"))
            .unwrap();

        let ids: Vec<String> = registry
            .conditions_for("f")
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["keep", "on"]);
        assert!(matches!(
            registry.replace_condition("missing", "off", Condition::never_skip("on", "x")),
            Err(RegistryError::UnknownFilter(_))
        ));
    }

    #[test]
    fn test_concurrent_replacements_leave_one_toggle() {
        let registry = Arc::new(registry_with(&[("f", 1)]));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for round in 0..200 {
                        if (worker + round) % 2 == 0 {
                            registry
                                .replace_condition("f", "on", Condition::always_skip("off", "d"))
                                .unwrap();
                        } else {
                            registry
                                .replace_condition("f", "off", Condition::never_skip("on", "e"))
                                .unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.conditions_for("f").len(), 1);
    }
}
