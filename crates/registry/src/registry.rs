use indexmap::IndexMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::catalog::{Catalog, CategoryDescriptor};
use crate::config::CatalogConfig;
use crate::context::Context;
use crate::entity::{AsAny, Collection, Entity, EntityRef};

/// One named binding: a collection and the category it was registered under.
struct Registration<S: ?Sized + 'static> {
    category: String,
    collection: Collection<S>,
}

/// Statistics from the last [`Registry::update_all`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStats {
    pub entities_updated: usize,
    pub entities_removed: usize,
    /// Collections whose category is not in the catalog.
    pub skipped_collections: usize,
    pub frame_time: Duration,
}

/// Owns named entity collections and drives their per-frame update and draw.
///
/// Iteration follows registration order. Re-registering a name replaces its
/// binding in place, keeping its original position.
///
/// Single-threaded by construction: collections are `Rc<RefCell<_>>` handles.
/// No collection or entity borrow is held across an entity's `update` call,
/// so an update may read other collections or append to any collection.
pub struct Registry<S: ?Sized + 'static> {
    catalog: Catalog,
    registrations: IndexMap<String, Registration<S>>,
    context: Context,
    /// Indices into `registrations` in draw order. `None` means stale.
    draw_order: Option<Vec<usize>>,
    stats: UpdateStats,
}

impl<S: ?Sized + 'static> Registry<S> {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            registrations: IndexMap::new(),
            context: Context::default(),
            draw_order: None,
            stats: UpdateStats::default(),
        }
    }

    /// Create a registry with an initial context.
    pub fn with_context(catalog: Catalog, context: Context) -> Self {
        Self {
            context,
            ..Self::new(catalog)
        }
    }

    /// Bind `name` to `collection` under `category`, replacing any prior binding.
    ///
    /// An unknown category is accepted with a warning and resolved defensively
    /// at use time. Always invalidates the draw cache.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        collection: Collection<S>,
        category: impl Into<String>,
    ) {
        let name = name.into();
        let category = category.into();
        if !self.catalog.contains(&category) {
            tracing::warn!(%name, %category, "registering collection under unknown category");
        }
        self.registrations.insert(
            name,
            Registration {
                category,
                collection,
            },
        );
        self.draw_order = None;
    }

    /// Remove a binding. Returns its collection if the name was registered.
    pub fn unregister(&mut self, name: &str) -> Option<Collection<S>> {
        let removed = self.registrations.shift_remove(name)?;
        tracing::debug!(%name, "unregistered collection");
        self.draw_order = None;
        Some(removed.collection)
    }

    /// Replace the context wholesale.
    pub fn set_context(&mut self, context: Context) {
        tracing::debug!(entries = context.len(), "context replaced");
        self.context = context;
    }

    /// Replace the context with an empty one.
    pub fn clear_context(&mut self) {
        self.context = Context::default();
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable catalog access. Invalidates the draw cache, since layers may change.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        self.draw_order = None;
        &mut self.catalog
    }

    /// Apply layer overrides to the catalog and invalidate the draw cache.
    pub fn apply_config(&mut self, config: &CatalogConfig) -> usize {
        let touched = config.apply(self.catalog_mut());
        tracing::debug!(touched, "catalog config applied");
        touched
    }

    /// Update every entity, then prune those matching their category's removal rule.
    ///
    /// Collections are visited in registration order; each one is scanned from
    /// its last entity to its first so in-place removal neither skips nor
    /// revisits anything. Entities appended to a collection during the pass
    /// are not visited until the next pass.
    pub fn update_all(&mut self, dt: f64) {
        let _span = tracing::trace_span!("update_all", dt).entered();
        let frame_start = Instant::now();
        let mut stats = UpdateStats::default();

        for registration in self.registrations.values() {
            let Some(descriptor) = self.catalog.get(&registration.category) else {
                stats.skipped_collections += 1;
                continue;
            };
            update_collection(
                &registration.collection,
                descriptor,
                &self.context,
                dt,
                &mut stats,
            );
        }

        stats.frame_time = frame_start.elapsed();
        tracing::trace!(
            updated = stats.entities_updated,
            removed = stats.entities_removed,
            skipped = stats.skipped_collections,
            "update pass complete"
        );
        self.stats = stats;
    }

    /// Draw every entity, lower layers first.
    ///
    /// Whole collections draw together; within a collection entities draw in
    /// stored order. Rebuilds the draw order if it is stale.
    pub fn draw_all(&mut self, surface: &mut S) {
        let order = self
            .draw_order
            .get_or_insert_with(|| compute_draw_order(&self.registrations, &self.catalog));

        for &index in order.iter() {
            let Some((_, registration)) = self.registrations.get_index(index) else {
                continue;
            };
            for entity in registration.collection.borrow().iter() {
                Entity::draw(&*entity.borrow(), surface);
            }
        }
    }

    /// Every entity registered under `category`, across all matching
    /// collections in registration order. The returned `Vec` is a fresh copy
    /// of the handles; changing it does not touch any registered collection.
    pub fn get_by_category(&self, category: &str) -> Vec<EntityRef<S>> {
        let mut entities = Vec::new();
        for registration in self.registrations.values() {
            if registration.category == category {
                entities.extend(registration.collection.borrow().iter().cloned());
            }
        }
        entities
    }

    /// The collection bound to `name`.
    pub fn get_array(&self, name: &str) -> Option<&Collection<S>> {
        self.registrations.get(name).map(|r| &r.collection)
    }

    /// Category `name` was registered under.
    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.registrations.get(name).map(|r| r.category.as_str())
    }

    /// Registered names in iteration (registration) order.
    pub fn registered_names(&self) -> Vec<&str> {
        self.registrations.keys().map(String::as_str).collect()
    }

    /// Mark the draw order stale. It is rebuilt on the next draw.
    pub fn invalidate_cache(&mut self) {
        self.draw_order = None;
    }

    pub fn is_cache_valid(&self) -> bool {
        self.draw_order.is_some()
    }

    /// The order the next draw would use, as `(name, layer)` pairs.
    /// Computed fresh; does not populate the cache.
    pub fn planned_draw_order(&self) -> Vec<(&str, i32)> {
        compute_draw_order(&self.registrations, &self.catalog)
            .into_iter()
            .filter_map(|i| self.registrations.get_index(i))
            .map(|(name, r)| (name.as_str(), self.catalog.layer_of(&r.category)))
            .collect()
    }

    /// Total entities across all collections.
    pub fn entity_count(&self) -> usize {
        self.registrations
            .values()
            .map(|r| r.collection.borrow().len())
            .sum()
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Statistics from the last update pass.
    pub fn stats(&self) -> &UpdateStats {
        &self.stats
    }
}

/// Reverse scan of one collection: update, then prune in place.
fn update_collection<S: ?Sized + 'static>(
    collection: &Collection<S>,
    descriptor: &CategoryDescriptor,
    context: &Context,
    dt: f64,
    stats: &mut UpdateStats,
) {
    let mut index = collection.borrow().len();
    while index > 0 {
        index -= 1;
        // Clone the handle so the collection is not borrowed during the update.
        let Some(entity) = collection.borrow().get(index).cloned() else {
            continue;
        };

        let remove = {
            let mut guard = entity.borrow_mut();
            let args = descriptor.extra_args(AsAny::as_any(&*guard), context);
            Entity::update(&mut *guard, dt, &args);
            descriptor.should_remove(AsAny::as_any(&*guard))
        };
        stats.entities_updated += 1;

        if remove {
            let mut entities = collection.borrow_mut();
            // The update may have removed earlier entities; fall back to a search.
            let position = if entities.get(index).is_some_and(|e| Rc::ptr_eq(e, &entity)) {
                Some(index)
            } else {
                entities.iter().position(|e| Rc::ptr_eq(e, &entity))
            };
            if let Some(position) = position {
                entities.remove(position);
                stats.entities_removed += 1;
            }
        }
    }
}

/// Stable ascending sort of registration indices by layer.
fn compute_draw_order<S: ?Sized + 'static>(
    registrations: &IndexMap<String, Registration<S>>,
    catalog: &Catalog,
) -> Vec<usize> {
    let layers: Vec<i32> = registrations
        .values()
        .map(|r| catalog.layer_of(&r.category))
        .collect();
    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by_key(|&i| layers[i]);
    tracing::debug!(collections = order.len(), "draw order rebuilt");
    order
}
