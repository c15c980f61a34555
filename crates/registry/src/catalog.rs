//! Category descriptors: removal rules, draw layers, extra-argument providers.
//!
//! The catalog is data. Adding a category is one `insert`, never a new branch
//! in the scheduler.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::context::{Context, UpdateArgs};

/// Layer used for collections whose category is not in the catalog.
pub const DEFAULT_LAYER: i32 = 0;

/// Decides, after an update, whether an entity is pruned from its collection.
pub type RemovalPredicate = Rc<dyn Fn(&dyn Any) -> bool>;

/// Builds the extra update arguments for one entity from the current context.
pub type ExtraArgsProvider = Rc<dyn Fn(&dyn Any, &Context) -> UpdateArgs>;

/// Per-category rules shared by every collection registered under that category.
#[derive(Clone, Default)]
pub struct CategoryDescriptor {
    /// Draw rank. Lower layers draw first (background).
    pub layer: i32,
    removal: Option<RemovalPredicate>,
    extra_args: Option<ExtraArgsProvider>,
}

impl CategoryDescriptor {
    /// A descriptor with no removal rule and no extra arguments.
    pub fn new(layer: i32) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    /// Prune entities of concrete type `E` for which `predicate` holds.
    /// Entities of any other type are never pruned by this rule.
    pub fn remove_when<E: Any>(mut self, predicate: impl Fn(&E) -> bool + 'static) -> Self {
        self.removal = Some(Rc::new(move |entity: &dyn Any| {
            entity.downcast_ref::<E>().is_some_and(&predicate)
        }));
        self
    }

    /// Untyped form of [`remove_when`](Self::remove_when).
    pub fn remove_when_any(mut self, predicate: impl Fn(&dyn Any) -> bool + 'static) -> Self {
        self.removal = Some(Rc::new(predicate));
        self
    }

    /// Supply extra update arguments to entities of concrete type `E`.
    /// Entities of any other type get no extra arguments.
    pub fn with_extra_args<E: Any>(
        mut self,
        provider: impl Fn(&E, &Context) -> UpdateArgs + 'static,
    ) -> Self {
        self.extra_args = Some(Rc::new(move |entity: &dyn Any, ctx: &Context| {
            entity
                .downcast_ref::<E>()
                .map(|e| provider(e, ctx))
                .unwrap_or_default()
        }));
        self
    }

    pub fn has_removal_rule(&self) -> bool {
        self.removal.is_some()
    }

    pub fn has_extra_args(&self) -> bool {
        self.extra_args.is_some()
    }

    /// Evaluate the removal rule. No rule means "never remove".
    pub fn should_remove(&self, entity: &dyn Any) -> bool {
        self.removal.as_ref().is_some_and(|p| p(entity))
    }

    /// Evaluate the extra-argument provider. No provider means no arguments.
    pub fn extra_args(&self, entity: &dyn Any, ctx: &Context) -> UpdateArgs {
        self.extra_args
            .as_ref()
            .map(|p| p(entity, ctx))
            .unwrap_or_default()
    }
}

impl fmt::Debug for CategoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryDescriptor")
            .field("layer", &self.layer)
            .field("removal", &self.has_removal_rule())
            .field("extra_args", &self.has_extra_args())
            .finish()
    }
}

/// Category name → descriptor.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<String, CategoryDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Catalog::insert`].
    pub fn with(mut self, name: impl Into<String>, descriptor: CategoryDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Add or replace a category. Returns the previous descriptor, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: CategoryDescriptor,
    ) -> Option<CategoryDescriptor> {
        self.categories.insert(name.into(), descriptor)
    }

    pub fn remove(&mut self, name: &str) -> Option<CategoryDescriptor> {
        self.categories.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&CategoryDescriptor> {
        self.categories.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CategoryDescriptor> {
        self.categories.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Layer of a category, [`DEFAULT_LAYER`] if unknown.
    pub fn layer_of(&self, name: &str) -> i32 {
        self.categories.get(name).map_or(DEFAULT_LAYER, |d| d.layer)
    }

    /// Change the layer of a known category. Returns false if unknown.
    pub fn set_layer(&mut self, name: &str, layer: i32) -> bool {
        match self.categories.get_mut(name) {
            Some(d) => {
                d.layer = layer;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryDescriptor)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Coin {
        collected: bool,
    }

    struct Alien {
        hp: i32,
    }

    #[test]
    fn no_rule_never_removes() {
        let d = CategoryDescriptor::new(1);
        assert!(!d.has_removal_rule());
        assert!(!d.should_remove(&Coin { collected: true }));
    }

    #[test]
    fn typed_rule_applies_to_its_type_only() {
        let d = CategoryDescriptor::new(3).remove_when(|c: &Coin| c.collected);
        assert!(d.should_remove(&Coin { collected: true }));
        assert!(!d.should_remove(&Coin { collected: false }));
        assert!(!d.should_remove(&Alien { hp: 0 }));
    }

    #[test]
    fn untyped_rule() {
        let d = CategoryDescriptor::new(0).remove_when_any(|_| true);
        assert!(d.should_remove(&Alien { hp: 5 }));
    }

    #[test]
    fn extra_args_from_context() {
        let d = CategoryDescriptor::new(4).with_extra_args(|a: &Alien, ctx| {
            UpdateArgs::new().with(a.hp).with_shared(ctx.shared("missiles"))
        });
        let ctx = Context::new().with("missiles", vec![1u8, 2]);

        let args = d.extra_args(&Alien { hp: 7 }, &ctx);
        assert_eq!(args.get::<i32>(0), Some(&7));
        assert_eq!(args.get::<Vec<u8>>(1).map(Vec::len), Some(2));

        // Incomplete context: provider degrades, core does not fail.
        let args = d.extra_args(&Alien { hp: 7 }, &Context::new());
        assert_eq!(args.len(), 1);

        // Wrong entity type: nothing.
        assert!(d.extra_args(&Coin { collected: false }, &ctx).is_empty());
    }

    #[test]
    fn no_provider_means_no_args() {
        let d = CategoryDescriptor::new(2);
        assert!(d.extra_args(&Coin { collected: false }, &Context::new()).is_empty());
    }

    #[test]
    fn layer_lookup_defaults() {
        let catalog = Catalog::new()
            .with("fish", CategoryDescriptor::new(2))
            .with("coin", CategoryDescriptor::new(3));
        assert_eq!(catalog.layer_of("coin"), 3);
        assert_eq!(catalog.layer_of("kraken"), DEFAULT_LAYER);
    }

    #[test]
    fn set_layer_known_and_unknown() {
        let mut catalog = Catalog::new().with("pet", CategoryDescriptor::new(1));
        assert!(catalog.set_layer("pet", 9));
        assert_eq!(catalog.layer_of("pet"), 9);
        assert!(!catalog.set_layer("ghost", 1));
        assert!(!catalog.contains("ghost"));
    }

    #[test]
    fn insert_replaces_descriptor() {
        let mut catalog = Catalog::new().with("fish", CategoryDescriptor::new(2));
        let old = catalog.insert("fish", CategoryDescriptor::new(5));
        assert_eq!(old.map(|d| d.layer), Some(2));
        assert_eq!(catalog.len(), 1);
    }
}
