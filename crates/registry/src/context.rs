//! Caller-supplied collaborator data and the extra update arguments built from it.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Named collaborator data owned by the game loop: shared collections,
/// counters, accessors. Values are type-erased; readers ask for the type
/// they expect and get `None` on a missing key or a type mismatch.
///
/// The registry holds only the latest context and never validates its shape.
#[derive(Clone, Default)]
pub struct Context {
    values: BTreeMap<String, Rc<dyn Any>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Context::insert`].
    pub fn with<T: Any>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Store `value` under `name`, replacing any previous value.
    pub fn insert<T: Any>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Rc::new(value));
    }

    /// Store an already shared value under `name`.
    pub fn insert_shared(&mut self, name: impl Into<String>, value: Rc<dyn Any>) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn Any>> {
        self.values.remove(name)
    }

    /// Typed read of a value.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// The shared value itself, for forwarding into [`UpdateArgs`].
    pub fn shared(&self, name: &str) -> Option<Rc<dyn Any>> {
        self.values.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Extra arguments passed to [`Entity::update`](crate::Entity::update) after `dt`.
///
/// Positional, type-erased. Empty for categories that declare no provider.
#[derive(Clone, Default)]
pub struct UpdateArgs {
    values: Vec<Rc<dyn Any>>,
}

impl UpdateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an owned value.
    pub fn with<T: Any>(mut self, value: T) -> Self {
        self.values.push(Rc::new(value));
        self
    }

    /// Append a shared value, typically taken from [`Context::shared`].
    /// `None` is skipped so providers can forward optional context entries.
    pub fn with_shared(mut self, value: Option<Rc<dyn Any>>) -> Self {
        if let Some(v) = value {
            self.values.push(v);
        }
        self
    }

    /// Typed read of the argument at `index`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index).and_then(|v| v.downcast_ref::<T>())
    }

    /// First argument of type `T`, wherever it sits.
    pub fn find<T: Any>(&self) -> Option<&T> {
        self.values.iter().find_map(|v| v.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for UpdateArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateArgs")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn typed_get() {
        let ctx = Context::new().with("coins_collected", 12u32);
        assert_eq!(ctx.get::<u32>("coins_collected"), Some(&12));
        assert!(ctx.get::<i64>("coins_collected").is_none());
        assert!(ctx.get::<u32>("missing").is_none());
    }

    #[test]
    fn insert_replaces() {
        let mut ctx = Context::new();
        ctx.insert("level", 1u8);
        ctx.insert("level", 2u8);
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get::<u8>("level"), Some(&2));
    }

    #[test]
    fn shared_values_alias() {
        let missiles = Rc::new(RefCell::new(vec![1, 2, 3]));
        let mut ctx = Context::new();
        ctx.insert("missiles", missiles.clone());

        missiles.borrow_mut().push(4);
        let seen = ctx.get::<Rc<RefCell<Vec<i32>>>>("missiles").unwrap();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn update_args_forward_context() {
        let ctx = Context::new().with("gravity", 9.8f64);
        let args = UpdateArgs::new()
            .with_shared(ctx.shared("gravity"))
            .with_shared(ctx.shared("absent"))
            .with("tag");
        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<f64>(0), Some(&9.8));
        assert_eq!(args.find::<&str>(), Some(&"tag"));
    }

    #[test]
    fn empty_args() {
        let args = UpdateArgs::new();
        assert!(args.is_empty());
        assert!(args.get::<u8>(0).is_none());
    }

    #[test]
    fn debug_lists_names() {
        let ctx = Context::new().with("a", 1).with("b", 2);
        let s = format!("{ctx:?}");
        assert!(s.contains("\"a\"") && s.contains("\"b\""));
    }
}
