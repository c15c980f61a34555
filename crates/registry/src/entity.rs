//! The capability contract every registered object satisfies.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::context::UpdateArgs;

/// Downcasting support so category rules can inspect concrete entity state.
///
/// Blanket-implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Anything the registry can schedule: an update step and a draw step.
///
/// `S` is the drawing surface. Entities do not share a base type; fish, coins
/// and particles only need these two operations.
pub trait Entity<S: ?Sized + 'static>: AsAny {
    /// Advance by `dt` seconds. `args` carries category-specific collaborator
    /// data and is empty for categories without an extra-argument provider.
    ///
    /// The entity is mutably borrowed for the whole call, so its own handle
    /// is not readable through shared collections while it updates:
    /// [`with_entity`] and [`with_entity_mut`] yield `None` for it.
    fn update(&mut self, dt: f64, args: &UpdateArgs);

    /// Draw onto `surface`. Must not mutate the entity.
    fn draw(&self, surface: &mut S);
}

/// Shared handle to one entity.
pub type EntityRef<S> = Rc<RefCell<dyn Entity<S>>>;

/// A registered, ordered, mutable entity sequence.
///
/// The caller keeps its own handle; the same collection may also be placed in
/// the [`Context`](crate::Context) for other categories to read.
pub type Collection<S> = Rc<RefCell<Vec<EntityRef<S>>>>;

/// Wrap a concrete entity in a shared handle.
pub fn entity_ref<S, E>(entity: E) -> EntityRef<S>
where
    S: ?Sized + 'static,
    E: Entity<S>,
{
    Rc::new(RefCell::new(entity))
}

/// Build a collection from entity handles.
pub fn collection<S: ?Sized + 'static>(entities: impl IntoIterator<Item = EntityRef<S>>) -> Collection<S> {
    Rc::new(RefCell::new(entities.into_iter().collect()))
}

/// Borrow an entity as its concrete type `E`. `None` if it is something else
/// or is already mutably borrowed (e.g. it is the entity being updated).
pub fn with_entity<S, E, R>(entity: &EntityRef<S>, f: impl FnOnce(&E) -> R) -> Option<R>
where
    S: ?Sized + 'static,
    E: Any,
{
    let guard = entity.try_borrow().ok()?;
    AsAny::as_any(&*guard).downcast_ref::<E>().map(f)
}

/// Mutably borrow an entity as its concrete type `E`. `None` if it is something
/// else or is already borrowed.
pub fn with_entity_mut<S, E, R>(entity: &EntityRef<S>, f: impl FnOnce(&mut E) -> R) -> Option<R>
where
    S: ?Sized + 'static,
    E: Any,
{
    let mut guard = entity.try_borrow_mut().ok()?;
    AsAny::as_any_mut(&mut *guard).downcast_mut::<E>().map(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bubble {
        rise: f64,
    }

    impl Entity<Vec<String>> for Bubble {
        fn update(&mut self, dt: f64, _args: &UpdateArgs) {
            self.rise += dt;
        }

        fn draw(&self, surface: &mut Vec<String>) {
            surface.push(format!("bubble@{:.1}", self.rise));
        }
    }

    struct Pebble;

    impl Entity<Vec<String>> for Pebble {
        fn update(&mut self, _dt: f64, _args: &UpdateArgs) {}

        fn draw(&self, surface: &mut Vec<String>) {
            surface.push("pebble".into());
        }
    }

    #[test]
    fn downcast_matching_type() {
        let e: EntityRef<Vec<String>> = entity_ref(Bubble { rise: 1.5 });
        assert_eq!(with_entity(&e, |b: &Bubble| b.rise), Some(1.5));
    }

    #[test]
    fn downcast_other_type_is_none() {
        let e: EntityRef<Vec<String>> = entity_ref(Pebble);
        assert!(with_entity(&e, |b: &Bubble| b.rise).is_none());
    }

    #[test]
    fn mutate_through_handle() {
        let e: EntityRef<Vec<String>> = entity_ref(Bubble { rise: 0.0 });
        with_entity_mut(&e, |b: &mut Bubble| b.rise = 3.0);
        e.borrow_mut().update(0.5, &UpdateArgs::new());

        let mut surface = Vec::new();
        e.borrow().draw(&mut surface);
        assert_eq!(surface, vec!["bubble@3.5".to_string()]);
    }

    #[test]
    fn borrowed_entity_reads_as_none() {
        let e: EntityRef<Vec<String>> = entity_ref(Bubble { rise: 1.0 });
        let _held = e.borrow_mut();
        assert!(with_entity(&e, |b: &Bubble| b.rise).is_none());
        assert!(with_entity_mut(&e, |b: &mut Bubble| b.rise = 2.0).is_none());
    }

    #[test]
    fn collection_preserves_order() {
        let c: Collection<Vec<String>> =
            collection([entity_ref(Pebble), entity_ref(Bubble { rise: 0.0 })]);
        let mut surface = Vec::new();
        for e in c.borrow().iter() {
            e.borrow().draw(&mut surface);
        }
        assert_eq!(surface, vec!["pebble".to_string(), "bubble@0.0".to_string()]);
    }
}
