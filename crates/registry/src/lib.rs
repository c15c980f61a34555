//! Entity Registry & Scheduler: named entity collections, per-frame update and layered draw.
//!
//! # Invariants
//! - Each collection is scanned from its last entity to its first during update,
//!   so in-place removal never skips or revisits an entity.
//! - Draw order is ascending by category layer, stable in registration order.
//! - The draw cache is either stale or equal to a fresh recomputation.
//! - Unknown categories never fail: inert for update, layer 0 for draw.

pub mod catalog;
pub mod config;
pub mod context;
pub mod entity;
pub mod registry;

pub use catalog::{Catalog, CategoryDescriptor, DEFAULT_LAYER};
pub use config::{CatalogConfig, ConfigError};
pub use context::{Context, UpdateArgs};
pub use entity::{AsAny, Collection, Entity, EntityRef, collection, entity_ref, with_entity, with_entity_mut};
pub use registry::{Registry, UpdateStats};

pub fn crate_info() -> &'static str {
    "aquaria-registry v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("registry"));
    }
}
