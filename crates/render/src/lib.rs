//! Rendering Adapter: the surface entities draw onto.
//!
//! # Invariants
//! - Drawing records output only; it never feeds back into simulation state.
//!
//! # Workaround
//! Provides a trait-based surface with a text backend that records draw calls
//! in place of a sprite renderer. The trait is stable; a canvas or GPU surface
//! can replace it without touching entities.

mod surface;

pub use surface::{DrawOp, Surface, TextSurface, Viewport};

pub fn crate_info() -> &'static str {
    "aquaria-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
