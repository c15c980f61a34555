use glam::Vec2;
use std::fmt::Write;

/// Visible tank area in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

impl Viewport {
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// Renderer-agnostic drawing interface. Entities draw through this trait only.
pub trait Surface {
    /// Draw the named sprite centred at `position`.
    fn sprite(&mut self, sprite: &str, position: Vec2);

    /// Draw a text label at `position`.
    fn label(&mut self, text: &str, position: Vec2);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Sprite { sprite: String, position: Vec2 },
    Label { text: String, position: Vec2 },
}

impl DrawOp {
    pub fn position(&self) -> Vec2 {
        match self {
            Self::Sprite { position, .. } | Self::Label { position, .. } => *position,
        }
    }
}

/// Debug text surface — workaround for a sprite renderer.
///
/// Records every draw call in order. Useful for the CLI, logging, and tests
/// that assert on draw ordering.
#[derive(Debug, Default)]
pub struct TextSurface {
    viewport: Viewport,
    ops: Vec<DrawOp>,
}

impl TextSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ops: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Draw calls since the last [`clear`](Self::clear), in call order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Sprite names in draw order.
    pub fn sprites(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Sprite { sprite, .. } => Some(sprite.as_str()),
                DrawOp::Label { .. } => None,
            })
            .collect()
    }

    /// Start a new frame.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Human-readable dump of the recorded frame.
    pub fn render_frame(&self, frame: u64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {frame} ({} draw calls, {:.0}x{:.0}) ===",
            self.ops.len(),
            self.viewport.width,
            self.viewport.height
        );
        for op in &self.ops {
            let p = op.position();
            let clip = if self.viewport.contains(p) { "" } else { " (offscreen)" };
            let _ = match op {
                DrawOp::Sprite { sprite, .. } => {
                    writeln!(out, "  sprite {sprite:<10} at ({:.1}, {:.1}){clip}", p.x, p.y)
                }
                DrawOp::Label { text, .. } => {
                    writeln!(out, "  label  {text:?} at ({:.1}, {:.1}){clip}", p.x, p.y)
                }
            };
        }
        out
    }
}

impl Surface for TextSurface {
    fn sprite(&mut self, sprite: &str, position: Vec2) {
        self.ops.push(DrawOp::Sprite {
            sprite: sprite.to_string(),
            position,
        });
    }

    fn label(&mut self, text: &str, position: Vec2) {
        self.ops.push(DrawOp::Label {
            text: text.to_string(),
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let mut surface = TextSurface::new(Viewport::default());
        surface.sprite("guppy", Vec2::new(10.0, 20.0));
        surface.label("$25", Vec2::new(5.0, 5.0));
        surface.sprite("coin", Vec2::new(30.0, 40.0));

        assert_eq!(surface.ops().len(), 3);
        assert_eq!(surface.sprites(), vec!["guppy", "coin"]);
    }

    #[test]
    fn clear_starts_new_frame() {
        let mut surface = TextSurface::default();
        surface.sprite("guppy", Vec2::ZERO);
        surface.clear();
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn render_frame_marks_offscreen() {
        let mut surface = TextSurface::new(Viewport::default());
        surface.sprite("coin", Vec2::new(100.0, 100.0));
        surface.sprite("missile", Vec2::new(100.0, -20.0));
        let out = surface.render_frame(7);

        assert!(out.contains("Frame 7"));
        assert!(out.contains("2 draw calls"));
        assert_eq!(out.matches("(offscreen)").count(), 1);
    }

    #[test]
    fn works_as_trait_object() {
        let mut surface = TextSurface::default();
        let dyn_surface: &mut dyn Surface = &mut surface;
        dyn_surface.label("hello", Vec2::ONE);
        assert!(matches!(surface.ops()[0], DrawOp::Label { .. }));
    }

    #[test]
    fn viewport_default() {
        let view = Viewport::default();
        assert_eq!(view.width, 640.0);
        assert!(view.contains(Vec2::new(0.0, 480.0)));
        assert!(!view.contains(Vec2::new(-1.0, 0.0)));
    }
}
