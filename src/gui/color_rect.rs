use crate::color::RgbaColor;
use crate::errors::GuiError;
use crate::geometry::{IVector2, Vector2};
use crate::gui::canvas::Canvas;
use crate::gui::component::{TreeContext, Widget};
use std::time::Duration;

/// Size of a [`ColorRect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RectSize {
    /// Fixed size in pixels
    Absolute(IVector2),
    /// Fraction of the viewport size, resolved once when the rectangle is set up
    Relative(Vector2),
}

/// Solid colored rectangle.
#[derive(Debug, Clone)]
pub struct ColorRect {
    size: RectSize,
    resolved: IVector2,
    color: RgbaColor,
}

impl ColorRect {
    pub fn new(size: RectSize, color: RgbaColor) -> Self {
        let resolved = match size {
            RectSize::Absolute(size) => size,
            RectSize::Relative(_) => IVector2::ZERO,
        };
        Self { size, resolved, color }
    }

    pub fn color(&self) -> RgbaColor {
        self.color
    }

    pub fn set_color(&mut self, color: RgbaColor) {
        self.color = color;
    }
}

impl Widget for ColorRect {
    fn setup(&mut self, ctx: &TreeContext) -> Result<(), GuiError> {
        if let RectSize::Relative(fraction) = self.size {
            self.resolved = (fraction * ctx.viewport_size()).rounded();
        }
        Ok(())
    }

    fn calculate(&mut self, _current: IVector2, _delta: Duration) -> IVector2 {
        self.resolved
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, _delta: Duration) -> Result<(), GuiError> {
        canvas.fill(self.color)
    }
}
