use crate::color::RgbaColor;
use crate::errors::GuiError;
use crate::geometry::{IRect2, IVector2};
use crate::render::{NativeBackend, NativeCheck, SharedBackend, SurfaceId};

const DRAW_CONTEXT: &str = "Failed to render component";

/// Drawing target handed to [`Widget::draw`](crate::gui::Widget::draw): the component's own surface.
///
/// The backend is only borrowed for the duration of each drawing call.
pub struct Canvas<'a> {
    backend: &'a SharedBackend,
    surface: SurfaceId,
    size: IVector2,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(backend: &'a SharedBackend, surface: SurfaceId, size: IVector2) -> Self {
        Self { backend, surface, size }
    }

    pub fn size(&self) -> IVector2 {
        self.size
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Fills the whole surface.
    pub fn fill(&mut self, color: RgbaColor) -> Result<(), GuiError> {
        let surface = self.surface;
        self.draw_with(|b| b.fill_rect(surface, None, color))
    }

    /// Fills `rect`, clipped to the surface.
    pub fn fill_rect(&mut self, rect: IRect2, color: RgbaColor) -> Result<(), GuiError> {
        let surface = self.surface;
        self.draw_with(|b| b.fill_rect(surface, Some(rect), color))
    }

    /// Copies another surface onto this one with its top-left corner at `at`.
    pub fn blit(&mut self, source: SurfaceId, at: IVector2) -> Result<(), GuiError> {
        let surface = self.surface;
        self.draw_with(|b| b.blit_surface(source, None, surface, Some(IRect2::from_vectors(at, IVector2::ZERO))))
    }

    fn draw_with(&mut self, f: impl FnOnce(&mut dyn NativeBackend)) -> Result<(), GuiError> {
        let mut backend = self.backend.borrow_mut();
        NativeCheck::new(DRAW_CONTEXT).run(&mut *backend, f)?;
        Ok(())
    }
}
