use crate::color::{PixelFormat, RgbaColor};
use crate::geometry::{IRect2, IVector2};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Identifier the native library uses for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeWindowId(pub u32);

impl Display for NativeWindowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "native-window#{}", self.0)
    }
}

/// Off-screen pixel surface owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Renderer bound to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub u64);

/// Texture uploaded to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

bitflags! {
    /// Window creation flags. Values follow the common native windowing conventions.
    pub struct WindowFlags: u32 {
        const FULLSCREEN    = 0x0000_0001;
        const HIDDEN        = 0x0000_0008;
        const BORDERLESS    = 0x0000_0010;
        const RESIZABLE     = 0x0000_0020;
        const MINIMIZED     = 0x0000_0040;
        const MAXIMIZED     = 0x0000_0080;
        const ALLOW_HIGHDPI = 0x0000_2000;
        const ALWAYS_ON_TOP = 0x0000_8000;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        WindowFlags::RESIZABLE
    }
}

/// Where a new window is placed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowPosition {
    #[default]
    Centered,
    /// Let the windowing system decide
    Undefined,
    At(IVector2),
}

/// Input event reported by the native library.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// The user asked the whole application to quit
    Quit,
    /// The close button of a window was pressed
    WindowClose { window: NativeWindowId },
    /// A window changed size
    WindowResized { window: NativeWindowId, width: i32, height: i32 },
    /// Anything the toolkit does not handle
    Other(String),
}

impl NativeEvent {
    /// Window affected by this event, if any.
    pub fn window(&self) -> Option<NativeWindowId> {
        match self {
            NativeEvent::WindowClose { window } | NativeEvent::WindowResized { window, .. } => Some(*window),
            NativeEvent::Quit | NativeEvent::Other(_) => None,
        }
    }
}

/// The narrow interface to the native windowing/2D library.
///
/// Calls that can fail return `None` (or silently do nothing) and leave a
/// pending error that is read with [`last_error`](NativeBackend::last_error).
/// Callers wrap calls in a [`NativeCheck`](crate::render::NativeCheck) which
/// turns pending errors into [`NativeError`](crate::errors::NativeError)s.
pub trait NativeBackend {
    /// Human readable backend name, used in logs.
    fn name(&self) -> &str;

    fn create_window(
        &mut self,
        title: &str,
        position: WindowPosition,
        size: IVector2,
        flags: WindowFlags,
    ) -> Option<NativeWindowId>;
    fn destroy_window(&mut self, window: NativeWindowId);
    fn show_window(&mut self, window: NativeWindowId);
    fn hide_window(&mut self, window: NativeWindowId);

    fn create_renderer(&mut self, window: NativeWindowId) -> Option<RendererId>;
    fn destroy_renderer(&mut self, renderer: RendererId);

    /// Allocate an off-screen surface of `size` pixels.
    fn create_surface(&mut self, size: IVector2, format: PixelFormat) -> Option<SurfaceId>;
    fn destroy_surface(&mut self, surface: SurfaceId);
    /// Fill `rect` (or the whole surface when `None`) with `color`.
    fn fill_rect(&mut self, surface: SurfaceId, rect: Option<IRect2>, color: RgbaColor);
    /// Copy `src_rect` of `src` (whole surface when `None`) to the position of `dst_rect` in `dst`.
    fn blit_surface(&mut self, src: SurfaceId, src_rect: Option<IRect2>, dst: SurfaceId, dst_rect: Option<IRect2>);

    fn create_texture_from_surface(&mut self, renderer: RendererId, surface: SurfaceId) -> Option<TextureId>;
    fn destroy_texture(&mut self, texture: TextureId);
    fn clear(&mut self, renderer: RendererId);
    fn copy(&mut self, renderer: RendererId, texture: TextureId);
    fn present(&mut self, renderer: RendererId);

    /// Next pending input event, if any. Never blocks.
    fn poll_event(&mut self) -> Option<NativeEvent>;

    /// Pending native error message, if any.
    fn last_error(&self) -> Option<String>;
    fn clear_error(&mut self);

    /// Shut down the native subsystem. Called once when the app is torn down.
    fn shutdown(&mut self) {}
}

/// Backend handle shared by the app, its windows and their components.
pub type SharedBackend = Rc<RefCell<dyn NativeBackend>>;
