pub mod backend;

/// Native backend implementations.
pub mod backends {
    /// In-memory backend without any windowing system
    pub mod headless;
}

mod native;

pub use backend::{
    NativeBackend, NativeEvent, NativeWindowId, RendererId, SharedBackend, SurfaceId, TextureId, WindowFlags,
    WindowPosition,
};
pub use native::{ClearErrorOn, NativeCheck};
