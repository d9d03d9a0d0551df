//! Headless backend.
//!
//! Keeps every native resource in memory: surfaces hold real pixels so
//! fills and blits can be inspected, windows remember whether they are
//! shown and what was last presented to them, and input events are fed
//! through [`HeadlessBackend::push_event`]. Failures of individual
//! operations can be injected with [`HeadlessBackend::fail_next`].

use crate::color::{PixelFormat, RgbaColor};
use crate::geometry::{IRect2, IVector2};
use crate::render::backend::{
    NativeBackend, NativeEvent, NativeWindowId, RendererId, SurfaceId, TextureId, WindowFlags, WindowPosition,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Operations that can be made to fail with [`HeadlessBackend::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadlessOp {
    CreateWindow,
    CreateRenderer,
    CreateSurface,
    FillRect,
    BlitSurface,
    CreateTexture,
    Present,
    PollEvent,
}

/// Largest surface width or height. Keeps pixel indices within `i32`.
pub const MAX_SURFACE_SIDE: i32 = 16384;

/// Snapshot of pixels, as uploaded to a texture or presented to a window.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub size: IVector2,
    pub format: PixelFormat,
    pub pixels: Vec<u32>,
}

impl Frame {
    fn blank(size: IVector2, format: PixelFormat) -> Self {
        Self {
            size,
            format,
            pixels: vec![0; size.x.max(0) as usize * size.y.max(0) as usize],
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<RgbaColor> {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return None;
        }
        Some(self.format.unpack(self.pixels[(y * self.size.x + x) as usize]))
    }
}

#[derive(Clone, Debug)]
pub struct HeadlessWindow {
    pub title: String,
    pub position: WindowPosition,
    pub size: IVector2,
    pub flags: WindowFlags,
    pub shown: bool,
    pub frames_presented: usize,
    pub last_frame: Option<Frame>,
}

struct HeadlessRenderer {
    window: NativeWindowId,
    target: Option<Frame>,
}

struct HeadlessTexture {
    renderer: RendererId,
    frame: Frame,
}

pub struct HeadlessBackend {
    next_window: u32,
    next_id: u64,
    windows: HashMap<NativeWindowId, HeadlessWindow>,
    destroyed_windows: HashSet<NativeWindowId>,
    renderers: HashMap<RendererId, HeadlessRenderer>,
    surfaces: HashMap<SurfaceId, Frame>,
    textures: HashMap<TextureId, HeadlessTexture>,
    events: VecDeque<NativeEvent>,
    error: Option<String>,
    failures: HashMap<HeadlessOp, String>,
    shut_down: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            next_window: 1,
            next_id: 1,
            windows: HashMap::new(),
            destroyed_windows: HashSet::new(),
            renderers: HashMap::new(),
            surfaces: HashMap::new(),
            textures: HashMap::new(),
            events: VecDeque::new(),
            error: None,
            failures: HashMap::new(),
            shut_down: false,
        }
    }

    /// Queue an input event for [`poll_event`](NativeBackend::poll_event).
    pub fn push_event(&mut self, event: NativeEvent) {
        self.events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Make the next call of `op` fail with `message`.
    pub fn fail_next(&mut self, op: HeadlessOp, message: impl Into<String>) {
        self.failures.insert(op, message.into());
    }

    /// Leave a pending error, as a failed native call would.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn window(&self, id: NativeWindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&id)
    }

    pub fn window_ids(&self) -> Vec<NativeWindowId> {
        let mut ids: Vec<_> = self.windows.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn was_destroyed(&self, id: NativeWindowId) -> bool {
        self.destroyed_windows.contains(&id)
    }

    pub fn live_renderers(&self) -> usize {
        self.renderers.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn surface_size(&self, id: SurfaceId) -> Option<IVector2> {
        self.surfaces.get(&id).map(|s| s.size)
    }

    pub fn pixel(&self, id: SurfaceId, x: i32, y: i32) -> Option<RgbaColor> {
        self.surfaces.get(&id)?.pixel(x, y)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn injected_failure(&mut self, op: HeadlessOp) -> bool {
        match self.failures.remove(&op) {
            Some(message) => {
                self.error = Some(message);
                true
            }
            None => false,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl NativeBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "HeadlessBackend"
    }

    fn create_window(
        &mut self,
        title: &str,
        position: WindowPosition,
        size: IVector2,
        flags: WindowFlags,
    ) -> Option<NativeWindowId> {
        if self.injected_failure(HeadlessOp::CreateWindow) {
            return None;
        }
        if size.x <= 0 || size.y <= 0 {
            self.set_error("Window size must be positive");
            return None;
        }

        let id = NativeWindowId(self.next_window);
        self.next_window += 1;
        self.windows.insert(
            id,
            HeadlessWindow {
                title: title.to_string(),
                position,
                size,
                flags,
                shown: !flags.contains(WindowFlags::HIDDEN),
                frames_presented: 0,
                last_frame: None,
            },
        );
        Some(id)
    }

    fn destroy_window(&mut self, window: NativeWindowId) {
        if self.windows.remove(&window).is_none() {
            self.set_error("Invalid window");
            return;
        }
        self.destroyed_windows.insert(window);
    }

    fn show_window(&mut self, window: NativeWindowId) {
        match self.windows.get_mut(&window) {
            Some(w) => w.shown = true,
            None => self.set_error("Invalid window"),
        }
    }

    fn hide_window(&mut self, window: NativeWindowId) {
        match self.windows.get_mut(&window) {
            Some(w) => w.shown = false,
            None => self.set_error("Invalid window"),
        }
    }

    fn create_renderer(&mut self, window: NativeWindowId) -> Option<RendererId> {
        if self.injected_failure(HeadlessOp::CreateRenderer) {
            return None;
        }
        if !self.windows.contains_key(&window) {
            self.set_error("Invalid window");
            return None;
        }
        if self.renderers.values().any(|r| r.window == window) {
            self.set_error("Renderer already associated with window");
            return None;
        }

        let id = RendererId(self.next_id());
        self.renderers.insert(id, HeadlessRenderer { window, target: None });
        Some(id)
    }

    fn destroy_renderer(&mut self, renderer: RendererId) {
        if self.renderers.remove(&renderer).is_none() {
            self.set_error("Invalid renderer");
            return;
        }
        self.textures.retain(|_, t| t.renderer != renderer);
    }

    fn create_surface(&mut self, size: IVector2, format: PixelFormat) -> Option<SurfaceId> {
        if self.injected_failure(HeadlessOp::CreateSurface) {
            return None;
        }
        if !size.is_non_negative() {
            self.set_error("Surface size must not be negative");
            return None;
        }
        if size.x > MAX_SURFACE_SIDE || size.y > MAX_SURFACE_SIDE {
            self.set_error(format!("Surface size {size} exceeds {MAX_SURFACE_SIDE} pixels per side"));
            return None;
        }

        let id = SurfaceId(self.next_id());
        self.surfaces.insert(id, Frame::blank(size, format));
        Some(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.surfaces.remove(&surface).is_none() {
            self.set_error("Invalid surface");
        }
    }

    fn fill_rect(&mut self, surface: SurfaceId, rect: Option<IRect2>, color: RgbaColor) {
        if self.injected_failure(HeadlessOp::FillRect) {
            return;
        }
        let Some(target) = self.surfaces.get_mut(&surface) else {
            self.set_error("Invalid surface");
            return;
        };

        let bounds = IRect2::from_vectors(IVector2::ZERO, target.size);
        let area = match rect {
            Some(r) => match r.intersect(&bounds) {
                Some(area) => area,
                None => return,
            },
            None => bounds,
        };

        let px = target.format.pack(color);
        for y in area.y..area.y + area.h {
            for x in area.x..area.x + area.w {
                let idx = (y * target.size.x + x) as usize;
                target.pixels[idx] = px;
            }
        }
    }

    fn blit_surface(&mut self, src: SurfaceId, src_rect: Option<IRect2>, dst: SurfaceId, dst_rect: Option<IRect2>) {
        if self.injected_failure(HeadlessOp::BlitSurface) {
            return;
        }
        let Some(source) = self.surfaces.get(&src) else {
            self.set_error("Invalid source surface");
            return;
        };

        let src_bounds = IRect2::from_vectors(IVector2::ZERO, source.size);
        let area = match src_rect.unwrap_or(src_bounds).intersect(&src_bounds) {
            Some(area) => area,
            None => return,
        };

        // Copy the region out first so src and dst may be the same surface.
        let mut region = Vec::with_capacity((area.w * area.h) as usize);
        for y in area.y..area.y + area.h {
            for x in area.x..area.x + area.w {
                region.push(source.pixels[(y * source.size.x + x) as usize]);
            }
        }

        let Some(target) = self.surfaces.get_mut(&dst) else {
            self.set_error("Invalid destination surface");
            return;
        };

        let origin = dst_rect.map(|r| r.position()).unwrap_or(IVector2::ZERO);
        for dy in 0..area.h {
            for dx in 0..area.w {
                let (x, y) = (origin.x + dx, origin.y + dy);
                if x < 0 || y < 0 || x >= target.size.x || y >= target.size.y {
                    continue;
                }
                target.pixels[(y * target.size.x + x) as usize] = region[(dy * area.w + dx) as usize];
            }
        }
    }

    fn create_texture_from_surface(&mut self, renderer: RendererId, surface: SurfaceId) -> Option<TextureId> {
        if self.injected_failure(HeadlessOp::CreateTexture) {
            return None;
        }
        if !self.renderers.contains_key(&renderer) {
            self.set_error("Invalid renderer");
            return None;
        }
        let Some(frame) = self.surfaces.get(&surface).cloned() else {
            self.set_error("Invalid surface");
            return None;
        };

        let id = TextureId(self.next_id());
        self.textures.insert(id, HeadlessTexture { renderer, frame });
        Some(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            self.set_error("Invalid texture");
        }
    }

    fn clear(&mut self, renderer: RendererId) {
        match self.renderers.get_mut(&renderer) {
            Some(r) => r.target = None,
            None => self.set_error("Invalid renderer"),
        }
    }

    fn copy(&mut self, renderer: RendererId, texture: TextureId) {
        let Some(frame) = self.textures.get(&texture).map(|t| t.frame.clone()) else {
            self.set_error("Invalid texture");
            return;
        };
        match self.renderers.get_mut(&renderer) {
            Some(r) => r.target = Some(frame),
            None => self.set_error("Invalid renderer"),
        }
    }

    fn present(&mut self, renderer: RendererId) {
        if self.injected_failure(HeadlessOp::Present) {
            return;
        }
        let Some(r) = self.renderers.get(&renderer) else {
            self.set_error("Invalid renderer");
            return;
        };

        let window_id = r.window;
        let target = r.target.clone();
        match self.windows.get_mut(&window_id) {
            Some(window) => {
                window.frames_presented += 1;
                window.last_frame = target;
            }
            None => self.set_error("Invalid window"),
        }
    }

    fn poll_event(&mut self) -> Option<NativeEvent> {
        if self.injected_failure(HeadlessOp::PollEvent) {
            return None;
        }
        self.events.pop_front()
    }

    fn last_error(&self) -> Option<String> {
        self.error.clone()
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}
