//! Native windows.
//!
//! A [`Window`] owns a native window, a renderer bound to it, its own event
//! queue and the [`Viewport`] whose surface it presents. It is wired to the
//! app queue through three listeners:
//!
//! * `app.render`: tick the window queue, fire `render` on it and present the viewport
//! * `app.window_close` for this window: hide, announce `window.destroy` on the app queue, destroy
//! * `app.window_resized` for this window: resize the viewport

mod config;

pub use config::{WindowConfig, WindowConfigBuilder};

use crate::config::QueueConfig;
use crate::errors::GuiError;
use crate::events::{EventKind, EventOrigin, EventPayload, EventQueue, ListenerHandle, ListenerOptions, Subscriber};
use crate::geometry::IVector2;
use crate::gui::Component;
use crate::render::{NativeCheck, NativeWindowId, RendererId, SharedBackend, WindowFlags};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};
use std::rc::{Rc, Weak};
use std::time::Duration;
use uuid::Uuid;

/// A unique identifier for a window, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(Uuid);

impl WindowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WindowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct WindowInner {
    id: WindowId,
    title: String,
    native: NativeWindowId,
    renderer: RendererId,
    backend: SharedBackend,
    /// Window-local queue
    events: EventQueue,
    app_events: EventQueue,
    viewport: Viewport,
    app_listeners: RefCell<Vec<ListenerHandle>>,
    shown: Cell<bool>,
    destroyed: Cell<bool>,
}

/// Handle to a window. Clones refer to the same window.
#[derive(Clone)]
pub struct Window {
    inner: Rc<WindowInner>,
}

impl Window {
    /// Creates the native window, its renderer, queue and viewport, and connects it to `app_events`.
    pub(crate) fn open(
        app_events: &EventQueue,
        backend: SharedBackend,
        queue: QueueConfig,
        default_title: &str,
        config: WindowConfig,
    ) -> Result<Window, GuiError> {
        config.validate()?;
        let id = WindowId::new();
        let title = config.title.clone().unwrap_or_else(|| default_title.to_string());

        let (native, renderer) = {
            let mut b = backend.borrow_mut();
            let native = NativeCheck::new("Failed to create window")
                .run_required(&mut *b, |b| b.create_window(&title, config.position, config.size, config.flags))?;
            let renderer = NativeCheck::new("Failed to create renderer")
                .run_required(&mut *b, |b| b.create_renderer(native));
            match renderer {
                Ok(renderer) => (native, renderer),
                Err(e) => {
                    b.destroy_window(native);
                    b.clear_error();
                    return Err(e.into());
                }
            }
        };

        let events = EventQueue::new(format!("window {id}"), queue);
        let viewport = match Viewport::new(&events, backend.clone(), config.size, config.viewport) {
            Ok(viewport) => viewport,
            Err(e) => {
                let mut b = backend.borrow_mut();
                b.destroy_renderer(renderer);
                b.destroy_window(native);
                b.clear_error();
                return Err(e);
            }
        };

        let window = Window {
            inner: Rc::new(WindowInner {
                id,
                title,
                native,
                renderer,
                backend,
                events,
                app_events: app_events.clone(),
                viewport,
                app_listeners: RefCell::new(Vec::new()),
                shown: Cell::new(!config.flags.contains(WindowFlags::HIDDEN)),
                destroyed: Cell::new(false),
            }),
        };

        if let Err(e) = window.connect_app_listeners() {
            if let Err(cleanup) = window.destroy() {
                log::warn!("failed to clean up window {id}: {cleanup}");
            }
            return Err(e);
        }

        log::debug!("window {} opened as {} ({})", id, native, window.inner.title);
        Ok(window)
    }

    fn connect_app_listeners(&self) -> Result<(), GuiError> {
        let inner = &self.inner;
        let subscriber = Subscriber::Window(inner.id);
        let native = inner.native;

        let weak = Rc::downgrade(inner);
        let render = inner.app_events.connect(
            subscriber.clone(),
            EventKind::AppRender,
            ListenerOptions::new(),
            move |event| match upgrade(&weak) {
                Some(window) => window.render(event.delta().unwrap_or_default()),
                None => Ok(()),
            },
        )?;
        inner.app_listeners.borrow_mut().push(render);

        let weak = Rc::downgrade(inner);
        let close = inner.app_events.connect(
            subscriber.clone(),
            EventKind::AppWindowClose,
            ListenerOptions::new().filter(move |e| e.native_window() == Some(native)),
            move |_| match upgrade(&weak) {
                Some(window) => window.close(),
                None => Ok(()),
            },
        )?;
        inner.app_listeners.borrow_mut().push(close);

        let weak = Rc::downgrade(inner);
        let resized = inner.app_events.connect(
            subscriber,
            EventKind::AppWindowResized,
            ListenerOptions::new().filter(move |e| e.native_window() == Some(native)),
            move |event| {
                let (Some(window), EventPayload::AppWindowResized { size, .. }) = (upgrade(&weak), event.payload())
                else {
                    return Ok(());
                };
                window.inner.viewport.resize(*size)
            },
        )?;
        inner.app_listeners.borrow_mut().push(resized);
        Ok(())
    }

    pub fn id(&self) -> WindowId {
        self.inner.id
    }

    pub fn native_id(&self) -> NativeWindowId {
        self.inner.native
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    /// The window-local event queue.
    pub fn events(&self) -> &EventQueue {
        &self.inner.events
    }

    pub fn viewport(&self) -> &Viewport {
        &self.inner.viewport
    }

    pub fn size(&self) -> IVector2 {
        self.inner.viewport.size()
    }

    /// Adds `component` to the viewport.
    pub fn add(&self, component: &Component) -> Result<(), GuiError> {
        self.inner.viewport.add(component)
    }

    pub fn is_shown(&self) -> bool {
        self.inner.shown.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// True when both handles refer to the same window.
    pub fn ptr_eq(&self, other: &Window) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn check_alive(&self) -> Result<(), GuiError> {
        if self.is_destroyed() {
            return Err(GuiError::WindowDestroyed(self.inner.id));
        }
        Ok(())
    }

    pub fn show(&self) -> Result<(), GuiError> {
        self.check_alive()?;
        let native = self.inner.native;
        let mut backend = self.inner.backend.borrow_mut();
        NativeCheck::new("Failed to show window").run(&mut *backend, |b| b.show_window(native))?;
        self.inner.shown.set(true);
        Ok(())
    }

    pub fn hide(&self) -> Result<(), GuiError> {
        self.check_alive()?;
        let native = self.inner.native;
        let mut backend = self.inner.backend.borrow_mut();
        NativeCheck::new("Failed to hide window").run(&mut *backend, |b| b.hide_window(native))?;
        self.inner.shown.set(false);
        Ok(())
    }

    /// One frame: ticks the window queue, fires `render` on it and presents the viewport.
    pub fn render(&self, delta: Duration) -> Result<(), GuiError> {
        self.check_alive()?;
        self.inner.events.tick();
        self.inner
            .events
            .fire(EventOrigin::Window, EventPayload::Render { delta })?;
        self.present()
    }

    /// Copies the viewport surface to the screen.
    pub fn present(&self) -> Result<(), GuiError> {
        self.check_alive()?;
        let inner = &self.inner;
        let surface = inner.viewport.surface()?;
        let renderer = inner.renderer;

        let mut backend = inner.backend.borrow_mut();
        let check = NativeCheck::new("Failed to present window");
        let texture = check.run_required(&mut *backend, |b| b.create_texture_from_surface(renderer, surface))?;
        let presented = check.run(&mut *backend, |b| {
            b.clear(renderer);
            b.copy(renderer, texture);
            b.present(renderer);
        });
        backend.destroy_texture(texture);
        presented?;
        Ok(())
    }

    /// Handles a close request: hides the window, announces its destruction on the app queue and destroys it.
    pub fn close(&self) -> Result<(), GuiError> {
        self.check_alive()?;
        log::debug!("window {} closing", self.inner.id);
        self.hide()?;
        self.inner.app_events.fire(
            EventOrigin::Window,
            EventPayload::WindowDestroyed { window: self.inner.id },
        )?;
        self.destroy()
    }

    /// Disconnects from the app queue, destroys the component tree and releases the native window.
    ///
    /// Teardown continues past errors; the first one is returned.
    pub fn destroy(&self) -> Result<(), GuiError> {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return Err(GuiError::WindowDestroyed(inner.id));
        }

        let mut result = Ok(());
        let listeners = std::mem::take(&mut *inner.app_listeners.borrow_mut());
        for listener in listeners {
            let res = inner.app_events.disconnect(&listener);
            if result.is_ok() {
                result = res;
            }
        }

        let res = inner.viewport.destroy();
        if result.is_ok() {
            result = res;
        }

        let (renderer, native) = (inner.renderer, inner.native);
        let mut backend = inner.backend.borrow_mut();
        let res = NativeCheck::new("Failed to destroy window").run(&mut *backend, |b| {
            b.destroy_renderer(renderer);
            b.destroy_window(native);
        });
        if result.is_ok() {
            result = res.map_err(GuiError::from);
        }

        inner.shown.set(false);
        log::debug!("window {} destroyed", inner.id);
        result
    }
}

fn upgrade(weak: &Weak<WindowInner>) -> Option<Window> {
    weak.upgrade().map(|inner| Window { inner })
}

impl Debug for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.inner.id)
            .field("native", &self.inner.native)
            .field("title", &self.inner.title)
            .field("shown", &self.inner.shown.get())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbaColor;
    use crate::gui::{ColorRect, GuiConfig, RectSize};
    use crate::render::backends::headless::{HeadlessBackend, HeadlessOp};

    struct Fixture {
        backend: Rc<RefCell<HeadlessBackend>>,
        app_events: EventQueue,
    }

    fn fixture() -> Fixture {
        Fixture {
            backend: Rc::new(RefCell::new(HeadlessBackend::new())),
            app_events: EventQueue::new("app", QueueConfig::default()),
        }
    }

    impl Fixture {
        fn open(&self, config: WindowConfig) -> Result<Window, GuiError> {
            Window::open(&self.app_events, self.backend.clone(), QueueConfig::default(), "App", config)
        }
    }

    fn small() -> WindowConfig {
        WindowConfig::builder()
            .size(10, 10)
            .background(RgbaColor::rgb(0, 0, 80))
            .build()
            .unwrap()
    }

    #[test]
    fn open_creates_native_resources() {
        let f = fixture();
        let window = f.open(WindowConfig::builder().title("Main").size(10, 10).build().unwrap()).unwrap();

        let backend = f.backend.borrow();
        let native = backend.window(window.native_id()).unwrap();
        assert_eq!(native.title, "Main");
        assert_eq!(native.size, IVector2::new(10, 10));
        assert_eq!(backend.live_renderers(), 1);
        assert_eq!(f.app_events.listener_count(), 3);
        assert!(window.is_shown());
    }

    #[test]
    fn untitled_windows_use_the_app_title() {
        let f = fixture();
        let window = f.open(small()).unwrap();
        assert_eq!(window.title(), "App");
    }

    #[test]
    fn failed_renderer_releases_the_window() {
        let f = fixture();
        f.backend.borrow_mut().fail_next(HeadlessOp::CreateRenderer, "no accelerator");

        let err = f.open(small()).unwrap_err();
        assert!(matches!(err, GuiError::Native(ref e) if e.message == "no accelerator"));
        let backend = f.backend.borrow();
        assert!(backend.window_ids().is_empty());
        assert_eq!(f.app_events.listener_count(), 0);
    }

    #[test]
    fn full_app_queue_releases_the_half_open_window() {
        let f = Fixture {
            backend: Rc::new(RefCell::new(HeadlessBackend::new())),
            app_events: EventQueue::new("app", QueueConfig::builder().max_listeners(2).build().unwrap()),
        };

        assert_eq!(f.open(small()).unwrap_err(), GuiError::ListenerLimitReached(2));
        let backend = f.backend.borrow();
        assert!(backend.window_ids().is_empty());
        assert_eq!(backend.live_renderers(), 0);
        assert_eq!(backend.live_surfaces(), 0);
        assert_eq!(f.app_events.listener_count(), 0);
    }

    #[test]
    fn app_render_presents_the_viewport() {
        let f = fixture();
        let window = f.open(small()).unwrap();
        let rect = Component::gui(
            GuiConfig::default(),
            ColorRect::new(RectSize::Absolute(IVector2::new(2, 2)), RgbaColor::WHITE),
        )
        .unwrap();
        window.add(&rect).unwrap();

        f.app_events
            .fire(EventOrigin::App, EventPayload::AppRender { delta: Duration::from_millis(16) })
            .unwrap();

        let backend = f.backend.borrow();
        let native = backend.window(window.native_id()).unwrap();
        assert_eq!(native.frames_presented, 1);
        let frame = native.last_frame.as_ref().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(RgbaColor::WHITE));
        assert_eq!(frame.pixel(5, 5), Some(RgbaColor::rgb(0, 0, 80)));
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn render_ticks_the_window_queue() {
        let f = fixture();
        let window = f.open(small()).unwrap();
        window.render(Duration::ZERO).unwrap();
        // gui.created is absent: no components. Only the render event is retained.
        assert_eq!(window.events().event_count(), 1);
        window.render(Duration::ZERO).unwrap();
        assert_eq!(window.events().event_count(), 1);
    }

    #[test]
    fn close_event_only_affects_its_window() {
        let f = fixture();
        let a = f.open(small()).unwrap();
        let b = f.open(small()).unwrap();

        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let sink = destroyed.clone();
        f.app_events
            .connect(Subscriber::App, EventKind::WindowDestroyed, ListenerOptions::new(), move |e| {
                if let EventPayload::WindowDestroyed { window } = e.payload() {
                    sink.borrow_mut().push(*window);
                }
                Ok(())
            })
            .unwrap();

        f.app_events
            .fire(EventOrigin::App, EventPayload::AppWindowClose { window: a.native_id() })
            .unwrap();

        assert_eq!(*destroyed.borrow(), [a.id()]);
        assert!(a.is_destroyed());
        assert!(!a.is_shown());
        assert!(!b.is_destroyed());
        // b's three listeners plus the test listener
        assert_eq!(f.app_events.listener_count(), 4);
        let backend = f.backend.borrow();
        assert!(backend.was_destroyed(a.native_id()));
        assert!(backend.window(b.native_id()).is_some());
        assert_eq!(backend.live_renderers(), 1);
    }

    #[test]
    fn resize_event_resizes_the_viewport() {
        let f = fixture();
        let window = f.open(small()).unwrap();
        f.app_events
            .fire(
                EventOrigin::App,
                EventPayload::AppWindowResized {
                    window: window.native_id(),
                    size: IVector2::new(20, 15),
                },
            )
            .unwrap();
        assert_eq!(window.size(), IVector2::new(20, 15));
    }

    #[test]
    fn destroying_twice_fails() {
        let f = fixture();
        let window = f.open(small()).unwrap();
        window.destroy().unwrap();
        assert_eq!(window.destroy(), Err(GuiError::WindowDestroyed(window.id())));
        assert_eq!(window.show(), Err(GuiError::WindowDestroyed(window.id())));
        assert_eq!(f.backend.borrow().live_surfaces(), 0);
        assert_eq!(f.app_events.listener_count(), 0);
    }

    #[test]
    fn show_and_hide() {
        let f = fixture();
        let window = f.open(WindowConfig::builder().size(4, 4).hidden().build().unwrap()).unwrap();
        assert!(!window.is_shown());
        window.show().unwrap();
        assert!(window.is_shown());
        assert!(f.backend.borrow().window(window.native_id()).unwrap().shown);
        window.hide().unwrap();
        assert!(!f.backend.borrow().window(window.native_id()).unwrap().shown);
    }
}
