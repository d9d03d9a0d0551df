//! Root of a window's component tree.
//!
//! A [`Viewport`] owns the surface its window presents. It listens for the
//! window-local `render` event and, on every tick, clears its surface with the
//! background color and renders its GUI children onto it.
//!
//! ```rust
//! use compygui::config::QueueConfig;
//! use compygui::events::EventQueue;
//! use compygui::geometry::IVector2;
//! use compygui::gui::ViewportConfig;
//! use compygui::render::backends::headless::HeadlessBackend;
//! use compygui::viewport::Viewport;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! # fn main() -> Result<(), compygui::errors::GuiError> {
//! let events = EventQueue::new("window", QueueConfig::default());
//! let backend = Rc::new(RefCell::new(HeadlessBackend::new()));
//! let viewport = Viewport::new(&events, backend, IVector2::new(800, 600), ViewportConfig::default())?;
//! assert_eq!(viewport.size(), IVector2::new(800, 600));
//! viewport.destroy()?;
//! # Ok(()) }
//! ```

use crate::color::RgbaColor;
use crate::errors::{ConfigError, GuiError};
use crate::events::{EventKind, EventOrigin, EventPayload, EventQueue, ListenerHandle, ListenerOptions, Subscriber};
use crate::geometry::IVector2;
use crate::gui::{render_component, Component, Element, TreeContext};
use crate::render::{NativeCheck, SharedBackend, SurfaceId};
use crate::tree::Node;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

pub use crate::gui::ViewportConfig;

/// Tree payload of a viewport root.
pub struct ViewportState {
    backend: SharedBackend,
    events: EventQueue,
    surface: Option<SurfaceId>,
    size: IVector2,
    config: ViewportConfig,
}

impl ViewportState {
    pub fn size(&self) -> IVector2 {
        self.size
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn background(&self) -> RgbaColor {
        self.config.background
    }

    fn context(&self, root: &Component) -> TreeContext {
        TreeContext::new(self.events.clone(), self.backend.clone(), root.downgrade())
    }

    /// Frees the surface. Called when the root node is destroyed.
    pub(crate) fn release(&mut self) -> Result<(), GuiError> {
        if let Some(surface) = self.surface.take() {
            let mut backend = self.backend.borrow_mut();
            NativeCheck::new("Failed to destroy viewport surface").run(&mut *backend, |b| b.destroy_surface(surface))?;
        }
        Ok(())
    }
}

impl Debug for ViewportState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportState")
            .field("surface", &self.surface)
            .field("size", &self.size)
            .field("config", &self.config)
            .finish()
    }
}

fn create_surface(backend: &SharedBackend, size: IVector2, config: &ViewportConfig) -> Result<SurfaceId, GuiError> {
    if !size.is_non_negative() {
        return Err(ConfigError::NegativeSize(size.x, size.y).into());
    }
    let mut backend = backend.borrow_mut();
    let surface = NativeCheck::new("Failed to create viewport surface")
        .run_required(&mut *backend, |b| b.create_surface(size, config.format))?;
    Ok(surface)
}

/// Root of a window's component tree.
pub struct Viewport {
    root: Component,
    events: EventQueue,
    backend: SharedBackend,
    listener: RefCell<Option<ListenerHandle>>,
}

impl Viewport {
    /// Creates the viewport surface and subscribes the viewport to `render` events on `events`.
    pub fn new(
        events: &EventQueue,
        backend: SharedBackend,
        size: IVector2,
        config: ViewportConfig,
    ) -> Result<Self, GuiError> {
        config.validate()?;
        let surface = create_surface(&backend, size, &config)?;

        let root = Node::new(Element::Viewport(ViewportState {
            backend: backend.clone(),
            events: events.clone(),
            surface: Some(surface),
            size,
            config,
        }));

        let weak = root.downgrade();
        let listener = events.connect(
            Subscriber::Component(root.id()),
            EventKind::Render,
            ListenerOptions::new(),
            move |event| match weak.upgrade() {
                Some(root) => render_root(&root, event.delta().unwrap_or_default()),
                None => Ok(()),
            },
        )?;

        Ok(Self {
            root,
            events: events.clone(),
            backend,
            listener: RefCell::new(Some(listener)),
        })
    }

    pub fn root(&self) -> &Component {
        &self.root
    }

    /// Appends `component` to the viewport's children.
    pub fn add(&self, component: &Component) -> Result<(), GuiError> {
        self.root.add_child(component)
    }

    /// Context handed to the components of this tree.
    pub fn context(&self) -> TreeContext {
        TreeContext::new(self.events.clone(), self.backend.clone(), self.root.downgrade())
    }

    pub fn size(&self) -> IVector2 {
        self.with_state(|s| s.size).unwrap_or_default()
    }

    pub fn surface(&self) -> Result<SurfaceId, GuiError> {
        self.with_state(|s| s.surface)
            .flatten()
            .ok_or(GuiError::MissingSurface(self.root.id()))
    }

    pub fn background(&self) -> RgbaColor {
        self.with_state(|s| s.background()).unwrap_or_default()
    }

    pub fn set_background(&self, color: RgbaColor) {
        self.with_state_mut(|s| s.config.background = color);
    }

    pub fn is_destroyed(&self) -> bool {
        self.root.is_destroyed()
    }

    /// Renders the tree once, as a `render` event would.
    pub fn render(&self, delta: Duration) -> Result<(), GuiError> {
        render_root(&self.root, delta)
    }

    /// Replaces the surface with one of `size` and announces the change on the window queue.
    pub fn resize(&self, size: IVector2) -> Result<(), GuiError> {
        if self.is_destroyed() {
            return Err(GuiError::ComponentDestroyed(self.root.id()));
        }
        let old = self.size();
        if old == size {
            return Ok(());
        }

        if !size.is_non_negative() {
            return Err(ConfigError::NegativeSize(size.x, size.y).into());
        }

        let (previous, config) = self
            .with_state_mut(|s| (s.surface.take(), s.config))
            .ok_or(GuiError::NotAGuiComponent(self.root.id()))?;
        if let Some(previous) = previous {
            let mut backend = self.backend.borrow_mut();
            NativeCheck::new("Failed to destroy viewport surface").run(&mut *backend, |b| b.destroy_surface(previous))?;
        }
        let surface = create_surface(&self.backend, size, &config)?;
        self.with_state_mut(|s| s.surface = Some(surface));

        self.events.fire(
            EventOrigin::Component(self.root.id()),
            EventPayload::ComponentSizeChanged { old, new: size },
        )?;
        self.with_state_mut(|s| s.size = size);
        log::debug!("viewport {} resized from {} to {}", self.root.id(), old, size);
        Ok(())
    }

    /// Stops listening for render events and destroys the whole tree.
    pub fn destroy(&self) -> Result<(), GuiError> {
        let listener = self.listener.borrow_mut().take();
        let disconnected = match listener {
            Some(listener) => self.events.disconnect(&listener),
            None => Ok(()),
        };
        let destroyed = self.root.destroy();
        disconnected.and(destroyed)
    }

    fn with_state<R>(&self, f: impl FnOnce(&ViewportState) -> R) -> Option<R> {
        match &*self.root.data() {
            Element::Viewport(state) => Some(f(state)),
            _ => None,
        }
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut ViewportState) -> R) -> Option<R> {
        match &mut *self.root.data_mut() {
            Element::Viewport(state) => Some(f(state)),
            _ => None,
        }
    }
}

impl Debug for Viewport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("root", &self.root)
            .field("listening", &self.listener.borrow().is_some())
            .finish()
    }
}

fn render_root(root: &Component, delta: Duration) -> Result<(), GuiError> {
    if root.is_destroyed() {
        return Err(GuiError::ComponentDestroyed(root.id()));
    }

    let (ctx, surface, background) = match &*root.data() {
        Element::Viewport(state) => (state.context(root), state.surface, state.background()),
        _ => return Err(GuiError::NotAGuiComponent(root.id())),
    };
    let surface = surface.ok_or(GuiError::MissingSurface(root.id()))?;

    {
        let mut backend = ctx.backend().borrow_mut();
        NativeCheck::new("Failed to render viewport").run(&mut *backend, |b| b.fill_rect(surface, None, background))?;
    }

    for child in root.children() {
        if child.is_gui() {
            render_component(&child, surface, delta, &ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::gui::{ColorRect, GuiConfig, RectSize};
    use crate::render::backends::headless::HeadlessBackend;
    use std::rc::Rc;

    fn setup(size: IVector2) -> (Rc<RefCell<HeadlessBackend>>, EventQueue, Viewport) {
        let backend = Rc::new(RefCell::new(HeadlessBackend::new()));
        let events = EventQueue::new("window", QueueConfig::default());
        let config = ViewportConfig::builder()
            .background(RgbaColor::rgb(10, 20, 30))
            .build()
            .unwrap();
        let viewport = Viewport::new(&events, backend.clone(), size, config).unwrap();
        (backend, events, viewport)
    }

    #[test]
    fn render_event_paints_the_tree() {
        let (backend, events, viewport) = setup(IVector2::new(8, 8));
        let rect = Component::gui(
            GuiConfig::builder().position(1, 1).build().unwrap(),
            ColorRect::new(RectSize::Absolute(IVector2::new(2, 2)), RgbaColor::WHITE),
        )
        .unwrap();
        viewport.add(&rect).unwrap();

        events
            .fire(EventOrigin::Window, EventPayload::Render { delta: Duration::from_millis(16) })
            .unwrap();

        let surface = viewport.surface().unwrap();
        let backend = backend.borrow();
        assert_eq!(backend.pixel(surface, 0, 0), Some(RgbaColor::rgb(10, 20, 30)));
        assert_eq!(backend.pixel(surface, 1, 1), Some(RgbaColor::WHITE));
        assert_eq!(backend.pixel(surface, 2, 2), Some(RgbaColor::WHITE));
        assert_eq!(backend.pixel(surface, 3, 3), Some(RgbaColor::rgb(10, 20, 30)));
    }

    #[test]
    fn resize_recreates_the_surface_and_announces_it() {
        let (backend, events, viewport) = setup(IVector2::new(8, 8));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        events
            .connect(
                Subscriber::App,
                EventKind::ComponentSizeChanged,
                ListenerOptions::new(),
                move |e| {
                    sink.borrow_mut().push((e.origin(), e.payload().clone()));
                    Ok(())
                },
            )
            .unwrap();

        viewport.resize(IVector2::new(16, 4)).unwrap();
        viewport.resize(IVector2::new(16, 4)).unwrap();

        assert_eq!(
            *seen.borrow(),
            [(
                EventOrigin::Component(viewport.root().id()),
                EventPayload::ComponentSizeChanged {
                    old: IVector2::new(8, 8),
                    new: IVector2::new(16, 4)
                }
            )]
        );
        assert_eq!(viewport.size(), IVector2::new(16, 4));
        let backend = backend.borrow();
        assert_eq!(backend.surface_size(viewport.surface().unwrap()), Some(IVector2::new(16, 4)));
        assert_eq!(backend.live_surfaces(), 1);
    }

    #[test]
    fn destroy_releases_everything() {
        let (backend, events, viewport) = setup(IVector2::new(8, 8));
        let destroyed = Rc::new(RefCell::new(0));
        let counter = destroyed.clone();
        events
            .connect(Subscriber::App, EventKind::ComponentDestroyed, ListenerOptions::new(), move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            })
            .unwrap();

        let rect = Component::gui(
            GuiConfig::default(),
            ColorRect::new(RectSize::Absolute(IVector2::new(2, 2)), RgbaColor::WHITE),
        )
        .unwrap();
        viewport.add(&rect).unwrap();
        viewport.render(Duration::ZERO).unwrap();
        assert_eq!(events.listener_count(), 2);

        viewport.destroy().unwrap();

        assert_eq!(*destroyed.borrow(), 1);
        assert_eq!(events.listener_count(), 1);
        assert_eq!(backend.borrow().live_surfaces(), 0);
        assert!(rect.is_destroyed());
        assert_eq!(viewport.surface(), Err(GuiError::MissingSurface(viewport.root().id())));

        // render events no longer reach the viewport
        events
            .fire(EventOrigin::Window, EventPayload::Render { delta: Duration::ZERO })
            .unwrap();
    }

    #[test]
    fn negative_size_is_rejected() {
        let (_backend, _events, viewport) = setup(IVector2::new(8, 8));
        assert_eq!(
            viewport.resize(IVector2::new(-1, 3)),
            Err(GuiError::Config(ConfigError::NegativeSize(-1, 3)))
        );
    }
}
