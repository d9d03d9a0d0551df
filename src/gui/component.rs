use crate::errors::{ConfigError, GuiError};
use crate::events::{EventOrigin, EventPayload, EventQueue};
use crate::geometry::{IRect2, IVector2, Vector2};
use crate::gui::canvas::Canvas;
use crate::gui::config::GuiConfig;
use crate::color::PixelFormat;
use crate::render::{NativeCheck, SharedBackend, SurfaceId};
use crate::tree::{Node, NodeData, WeakNode};
use crate::viewport::ViewportState;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::Duration;

/// Size and drawing behaviour of a GUI component.
///
/// All hooks have defaults: a widget that overrides nothing keeps its initial
/// size and shows whatever its children rendered.
pub trait Widget {
    /// Called once, on the first render of the component in a tree.
    fn setup(&mut self, _ctx: &TreeContext) -> Result<(), GuiError> {
        Ok(())
    }

    /// Returns the size of the component for this render tick.
    fn calculate(&mut self, current: IVector2, _delta: Duration) -> IVector2 {
        current
    }

    /// Paints the component surface. Runs after the children have been blitted onto it.
    fn draw(&mut self, _canvas: &mut Canvas<'_>, _delta: Duration) -> Result<(), GuiError> {
        Ok(())
    }
}

/// What a component in a window tree has access to once it is set up.
#[derive(Clone)]
pub struct TreeContext {
    events: EventQueue,
    backend: SharedBackend,
    viewport: WeakNode<Element>,
}

impl TreeContext {
    pub(crate) fn new(events: EventQueue, backend: SharedBackend, viewport: WeakNode<Element>) -> Self {
        Self {
            events,
            backend,
            viewport,
        }
    }

    /// The window-local event queue.
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn viewport(&self) -> Option<Component> {
        self.viewport.upgrade()
    }

    /// Current size of the viewport, zero once the viewport is gone.
    pub fn viewport_size(&self) -> IVector2 {
        let Some(viewport) = self.viewport() else {
            return IVector2::ZERO;
        };
        let size = match &*viewport.data() {
            Element::Viewport(state) => state.size(),
            _ => IVector2::ZERO,
        };
        size
    }
}

impl Debug for TreeContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeContext")
            .field("events", &self.events)
            .field("backend", &self.backend.try_borrow().map(|b| b.name().to_string()).ok())
            .finish()
    }
}

/// Tree payload of a drawable component.
pub struct GuiComponent {
    widget: Rc<RefCell<dyn Widget>>,
    format: PixelFormat,
    position: IVector2,
    anchor: Vector2,
    size: IVector2,
    surface: Option<SurfaceId>,
    context: Option<TreeContext>,
}

impl GuiComponent {
    fn new(config: GuiConfig, widget: Rc<RefCell<dyn Widget>>) -> Self {
        Self {
            widget,
            format: config.format,
            position: config.position,
            anchor: config.anchor,
            size: config.initial_size,
            surface: None,
            context: None,
        }
    }

    /// Top-left corner of the component inside its parent surface.
    pub fn top_left(&self) -> IVector2 {
        self.position - (self.anchor * self.size).rounded()
    }

    pub fn size(&self) -> IVector2 {
        self.size
    }

    pub fn position(&self) -> IVector2 {
        self.position
    }

    pub fn anchor(&self) -> Vector2 {
        self.anchor
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn is_set_up(&self) -> bool {
        self.context.is_some()
    }
}

impl Debug for GuiComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiComponent")
            .field("position", &self.position)
            .field("anchor", &self.anchor)
            .field("size", &self.size)
            .field("surface", &self.surface)
            .field("set_up", &self.context.is_some())
            .finish()
    }
}

/// Payload of every node in a window tree.
#[derive(Debug)]
pub enum Element {
    /// Plain grouping node. Groups are not rendered, and neither is anything below them.
    Group,
    Gui(GuiComponent),
    Viewport(ViewportState),
}

pub type Component = Node<Element>;

impl NodeData for Element {
    fn on_destroy(node: &Node<Self>) -> Result<(), GuiError> {
        let (surface, context) = match &mut *node.data_mut() {
            Element::Group => return Ok(()),
            Element::Viewport(state) => return state.release(),
            Element::Gui(gui) => (gui.surface.take(), gui.context.clone()),
        };

        // Components that never rendered own nothing and nobody heard of them.
        let Some(ctx) = context else {
            return Ok(());
        };

        let fired = ctx
            .events
            .fire(EventOrigin::Component(node.id()), EventPayload::ComponentDestroyed);

        if let Some(surface) = surface {
            let mut backend = ctx.backend.borrow_mut();
            NativeCheck::new("Failed to destroy component surface").run(&mut *backend, |b| b.destroy_surface(surface))?;
        }
        log::debug!("component {} destroyed", node.id());
        fired
    }
}

impl Node<Element> {
    /// A node that only groups other nodes.
    pub fn group() -> Self {
        Node::new(Element::Group)
    }

    /// A drawable component driven by `widget`. Fails if `config` does not validate.
    pub fn gui(config: GuiConfig, widget: impl Widget + 'static) -> Result<Self, GuiError> {
        Self::gui_shared(config, Rc::new(RefCell::new(widget)))
    }

    /// Like [`gui`](Self::gui) for a widget the caller keeps a handle to.
    pub fn gui_shared(config: GuiConfig, widget: Rc<RefCell<dyn Widget>>) -> Result<Self, GuiError> {
        config.validate()?;
        Ok(Node::new(Element::Gui(GuiComponent::new(config, widget))))
    }

    pub fn is_gui(&self) -> bool {
        matches!(&*self.data(), Element::Gui(_))
    }

    pub fn is_viewport(&self) -> bool {
        matches!(&*self.data(), Element::Viewport(_))
    }

    fn with_gui<R>(&self, f: impl FnOnce(&GuiComponent) -> R) -> Result<R, GuiError> {
        match &*self.data() {
            Element::Gui(gui) => Ok(f(gui)),
            _ => Err(GuiError::NotAGuiComponent(self.id())),
        }
    }

    fn with_gui_mut<R>(&self, f: impl FnOnce(&mut GuiComponent) -> R) -> Result<R, GuiError> {
        match &mut *self.data_mut() {
            Element::Gui(gui) => Ok(f(gui)),
            _ => Err(GuiError::NotAGuiComponent(self.id())),
        }
    }

    /// Size computed on the last render tick (the initial size before that).
    pub fn size(&self) -> Result<IVector2, GuiError> {
        self.with_gui(|g| g.size)
    }

    pub fn position(&self) -> Result<IVector2, GuiError> {
        self.with_gui(|g| g.position)
    }

    pub fn set_position(&self, position: IVector2) -> Result<(), GuiError> {
        self.with_gui_mut(|g| g.position = position)
    }

    pub fn anchor(&self) -> Result<Vector2, GuiError> {
        self.with_gui(|g| g.anchor)
    }

    pub fn set_anchor(&self, anchor: Vector2) -> Result<(), GuiError> {
        if !anchor.is_normalized() {
            return Err(ConfigError::AnchorOutOfRange(anchor.x, anchor.y).into());
        }
        self.with_gui_mut(|g| g.anchor = anchor)
    }

    pub fn top_left(&self) -> Result<IVector2, GuiError> {
        self.with_gui(|g| g.top_left())
    }

    pub fn is_set_up(&self) -> Result<bool, GuiError> {
        self.with_gui(|g| g.is_set_up())
    }

    /// Context of the tree the component was set up in.
    pub fn context(&self) -> Result<TreeContext, GuiError> {
        self.with_gui(|g| g.context.clone())?
            .ok_or(GuiError::NotSetUp(self.id()))
    }

    /// The component's own surface.
    pub fn surface(&self) -> Result<SurfaceId, GuiError> {
        let (set_up, surface) = self.with_gui(|g| (g.is_set_up(), g.surface))?;
        if !set_up {
            return Err(GuiError::NotSetUp(self.id()));
        }
        surface.ok_or(GuiError::MissingSurface(self.id()))
    }
}

fn create_surface(ctx: &TreeContext, size: IVector2, format: PixelFormat) -> Result<SurfaceId, GuiError> {
    let mut backend = ctx.backend.borrow_mut();
    let surface = NativeCheck::new("Failed to create component surface")
        .run_required(&mut *backend, |b| b.create_surface(size, format))?;
    Ok(surface)
}

fn set_up(node: &Component, ctx: &TreeContext) -> Result<(), GuiError> {
    let widget = node.with_gui_mut(|g| {
        g.context = Some(ctx.clone());
        g.widget.clone()
    })?;

    ctx.events
        .fire(EventOrigin::Component(node.id()), EventPayload::ComponentCreated)?;
    widget.borrow_mut().setup(ctx)?;

    let (size, format) = node.with_gui(|g| (g.size, g.format))?;
    let surface = create_surface(ctx, size, format)?;
    node.with_gui_mut(|g| g.surface = Some(surface))?;

    log::debug!("component {} set up with size {}", node.id(), size);
    Ok(())
}

fn resize(node: &Component, ctx: &TreeContext, old: IVector2, new: IVector2) -> Result<(), GuiError> {
    if !new.is_non_negative() {
        return Err(ConfigError::NegativeSize(new.x, new.y).into());
    }

    let (previous, format) = node.with_gui_mut(|g| (g.surface.take(), g.format))?;
    if let Some(previous) = previous {
        let mut backend = ctx.backend.borrow_mut();
        NativeCheck::new("Failed to destroy component surface").run(&mut *backend, |b| b.destroy_surface(previous))?;
    }
    let surface = create_surface(ctx, new, format)?;
    node.with_gui_mut(|g| g.surface = Some(surface))?;

    ctx.events.fire(
        EventOrigin::Component(node.id()),
        EventPayload::ComponentSizeChanged { old, new },
    )?;
    node.with_gui_mut(|g| g.size = new)?;
    Ok(())
}

/// Runs one render tick of `node` and its GUI descendants and blits the result onto `target`.
///
/// On the first call the component is set up in the tree described by `ctx`.
pub(crate) fn render_component(
    node: &Component,
    target: SurfaceId,
    delta: Duration,
    ctx: &TreeContext,
) -> Result<(), GuiError> {
    let id = node.id();
    if node.is_destroyed() {
        return Err(GuiError::ComponentDestroyed(id));
    }

    if !node.is_set_up()? {
        set_up(node, ctx)?;
    }

    let (widget, old) = node.with_gui(|g| (g.widget.clone(), g.size))?;
    let new = widget.borrow_mut().calculate(old, delta);
    if new != old {
        resize(node, ctx, old, new)?;
    }

    let surface = node
        .with_gui(|g| g.surface)?
        .ok_or(GuiError::MissingSurface(id))?;

    for child in node.children() {
        if child.is_gui() {
            render_component(&child, surface, delta, ctx)?;
        }
    }

    let (size, top_left) = node.with_gui(|g| (g.size, g.top_left()))?;
    {
        let mut canvas = Canvas::new(&ctx.backend, surface, size);
        widget.borrow_mut().draw(&mut canvas, delta)?;
    }
    let mut backend = ctx.backend.borrow_mut();
    NativeCheck::new("Failed to render component").run(&mut *backend, |b| {
        b.blit_surface(surface, None, target, Some(IRect2::from_vectors(top_left, size)))
    })?;
    Ok(())
}
