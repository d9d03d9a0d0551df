use crate::geometry::IVector2;
use crate::render::NativeWindowId;
use crate::tree::ComponentId;
use crate::window::WindowId;
use std::cell::Cell;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Kind of an event. Displays as (and parses from) its string tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// App-wide render tick (`app.render`)
    AppRender,
    /// A native window asked to be closed (`app.window_close`)
    AppWindowClose,
    /// A native window changed size (`app.window_resized`)
    AppWindowResized,
    /// A window has been destroyed (`window.destroy`)
    WindowDestroyed,
    /// Window-local render tick (`render`)
    Render,
    /// A component got set up in a tree (`gui.created`)
    ComponentCreated,
    /// A component is being destroyed (`gui.destroy`)
    ComponentDestroyed,
    /// A component's computed size changed (`gui.size_changed`)
    ComponentSizeChanged,
    /// Application defined kind
    User(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::AppRender => "app.render",
            EventKind::AppWindowClose => "app.window_close",
            EventKind::AppWindowResized => "app.window_resized",
            EventKind::WindowDestroyed => "window.destroy",
            EventKind::Render => "render",
            EventKind::ComponentCreated => "gui.created",
            EventKind::ComponentDestroyed => "gui.destroy",
            EventKind::ComponentSizeChanged => "gui.size_changed",
            EventKind::User(tag) => tag,
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "app.render" => EventKind::AppRender,
            "app.window_close" => EventKind::AppWindowClose,
            "app.window_resized" => EventKind::AppWindowResized,
            "window.destroy" => EventKind::WindowDestroyed,
            "render" => EventKind::Render,
            "gui.created" => EventKind::ComponentCreated,
            "gui.destroy" => EventKind::ComponentDestroyed,
            "gui.size_changed" => EventKind::ComponentSizeChanged,
            other => EventKind::User(other.to_string()),
        })
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventOrigin {
    #[default]
    Unknown,
    Window,
    App,
    Other,
    Component(ComponentId),
}

/// Data carried by an event. There is exactly one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    AppRender { delta: Duration },
    AppWindowClose { window: NativeWindowId },
    AppWindowResized { window: NativeWindowId, size: IVector2 },
    WindowDestroyed { window: WindowId },
    Render { delta: Duration },
    ComponentCreated,
    ComponentDestroyed,
    ComponentSizeChanged { old: IVector2, new: IVector2 },
    User { tag: String, data: serde_json::Value },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::AppRender { .. } => EventKind::AppRender,
            EventPayload::AppWindowClose { .. } => EventKind::AppWindowClose,
            EventPayload::AppWindowResized { .. } => EventKind::AppWindowResized,
            EventPayload::WindowDestroyed { .. } => EventKind::WindowDestroyed,
            EventPayload::Render { .. } => EventKind::Render,
            EventPayload::ComponentCreated => EventKind::ComponentCreated,
            EventPayload::ComponentDestroyed => EventKind::ComponentDestroyed,
            EventPayload::ComponentSizeChanged { .. } => EventKind::ComponentSizeChanged,
            EventPayload::User { tag, .. } => EventKind::User(tag.clone()),
        }
    }

    pub fn user(tag: impl Into<String>, data: serde_json::Value) -> Self {
        EventPayload::User { tag: tag.into(), data }
    }
}

/// A fired event, as seen by listeners and kept in the queue until it expires.
#[derive(Debug)]
pub struct Event {
    kind: EventKind,
    origin: EventOrigin,
    payload: EventPayload,
    expires_in: u32,
    age: Cell<u32>,
}

impl Event {
    pub(crate) fn new(origin: EventOrigin, payload: EventPayload, expires_in: u32) -> Self {
        Self {
            kind: payload.kind(),
            origin,
            payload,
            expires_in,
            age: Cell::new(0),
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Number of queue ticks this event is retained for.
    pub fn expires_in(&self) -> u32 {
        self.expires_in
    }

    /// Number of queue ticks this event has been retained for.
    pub fn age(&self) -> u32 {
        self.age.get()
    }

    pub fn is_expired(&self) -> bool {
        self.age.get() >= self.expires_in
    }

    /// Frame delta of render events.
    pub fn delta(&self) -> Option<Duration> {
        match self.payload {
            EventPayload::AppRender { delta } | EventPayload::Render { delta } => Some(delta),
            _ => None,
        }
    }

    /// Native window of app-level window events.
    pub fn native_window(&self) -> Option<NativeWindowId> {
        match self.payload {
            EventPayload::AppWindowClose { window } | EventPayload::AppWindowResized { window, .. } => Some(window),
            _ => None,
        }
    }

    /// Advances the age by one tick and reports whether the event expired.
    pub(crate) fn advance(&self) -> bool {
        self.age.set(self.age.get().saturating_add(1));
        self.is_expired()
    }
}
