use crate::errors::GuiError;
use crate::events::event::{Event, EventKind};
use crate::tree::ComponentId;
use crate::window::WindowId;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use uuid::Uuid;

/// A unique identifier for a listener, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ListenerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who registered a listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subscriber {
    App,
    Window(WindowId),
    Component(ComponentId),
    Other(String),
}

impl Display for Subscriber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Subscriber::App => write!(f, "app"),
            Subscriber::Window(id) => write!(f, "window {id}"),
            Subscriber::Component(id) => write!(f, "component {id}"),
            Subscriber::Other(name) => write!(f, "{name}"),
        }
    }
}

pub(crate) type Callback = Rc<dyn Fn(&Event) -> Result<(), GuiError>>;
pub(crate) type Predicate = Rc<dyn Fn(&Event) -> bool>;

/// Optional listener settings for [`EventQueue::connect`](crate::events::EventQueue::connect).
#[derive(Default, Clone)]
pub struct ListenerOptions {
    pub(crate) predicate: Option<Predicate>,
    pub(crate) oneshot: bool,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only deliver events for which `predicate` returns true.
    pub fn filter(mut self, predicate: impl Fn(&Event) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    /// Disconnect the listener after its first invocation.
    pub fn oneshot(mut self) -> Self {
        self.oneshot = true;
        self
    }
}

impl Debug for ListenerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("predicate", &self.predicate.is_some())
            .field("oneshot", &self.oneshot)
            .finish()
    }
}

pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) subscriber: Subscriber,
    pub(crate) kind: EventKind,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) callback: Callback,
    pub(crate) oneshot: bool,
    pub(crate) valid: Cell<bool>,
}

impl Listener {
    /// Whether this listener wants `event`. Disconnected listeners never do.
    pub(crate) fn accepts(&self, event: &Event) -> bool {
        if !self.valid.get() || &self.kind != event.kind() {
            return false;
        }
        match &self.predicate {
            Some(predicate) => predicate(event),
            None => true,
        }
    }
}

/// Handle returned by `connect`, used to inspect and disconnect a listener.
#[derive(Clone)]
pub struct ListenerHandle {
    pub(crate) listener: Rc<Listener>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.listener.id
    }

    pub fn kind(&self) -> &EventKind {
        &self.listener.kind
    }

    pub fn subscriber(&self) -> &Subscriber {
        &self.listener.subscriber
    }

    pub fn is_oneshot(&self) -> bool {
        self.listener.oneshot
    }

    /// False once the listener has been disconnected.
    pub fn is_valid(&self) -> bool {
        self.listener.valid.get()
    }
}

impl Debug for ListenerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.listener.id)
            .field("kind", &self.listener.kind)
            .field("subscriber", &self.listener.subscriber)
            .field("oneshot", &self.listener.oneshot)
            .field("valid", &self.listener.valid.get())
            .finish()
    }
}
