use crate::events::ListenerId;
use crate::tree::ComponentId;
use crate::window::WindowId;

/// Failure reported by the native backend, together with what we were trying to do.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: native error: {message}")]
pub struct NativeError {
    /// Caller supplied description of the failed operation
    pub context: String,
    /// Diagnostic string reported by the native library
    pub message: String,
}

impl NativeError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("bit depth {0} is not supported (expected 8, 16, 24 or 32)")]
    InvalidBitDepth(u8),

    #[error("channel masks overlap")]
    OverlappingMasks,

    #[error("channel masks do not fit in {0} bits")]
    MaskExceedsDepth(u8),

    #[error("anchor point ({0}, {1}) is outside 0.0..=1.0")]
    AnchorOutOfRange(f32, f32),

    #[error("size ({0}, {1}) must not be negative")]
    NegativeSize(i32, i32),

    #[error("window size ({0}, {1}) must be at least 1x1")]
    EmptyWindow(i32, i32),

    #[error("{0} limit must be at least 1")]
    ZeroLimit(&'static str),

    #[error("default event expiry must be at least one tick")]
    ZeroExpiry,

    #[error("frame cap must be at least 1 fps")]
    ZeroFrameCap,

    #[error("invalid configuration file: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuiError {
    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("Event queue size limit reached ({0} events)")]
    EventLimitReached(usize),

    #[error("Event listener limit reached ({0} event listeners)")]
    ListenerLimitReached(usize),

    #[error("Unknown event listener {0}")]
    UnknownListener(ListenerId),

    #[error("Event listener {0} has already been disconnected")]
    ListenerAlreadyDisconnected(ListenerId),

    #[error("Component {0} has been destroyed")]
    ComponentDestroyed(ComponentId),

    #[error("Cannot reparent component {node} under {parent}: it would create a cycle")]
    ReparentCycle { node: ComponentId, parent: ComponentId },

    #[error("Component {0} has no surface")]
    MissingSurface(ComponentId),

    #[error("Component {0} is not a GUI component")]
    NotAGuiComponent(ComponentId),

    #[error("Component {0} has not been set up yet")]
    NotSetUp(ComponentId),

    #[error("Window {0} has been destroyed")]
    WindowDestroyed(WindowId),

    #[error("App is already running")]
    AlreadyRunning,

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
