pub mod app;
pub mod color;
pub mod config;
pub mod errors;
pub mod events;
pub mod geometry;
pub mod gui;
pub mod render;
pub mod tree;
pub mod viewport;
pub mod window;

pub use app::{App, AppState};
pub use config::{AppConfig, QueueConfig};
pub use errors::GuiError;
pub use gui::{Component, Widget};
pub use viewport::Viewport;
pub use window::{Window, WindowConfig};
