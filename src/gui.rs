//! GUI components.
//!
//! A GUI component is a tree node ([`Element::Gui`]) that owns an off-screen
//! surface. On every window render tick it asks its [`Widget`] for its size,
//! recreates the surface when the size changed, renders its GUI children onto
//! the surface, lets the widget paint, and finally blits the surface onto its
//! parent at [`top_left`](crate::gui::GuiComponent::top_left).
//!
//! ```rust
//! use compygui::geometry::IVector2;
//! use compygui::gui::{Component, GuiConfig, Widget};
//!
//! struct Spacer;
//! impl Widget for Spacer {}
//!
//! let config = GuiConfig::builder().position(100, 100).centered().initial_size(20, 10).build().unwrap();
//! let spacer = Component::gui(config, Spacer).unwrap();
//! assert_eq!(spacer.top_left().unwrap(), IVector2::new(90, 95));
//! ```

mod canvas;
mod color_rect;
mod component;
mod config;

pub use canvas::Canvas;
pub use color_rect::{ColorRect, RectSize};
pub use component::{Component, Element, GuiComponent, TreeContext, Widget};
pub use config::{GuiConfig, GuiConfigBuilder, ViewportConfig, ViewportConfigBuilder};

pub(crate) use component::render_component;
