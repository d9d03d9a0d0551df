use crate::color::RgbaColor;
use crate::errors::ConfigError;
use crate::geometry::IVector2;
use crate::gui::ViewportConfig;
use crate::render::{WindowFlags, WindowPosition};

/// Settings of a new window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Window title. `None` uses the app title.
    pub title: Option<String>,
    pub position: WindowPosition,
    /// Initial size of the window and its viewport
    pub size: IVector2,
    pub flags: WindowFlags,
    pub viewport: ViewportConfig,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            position: WindowPosition::Centered,
            size: IVector2::new(640, 480),
            flags: WindowFlags::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

impl WindowConfig {
    pub fn builder() -> WindowConfigBuilder {
        WindowConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.x < 1 || self.size.y < 1 {
            return Err(ConfigError::EmptyWindow(self.size.x, self.size.y));
        }
        self.viewport.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WindowConfigBuilder {
    inner: WindowConfig,
}

impl WindowConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut WindowConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn title<S: Into<String>>(self, title: S) -> Self { self.map(|c| c.title = Some(title.into())) }
    pub fn position(self, position: WindowPosition) -> Self { self.map(|c| c.position = position) }
    pub fn size(self, w: i32, h: i32) -> Self { self.map(|c| c.size = IVector2::new(w, h)) }
    pub fn flags(self, flags: WindowFlags) -> Self { self.map(|c| c.flags = flags) }
    pub fn hidden(self) -> Self { self.map(|c| c.flags.insert(WindowFlags::HIDDEN)) }
    pub fn background(self, color: RgbaColor) -> Self { self.map(|c| c.viewport.background = color) }
    pub fn viewport(self, viewport: ViewportConfig) -> Self { self.map(|c| c.viewport = viewport) }

    pub fn build(self) -> Result<WindowConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
