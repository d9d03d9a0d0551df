use crate::color::{PixelFormat, RgbaColor};
use crate::errors::ConfigError;
use crate::geometry::{IVector2, Vector2};

/// Placement and surface settings of a GUI component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiConfig {
    /// Position of the anchor point inside the parent surface
    pub position: IVector2,
    /// Point of the component that sits at `position`, relative to its size
    pub anchor: Vector2,
    /// Size before the first calculation
    pub initial_size: IVector2,
    /// Pixel format of the component surface
    pub format: PixelFormat,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            position: IVector2::ZERO,
            anchor: Vector2::ZERO,
            initial_size: IVector2::ZERO,
            format: PixelFormat::default(),
        }
    }
}

impl GuiConfig {
    pub fn builder() -> GuiConfigBuilder {
        GuiConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.anchor.is_normalized() {
            return Err(ConfigError::AnchorOutOfRange(self.anchor.x, self.anchor.y));
        }
        if !self.initial_size.is_non_negative() {
            return Err(ConfigError::NegativeSize(self.initial_size.x, self.initial_size.y));
        }
        self.format.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuiConfigBuilder {
    inner: GuiConfig,
}

impl GuiConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut GuiConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn position(self, x: i32, y: i32) -> Self { self.map(|c| c.position = IVector2::new(x, y)) }
    pub fn anchor(self, anchor: Vector2) -> Self { self.map(|c| c.anchor = anchor) }
    pub fn centered(self) -> Self { self.map(|c| c.anchor = Vector2::CENTER) }
    pub fn initial_size(self, w: i32, h: i32) -> Self { self.map(|c| c.initial_size = IVector2::new(w, h)) }
    pub fn format(self, format: PixelFormat) -> Self { self.map(|c| c.format = format) }

    pub fn build(self) -> Result<GuiConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Settings of a window's root viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    /// Color the viewport is cleared with before its components render
    pub background: RgbaColor,
    pub format: PixelFormat,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            background: RgbaColor::BLACK,
            format: PixelFormat::default(),
        }
    }
}

impl ViewportConfig {
    pub fn builder() -> ViewportConfigBuilder {
        ViewportConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.format.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewportConfigBuilder {
    inner: ViewportConfig,
}

impl ViewportConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ViewportConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn background(self, color: RgbaColor) -> Self { self.map(|c| c.background = color) }
    pub fn format(self, format: PixelFormat) -> Self { self.map(|c| c.format = format) }

    pub fn build(self) -> Result<ViewportConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
