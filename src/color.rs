//! Colors and pixel formats.
//!
//! Surfaces are described by a [`PixelFormat`]: a bit depth plus one
//! [`RgbaMask`] selecting where each channel lives inside a pixel. Colors are
//! always specified as 8-bit [`RgbaColor`] values and packed per format.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const WHITE: RgbaColor = RgbaColor::new(255, 255, 255, 255);
    pub const BLACK: RgbaColor = RgbaColor::new(0, 0, 0, 255);
    /// Fully transparent white
    pub const TRANSPARENT_WHITE: RgbaColor = RgbaColor::new(255, 255, 255, 0);
    /// Fully transparent black, same as `RgbaColor::default()`
    pub const TRANSPARENT: RgbaColor = RgbaColor::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Channel masks of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbaMask {
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

impl RgbaMask {
    /// `0xRRGGBBAA`
    pub const RGBA: RgbaMask = RgbaMask { r: 0xFF00_0000, g: 0x00FF_0000, b: 0x0000_FF00, a: 0x0000_00FF };
    /// `0xAARRGGBB`
    pub const ARGB: RgbaMask = RgbaMask { a: 0xFF00_0000, r: 0x00FF_0000, g: 0x0000_FF00, b: 0x0000_00FF };
    /// `0xAABBGGRR`
    pub const ABGR: RgbaMask = RgbaMask { a: 0xFF00_0000, b: 0x00FF_0000, g: 0x0000_FF00, r: 0x0000_00FF };

    /// All channel bits or-ed together.
    pub fn combined(&self) -> u32 {
        self.r | self.g | self.b | self.a
    }

    /// Packs a color into a pixel value of this layout.
    pub fn pack(&self, color: RgbaColor) -> u32 {
        pack_channel(color.r, self.r)
            | pack_channel(color.g, self.g)
            | pack_channel(color.b, self.b)
            | pack_channel(color.a, self.a)
    }

    /// Unpacks a pixel value. Channels without a mask read as 0, except alpha which reads as opaque.
    pub fn unpack(&self, pixel: u32) -> RgbaColor {
        RgbaColor {
            r: unpack_channel(pixel, self.r).unwrap_or(0),
            g: unpack_channel(pixel, self.g).unwrap_or(0),
            b: unpack_channel(pixel, self.b).unwrap_or(0),
            a: unpack_channel(pixel, self.a).unwrap_or(255),
        }
    }

    fn overlaps(&self) -> bool {
        let masks = [self.r, self.g, self.b, self.a];
        masks
            .iter()
            .enumerate()
            .any(|(i, m)| masks[i + 1..].iter().any(|o| m & o != 0))
    }
}

impl Default for RgbaMask {
    fn default() -> Self {
        RgbaMask::RGBA
    }
}

fn pack_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones().min(8);
    ((value as u32 >> (8 - bits)) << shift) & mask
}

fn unpack_channel(pixel: u32, mask: u32) -> Option<u8> {
    if mask == 0 {
        return None;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones().min(8);
    let raw = (pixel & mask) >> shift;
    Some((raw << (8 - bits)) as u8)
}

/// Bit depth and channel layout of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat {
    pub mask: RgbaMask,
    pub bit_depth: u8,
}

impl PixelFormat {
    pub const RGBA32: PixelFormat = PixelFormat { mask: RgbaMask::RGBA, bit_depth: 32 };
    pub const ARGB32: PixelFormat = PixelFormat { mask: RgbaMask::ARGB, bit_depth: 32 };

    pub fn new(mask: RgbaMask, bit_depth: u8) -> Result<Self, ConfigError> {
        let format = Self { mask, bit_depth };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if ![8, 16, 24, 32].contains(&self.bit_depth) {
            return Err(ConfigError::InvalidBitDepth(self.bit_depth));
        }
        if self.mask.overlaps() {
            return Err(ConfigError::OverlappingMasks);
        }
        if self.bit_depth < 32 && self.mask.combined() >> self.bit_depth != 0 {
            return Err(ConfigError::MaskExceedsDepth(self.bit_depth));
        }
        Ok(())
    }

    pub fn pack(&self, color: RgbaColor) -> u32 {
        self.mask.pack(color)
    }

    pub fn unpack(&self, pixel: u32) -> RgbaColor {
        self.mask.unpack(pixel)
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::RGBA32
    }
}
