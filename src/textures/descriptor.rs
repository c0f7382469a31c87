// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Immutable description of a 2D texture, plus a builder to construct one.

use crate::pixel_formats::TextureFormat;

/// Everything needed to create a 2D texture.
///
/// A descriptor is fixed once the resource is created; the manager hands copies back from
/// [`crate::textures::TextureManager::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub has_mipmaps: bool,
    pub gamma_correction: bool,
}

impl TextureDescriptor {
    /// A descriptor with no mipmaps and no gamma correction, the scripting layer's defaults.
    pub const fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            has_mipmaps: false,
            gamma_correction: false,
        }
    }

    /// Number of levels in the texture, including the base level.
    ///
    /// With mipmaps this is `floor(log2(max(width, height))) + 1`, so a 256×256 texture has
    /// 9 levels.  Without mipmaps it is 1.
    pub const fn mip_level_count(&self) -> u32 {
        if self.has_mipmaps {
            full_mip_chain_len(self.width, self.height)
        } else {
            1
        }
    }

    /// Size of the given level.  Each dimension halves per level and bottoms out at 1.
    ///
    /// Returns `None` for a level past the end of the chain.
    pub const fn mip_extent(&self, level: u32) -> Option<(u32, u32)> {
        if level >= self.mip_level_count() {
            return None;
        }
        let width = self.width >> level;
        let height = self.height >> level;
        Some((
            if width == 0 { 1 } else { width },
            if height == 0 { 1 } else { height },
        ))
    }

    /// Bytes occupied by a single level.
    pub const fn level_byte_len(&self, level: u32) -> Option<u64> {
        match self.mip_extent(level) {
            Some((width, height)) => Some(self.format.surface_byte_len(width, height)),
            None => None,
        }
    }

    /// Total bytes for the base level and every mip level.
    pub fn byte_len(&self) -> u64 {
        (0..self.mip_level_count())
            .filter_map(|level| self.level_byte_len(level))
            .sum()
    }
}

/// `floor(log2(max(width, height))) + 1`, or 0 for a zero-sized texture.
pub const fn full_mip_chain_len(width: u32, height: u32) -> u32 {
    let largest = if width > height { width } else { height };
    if largest == 0 {
        0
    } else {
        u32::BITS - largest.leading_zeros()
    }
}

/// Builder for [`TextureDescriptor`].
///
/// Mirrors the scripting constructor, where mipmaps and gamma correction are optional
/// trailing arguments.
#[derive(Debug, Clone, Copy)]
pub struct TextureBuilder {
    descriptor: TextureDescriptor,
}

impl TextureBuilder {
    /// Create a new builder with the required parameters.
    pub const fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            descriptor: TextureDescriptor::new(format, width, height),
        }
    }

    /// Request a full mip chain down to 1×1.
    pub const fn with_mipmaps(mut self, has_mipmaps: bool) -> Self {
        self.descriptor.has_mipmaps = has_mipmaps;
        self
    }

    /// Request sRGB decoding on sample.
    pub const fn with_gamma_correction(mut self, gamma_correction: bool) -> Self {
        self.descriptor.gamma_correction = gamma_correction;
        self
    }

    pub const fn build(self) -> TextureDescriptor {
        self.descriptor
    }
}

impl From<TextureBuilder> for TextureDescriptor {
    fn from(builder: TextureBuilder) -> Self {
        builder.build()
    }
}
