// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texture formats understood by the resource manager.
//!
//! Each format describes its memory footprint in terms of *blocks*.  Uncompressed formats
//! use a 1×1 block (one texel), block-compressed formats use a 4×4 block.  This lets the
//! same arithmetic size both kinds of texture, including every level of a mip chain.
//!
//! # Examples
//!
//! ```
//! use texture_arena::pixel_formats::TextureFormat;
//!
//! assert_eq!(TextureFormat::Rgba8Unorm.bytes_per_block(), 4);
//! assert!(TextureFormat::Rgba8Unorm.has_srgb_encoding());
//! assert!(!TextureFormat::Depth32Float.is_color());
//! ```

/// A 2D texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single 8-bit normalized channel.
    R8Unorm,
    /// Two 8-bit normalized channels.
    Rg8Unorm,
    /// Four 8-bit normalized channels.  The common color format.
    Rgba8Unorm,
    /// Four 8-bit normalized channels in BGRA order, typical for swapchains.
    Bgra8Unorm,
    /// Four 16-bit normalized channels.
    Rgba16Unorm,
    /// Single half-precision float channel.
    R16Float,
    /// Four half-precision float channels.
    Rgba16Float,
    /// Single 32-bit float channel.
    R32Float,
    /// Two 32-bit float channels.
    Rg32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// Single 32-bit signed integer channel.
    R32Sint,
    /// BC1 (DXT1) block compression, 8 bytes per 4×4 block.
    Bc1RgbaUnorm,
    /// BC3 (DXT5) block compression, 16 bytes per 4×4 block.
    Bc3RgbaUnorm,
    /// BC7 block compression, 16 bytes per 4×4 block.
    Bc7RgbaUnorm,
    /// 16-bit depth.
    Depth16Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Every format, in declaration order.
    pub const ALL: [TextureFormat; 17] = [
        TextureFormat::R8Unorm,
        TextureFormat::Rg8Unorm,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Bgra8Unorm,
        TextureFormat::Rgba16Unorm,
        TextureFormat::R16Float,
        TextureFormat::Rgba16Float,
        TextureFormat::R32Float,
        TextureFormat::Rg32Float,
        TextureFormat::Rgba32Float,
        TextureFormat::R32Sint,
        TextureFormat::Bc1RgbaUnorm,
        TextureFormat::Bc3RgbaUnorm,
        TextureFormat::Bc7RgbaUnorm,
        TextureFormat::Depth16Unorm,
        TextureFormat::Depth32Float,
        TextureFormat::Depth24PlusStencil8,
    ];

    /// Number of bytes occupied by one block of this format.
    pub const fn bytes_per_block(self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::Rgba8Unorm | TextureFormat::Bgra8Unorm => 4,
            TextureFormat::Rgba16Unorm => 8,
            TextureFormat::R16Float => 2,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::R32Sint => 4,
            TextureFormat::Bc1RgbaUnorm => 8,
            TextureFormat::Bc3RgbaUnorm | TextureFormat::Bc7RgbaUnorm => 16,
            TextureFormat::Depth16Unorm => 2,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth24PlusStencil8 => 4,
        }
    }

    /// Width and height of one block, in texels.
    pub const fn block_dimensions(self) -> (u32, u32) {
        if self.is_block_compressed() {
            (4, 4)
        } else {
            (1, 1)
        }
    }

    pub const fn is_block_compressed(self) -> bool {
        matches!(
            self,
            TextureFormat::Bc1RgbaUnorm | TextureFormat::Bc3RgbaUnorm | TextureFormat::Bc7RgbaUnorm
        )
    }

    /// Whether the format stores color data, as opposed to depth/stencil.
    pub const fn is_color(self) -> bool {
        !matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth32Float
                | TextureFormat::Depth24PlusStencil8
        )
    }

    /// Whether the format has an sRGB-encoded counterpart that hardware can decode on sample.
    pub const fn has_srgb_encoding(self) -> bool {
        matches!(
            self,
            TextureFormat::Rgba8Unorm
                | TextureFormat::Bgra8Unorm
                | TextureFormat::Bc1RgbaUnorm
                | TextureFormat::Bc3RgbaUnorm
                | TextureFormat::Bc7RgbaUnorm
        )
    }

    /// Bytes needed for a single surface of the given size.
    ///
    /// Partial blocks at the edges are rounded up, so a 1×1 level of a BC format still
    /// occupies a full block.
    pub const fn surface_byte_len(self, width: u32, height: u32) -> u64 {
        let (block_w, block_h) = self.block_dimensions();
        let blocks_wide = width.div_ceil(block_w) as u64;
        let blocks_high = height.div_ceil(block_h) as u64;
        blocks_wide * blocks_high * self.bytes_per_block() as u64
    }
}
