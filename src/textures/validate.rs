// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Descriptor validation against a device capability snapshot.

use crate::device::Capabilities;
use crate::pixel_formats::TextureFormat;
use crate::textures::TextureDescriptor;
use crate::textures::descriptor::full_mip_chain_len;

/// Why a format was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFault {
    /// The device cannot create textures of this format.
    Unsupported,
    /// Gamma correction was requested on a depth/stencil format.
    GammaOnNonColor,
    /// Gamma correction was requested on a color format with no sRGB encoding.
    NoSrgbEncoding,
    /// A block-compressed format was given dimensions that are not whole blocks.
    BlockMisaligned,
}

impl std::fmt::Display for FormatFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatFault::Unsupported => write!(f, "not supported by the device"),
            FormatFault::GammaOnNonColor => {
                write!(f, "gamma correction requested on a non-color format")
            }
            FormatFault::NoSrgbEncoding => {
                write!(f, "gamma correction requested but the format has no sRGB encoding")
            }
            FormatFault::BlockMisaligned => {
                write!(f, "dimensions are not a multiple of the compression block size")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("texture dimensions must be at least 1x1, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("texture dimensions {width}x{height} exceed the device maximum of {max}")]
    DimensionTooLarge { width: u32, height: u32, max: u32 },
    #[error("invalid format {format:?}: {fault}")]
    InvalidFormat {
        format: TextureFormat,
        fault: FormatFault,
    },
    #[error("cannot build a {levels}-level mip chain for {width}x{height}")]
    UnsupportedMipChain { width: u32, height: u32, levels: u32 },
}

/// Check `descriptor` against `capabilities`.
///
/// Pure function of its arguments.
pub fn validate(
    descriptor: &TextureDescriptor,
    capabilities: &Capabilities,
) -> Result<(), ValidationError> {
    let TextureDescriptor {
        format,
        width,
        height,
        has_mipmaps,
        gamma_correction,
    } = *descriptor;

    if width == 0 || height == 0 {
        return Err(ValidationError::ZeroDimension { width, height });
    }
    if width > capabilities.max_dimension_2d || height > capabilities.max_dimension_2d {
        return Err(ValidationError::DimensionTooLarge {
            width,
            height,
            max: capabilities.max_dimension_2d,
        });
    }
    if !capabilities.supports_format(format) {
        return Err(ValidationError::InvalidFormat {
            format,
            fault: FormatFault::Unsupported,
        });
    }
    let (block_w, block_h) = format.block_dimensions();
    if width % block_w != 0 || height % block_h != 0 {
        return Err(ValidationError::InvalidFormat {
            format,
            fault: FormatFault::BlockMisaligned,
        });
    }
    if gamma_correction {
        if !format.is_color() {
            return Err(ValidationError::InvalidFormat {
                format,
                fault: FormatFault::GammaOnNonColor,
            });
        }
        if !format.has_srgb_encoding() {
            return Err(ValidationError::InvalidFormat {
                format,
                fault: FormatFault::NoSrgbEncoding,
            });
        }
    }
    if has_mipmaps {
        let levels = full_mip_chain_len(width, height);
        let npot = !width.is_power_of_two() || !height.is_power_of_two();
        let too_deep = capabilities.max_mip_levels.is_some_and(|max| levels > max);
        if (npot && !capabilities.non_power_of_two_mipmaps) || too_deep {
            return Err(ValidationError::UnsupportedMipChain {
                width,
                height,
                levels,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::TextureBuilder;

    fn caps() -> Capabilities {
        Capabilities::default()
    }

    #[test]
    fn accepts_ordinary_texture() {
        let d = TextureBuilder::new(TextureFormat::Rgba8Unorm, 256, 256)
            .with_mipmaps(true)
            .build();
        assert_eq!(validate(&d, &caps()), Ok(()));
    }

    #[test]
    fn zero_width() {
        let d = TextureDescriptor::new(TextureFormat::Rgba8Unorm, 0, 256);
        assert_eq!(
            validate(&d, &caps()),
            Err(ValidationError::ZeroDimension {
                width: 0,
                height: 256
            })
        );
    }

    #[test]
    fn too_large() {
        let d = TextureDescriptor::new(TextureFormat::Rgba8Unorm, 20000, 20000);
        assert!(matches!(
            validate(&d, &caps()),
            Err(ValidationError::DimensionTooLarge { max: 16384, .. })
        ));
        //exactly the maximum is fine
        let d = TextureDescriptor::new(TextureFormat::R8Unorm, 16384, 1);
        assert_eq!(validate(&d, &caps()), Ok(()));
    }

    #[test]
    fn gamma_on_depth() {
        let d = TextureBuilder::new(TextureFormat::Depth32Float, 64, 64)
            .with_gamma_correction(true)
            .build();
        assert_eq!(
            validate(&d, &caps()),
            Err(ValidationError::InvalidFormat {
                format: TextureFormat::Depth32Float,
                fault: FormatFault::GammaOnNonColor
            })
        );
    }

    #[test]
    fn gamma_without_srgb() {
        let d = TextureBuilder::new(TextureFormat::R32Float, 64, 64)
            .with_gamma_correction(true)
            .build();
        assert!(matches!(
            validate(&d, &caps()),
            Err(ValidationError::InvalidFormat {
                fault: FormatFault::NoSrgbEncoding,
                ..
            })
        ));
        let d = TextureBuilder::new(TextureFormat::Bgra8Unorm, 64, 64)
            .with_gamma_correction(true)
            .build();
        assert_eq!(validate(&d, &caps()), Ok(()));
    }

    #[test]
    fn unsupported_format() {
        let caps = caps().with_supported_formats([TextureFormat::Rgba8Unorm]);
        let d = TextureDescriptor::new(TextureFormat::Bc3RgbaUnorm, 64, 64);
        assert!(matches!(
            validate(&d, &caps),
            Err(ValidationError::InvalidFormat {
                fault: FormatFault::Unsupported,
                ..
            })
        ));
    }

    #[test]
    fn compressed_needs_whole_blocks() {
        let d = TextureDescriptor::new(TextureFormat::Bc1RgbaUnorm, 30, 32);
        assert!(matches!(
            validate(&d, &caps()),
            Err(ValidationError::InvalidFormat {
                fault: FormatFault::BlockMisaligned,
                ..
            })
        ));
        let d = TextureBuilder::new(TextureFormat::Bc1RgbaUnorm, 32, 32)
            .with_mipmaps(true)
            .build();
        assert_eq!(validate(&d, &caps()), Ok(()));
    }

    #[test]
    fn non_power_of_two_mips() {
        let d = TextureBuilder::new(TextureFormat::Rgba8Unorm, 300, 200)
            .with_mipmaps(true)
            .build();
        assert_eq!(validate(&d, &caps()), Ok(()));
        let strict = caps().with_non_power_of_two_mipmaps(false);
        assert_eq!(
            validate(&d, &strict),
            Err(ValidationError::UnsupportedMipChain {
                width: 300,
                height: 200,
                levels: 9
            })
        );
        //without mips the same device takes it
        let d = TextureDescriptor::new(TextureFormat::Rgba8Unorm, 300, 200);
        assert_eq!(validate(&d, &strict), Ok(()));
    }

    #[test]
    fn mip_level_cap() {
        let shallow = caps().with_max_mip_levels(4);
        let d = TextureBuilder::new(TextureFormat::Rgba8Unorm, 8, 8)
            .with_mipmaps(true)
            .build();
        assert_eq!(validate(&d, &shallow), Ok(()));
        let d = TextureBuilder::new(TextureFormat::Rgba8Unorm, 16, 16)
            .with_mipmaps(true)
            .build();
        assert!(matches!(
            validate(&d, &shallow),
            Err(ValidationError::UnsupportedMipChain { levels: 5, .. })
        ));
    }
}
