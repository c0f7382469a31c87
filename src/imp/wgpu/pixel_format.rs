// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::Capabilities;
use crate::pixel_formats::TextureFormat;

/// The wgpu format for `format`, taking the sRGB variant when gamma correction is requested.
///
/// Validation has already rejected gamma on formats without an sRGB encoding, so those fall
/// back to the linear format here.
pub(super) const fn wgpu_format(format: TextureFormat, gamma_correction: bool) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as W;
    match (format, gamma_correction) {
        (TextureFormat::R8Unorm, _) => W::R8Unorm,
        (TextureFormat::Rg8Unorm, _) => W::Rg8Unorm,
        (TextureFormat::Rgba8Unorm, false) => W::Rgba8Unorm,
        (TextureFormat::Rgba8Unorm, true) => W::Rgba8UnormSrgb,
        (TextureFormat::Bgra8Unorm, false) => W::Bgra8Unorm,
        (TextureFormat::Bgra8Unorm, true) => W::Bgra8UnormSrgb,
        (TextureFormat::Rgba16Unorm, _) => W::Rgba16Unorm,
        (TextureFormat::R16Float, _) => W::R16Float,
        (TextureFormat::Rgba16Float, _) => W::Rgba16Float,
        (TextureFormat::R32Float, _) => W::R32Float,
        (TextureFormat::Rg32Float, _) => W::Rg32Float,
        (TextureFormat::Rgba32Float, _) => W::Rgba32Float,
        (TextureFormat::R32Sint, _) => W::R32Sint,
        (TextureFormat::Bc1RgbaUnorm, false) => W::Bc1RgbaUnorm,
        (TextureFormat::Bc1RgbaUnorm, true) => W::Bc1RgbaUnormSrgb,
        (TextureFormat::Bc3RgbaUnorm, false) => W::Bc3RgbaUnorm,
        (TextureFormat::Bc3RgbaUnorm, true) => W::Bc3RgbaUnormSrgb,
        (TextureFormat::Bc7RgbaUnorm, false) => W::Bc7RgbaUnorm,
        (TextureFormat::Bc7RgbaUnorm, true) => W::Bc7RgbaUnormSrgb,
        (TextureFormat::Depth16Unorm, _) => W::Depth16Unorm,
        (TextureFormat::Depth32Float, _) => W::Depth32Float,
        (TextureFormat::Depth24PlusStencil8, _) => W::Depth24PlusStencil8,
    }
}

/// Read the limits and optional format features off a live device.
pub(super) fn capabilities(device: &wgpu::Device) -> Capabilities {
    let limits = device.limits();
    let features = device.features();
    let supported = TextureFormat::ALL.into_iter().filter(|format| match format {
        TextureFormat::Bc1RgbaUnorm | TextureFormat::Bc3RgbaUnorm | TextureFormat::Bc7RgbaUnorm => {
            features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC)
        }
        TextureFormat::Rgba16Unorm => features.contains(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM),
        _ => true,
    });
    Capabilities::new(limits.max_texture_dimension_2d).with_supported_formats(supported)
}
