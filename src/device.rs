// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Cross-platform device seam.
//!
//! A [`Device`] is whatever owns texture memory: a wgpu device, or the in-process
//! [`crate::SoftwareDevice`].  The manager only needs three things from it: a snapshot of
//! its limits, a way to allocate memory for a descriptor, and a way to give that memory back.

use crate::pixel_formats::TextureFormat;
use crate::textures::TextureDescriptor;
use std::fmt::Debug;

/// Default upper bound on either texture dimension.
pub const DEFAULT_MAX_DIMENSION_2D: u32 = 16384;

/// A snapshot of what a device can do, used by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Largest width or height accepted for a 2D texture.
    pub max_dimension_2d: u32,
    /// Upper bound on mip levels, base level included.  `None` means the full chain is always
    /// available.
    pub max_mip_levels: Option<u32>,
    /// Whether a mip chain may be built for a texture whose sides are not powers of two.
    pub non_power_of_two_mipmaps: bool,
    supported_formats: Vec<TextureFormat>,
}

impl Capabilities {
    pub fn new(max_dimension_2d: u32) -> Self {
        Self {
            max_dimension_2d,
            max_mip_levels: None,
            non_power_of_two_mipmaps: true,
            supported_formats: TextureFormat::ALL.to_vec(),
        }
    }

    /// Restrict the device to the given formats.
    pub fn with_supported_formats(mut self, formats: impl IntoIterator<Item = TextureFormat>) -> Self {
        self.supported_formats = formats.into_iter().collect();
        self
    }

    pub fn with_max_mip_levels(mut self, max_mip_levels: u32) -> Self {
        self.max_mip_levels = Some(max_mip_levels);
        self
    }

    pub fn with_non_power_of_two_mipmaps(mut self, allowed: bool) -> Self {
        self.non_power_of_two_mipmaps = allowed;
        self
    }

    pub fn supports_format(&self, format: TextureFormat) -> bool {
        self.supported_formats.contains(&format)
    }

    pub fn supported_formats(&self) -> &[TextureFormat] {
        &self.supported_formats
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION_2D)
    }
}

/// Identifies one device allocation for diagnostics and resource snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationId(pub u64);

/// Memory handed out by a [`Device`].
///
/// Allocations are deliberately not `Clone`: whoever holds one is responsible for passing it
/// back to [`Device::free`], and moving it is the only way to do so.
pub trait DeviceAllocation: Send + Debug {
    fn id(&self) -> AllocationId;
    fn byte_len(&self) -> u64;
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device is out of memory ({requested} bytes requested)")]
    OutOfMemory { requested: u64 },
    #[error("device rejected the allocation: {0}")]
    Rejected(String),
}

/// Texture memory provider.
///
/// Allocation and free are synchronous and bounded.  Implementations must be usable from
/// the finalizer thread as well as the owning thread.
pub trait Device: Send + Sync + Debug {
    type Allocation: DeviceAllocation;

    fn capabilities(&self) -> Capabilities;

    /// Allocate backing memory for `descriptor`.  `byte_len` is the size of the full chain
    /// as computed by [`TextureDescriptor::byte_len`].
    fn allocate(
        &self,
        descriptor: &TextureDescriptor,
        byte_len: u64,
    ) -> Result<Self::Allocation, DeviceError>;

    fn free(&self, allocation: Self::Allocation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities() {
        let caps = Capabilities::default();
        assert_eq!(caps.max_dimension_2d, 16384);
        assert!(caps.non_power_of_two_mipmaps);
        for format in TextureFormat::ALL {
            assert!(caps.supports_format(format));
        }
    }

    #[test]
    fn restricted_formats() {
        let caps = Capabilities::default().with_supported_formats([TextureFormat::Rgba8Unorm]);
        assert!(caps.supports_format(TextureFormat::Rgba8Unorm));
        assert!(!caps.supports_format(TextureFormat::Bc7RgbaUnorm));
    }
}
