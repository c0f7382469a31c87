// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Rust-side stand-in for the scripting layer's texture object.
//!
//! Constructing a [`Texture2D`] creates the texture.  [`Texture2D::dispose`] destroys it
//! deterministically.  Dropping it without disposing plays the part of the garbage
//! collector: the handle is reported to the [`FinalizationBridge`].

use crate::device::Device;
use crate::pixel_formats::TextureFormat;
use crate::textures::{
    CreateError, DestroyError, FinalizationBridge, TextureBuilder, TextureDescriptor,
    TextureHandle, TextureManager,
};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Texture2D<D: Device> {
    handle: TextureHandle,
    manager: Arc<TextureManager<D>>,
    bridge: Arc<FinalizationBridge<D>>,
    disposed: AtomicBool,
}

impl<D: Device> Texture2D<D> {
    pub fn new(
        manager: Arc<TextureManager<D>>,
        bridge: Arc<FinalizationBridge<D>>,
        format: TextureFormat,
        width: u32,
        height: u32,
        has_mipmaps: bool,
        gamma_correction: bool,
    ) -> Result<Self, CreateError> {
        let descriptor = TextureBuilder::new(format, width, height)
            .with_mipmaps(has_mipmaps)
            .with_gamma_correction(gamma_correction)
            .build();
        Self::with_descriptor(manager, bridge, descriptor)
    }

    pub fn with_descriptor(
        manager: Arc<TextureManager<D>>,
        bridge: Arc<FinalizationBridge<D>>,
        descriptor: TextureDescriptor,
    ) -> Result<Self, CreateError> {
        let handle = manager.create(descriptor)?;
        Ok(Self {
            handle,
            manager,
            bridge,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Descriptor, or `None` once the texture has been destroyed by any path.
    pub fn descriptor(&self) -> Option<TextureDescriptor> {
        self.manager.query(self.handle)
    }

    /// Destroy the texture now.  A second call reports [`DestroyError::AlreadyDestroyed`].
    pub fn dispose(&self) -> Result<(), DestroyError> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(DestroyError::AlreadyDestroyed(self.handle));
        }
        self.manager.destroy(self.handle)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<D: Device> Drop for Texture2D<D> {
    fn drop(&mut self) {
        if !*self.disposed.get_mut() {
            self.bridge.on_proxy_unreachable(self.handle);
        }
    }
}

impl<D: Device> Debug for Texture2D<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2D")
            .field("handle", &self.handle)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
