// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Boundary surface for the scripting layer.
//!
//! Handles cross as plain `u64`s.  An [`EntryPoint`] is created when the device context comes
//! up and torn down with it; nothing here depends on the scripting runtime's own startup or
//! shutdown.
use crate::device::Device;
use crate::pixel_formats::TextureFormat;
use crate::proxy::Texture2D;
use crate::textures::{
    CreateError, DestroyError, FinalizationBridge, FinalizeOutcome, ManagerConfig,
    TextureDescriptor, TextureHandle, TextureManager,
};
use std::sync::Arc;

#[derive(Debug)]
pub struct EntryPoint<D: Device> {
    manager: Arc<TextureManager<D>>,
    bridge: Arc<FinalizationBridge<D>>,
}

impl<D: Device> EntryPoint<D> {
    /// Bring up texture management on `device`.
    pub fn init(device: D, config: ManagerConfig) -> Self {
        let manager = Arc::new(TextureManager::new(device, config));
        let bridge = Arc::new(FinalizationBridge::new(&manager));
        Self { manager, bridge }
    }

    /// `CreateTexture`: called at proxy construction.
    pub fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<u64, CreateError> {
        self.manager.create(*descriptor).map(TextureHandle::to_raw)
    }

    /// `DestroyTexture`: called at explicit disposal.
    pub fn destroy_texture(&self, handle: u64) -> Result<(), DestroyError> {
        self.manager.destroy(TextureHandle::from_raw(handle))
    }

    /// `QueryTexture`: metadata for collaborators that do not own the texture.
    pub fn query_texture(&self, handle: u64) -> Option<TextureDescriptor> {
        self.manager.query(TextureHandle::from_raw(handle))
    }

    /// Finalizer hook: the proxy holding `handle` was collected.
    pub fn proxy_unreachable(&self, handle: u64) -> FinalizeOutcome {
        self.bridge.on_proxy_unreachable(TextureHandle::from_raw(handle))
    }

    /// Run deferred finalizations.  Call from the owning thread, e.g. once per frame.
    pub fn drain_finalized(&self) -> usize {
        self.bridge.drain()
    }

    /// Create a texture wrapped in a proxy that cleans up after itself.
    pub fn texture(
        &self,
        format: TextureFormat,
        width: u32,
        height: u32,
        has_mipmaps: bool,
        gamma_correction: bool,
    ) -> Result<Texture2D<D>, CreateError> {
        Texture2D::new(
            self.manager.clone(),
            self.bridge.clone(),
            format,
            width,
            height,
            has_mipmaps,
            gamma_correction,
        )
    }

    pub fn manager(&self) -> &Arc<TextureManager<D>> {
        &self.manager
    }

    pub fn bridge(&self) -> &Arc<FinalizationBridge<D>> {
        &self.bridge
    }

    /// Tear down with the device context.  Runs pending finalizations, then frees every
    /// texture still alive.  Returns how many textures were leaked (freed by teardown rather
    /// than by destroy or finalization).
    ///
    /// Proxies that outlive teardown are harmless; their finalizers see
    /// [`FinalizeOutcome::AlreadyDestroyed`].
    pub fn teardown(self) -> usize {
        self.bridge.drain();
        let leaked = self.manager.teardown();
        logwise::info_sync!("texture entry point torn down");
        leaked
    }
}

///platform-independent error type
#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
#[derive(Debug)]
pub struct EntryPointError(crate::imp::WgpuError);

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
impl std::fmt::Display for EntryPointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
impl std::error::Error for EntryPointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
impl EntryPoint<crate::imp::WgpuDevice> {
    /// Request a headless wgpu device and bring up texture management on it.
    pub async fn new(config: ManagerConfig) -> Result<Self, EntryPointError> {
        crate::imp::WgpuDevice::request()
            .await
            .map(|device| Self::init(device, config))
            .map_err(EntryPointError)
    }
}
