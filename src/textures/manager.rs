// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The public face of texture lifetime: create, destroy, query.

use crate::device::{Capabilities, Device, DeviceAllocation, DeviceError};
use crate::pixel_formats::TextureFormat;
use crate::textures::config::ManagerConfig;
use crate::textures::handle_table::{
    HandleFault, HandleTable, InvalidHandle, OutOfSlots, ResourceState, TextureHandle,
    TextureResource,
};
use crate::textures::validate::{ValidationError, validate};
use crate::textures::{TextureBuilder, TextureDescriptor};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("invalid texture descriptor: {0}")]
    InvalidDescriptor(#[from] ValidationError),
    #[error("texture handle table is full ({capacity} slots)")]
    OutOfSlots { capacity: u32 },
    /// Either the manager's memory budget or the device itself refused the allocation.
    /// `source` is set when the device was asked.
    #[error("out of device memory allocating {requested} bytes")]
    OutOfDeviceMemory {
        requested: u64,
        #[source]
        source: Option<DeviceError>,
    },
}

impl From<OutOfSlots> for CreateError {
    fn from(value: OutOfSlots) -> Self {
        CreateError::OutOfSlots {
            capacity: value.capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DestroyError {
    #[error("texture {0} was already destroyed")]
    AlreadyDestroyed(TextureHandle),
    #[error("texture {0} is not known to this manager")]
    Unknown(TextureHandle),
}

impl From<InvalidHandle> for DestroyError {
    fn from(value: InvalidHandle) -> Self {
        match value.fault {
            HandleFault::Destroyed => DestroyError::AlreadyDestroyed(value.handle),
            HandleFault::Unknown | HandleFault::AlreadyBound | HandleFault::Unbound => {
                DestroyError::Unknown(value.handle)
            }
        }
    }
}

/// Creates, tracks and destroys 2D textures on one device.
///
/// All methods take `&self`; share the manager behind an `Arc` to reach it from a
/// finalizer thread.  Dropping the manager frees whatever is still allocated.
pub struct TextureManager<D: Device> {
    device: D,
    capabilities: Capabilities,
    table: HandleTable<D::Allocation>,
    allocated_bytes: AtomicU64,
    config: ManagerConfig,
}

impl<D: Device> TextureManager<D> {
    pub fn new(device: D, config: ManagerConfig) -> Self {
        let mut capabilities = device.capabilities();
        if let Some(max) = config.max_dimension_2d() {
            capabilities.max_dimension_2d = capabilities.max_dimension_2d.min(max);
        }
        logwise::info_sync!(
            "texture manager up; max dimension {max}",
            max = capabilities.max_dimension_2d
        );
        Self {
            device,
            capabilities,
            table: HandleTable::new(config.slot_capacity()),
            allocated_bytes: AtomicU64::new(0),
            config,
        }
    }

    /// Create a texture the way the scripting constructor does.
    pub fn create_texture(
        &self,
        format: TextureFormat,
        width: u32,
        height: u32,
        has_mipmaps: bool,
        gamma_correction: bool,
    ) -> Result<TextureHandle, CreateError> {
        self.create(
            TextureBuilder::new(format, width, height)
                .with_mipmaps(has_mipmaps)
                .with_gamma_correction(gamma_correction)
                .build(),
        )
    }

    /// Validate, reserve a handle, allocate memory, bind.
    ///
    /// Either every step succeeds or nothing is left behind: a failure after the handle is
    /// reserved abandons it, and a failure after memory is allocated frees it.
    pub fn create(&self, descriptor: TextureDescriptor) -> Result<TextureHandle, CreateError> {
        validate(&descriptor, &self.capabilities)?;
        let byte_len = descriptor.byte_len();
        let handle = self.table.allocate(descriptor)?;

        if let Err(e) = self.reserve_budget(byte_len) {
            self.abandon(handle);
            return Err(e);
        }
        let allocation = match self.device.allocate(&descriptor, byte_len) {
            Ok(allocation) => allocation,
            Err(err) => {
                logwise::warn_sync!(
                    "device refused {bytes} bytes for {handle}: {err}",
                    bytes = byte_len,
                    handle = logwise::privacy::LogIt(&handle),
                    err = logwise::privacy::LogIt(&err)
                );
                self.allocated_bytes.fetch_sub(byte_len, Ordering::AcqRel);
                self.abandon(handle);
                return Err(CreateError::OutOfDeviceMemory {
                    requested: byte_len,
                    source: Some(err),
                });
            }
        };
        let allocated = allocation.byte_len();
        if let Err(err) = self.table.bind(handle, allocation) {
            //nothing else can see a reserved handle, so this is a table bug; still, undo it
            logwise::error_sync!(
                "bind failed for freshly reserved {handle}: {fault}",
                handle = logwise::privacy::LogIt(&err.handle),
                fault = logwise::privacy::LogIt(&err.fault)
            );
            self.device.free(err.allocation);
            self.allocated_bytes.fetch_sub(byte_len, Ordering::AcqRel);
            self.abandon(handle);
            return Err(CreateError::OutOfDeviceMemory {
                requested: byte_len,
                source: Some(DeviceError::Rejected(err.fault.to_string())),
            });
        }
        //the device may round the allocation; keep the counter honest
        if allocated != byte_len {
            self.allocated_bytes.fetch_add(allocated, Ordering::AcqRel);
            self.allocated_bytes.fetch_sub(byte_len, Ordering::AcqRel);
        }
        logwise::trace_sync!(
            "created {handle} ({bytes} bytes)",
            handle = logwise::privacy::LogIt(&handle),
            bytes = allocated
        );
        Ok(handle)
    }

    /// Destroy `handle` and return its memory to the device.
    ///
    /// Safe to race with any other destroy of the same handle: exactly one caller gets `Ok`,
    /// the rest get [`DestroyError::AlreadyDestroyed`], and memory is freed once.
    pub fn destroy(&self, handle: TextureHandle) -> Result<(), DestroyError> {
        let allocation = self.table.release(handle)?;
        let bytes = allocation.byte_len();
        self.device.free(allocation);
        self.allocated_bytes.fetch_sub(bytes, Ordering::AcqRel);
        logwise::trace_sync!(
            "destroyed {handle} ({bytes} bytes)",
            handle = logwise::privacy::LogIt(&handle),
            bytes = bytes
        );
        Ok(())
    }

    /// Descriptor of a live texture.  Empty for unknown or destroyed handles.
    pub fn query(&self, handle: TextureHandle) -> Option<TextureDescriptor> {
        self.table.lookup(handle).map(|resource| resource.descriptor)
    }

    /// Full snapshot of a live texture.
    pub fn resource(&self, handle: TextureHandle) -> Option<TextureResource> {
        self.table.lookup(handle)
    }

    /// Lifecycle state, including `Destroyed` for handles this manager issued and released.
    pub fn state(&self, handle: TextureHandle) -> Option<ResourceState> {
        self.table.state_of(handle)
    }

    /// Bytes currently allocated across all live textures.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Acquire)
    }

    pub fn live_count(&self) -> usize {
        self.table.live_count()
    }

    /// Limits in effect, after any configuration override.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Free every texture still alive.  Returns how many there were.
    ///
    /// Handles issued before teardown read as destroyed afterwards.  The manager stays
    /// usable.
    pub fn teardown(&self) -> usize {
        let drained = self.table.drain();
        let count = drained.len();
        if count > 0 {
            logwise::warn_sync!(
                "texture teardown freeing {count} textures that were never destroyed",
                count = count
            );
        }
        for (handle, allocation) in drained {
            let bytes = allocation.byte_len();
            self.device.free(allocation);
            self.allocated_bytes.fetch_sub(bytes, Ordering::AcqRel);
            logwise::trace_sync!(
                "teardown freed {handle}",
                handle = logwise::privacy::LogIt(&handle)
            );
        }
        count
    }

    pub(crate) fn mark_pending_destroy(&self, handle: TextureHandle) -> Result<bool, DestroyError> {
        Ok(self.table.mark_pending_destroy(handle)?)
    }

    fn abandon(&self, handle: TextureHandle) {
        if let Err(err) = self.table.abandon(handle) {
            logwise::error_sync!(
                "could not roll back reservation: {err}",
                err = logwise::privacy::LogIt(&err)
            );
        }
    }

    /// Charge `bytes` against the configured budget, if any.
    fn reserve_budget(&self, bytes: u64) -> Result<(), CreateError> {
        let budget = self.config.memory_budget();
        self.allocated_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(bytes)?;
                match budget {
                    Some(budget) if next > budget => None,
                    _ => Some(next),
                }
            })
            .map(|_| ())
            .map_err(|current| {
                logwise::warn_sync!(
                    "texture budget exhausted: {current} allocated, {bytes} requested",
                    current = current,
                    bytes = bytes
                );
                CreateError::OutOfDeviceMemory {
                    requested: bytes,
                    source: None,
                }
            })
    }
}

impl<D: Device> Drop for TextureManager<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<D: Device> Debug for TextureManager<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("device", &self.device)
            .field("live", &self.table.live_count())
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}
