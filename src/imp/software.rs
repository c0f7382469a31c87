// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! In-process device that only keeps books.
//!
//! No memory is actually reserved; the device records every allocation and free so that
//! lifetime bugs (leaks, double frees) show up as numbers.  It runs headless and is what the
//! tests drive.

use crate::device::{AllocationId, Capabilities, Device, DeviceAllocation, DeviceError};
use crate::textures::TextureDescriptor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct SoftwareAllocation {
    id: AllocationId,
    byte_len: u64,
}

impl DeviceAllocation for SoftwareAllocation {
    fn id(&self) -> AllocationId {
        self.id
    }
    fn byte_len(&self) -> u64 {
        self.byte_len
    }
}

#[derive(Debug, Default)]
struct Ledger {
    live: HashMap<AllocationId, u64>,
    live_bytes: u64,
    allocations: u64,
    frees: u64,
    double_frees: u64,
}

/// Allocation-tracking device with an optional memory budget.
#[derive(Debug)]
pub struct SoftwareDevice {
    capabilities: Capabilities,
    budget: Option<u64>,
    next_id: AtomicU64,
    ledger: Mutex<Ledger>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// Default capabilities, unlimited memory.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    /// Default capabilities; allocations fail once `budget` bytes are outstanding.
    pub fn with_budget(budget: u64) -> Self {
        Self {
            budget: Some(budget),
            ..Self::new()
        }
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            budget: None,
            next_id: AtomicU64::new(1),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful allocations so far.
    pub fn allocation_count(&self) -> u64 {
        self.ledger().allocations
    }

    /// Frees of live allocations so far.
    pub fn free_count(&self) -> u64 {
        self.ledger().frees
    }

    /// Frees of allocations that were not live.  Should always be zero.
    pub fn double_free_count(&self) -> u64 {
        self.ledger().double_frees
    }

    pub fn live_allocations(&self) -> usize {
        self.ledger().live.len()
    }

    pub fn live_bytes(&self) -> u64 {
        self.ledger().live_bytes
    }
}

impl Device for SoftwareDevice {
    type Allocation = SoftwareAllocation;

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn allocate(
        &self,
        _descriptor: &TextureDescriptor,
        byte_len: u64,
    ) -> Result<SoftwareAllocation, DeviceError> {
        let mut ledger = self.ledger();
        if let Some(budget) = self.budget {
            if ledger.live_bytes.saturating_add(byte_len) > budget {
                return Err(DeviceError::OutOfMemory {
                    requested: byte_len,
                });
            }
        }
        let id = AllocationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        ledger.live.insert(id, byte_len);
        ledger.live_bytes += byte_len;
        ledger.allocations += 1;
        Ok(SoftwareAllocation { id, byte_len })
    }

    fn free(&self, allocation: SoftwareAllocation) {
        let mut ledger = self.ledger();
        match ledger.live.remove(&allocation.id) {
            Some(bytes) => {
                ledger.live_bytes -= bytes;
                ledger.frees += 1;
            }
            None => {
                logwise::error_sync!(
                    "double free of allocation {id}",
                    id = logwise::privacy::LogIt(&allocation.id)
                );
                ledger.double_frees += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::TextureFormat;

    #[test]
    fn books_balance() {
        let device = SoftwareDevice::new();
        let d = TextureDescriptor::new(TextureFormat::R8Unorm, 2, 2);
        let a = device.allocate(&d, 4).unwrap();
        let b = device.allocate(&d, 4).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(device.live_bytes(), 8);
        device.free(a);
        device.free(b);
        assert_eq!(device.allocation_count(), 2);
        assert_eq!(device.free_count(), 2);
        assert_eq!(device.live_allocations(), 0);
        assert_eq!(device.double_free_count(), 0);
    }

    #[test]
    fn forged_free_is_counted() {
        let device = SoftwareDevice::new();
        device.free(SoftwareAllocation {
            id: AllocationId(99),
            byte_len: 1,
        });
        assert_eq!(device.double_free_count(), 1);
        assert_eq!(device.free_count(), 0);
    }

    #[test]
    fn budget() {
        let device = SoftwareDevice::with_budget(10);
        let d = TextureDescriptor::new(TextureFormat::R8Unorm, 2, 2);
        let a = device.allocate(&d, 8).unwrap();
        assert!(matches!(
            device.allocate(&d, 4),
            Err(DeviceError::OutOfMemory { requested: 4 })
        ));
        device.free(a);
        assert!(device.allocate(&d, 4).is_ok());
    }
}
