// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Generation-checked arena of texture slots.
//!
//! # Overview
//!
//! Every texture lives in a slot.  A [`TextureHandle`] is the pair (slot index, generation),
//! so a handle left over from a destroyed texture is told apart from a live one in O(1):
//! releasing a slot bumps its generation, and any handle carrying an older generation is
//! known to be destroyed.
//!
//! Slots move through these states:
//! - `Vacant`: on the free list, ready for [`HandleTable::allocate`]
//! - `Reserved`: handle issued, no device memory bound yet
//! - `Bound`: device memory attached; the resource is live (or pending destroy)
//! - `Retired`: the generation counter is exhausted and the slot is never reused
//!
//! [`HandleTable::release`] is the only operation that takes an allocation out of a bound
//! slot.  Because it runs under the table lock and leaves the slot with a newer generation,
//! a second release of the same handle can only ever observe [`HandleFault::Destroyed`].

use crate::bittricks::{u32s_to_u64, u64_to_u32s};
use crate::device::{AllocationId, DeviceAllocation};
use crate::textures::TextureDescriptor;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Opaque, generation-checked reference to a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle {
    index: u32,
    generation: u32,
}

impl TextureHandle {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a single integer for crossing the scripting boundary.
    pub fn to_raw(self) -> u64 {
        u32s_to_u64(self.generation, self.index)
    }

    /// Inverse of [`Self::to_raw`].  Any `u64` decodes; the table decides whether it is valid.
    pub fn from_raw(raw: u64) -> Self {
        let (generation, index) = u64_to_u32s(raw);
        Self { index, generation }
    }
}

impl Display for TextureHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Lifecycle of a texture as seen from outside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Live,
    /// A finalizer has asked for destruction, which has not been carried out yet.
    PendingDestroy,
    Destroyed,
}

/// Read-only snapshot of a bound slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureResource {
    pub handle: TextureHandle,
    pub descriptor: TextureDescriptor,
    pub allocation: AllocationId,
    pub byte_len: u64,
    pub state: ResourceState,
}

/// Why a handle was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleFault {
    /// The handle was never issued by this table.
    Unknown,
    /// The handle was issued, and its resource has since been released.
    Destroyed,
    /// The slot already has device memory bound.
    AlreadyBound,
    /// The slot is reserved but has no device memory yet.
    Unbound,
}

impl Display for HandleFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandleFault::Unknown => "unknown handle",
            HandleFault::Destroyed => "already destroyed",
            HandleFault::AlreadyBound => "already bound",
            HandleFault::Unbound => "not bound",
        };
        f.write_str(s)
    }
}

/// [`HandleTable::allocate`] hit the configured slot ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("handle table is full ({capacity} slots)")]
pub struct OutOfSlots {
    pub capacity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid handle {handle}: {fault}")]
pub struct InvalidHandle {
    pub handle: TextureHandle,
    pub fault: HandleFault,
}

/// A failed [`HandleTable::bind`].  The allocation comes back so the caller can free it.
#[derive(Debug, thiserror::Error)]
#[error("cannot bind memory to {handle}: {fault}")]
pub struct BindError<A> {
    pub handle: TextureHandle,
    pub fault: HandleFault,
    pub allocation: A,
}

#[derive(Debug)]
enum SlotState<A> {
    Vacant,
    Reserved(TextureDescriptor),
    Bound {
        descriptor: TextureDescriptor,
        allocation: A,
        pending_destroy: bool,
    },
    Retired,
}

#[derive(Debug)]
struct Slot<A> {
    generation: u32,
    state: SlotState<A>,
}

#[derive(Debug)]
struct Slots<A> {
    slots: Vec<Slot<A>>,
    free: Vec<u32>,
    bound: usize,
}

impl<A> Slots<A> {
    /// Find the slot `handle` refers to, provided the generations agree.
    fn slot_mut(&mut self, handle: TextureHandle) -> Result<&mut Slot<A>, HandleFault> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(HandleFault::Unknown)?;
        if handle.generation < slot.generation {
            return Err(HandleFault::Destroyed);
        }
        if handle.generation > slot.generation {
            return Err(HandleFault::Unknown);
        }
        match slot.state {
            SlotState::Vacant => Err(HandleFault::Unknown),
            SlotState::Retired => Err(HandleFault::Destroyed),
            SlotState::Reserved(_) | SlotState::Bound { .. } => Ok(slot),
        }
    }

    /// Move `slot` to the next generation and return its index to the free list.
    fn recycle(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                slot.state = SlotState::Vacant;
                self.free.push(index);
            }
            None => {
                logwise::trace_sync!("retiring texture slot {index}", index = index);
                slot.state = SlotState::Retired;
            }
        }
    }
}

/// Arena of texture slots, generic over the device allocation type.
///
/// All mutation is serialized under one lock.
#[derive(Debug)]
pub struct HandleTable<A> {
    inner: Mutex<Slots<A>>,
    capacity: Option<u32>,
}

impl<A> Default for HandleTable<A> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<A> HandleTable<A> {
    /// Create a table.  `capacity` is a hard ceiling on slots; `None` means unbounded.
    pub fn new(capacity: Option<u32>) -> Self {
        Self {
            inner: Mutex::new(Slots {
                slots: Vec::new(),
                free: Vec::new(),
                bound: 0,
            }),
            capacity,
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots<A>> {
        //every mutation leaves the slots consistent before anything that could panic
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a slot for `descriptor` without binding memory.
    pub fn allocate(&self, descriptor: TextureDescriptor) -> Result<TextureHandle, OutOfSlots> {
        let mut slots = self.slots();
        if let Some(index) = slots.free.pop() {
            let slot = &mut slots.slots[index as usize];
            slot.state = SlotState::Reserved(descriptor);
            return Ok(TextureHandle::new(index, slot.generation));
        }
        let len = slots.slots.len();
        let at_capacity = match self.capacity {
            Some(capacity) => len >= capacity as usize,
            None => len >= u32::MAX as usize,
        };
        if at_capacity {
            return Err(OutOfSlots {
                capacity: self.capacity.unwrap_or(u32::MAX),
            });
        }
        slots.slots.push(Slot {
            generation: 0,
            state: SlotState::Reserved(descriptor),
        });
        Ok(TextureHandle::new(len as u32, 0))
    }

    /// Attach device memory to a reserved slot.
    pub fn bind(&self, handle: TextureHandle, allocation: A) -> Result<(), BindError<A>> {
        let mut slots = self.slots();
        let slot = match slots.slot_mut(handle) {
            Ok(slot) => slot,
            Err(fault) => {
                return Err(BindError {
                    handle,
                    fault,
                    allocation,
                });
            }
        };
        let descriptor = match slot.state {
            SlotState::Reserved(descriptor) => descriptor,
            _ => {
                return Err(BindError {
                    handle,
                    fault: HandleFault::AlreadyBound,
                    allocation,
                });
            }
        };
        slot.state = SlotState::Bound {
            descriptor,
            allocation,
            pending_destroy: false,
        };
        slots.bound += 1;
        Ok(())
    }

    /// Roll back a reservation that never had memory bound.
    pub fn abandon(&self, handle: TextureHandle) -> Result<(), InvalidHandle> {
        let mut slots = self.slots();
        let slot = slots
            .slot_mut(handle)
            .map_err(|fault| InvalidHandle { handle, fault })?;
        if !matches!(slot.state, SlotState::Reserved(_)) {
            return Err(InvalidHandle {
                handle,
                fault: HandleFault::AlreadyBound,
            });
        }
        slots.recycle(handle.index);
        Ok(())
    }

    /// Destroy the resource behind `handle` and hand back its allocation.
    ///
    /// This is the only way an allocation leaves the table, so it is yielded exactly once no
    /// matter how many callers race on the same handle.
    pub fn release(&self, handle: TextureHandle) -> Result<A, InvalidHandle> {
        let mut slots = self.slots();
        let slot = slots
            .slot_mut(handle)
            .map_err(|fault| InvalidHandle { handle, fault })?;
        let allocation = match std::mem::replace(&mut slot.state, SlotState::Vacant) {
            SlotState::Bound { allocation, .. } => allocation,
            other => {
                slot.state = other;
                return Err(InvalidHandle {
                    handle,
                    fault: HandleFault::Unbound,
                });
            }
        };
        slots.bound -= 1;
        slots.recycle(handle.index);
        Ok(allocation)
    }

    /// Flag a live resource as awaiting deferred destruction.
    ///
    /// Returns `false` if it was already flagged.
    pub fn mark_pending_destroy(&self, handle: TextureHandle) -> Result<bool, InvalidHandle> {
        let mut slots = self.slots();
        let slot = slots
            .slot_mut(handle)
            .map_err(|fault| InvalidHandle { handle, fault })?;
        match &mut slot.state {
            SlotState::Bound {
                pending_destroy, ..
            } => Ok(!std::mem::replace(pending_destroy, true)),
            _ => Err(InvalidHandle {
                handle,
                fault: HandleFault::Unbound,
            }),
        }
    }

    /// Where `handle` is in its lifecycle, or `None` if it was never issued (or is only
    /// reserved).
    pub fn state_of(&self, handle: TextureHandle) -> Option<ResourceState> {
        let mut slots = self.slots();
        match slots.slot_mut(handle) {
            Ok(Slot {
                state: SlotState::Bound {
                    pending_destroy, ..
                },
                ..
            }) => Some(if *pending_destroy {
                ResourceState::PendingDestroy
            } else {
                ResourceState::Live
            }),
            Ok(_) => None,
            Err(HandleFault::Destroyed) => Some(ResourceState::Destroyed),
            Err(_) => None,
        }
    }

    /// Number of slots with memory bound.
    pub fn live_count(&self) -> usize {
        self.slots().bound
    }

    /// Total slots ever created, including vacant and retired ones.
    pub fn slot_count(&self) -> usize {
        self.slots().slots.len()
    }
}

impl<A: DeviceAllocation> HandleTable<A> {
    /// Snapshot of a bound resource.  Empty for stale, unknown or merely reserved handles.
    pub fn lookup(&self, handle: TextureHandle) -> Option<TextureResource> {
        let mut slots = self.slots();
        match slots.slot_mut(handle) {
            Ok(Slot {
                state:
                    SlotState::Bound {
                        descriptor,
                        allocation,
                        pending_destroy,
                    },
                ..
            }) => Some(TextureResource {
                handle,
                descriptor: *descriptor,
                allocation: allocation.id(),
                byte_len: allocation.byte_len(),
                state: if *pending_destroy {
                    ResourceState::PendingDestroy
                } else {
                    ResourceState::Live
                },
            }),
            _ => None,
        }
    }

    /// Release every bound slot, returning the handles and allocations.
    ///
    /// Used at teardown.  Reserved slots belong to a `create` still in flight and are left
    /// for it to finish or roll back.
    pub fn drain(&self) -> Vec<(TextureHandle, A)> {
        let mut slots = self.slots();
        let mut drained = Vec::with_capacity(slots.bound);
        for index in 0..slots.slots.len() as u32 {
            let slot = &mut slots.slots[index as usize];
            if !matches!(slot.state, SlotState::Bound { .. }) {
                continue;
            }
            let handle = TextureHandle::new(index, slot.generation);
            if let SlotState::Bound { allocation, .. } =
                std::mem::replace(&mut slot.state, SlotState::Vacant)
            {
                drained.push((handle, allocation));
            }
            slots.bound -= 1;
            slots.recycle(index);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::TextureFormat;

    #[derive(Debug, PartialEq, Eq)]
    struct FakeAllocation(u64);
    impl DeviceAllocation for FakeAllocation {
        fn id(&self) -> AllocationId {
            AllocationId(self.0)
        }
        fn byte_len(&self) -> u64 {
            64
        }
    }

    fn descriptor() -> TextureDescriptor {
        TextureDescriptor::new(TextureFormat::Rgba8Unorm, 4, 4)
    }

    #[test]
    fn allocate_bind_release() {
        let table = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        assert_eq!(table.lookup(h), None, "reserved slots are not visible");
        table.bind(h, FakeAllocation(7)).unwrap();
        let resource = table.lookup(h).unwrap();
        assert_eq!(resource.allocation, AllocationId(7));
        assert_eq!(resource.state, ResourceState::Live);
        assert_eq!(table.live_count(), 1);

        assert_eq!(table.release(h).unwrap(), FakeAllocation(7));
        assert_eq!(table.lookup(h), None);
        assert_eq!(table.state_of(h), Some(ResourceState::Destroyed));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn release_twice() {
        let table = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        table.bind(h, FakeAllocation(1)).unwrap();
        table.release(h).unwrap();
        assert_eq!(
            table.release(h),
            Err(InvalidHandle {
                handle: h,
                fault: HandleFault::Destroyed
            })
        );
    }

    #[test]
    fn recycled_slot_gets_new_generation() {
        let table = HandleTable::new(None);
        let first = table.allocate(descriptor()).unwrap();
        table.bind(first, FakeAllocation(1)).unwrap();
        table.release(first).unwrap();

        let second = table.allocate(descriptor()).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        table.bind(second, FakeAllocation(2)).unwrap();

        assert_eq!(table.lookup(first), None);
        assert!(table.lookup(second).is_some());
        //the stale handle cannot destroy the new resource
        assert!(matches!(
            table.release(first),
            Err(InvalidHandle {
                fault: HandleFault::Destroyed,
                ..
            })
        ));
        assert_eq!(table.live_count(), 1);
    }

    #[test]
    fn unknown_handles() {
        let table: HandleTable<FakeAllocation> = HandleTable::new(None);
        let bogus = TextureHandle::new(12, 0);
        assert_eq!(table.lookup(bogus), None);
        assert_eq!(table.state_of(bogus), None);
        assert!(matches!(
            table.release(bogus),
            Err(InvalidHandle {
                fault: HandleFault::Unknown,
                ..
            })
        ));
        let h = table.allocate(descriptor()).unwrap();
        let future = TextureHandle::new(h.index(), h.generation() + 1);
        assert!(matches!(
            table.release(future),
            Err(InvalidHandle {
                fault: HandleFault::Unknown,
                ..
            })
        ));
    }

    #[test]
    fn bind_rejects_double_bind_and_returns_allocation() {
        let table = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        table.bind(h, FakeAllocation(1)).unwrap();
        let err = table.bind(h, FakeAllocation(2)).unwrap_err();
        assert_eq!(err.fault, HandleFault::AlreadyBound);
        assert_eq!(err.allocation, FakeAllocation(2));
    }

    #[test]
    fn release_of_reserved_slot_is_refused() {
        let table: HandleTable<FakeAllocation> = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        assert!(matches!(
            table.release(h),
            Err(InvalidHandle {
                fault: HandleFault::Unbound,
                ..
            })
        ));
        table.abandon(h).unwrap();
        assert_eq!(table.state_of(h), Some(ResourceState::Destroyed));
        let next = table.allocate(descriptor()).unwrap();
        assert_eq!(next.index(), h.index());
        assert_eq!(next.generation(), h.generation() + 1);
    }

    #[test]
    fn capacity_ceiling() {
        let table: HandleTable<FakeAllocation> = HandleTable::new(Some(2));
        let a = table.allocate(descriptor()).unwrap();
        let _b = table.allocate(descriptor()).unwrap();
        assert_eq!(
            table.allocate(descriptor()),
            Err(OutOfSlots { capacity: 2 })
        );
        table.abandon(a).unwrap();
        assert!(table.allocate(descriptor()).is_ok());
    }

    #[test]
    fn pending_destroy() {
        let table = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        table.bind(h, FakeAllocation(3)).unwrap();
        assert_eq!(table.mark_pending_destroy(h), Ok(true));
        assert_eq!(table.mark_pending_destroy(h), Ok(false));
        assert_eq!(table.lookup(h).unwrap().state, ResourceState::PendingDestroy);
        assert_eq!(table.release(h).unwrap(), FakeAllocation(3));
    }

    #[test]
    fn exhausted_generation_retires_slot() {
        let table = HandleTable::new(None);
        let h = table.allocate(descriptor()).unwrap();
        table.slots().slots[0].generation = u32::MAX;
        let h = TextureHandle::new(h.index(), u32::MAX);
        table.bind(h, FakeAllocation(1)).unwrap();
        table.release(h).unwrap();
        assert_eq!(table.state_of(h), Some(ResourceState::Destroyed));
        let next = table.allocate(descriptor()).unwrap();
        assert_ne!(next.index(), h.index(), "retired slot must not be reused");
        assert_eq!(table.slot_count(), 2);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let table: HandleTable<FakeAllocation> = HandleTable::default();
        let h = table.allocate(descriptor()).unwrap();
        table.bind(h, FakeAllocation(1)).unwrap();
        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _slots = table.slots();
            panic!("panic while holding the table lock");
        }));
        assert!(panicked.is_err());
        assert!(table.inner.is_poisoned());

        let next = table.allocate(descriptor()).unwrap();
        assert_ne!(next.index(), h.index());
        assert_eq!(table.live_count(), 1);
        assert_eq!(table.release(h).unwrap(), FakeAllocation(1));
        assert_eq!(table.slot_count(), 2);
    }

    #[test]
    fn drain_releases_everything() {
        let table = HandleTable::new(None);
        let mut handles = Vec::new();
        for i in 0..4 {
            let h = table.allocate(descriptor()).unwrap();
            table.bind(h, FakeAllocation(i)).unwrap();
            handles.push(h);
        }
        table.release(handles[1]).unwrap();
        let drained = table.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(table.live_count(), 0);
        for h in handles {
            assert_eq!(table.lookup(h), None);
        }
    }

    #[test]
    fn raw_round_trip() {
        let h = TextureHandle::new(5, 9);
        assert_eq!(TextureHandle::from_raw(h.to_raw()), h);
        assert_eq!(h.to_string(), "#5v9");
    }
}
