// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Manager configuration.

/// When a finalizer-triggered destroy actually runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FinalizationPolicy {
    /// Destroy on the finalizer's thread as soon as the proxy is reported unreachable.
    #[default]
    Immediate,
    /// Mark the resource pending and queue it; the owning thread destroys it on
    /// [`crate::textures::FinalizationBridge::drain`].
    Deferred,
}

/// Policy knobs for a [`crate::textures::TextureManager`].
///
/// Built fluently:
///
/// ```
/// use texture_arena::textures::{ManagerConfig, FinalizationPolicy};
///
/// let config = ManagerConfig::new()
///     .with_slot_capacity(1024)
///     .with_memory_budget(256 * 1024 * 1024)
///     .with_finalization(FinalizationPolicy::Deferred);
/// assert_eq!(config.slot_capacity(), Some(1024));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    slot_capacity: Option<u32>,
    memory_budget: Option<u64>,
    max_dimension_2d: Option<u32>,
    finalization: FinalizationPolicy,
}

impl ManagerConfig {
    /// Unbounded slots, no budget beyond the device's own, immediate finalization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard ceiling on live plus reserved texture slots.
    pub fn with_slot_capacity(mut self, slot_capacity: u32) -> Self {
        self.slot_capacity = Some(slot_capacity);
        self
    }

    /// Bytes the manager may have allocated at once, across all textures.
    pub fn with_memory_budget(mut self, memory_budget: u64) -> Self {
        self.memory_budget = Some(memory_budget);
        self
    }

    /// Lower the device's maximum texture dimension.  Values above the device limit have no
    /// effect.
    pub fn with_max_dimension_2d(mut self, max_dimension_2d: u32) -> Self {
        self.max_dimension_2d = Some(max_dimension_2d);
        self
    }

    pub fn with_finalization(mut self, finalization: FinalizationPolicy) -> Self {
        self.finalization = finalization;
        self
    }

    pub fn slot_capacity(&self) -> Option<u32> {
        self.slot_capacity
    }

    pub fn memory_budget(&self) -> Option<u64> {
        self.memory_budget
    }

    pub fn max_dimension_2d(&self) -> Option<u32> {
        self.max_dimension_2d
    }

    pub fn finalization(&self) -> FinalizationPolicy {
        self.finalization
    }
}
