// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Destroy-on-collection for textures whose proxy was never disposed.
//!
//! # Overview
//!
//! A scripting runtime reports that a proxy became unreachable at some unspecified later
//! time, on some thread of its choosing.  By then the application may already have
//! destroyed the texture explicitly, or may be destroying it right now on another thread.
//!
//! The bridge does not try to order these callers.  It relies on
//! [`TextureManager::destroy`] yielding the device allocation exactly once, and treats
//! [`DestroyError::AlreadyDestroyed`] as the expected outcome of losing the race.

use crate::device::Device;
use crate::textures::config::FinalizationPolicy;
use crate::textures::handle_table::TextureHandle;
use crate::textures::manager::{DestroyError, TextureManager};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// What happened to a finalizer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalizeOutcome {
    /// This call destroyed the texture.
    Destroyed,
    /// Someone else got there first.  Benign.
    AlreadyDestroyed,
    /// Queued for the owning thread's next [`FinalizationBridge::drain`].
    Deferred,
    /// The handle was never issued by this manager.  Indicates a bug in the caller.
    Unknown,
    /// The manager has been dropped; its teardown already freed everything.
    ManagerGone,
}

/// Routes proxy-unreachable notifications into texture destruction.
#[derive(Debug)]
pub struct FinalizationBridge<D: Device> {
    manager: Weak<TextureManager<D>>,
    policy: FinalizationPolicy,
    queue: Mutex<Vec<TextureHandle>>,
}

impl<D: Device> FinalizationBridge<D> {
    /// Bridge for `manager`, using the finalization policy from its configuration.
    pub fn new(manager: &Arc<TextureManager<D>>) -> Self {
        Self::with_policy(manager, manager.config().finalization())
    }

    pub fn with_policy(manager: &Arc<TextureManager<D>>, policy: FinalizationPolicy) -> Self {
        Self {
            manager: Arc::downgrade(manager),
            policy,
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> FinalizationPolicy {
        self.policy
    }

    pub fn manager(&self) -> Option<Arc<TextureManager<D>>> {
        self.manager.upgrade()
    }

    fn queue(&self) -> MutexGuard<'_, Vec<TextureHandle>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by the runtime's finalizer when the proxy for `handle` is unreachable.
    ///
    /// May be called from any thread, any number of times, before or after or during an
    /// explicit destroy.  Never surfaces an error.
    pub fn on_proxy_unreachable(&self, handle: TextureHandle) -> FinalizeOutcome {
        let Some(manager) = self.manager.upgrade() else {
            return FinalizeOutcome::ManagerGone;
        };
        match self.policy {
            FinalizationPolicy::Immediate => Self::finalize(&manager, handle),
            FinalizationPolicy::Deferred => match manager.mark_pending_destroy(handle) {
                Ok(newly_marked) => {
                    if newly_marked {
                        self.queue().push(handle);
                    }
                    FinalizeOutcome::Deferred
                }
                Err(err) => Self::outcome_for(err),
            },
        }
    }

    /// Destroy everything queued by deferred finalization.  Returns how many textures this
    /// call actually destroyed.
    pub fn drain(&self) -> usize {
        let pending = std::mem::take(&mut *self.queue());
        if pending.is_empty() {
            return 0;
        }
        let Some(manager) = self.manager.upgrade() else {
            return 0;
        };
        logwise::trace_sync!(
            "draining {count} deferred texture destroys",
            count = pending.len()
        );
        pending
            .into_iter()
            .filter(|handle| Self::finalize(&manager, *handle) == FinalizeOutcome::Destroyed)
            .count()
    }

    /// Handles waiting for [`Self::drain`].
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    fn finalize(manager: &TextureManager<D>, handle: TextureHandle) -> FinalizeOutcome {
        match manager.destroy(handle) {
            Ok(()) => FinalizeOutcome::Destroyed,
            Err(err) => Self::outcome_for(err),
        }
    }

    fn outcome_for(err: DestroyError) -> FinalizeOutcome {
        match err {
            DestroyError::AlreadyDestroyed(handle) => {
                logwise::trace_sync!(
                    "finalizer found {handle} already destroyed",
                    handle = logwise::privacy::LogIt(&handle)
                );
                FinalizeOutcome::AlreadyDestroyed
            }
            DestroyError::Unknown(handle) => {
                logwise::error_sync!(
                    "finalizer called for unknown texture {handle}",
                    handle = logwise::privacy::LogIt(&handle)
                );
                FinalizeOutcome::Unknown
            }
        }
    }
}

impl<D: Device> Drop for FinalizationBridge<D> {
    fn drop(&mut self) {
        self.drain();
    }
}
