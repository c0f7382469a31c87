// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device implementations.
//!
//! The software device is always available.  The wgpu device is behind `backend_wgpu`.

mod software;

pub use software::{SoftwareAllocation, SoftwareDevice};

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
mod wgpu;

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
pub use self::wgpu::{Error as WgpuError, WgpuAllocation, WgpuDevice};
