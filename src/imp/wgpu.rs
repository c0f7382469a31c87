// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! wgpu backend.

mod bound_device;
mod error;
mod pixel_format;

pub use bound_device::{WgpuAllocation, WgpuDevice};
pub use error::Error;
