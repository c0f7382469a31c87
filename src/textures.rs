// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Texture lifetime: validation, the handle table, the manager and finalization. */

mod config;
mod descriptor;
mod finalization;
pub mod handle_table;
mod manager;
pub mod validate;

pub use config::{FinalizationPolicy, ManagerConfig};
pub use descriptor::{TextureBuilder, TextureDescriptor, full_mip_chain_len};
pub use finalization::{FinalizationBridge, FinalizeOutcome};
pub use handle_table::{ResourceState, TextureHandle, TextureResource};
pub use manager::{CreateError, DestroyError, TextureManager};
pub use validate::{FormatFault, ValidationError, validate};
