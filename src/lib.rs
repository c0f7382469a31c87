// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! texture_arena manages the lifetime of GPU textures that are owned by a garbage-collected
scripting layer.

A scripting runtime creates texture objects freely and usually forgets about them.  Some
are disposed explicitly; most are simply dropped and collected at an unspecified later time,
on a thread the runtime chooses.  Both paths must end with exactly one device free, and
neither may ever touch memory the other already released.

# Layers

| Layer                                  | Role                                                                     |
|----------------------------------------|--------------------------------------------------------------------------|
| [`textures::TextureDescriptor`]        | Immutable metadata: format, extent, mip chain, gamma                     |
| [`textures::validate`]                 | Rejects descriptors the device cannot honor, before anything is reserved |
| [`textures::handle_table::HandleTable`] | Generation-checked slots; stale handles are detected, never dereferenced |
| [`textures::TextureManager`]           | create / destroy / query; owns every device allocation                   |
| [`textures::FinalizationBridge`]       | Turns "proxy unreachable" into a destroy, immediately or deferred        |
| [`EntryPoint`]                         | `u64`-handle surface for the scripting boundary                          |

# Backends

The [`device::Device`] trait is the only thing the manager needs from a GPU.  Two
implementations ship:

* [`SoftwareDevice`] keeps books only.  It counts allocations, frees and double frees, and
  is what the test suite drives.
* `WgpuDevice` (feature `backend_wgpu`, native targets) allocates real
  [wgpu](https://wgpu.rs) textures.

# Example

```
use texture_arena::{EntryPoint, SoftwareDevice};
use texture_arena::pixel_formats::TextureFormat;
use texture_arena::textures::{ManagerConfig, TextureBuilder};

let entry = EntryPoint::init(SoftwareDevice::new(), ManagerConfig::new());
let descriptor = TextureBuilder::new(TextureFormat::Rgba8Unorm, 256, 256)
    .with_mipmaps(true)
    .build();
let handle = entry.create_texture(&descriptor).unwrap();
assert_eq!(entry.query_texture(handle).unwrap().mip_level_count(), 9);
entry.destroy_texture(handle).unwrap();
assert!(entry.destroy_texture(handle).is_err());
assert_eq!(entry.teardown(), 0);
```
*/

mod bittricks;
pub mod device;
mod entry_point;
mod imp;
pub mod pixel_formats;
pub mod proxy;
pub mod textures;

pub use entry_point::EntryPoint;
#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
pub use entry_point::EntryPointError;
pub use imp::{SoftwareAllocation, SoftwareDevice};
#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
pub use imp::{WgpuAllocation, WgpuDevice, WgpuError};
pub use proxy::Texture2D;
