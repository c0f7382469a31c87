// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Create, query, destroy and handle reuse through the public manager API.
#[cfg(target_arch = "wasm32")]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

use texture_arena::SoftwareDevice;
use texture_arena::pixel_formats::TextureFormat;
use texture_arena::textures::{
    CreateError, DestroyError, ManagerConfig, ResourceState, TextureBuilder, TextureManager,
    ValidationError,
};

fn manager(config: ManagerConfig) -> TextureManager<SoftwareDevice> {
    TextureManager::new(SoftwareDevice::new(), config)
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn query_returns_what_was_created() {
    let m = manager(ManagerConfig::new());
    for format in TextureFormat::ALL {
        let gamma = format.has_srgb_encoding();
        let descriptor = TextureBuilder::new(format, 64, 32)
            .with_mipmaps(true)
            .with_gamma_correction(gamma)
            .build();
        let handle = m.create(descriptor).unwrap();
        assert_eq!(m.query(handle), Some(descriptor));
        let resource = m.resource(handle).unwrap();
        assert_eq!(resource.handle, handle);
        assert_eq!(resource.state, ResourceState::Live);
        assert_eq!(resource.byte_len, descriptor.byte_len());
    }
    assert_eq!(m.live_count(), TextureFormat::ALL.len());
    assert_eq!(m.teardown(), TextureFormat::ALL.len());
    assert_eq!(m.allocated_bytes(), 0);
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn repeated_destroy_frees_once() {
    let m = manager(ManagerConfig::new());
    let handles: Vec<_> = (0..32)
        .map(|i| {
            m.create_texture(TextureFormat::Rgba16Float, 8 + i, 8, false, false)
                .unwrap()
        })
        .collect();
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(m.destroy(*handle), Ok(()));
        for _ in 0..3 {
            assert_eq!(
                m.destroy(*handle),
                Err(DestroyError::AlreadyDestroyed(*handle))
            );
        }
        let device = m.device();
        assert!(device.free_count() <= device.allocation_count());
        assert_eq!(device.free_count(), i as u64 + 1);
    }
    assert_eq!(m.device().free_count(), m.device().allocation_count());
    assert_eq!(m.device().double_free_count(), 0);
    assert_eq!(m.device().live_bytes(), 0);
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn stale_handle_stays_dead_after_slot_reuse() {
    let m = manager(ManagerConfig::new());
    let first = m
        .create_texture(TextureFormat::R32Float, 16, 16, false, false)
        .unwrap();
    m.destroy(first).unwrap();
    let second = m
        .create_texture(TextureFormat::Rg32Float, 32, 32, false, false)
        .unwrap();
    assert_eq!(second.index(), first.index());
    assert_eq!(second.generation(), first.generation() + 1);

    assert_eq!(m.query(first), None);
    assert_eq!(m.state(first), Some(ResourceState::Destroyed));
    assert_eq!(m.destroy(first), Err(DestroyError::AlreadyDestroyed(first)));
    //the stale destroy did not touch the new texture
    assert_eq!(m.query(second).unwrap().format, TextureFormat::Rg32Float);
    assert_eq!(m.device().free_count(), 1);
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn slot_capacity_is_enforced() {
    let m = manager(ManagerConfig::new().with_slot_capacity(2));
    let a = m
        .create_texture(TextureFormat::R8Unorm, 1, 1, false, false)
        .unwrap();
    m.create_texture(TextureFormat::R8Unorm, 1, 1, false, false)
        .unwrap();
    let err = m
        .create_texture(TextureFormat::R8Unorm, 1, 1, false, false)
        .unwrap_err();
    assert!(matches!(err, CreateError::OutOfSlots { capacity: 2 }));
    m.destroy(a).unwrap();
    m.create_texture(TextureFormat::R8Unorm, 1, 1, false, false)
        .unwrap();
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn configured_dimension_cap() {
    let m = manager(ManagerConfig::new().with_max_dimension_2d(1024));
    assert_eq!(m.capabilities().max_dimension_2d, 1024);
    let err = m
        .create_texture(TextureFormat::Rgba8Unorm, 2048, 16, false, false)
        .unwrap_err();
    assert!(matches!(
        err,
        CreateError::InvalidDescriptor(ValidationError::DimensionTooLarge { .. })
    ));
    assert_eq!(m.device().allocation_count(), 0);
}

#[test]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
fn teardown_frees_leaks() {
    let device_frees;
    {
        let m = manager(ManagerConfig::new());
        for _ in 0..4 {
            m.create_texture(TextureFormat::Bc7RgbaUnorm, 64, 64, true, true)
                .unwrap();
        }
        device_frees = m.device().free_count();
        assert_eq!(m.teardown(), 4);
        assert_eq!(m.device().live_allocations(), 0);
    }
    assert_eq!(device_frees, 0);
}
